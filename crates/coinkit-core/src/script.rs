//! Minimal script construction.
//!
//! Only what address derivation, the standard builder and the standard
//! signer need: data pushes, small-integer pushes and the P2PKH, P2SH and
//! P2WPKH templates. Scripts are hashed into addresses, so the push length
//! boundaries below are consensus-relevant.

pub const OP_0: u8 = 0x00;
pub const OP_PUSHDATA1: u8 = 0x4c;
pub const OP_PUSHDATA2: u8 = 0x4d;
pub const OP_PUSHDATA4: u8 = 0x4e;
/// `OP_1` is `OP_1NEGATE + 2`; small integers n are encoded as `0x50 + n`.
pub const OP_1NEGATE: u8 = 0x4f;
pub const OP_DUP: u8 = 0x76;
pub const OP_EQUAL: u8 = 0x87;
pub const OP_EQUALVERIFY: u8 = 0x88;
pub const OP_HASH160: u8 = 0xa9;
pub const OP_CHECKSIG: u8 = 0xac;

/// Largest length encoded directly in the opcode byte.
const MAX_DIRECT_PUSH: usize = 0x4b;

/// Push a small integer.
///
/// `0` encodes as `OP_0`, `1..=16` as `OP_1..=OP_16`. Anything else has no
/// single-opcode form and yields an empty script fragment.
pub fn push_int(value: u8) -> Vec<u8> {
    match value {
        0 => vec![OP_0],
        1..=16 => vec![0x50 + value],
        _ => Vec::new(),
    }
}

/// Push `data` with the shortest length prefix.
pub fn push_data(data: &[u8]) -> Vec<u8> {
    let len = data.len();
    let mut out = Vec::with_capacity(len + 5);
    if len <= MAX_DIRECT_PUSH {
        out.push(len as u8);
    } else if len <= 0xff {
        out.push(OP_PUSHDATA1);
        out.push(len as u8);
    } else if len <= 0xffff {
        out.push(OP_PUSHDATA2);
        out.extend_from_slice(&(len as u16).to_le_bytes());
    } else if let Ok(len) = u32::try_from(len) {
        out.push(OP_PUSHDATA4);
        out.extend_from_slice(&len.to_le_bytes());
    } else {
        // No push opcode covers more than 2^32 - 1 bytes.
        return data.to_vec();
    }
    out.extend_from_slice(data);
    out
}

/// `OP_DUP OP_HASH160 <20 bytes> OP_EQUALVERIFY OP_CHECKSIG`.
pub fn p2pkh_script(pubkey_hash: &[u8; 20]) -> Vec<u8> {
    let mut script = Vec::with_capacity(25);
    script.push(OP_DUP);
    script.push(OP_HASH160);
    script.extend_from_slice(&push_data(pubkey_hash));
    script.push(OP_EQUALVERIFY);
    script.push(OP_CHECKSIG);
    script
}

/// `OP_HASH160 <20 bytes> OP_EQUAL`.
pub fn p2sh_script(script_hash: &[u8; 20]) -> Vec<u8> {
    let mut script = Vec::with_capacity(23);
    script.push(OP_HASH160);
    script.extend_from_slice(&push_data(script_hash));
    script.push(OP_EQUAL);
    script
}

/// Version-0 witness program `OP_0 <20-byte pubkey hash>`, the redeem
/// script of a wrapped-segwit (P2SH-P2WPKH) output.
pub fn p2wpkh_redeem_script(pubkey_hash: &[u8; 20]) -> Vec<u8> {
    let mut script = push_int(0);
    script.extend_from_slice(&push_data(pubkey_hash));
    script
}

/// Extract the hash from a P2PKH locking script.
pub fn parse_p2pkh(script: &[u8]) -> Option<[u8; 20]> {
    match script {
        [OP_DUP, OP_HASH160, 0x14, hash @ .., OP_EQUALVERIFY, OP_CHECKSIG] if hash.len() == 20 => {
            hash.try_into().ok()
        }
        _ => None,
    }
}

/// Extract the hash from a P2SH locking script.
pub fn parse_p2sh(script: &[u8]) -> Option<[u8; 20]> {
    match script {
        [OP_HASH160, 0x14, hash @ .., OP_EQUAL] if hash.len() == 20 => hash.try_into().ok(),
        _ => None,
    }
}
