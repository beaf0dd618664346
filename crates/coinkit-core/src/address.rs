//! Address derivation for every supported chain.
//!
//! Four encodings are supported, selected by [`AddressKind`]:
//! - `Legacy`: `Base58Check(p2pkh_version ‖ HASH160(compressed_key))`
//! - `WrappedSegwit`: `Base58Check(p2sh_version ‖ HASH160(OP_0 ‖ push(HASH160(key))))`
//!   ([BIP-49])
//! - `Cash`: `prefix:` + base32 of `p2pkh_version ‖ HASH160(key)` with a
//!   40-bit BCH checksum, the prefix being the chain's URI scheme
//! - `Account`: `0x` + [EIP-55] mixed-case hex of the last 20 bytes of
//!   `Keccak256(uncompressed_key[1..])`
//!
//! The first three exist only on UTXO chains and the last only on the
//! account-model chain. Asking for the wrong combination returns
//! [`AddressError::UnsupportedCoin`].
//!
//! [BIP-49]: https://github.com/bitcoin/bips/blob/master/bip-0049.mediawiki
//! [EIP-55]: https://eips.ethereum.org/EIPS/eip-55

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::coin::Coin;
use crate::crypto::{double_sha256, hash160, keccak256, PublicKey};
use crate::error::AddressError;
use crate::script;

/// Base32 character set shared by Bech32 and the cash-style encoding.
const CHARSET: &[u8; 32] = b"qpzry9x8gf2tvdw0s3jn54khce6mua7l";

/// Number of 5-bit checksum groups in a cash-style address.
const CASH_CHECKSUM_LEN: usize = 8;

/// Separator between prefix and payload in a cash-style address.
const CASH_SEPARATOR: char = ':';

/// Which address encoding to derive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddressKind {
    /// Pay-to-pubkey-hash, Base58Check.
    Legacy,
    /// P2SH-wrapped P2WPKH, Base58Check.
    WrappedSegwit,
    /// Prefixed base32 with a BCH-code checksum.
    Cash,
    /// Checksummed hex for the account-model chain.
    Account,
}

impl AddressKind {
    fn supported_on(&self, coin: Coin) -> bool {
        match self {
            AddressKind::Account => !coin.is_utxo(),
            _ => coin.is_utxo(),
        }
    }
}

/// The hash an address commits to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Payload {
    /// HASH160 of a compressed public key.
    PubkeyHash([u8; 20]),
    /// HASH160 of a redeem script.
    ScriptHash([u8; 20]),
    /// Trailing 20 bytes of the Keccak-256 of an uncompressed key.
    AccountHash([u8; 20]),
}

/// A decoded address: chain, encoding and the committed hash.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Address {
    coin: Coin,
    kind: AddressKind,
    /// Leading version byte; unused for account addresses.
    version: u8,
    payload: Payload,
}

impl Address {
    /// Derive the address of `kind` for a public key on its own chain.
    pub fn from_public_key(key: &PublicKey, kind: AddressKind) -> Result<Self, AddressError> {
        let coin = key.coin();
        if !kind.supported_on(coin) {
            return Err(AddressError::UnsupportedCoin { coin, kind });
        }
        let unsupported = |_| AddressError::UnsupportedCoin { coin, kind };
        let (version, payload) = match kind {
            AddressKind::Legacy | AddressKind::Cash => {
                let params = coin.utxo_params().map_err(unsupported)?;
                (params.p2pkh_version, Payload::PubkeyHash(key.pubkey_hash()))
            }
            AddressKind::WrappedSegwit => {
                let params = coin.utxo_params().map_err(unsupported)?;
                let redeem = script::p2wpkh_redeem_script(&key.pubkey_hash());
                (params.p2sh_version, Payload::ScriptHash(hash160(&redeem)))
            }
            AddressKind::Account => (0, Payload::AccountHash(account_hash(key))),
        };
        Ok(Self {
            coin,
            kind,
            version,
            payload,
        })
    }

    /// Parse a Base58Check address (legacy or wrapped segwit) for `coin`.
    pub fn from_legacy_str(s: &str, coin: Coin) -> Result<Self, AddressError> {
        let params = coin.utxo_params().map_err(|_| AddressError::UnsupportedCoin {
            coin,
            kind: AddressKind::Legacy,
        })?;
        let decoded = bs58::decode(s)
            .with_check(None)
            .into_vec()
            .map_err(|e| match e {
                bs58::decode::Error::InvalidChecksum { .. } => AddressError::InvalidChecksum,
                other => AddressError::InvalidBase58(other.to_string()),
            })?;
        if decoded.len() != 21 {
            return Err(AddressError::InvalidLength(decoded.len()));
        }
        let mut hash = [0u8; 20];
        hash.copy_from_slice(&decoded[1..]);
        let version = decoded[0];
        let (kind, payload) = if version == params.p2pkh_version {
            (AddressKind::Legacy, Payload::PubkeyHash(hash))
        } else if version == params.p2sh_version {
            (AddressKind::WrappedSegwit, Payload::ScriptHash(hash))
        } else {
            return Err(AddressError::UnknownVersion(version));
        };
        Ok(Self {
            coin,
            kind,
            version,
            payload,
        })
    }

    pub fn coin(&self) -> Coin {
        self.coin
    }

    pub fn kind(&self) -> AddressKind {
        self.kind
    }

    pub fn payload(&self) -> Payload {
        self.payload
    }

    /// Locking script paying to this address. `None` for account addresses.
    pub fn script_pubkey(&self) -> Option<Vec<u8>> {
        match self.payload {
            Payload::PubkeyHash(hash) => Some(script::p2pkh_script(&hash)),
            Payload::ScriptHash(hash) => Some(script::p2sh_script(&hash)),
            Payload::AccountHash(_) => None,
        }
    }

    /// Render the address string.
    pub fn encode(&self) -> String {
        match self.payload {
            Payload::AccountHash(hash) => {
                format!("{}{}", self.coin.address_prefix(), eip55_checksum(&hash))
            }
            Payload::PubkeyHash(hash) if self.kind == AddressKind::Cash => {
                cash_encode(self.version, &hash, self.coin.scheme())
            }
            Payload::PubkeyHash(hash) | Payload::ScriptHash(hash) => {
                base58check(self.version, &hash)
            }
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl PublicKey {
    /// Default address for this key's chain: legacy for UTXO chains,
    /// checksummed hex for the account-model chain.
    pub fn address(&self) -> String {
        let coin = self.coin();
        let address = match coin.utxo_params() {
            Ok(params) => Address {
                coin,
                kind: AddressKind::Legacy,
                version: params.p2pkh_version,
                payload: Payload::PubkeyHash(self.pubkey_hash()),
            },
            Err(_) => Address {
                coin,
                kind: AddressKind::Account,
                version: 0,
                payload: Payload::AccountHash(account_hash(self)),
            },
        };
        address.encode()
    }

    /// Address of a specific kind.
    pub fn address_of(&self, kind: AddressKind) -> Result<Address, AddressError> {
        Address::from_public_key(self, kind)
    }

    /// Legacy P2PKH address, the wallet's change destination.
    pub fn utxo_address(&self) -> Result<Address, AddressError> {
        self.address_of(AddressKind::Legacy)
    }

    /// Wrapped-segwit address, the segwit wallet's change destination.
    pub fn utxo_segwit_address(&self) -> Result<Address, AddressError> {
        self.address_of(AddressKind::WrappedSegwit)
    }
}

/// Trailing 20 bytes of `Keccak256(uncompressed_key[1..])`.
fn account_hash(key: &PublicKey) -> [u8; 20] {
    let digest = keccak256(&key.uncompressed()[1..]);
    let mut hash = [0u8; 20];
    hash.copy_from_slice(&digest[12..]);
    hash
}

// --- Base58Check ---

/// `Base58(version ‖ payload ‖ first4(double_sha256(version ‖ payload)))`.
fn base58check(version: u8, payload: &[u8]) -> String {
    let mut data = Vec::with_capacity(1 + payload.len() + 4);
    data.push(version);
    data.extend_from_slice(payload);
    let checksum = double_sha256(&data);
    data.extend_from_slice(&checksum[..4]);
    bs58::encode(data).into_string()
}

// --- EIP-55 ---

/// Mixed-case hex: a letter is uppercased when the matching nibble of
/// `Keccak256(lowercase_hex)` is 8 or more.
fn eip55_checksum(hash: &[u8; 20]) -> String {
    let lower = hex::encode(hash);
    let digest = keccak256(lower.as_bytes());
    lower
        .chars()
        .enumerate()
        .map(|(i, c)| {
            let nibble = (digest[i / 2] >> (if i % 2 == 0 { 4 } else { 0 })) & 0x0f;
            if c.is_ascii_alphabetic() && nibble >= 8 {
                c.to_ascii_uppercase()
            } else {
                c
            }
        })
        .collect()
}

// --- Cash-style base32 ---

fn cash_encode(version: u8, hash: &[u8; 20], prefix: &str) -> String {
    let mut raw = Vec::with_capacity(21);
    raw.push(version);
    raw.extend_from_slice(hash);
    let payload = convert_bits(&raw, 8, 5, true).unwrap_or_default();
    let checksum = cash_create_checksum(prefix, &payload);

    let mut result = String::with_capacity(prefix.len() + 1 + payload.len() + CASH_CHECKSUM_LEN);
    result.push_str(prefix);
    result.push(CASH_SEPARATOR);
    for &d in payload.iter().chain(checksum.iter()) {
        result.push(CHARSET[d as usize] as char);
    }
    result
}

/// 40-bit BCH checksum over 5-bit groups.
fn cash_polymod(values: &[u8]) -> u64 {
    const GEN: [u64; 5] = [
        0x98_f2bc_8e61,
        0x79_b76d_99e2,
        0xf3_3e5f_b3c4,
        0xae_2eab_e2a8,
        0x1e_4f43_e470,
    ];
    let mut chk: u64 = 1;
    for &v in values {
        let b = chk >> 35;
        chk = ((chk & 0x07_ffff_ffff) << 5) ^ (v as u64);
        for (i, &g) in GEN.iter().enumerate() {
            if (b >> i) & 1 != 0 {
                chk ^= g;
            }
        }
    }
    chk ^ 1
}

/// Prefix expansion: low 5 bits of each character, then a zero separator.
fn cash_prefix_expand(prefix: &str) -> Vec<u8> {
    let mut ret: Vec<u8> = prefix.bytes().map(|c| c & 0x1f).collect();
    ret.push(0);
    ret
}

fn cash_create_checksum(prefix: &str, payload: &[u8]) -> Vec<u8> {
    let mut values = cash_prefix_expand(prefix);
    values.extend_from_slice(payload);
    values.extend_from_slice(&[0; CASH_CHECKSUM_LEN]);
    let polymod = cash_polymod(&values);
    (0..CASH_CHECKSUM_LEN)
        .map(|i| ((polymod >> (5 * (7 - i))) & 0x1f) as u8)
        .collect()
}

/// Convert between bit widths (e.g. 8-bit bytes to 5-bit base32 groups).
fn convert_bits(data: &[u8], from_bits: u32, to_bits: u32, pad: bool) -> Option<Vec<u8>> {
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;
    let mut ret = Vec::new();
    let maxv = (1u32 << to_bits) - 1;
    for &value in data {
        let v = value as u32;
        if v >> from_bits != 0 {
            return None;
        }
        acc = (acc << from_bits) | v;
        bits += from_bits;
        while bits >= to_bits {
            bits -= to_bits;
            ret.push(((acc >> bits) & maxv) as u8);
        }
    }
    if pad {
        if bits > 0 {
            ret.push(((acc << (to_bits - bits)) & maxv) as u8);
        }
    } else if bits >= from_bits || ((acc << (to_bits - bits)) & maxv) != 0 {
        return None;
    }
    Some(ret)
}
