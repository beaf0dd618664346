//! Signature hashes for SIGHASH_ALL.
//!
//! Two digest algorithms:
//! - legacy: the transaction with every script_sig blanked except the
//!   signed input's, which carries the script code;
//! - BIP-143: the segwit v0 preimage, which commits to the spent amount.
//!   Bitcoin Cash signs every input with it, flagged by `SIGHASH_FORKID`.

use crate::coin::Coin;
use crate::codec::VarInt;
use crate::crypto::double_sha256;
use crate::error::CryptoError;
use crate::types::Transaction;

pub const SIGHASH_ALL: u32 = 0x01;
pub const SIGHASH_FORKID: u32 = 0x40;

/// Sighash type a chain signs with. Bitcoin Cash uses fork id 0.
pub fn sighash_type(coin: Coin) -> u32 {
    if coin.uses_fork_id() {
        SIGHASH_ALL | SIGHASH_FORKID
    } else {
        SIGHASH_ALL
    }
}

fn check_index(tx: &Transaction, index: usize) -> Result<(), CryptoError> {
    if index >= tx.inputs.len() {
        return Err(CryptoError::InputIndexOutOfBounds {
            index,
            len: tx.inputs.len(),
        });
    }
    Ok(())
}

/// Pre-segwit digest for input `index`.
///
/// `script_code` is the locking script of the spent output.
pub fn legacy_sighash(
    tx: &Transaction,
    index: usize,
    script_code: &[u8],
    sighash_type: u32,
) -> Result<[u8; 32], CryptoError> {
    check_index(tx, index)?;
    let mut copy = tx.clone();
    for (i, input) in copy.inputs.iter_mut().enumerate() {
        input.script_sig = if i == index { script_code.to_vec() } else { Vec::new() };
        input.witness.clear();
    }
    let mut preimage = copy.serialize_without_witness();
    preimage.extend_from_slice(&sighash_type.to_le_bytes());
    Ok(double_sha256(&preimage))
}

/// BIP-143 digest for input `index` spending `amount`.
///
/// ```text
/// version || hashPrevouts || hashSequence || outpoint || scriptCode ||
/// amount || nSequence || hashOutputs || locktime || sighashType
/// ```
pub fn segwit_sighash(
    tx: &Transaction,
    index: usize,
    script_code: &[u8],
    amount: u64,
    sighash_type: u32,
) -> Result<[u8; 32], CryptoError> {
    check_index(tx, index)?;

    let mut prevouts = Vec::with_capacity(tx.inputs.len() * 36);
    let mut sequences = Vec::with_capacity(tx.inputs.len() * 4);
    for input in &tx.inputs {
        prevouts.extend_from_slice(input.previous_output.txid.as_bytes());
        prevouts.extend_from_slice(&input.previous_output.index.to_le_bytes());
        sequences.extend_from_slice(&input.sequence.to_le_bytes());
    }
    let mut outputs = Vec::new();
    for output in &tx.outputs {
        output.encode_to(&mut outputs);
    }

    let input = &tx.inputs[index];
    let mut preimage = Vec::with_capacity(156 + script_code.len());
    preimage.extend_from_slice(&tx.version.to_le_bytes());
    preimage.extend_from_slice(&double_sha256(&prevouts));
    preimage.extend_from_slice(&double_sha256(&sequences));
    preimage.extend_from_slice(input.previous_output.txid.as_bytes());
    preimage.extend_from_slice(&input.previous_output.index.to_le_bytes());
    VarInt::from(script_code.len()).encode_to(&mut preimage);
    preimage.extend_from_slice(script_code);
    preimage.extend_from_slice(&amount.to_le_bytes());
    preimage.extend_from_slice(&input.sequence.to_le_bytes());
    preimage.extend_from_slice(&double_sha256(&outputs));
    preimage.extend_from_slice(&tx.lock_time.to_le_bytes());
    preimage.extend_from_slice(&sighash_type.to_le_bytes());
    Ok(double_sha256(&preimage))
}
