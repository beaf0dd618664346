//! Transaction value types.
//!
//! All monetary values are integer base units (satoshi-equivalents) in u64.
//! Wire encoding lives in [`crate::codec`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CodecError;

/// A 32-byte hash value in internal (wire) byte order.
///
/// Block explorers display txids byte-reversed; use
/// [`Hash256::to_display_hex`] and [`Hash256::from_display_hex`] at that
/// boundary.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Hash256(pub [u8; 32]);

impl Hash256 {
    /// The zero hash. Used for coinbase previous outpoints.
    pub const ZERO: Self = Self([0u8; 32]);

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Hex in display order (byte-reversed).
    pub fn to_display_hex(&self) -> String {
        let mut reversed = self.0;
        reversed.reverse();
        hex::encode(reversed)
    }

    /// Parse display-order hex (as shown by explorers and RPC).
    pub fn from_display_hex(s: &str) -> Result<Self, CodecError> {
        let bytes = hex::decode(s).map_err(|e| CodecError::InvalidHex(e.to_string()))?;
        let mut out: [u8; 32] = bytes
            .try_into()
            .map_err(|b: Vec<u8>| CodecError::InvalidHex(format!("expected 32 bytes, got {}", b.len())))?;
        out.reverse();
        Ok(Self(out))
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display_hex())
    }
}

impl From<[u8; 32]> for Hash256 {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Hash256 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Reference to a specific output of a previous transaction.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OutPoint {
    /// Transaction ID containing the referenced output.
    pub txid: Hash256,
    /// Index of the output within the transaction.
    pub index: u32,
}

impl OutPoint {
    /// The null outpoint, used for coinbase transaction inputs.
    pub fn null() -> Self {
        Self {
            txid: Hash256::ZERO,
            index: u32::MAX,
        }
    }

    pub fn is_null(&self) -> bool {
        self.txid.is_zero() && self.index == u32::MAX
    }
}

impl fmt::Display for OutPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.txid, self.index)
    }
}

/// A transaction input, spending a previous output.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TxInput {
    /// The outpoint being spent. Null outpoint for coinbase.
    pub previous_output: OutPoint,
    /// Unlocking script. Empty until signed.
    pub script_sig: Vec<u8>,
    pub sequence: u32,
    /// Witness stack items, serialized only in segwit encoding.
    pub witness: Vec<Vec<u8>>,
}

impl TxInput {
    /// An unsigned input with an empty script and witness.
    pub fn unsigned(previous_output: OutPoint, sequence: u32) -> Self {
        Self {
            previous_output,
            script_sig: Vec::new(),
            sequence,
            witness: Vec::new(),
        }
    }

    pub fn is_coinbase(&self) -> bool {
        self.previous_output.is_null()
    }
}

/// A transaction output, creating a new UTXO.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TxOutput {
    pub value: u64,
    /// Locking script.
    pub script_pubkey: Vec<u8>,
}

/// A transaction transferring value between scripts.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub version: u32,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
    /// Block height or timestamp before which this tx is invalid.
    pub lock_time: u32,
    /// Serialize with the segwit marker, flag and witness section.
    pub segwit: bool,
}

impl Transaction {
    /// Check if this is a coinbase transaction (single input with null outpoint).
    pub fn is_coinbase(&self) -> bool {
        self.inputs.len() == 1 && self.inputs[0].is_coinbase()
    }

    /// Sum of all output values. Returns None on overflow.
    pub fn total_output_value(&self) -> Option<u64> {
        self.outputs
            .iter()
            .try_fold(0u64, |acc, out| acc.checked_add(out.value))
    }
}

/// A spendable output reported by the chain-query layer.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct UnspentOutput {
    pub outpoint: OutPoint,
    /// The output being spent: value and locking script.
    pub output: TxOutput,
}

impl UnspentOutput {
    pub fn value(&self) -> u64 {
        self.output.value
    }
}

/// Sum of utxo values. Returns None on overflow.
pub fn total_value<'a>(utxos: impl IntoIterator<Item = &'a UnspentOutput>) -> Option<u64> {
    utxos
        .into_iter()
        .try_fold(0u64, |acc, u| acc.checked_add(u.value()))
}
