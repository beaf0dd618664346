//! Error types for Coinkit.
use thiserror::Error;

use crate::address::AddressKind;
use crate::coin::Coin;

/// A parameter was requested from a chain that does not define it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoinError {
    #[error("{coin} does not define {parameter}")] Unsupported { coin: Coin, parameter: &'static str },
}

/// Malformed or truncated wire data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("unexpected end of data: needed {needed} bytes, {remaining} remaining")] UnexpectedEof { needed: usize, remaining: usize },
    #[error("invalid segwit flag: {0:#04x}")] InvalidSegwitFlag(u8),
    #[error("non-canonical varint")] NonCanonicalVarInt,
    #[error("count {count} exceeds remaining {remaining} bytes")] CountTooLarge { count: u64, remaining: usize },
    #[error("{0} trailing bytes after transaction")] TrailingBytes(usize),
    #[error("invalid hex: {0}")] InvalidHex(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("{kind:?} addresses are not supported on {coin}")] UnsupportedCoin { coin: Coin, kind: AddressKind },
    #[error("invalid base58: {0}")] InvalidBase58(String),
    #[error("invalid length: {0}")] InvalidLength(usize),
    #[error("unknown version byte: {0:#04x}")] UnknownVersion(u8),
    #[error("invalid checksum")] InvalidChecksum,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("invalid private key bytes")] InvalidPrivateKey,
    #[error("invalid public key bytes")] InvalidPublicKey,
    #[error("invalid signature bytes")] InvalidSignature,
    #[error("input index out of bounds: {index} >= {len}")] InputIndexOutOfBounds { index: usize, len: usize },
    #[error("signing failed: {0}")] SigningFailed(String),
}
