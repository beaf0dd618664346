//! Cross-crate test suite for Coinkit.
//!
//! Integration tests in `tests/` drive the full wallet pipeline (select,
//! build, sign, serialize) for every UTXO chain, check the wire format
//! against decoded output, and feed malformed data to the decoders.

pub mod helpers;
