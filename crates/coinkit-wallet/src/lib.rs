//! # coinkit-wallet: UTXO transaction construction.
//!
//! Picks inputs with a windowed coin selector, builds and signs the
//! transaction through pluggable builder/signer traits, and returns the
//! serialized result with its txid and the fee paid.
//!
//! # Modules
//!
//! - [`error`]: `WalletError` enum
//! - [`config`]: selector and wallet settings
//! - [`coin_selection`]: windowed UTXO selection and fee estimation
//! - [`builder`]: `TransactionBuilder` trait and the standard builder
//! - [`signer`]: `TransactionSigner` trait and the standard ECDSA signer
//! - [`wallet`]: `UtxoWallet` orchestration

pub mod builder;
pub mod coin_selection;
pub mod config;
pub mod error;
pub mod signer;
pub mod wallet;

// Re-exports for convenient access
pub use builder::{Recipient, StandardBuilder, TransactionBuilder, UnsignedTransaction};
pub use coin_selection::{Selection, UtxoSelector};
pub use config::{SelectorConfig, WalletConfig};
pub use error::WalletError;
pub use signer::{StandardSigner, TransactionSigner};
pub use wallet::{TransactionResult, UtxoWallet};
