//! Wallet error types.

use coinkit_core::coin::Coin;
use coinkit_core::error::{AddressError, CodecError, CoinError, CryptoError};
use thiserror::Error;

/// Errors that can occur in wallet operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    /// The available outputs cannot cover the amount plus fee.
    #[error("insufficient funds: have {have}, need {need}")]
    InsufficientFunds {
        /// Total value of the offered utxos.
        have: u64,
        /// Smallest amount that would have satisfied the request.
        need: u64,
    },

    /// Invalid monetary amount.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// The builder could not assemble the transaction.
    #[error("build error: {0}")]
    BuildError(String),

    /// The signer could not authorize an input.
    #[error("sign error: {0}")]
    SignError(String),

    /// The wallet was asked to spend on a chain without UTXO parameters.
    #[error("{0} is not a UTXO chain")]
    UnsupportedCoin(Coin),

    /// Missing per-chain parameter from coinkit-core.
    #[error(transparent)]
    Coin(#[from] CoinError),

    /// Address derivation error from coinkit-core.
    #[error(transparent)]
    Address(#[from] AddressError),

    /// Cryptographic error from coinkit-core.
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// Wire-format error from coinkit-core.
    #[error(transparent)]
    Codec(#[from] CodecError),
}
