//! Wallet and coin-selection configuration.
//!
//! Plain serde structs with defaults; a missing field in a config file
//! takes its default value.

use coinkit_core::coin::Coin;
use coinkit_core::constants::{
    DEFAULT_DUST_THRESHOLD, DEFAULT_FEE_PER_BYTE, DEFAULT_LOCK_TIME, DEFAULT_TX_VERSION,
    SEQUENCE_FINAL,
};
use serde::{Deserialize, Serialize};

/// Fee model and dust policy for [`crate::coin_selection::UtxoSelector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Fee charged per estimated byte, in base units.
    pub fee_per_byte: u64,
    /// Change below this value is absorbed into the fee. Selection also
    /// prefers inputs that leave at least this much above target plus fee.
    pub dust_threshold: u64,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            fee_per_byte: DEFAULT_FEE_PER_BYTE,
            dust_threshold: DEFAULT_DUST_THRESHOLD,
        }
    }
}

impl SelectorConfig {
    /// Defaults, with the chain's own dust threshold when it defines one.
    pub fn for_coin(coin: Coin) -> Self {
        let dust = coin.dust_threshold();
        Self {
            dust_threshold: if dust > 0 { dust } else { DEFAULT_DUST_THRESHOLD },
            ..Self::default()
        }
    }

    /// The same policy with `fee_per_byte` multiplied by `fee_rate`.
    pub fn with_fee_rate(&self, fee_rate: u64) -> Self {
        Self {
            fee_per_byte: self.fee_per_byte.saturating_mul(fee_rate),
            ..*self
        }
    }
}

/// Settings for a [`crate::wallet::UtxoWallet`] and the standard builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletConfig {
    pub selector: SelectorConfig,
    /// Version field of built transactions.
    pub tx_version: u32,
    pub lock_time: u32,
    /// Sequence number given to every input.
    pub sequence: u32,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            selector: SelectorConfig::default(),
            tx_version: DEFAULT_TX_VERSION,
            lock_time: DEFAULT_LOCK_TIME,
            sequence: SEQUENCE_FINAL,
        }
    }
}

impl WalletConfig {
    /// Defaults tuned for `coin`.
    pub fn for_coin(coin: Coin) -> Self {
        Self {
            selector: SelectorConfig::for_coin(coin),
            ..Self::default()
        }
    }
}
