//! Windowed coin selection.
//!
//! UTXOs are sorted ascending by value and only contiguous runs ("windows")
//! of the sorted list are considered, smallest run length first. This is a
//! deterministic approximation, not an optimal subset search, and it is
//! `O(n²)` in the number of offered outputs.
//!
//! Two passes, first match wins:
//! 1. For each window size `k = 1..=n`, among windows whose sum covers
//!    `target + fee(k) + dust_threshold`, take the one whose sum is closest
//!    to `2 × target` (earliest window on ties).
//! 2. Otherwise, for each `k`, take the first window that covers
//!    `target + fee(k)`; its change may be dust.
//!
//! The fee always assumes [`DEFAULT_NUM_OUTPUTS`] outputs, even when the
//! change is later absorbed, so selection and build agree on the fee.

use coinkit_core::constants::{estimated_tx_size, DEFAULT_NUM_OUTPUTS};
use coinkit_core::types::{total_value, UnspentOutput};
use tracing::debug;

use crate::config::SelectorConfig;
use crate::error::WalletError;

/// Result of coin selection: which UTXOs to spend and the fee.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// Chosen outputs, in ascending value order.
    pub utxos: Vec<UnspentOutput>,
    /// Fee for spending `utxos` to two outputs, in base units.
    pub fee: u64,
}

impl Selection {
    fn empty() -> Self {
        Self {
            utxos: Vec::new(),
            fee: 0,
        }
    }

    /// Total value of the chosen outputs, `None` if it overflows `u64`.
    pub fn total(&self) -> Option<u64> {
        total_value(&self.utxos)
    }
}

/// Coin selector with a linear byte-size fee model.
#[derive(Debug, Clone, Copy, Default)]
pub struct UtxoSelector {
    config: SelectorConfig,
}

impl UtxoSelector {
    pub fn new(config: SelectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    /// `fee_per_byte × (input_size × num_inputs + 34 × num_outputs + 10)`,
    /// with an input size of 108 bytes for segwit and 148 otherwise.
    pub fn estimate_fee(&self, num_inputs: usize, num_outputs: usize, segwit: bool) -> u64 {
        let size = estimated_tx_size(num_inputs as u64, num_outputs as u64, segwit);
        self.config.fee_per_byte.saturating_mul(size)
    }

    /// Choose utxos paying `target` plus fee.
    ///
    /// A zero target selects nothing and costs nothing.
    ///
    /// # Errors
    /// [`WalletError::InsufficientFunds`] when `utxos` is empty, sums to less
    /// than `target`, or no window covers `target` plus its fee.
    pub fn select(
        &self,
        utxos: &[UnspentOutput],
        target: u64,
        segwit: bool,
    ) -> Result<Selection, WalletError> {
        if target == 0 {
            return Ok(Selection::empty());
        }

        let mut sorted: Vec<&UnspentOutput> = utxos.iter().collect();
        sorted.sort_by_key(|u| u.value());

        // prefix[i] = sum of the i smallest values
        let mut prefix = Vec::with_capacity(sorted.len() + 1);
        prefix.push(0u128);
        for u in &sorted {
            let last = prefix[prefix.len() - 1];
            prefix.push(last + u.value() as u128);
        }
        let total = prefix[sorted.len()];
        let have = u64::try_from(total).unwrap_or(u64::MAX);

        if sorted.is_empty() || total < target as u128 {
            debug!(have, target, utxos = sorted.len(), "not enough value offered");
            return Err(WalletError::InsufficientFunds { have, need: target });
        }

        let n = sorted.len();
        let window_sum = |start: usize, k: usize| prefix[start + k] - prefix[start];
        let double_target = 2 * target as u128;
        let dust = self.config.dust_threshold as u128;

        for k in 1..=n {
            let fee = self.estimate_fee(k, DEFAULT_NUM_OUTPUTS as usize, segwit);
            let needed = target as u128 + fee as u128 + dust;
            let best = (0..=n - k)
                .filter(|&start| window_sum(start, k) >= needed)
                .min_by_key(|&start| window_sum(start, k).abs_diff(double_target));
            if let Some(start) = best {
                debug!(pass = 1, inputs = k, sum = %window_sum(start, k), fee, "selected utxos");
                return Ok(Self::take(&sorted, start, k, fee));
            }
        }

        for k in 1..=n {
            let fee = self.estimate_fee(k, DEFAULT_NUM_OUTPUTS as usize, segwit);
            let needed = target as u128 + fee as u128;
            if let Some(start) = (0..=n - k).find(|&start| window_sum(start, k) >= needed) {
                debug!(pass = 2, inputs = k, sum = %window_sum(start, k), fee, "selected utxos, change may be dust");
                return Ok(Self::take(&sorted, start, k, fee));
            }
        }

        let need = target.saturating_add(self.estimate_fee(n, DEFAULT_NUM_OUTPUTS as usize, segwit));
        debug!(have, need, "no window covers target plus fee");
        Err(WalletError::InsufficientFunds { have, need })
    }

    fn take(sorted: &[&UnspentOutput], start: usize, k: usize, fee: u64) -> Selection {
        Selection {
            utxos: sorted[start..start + k].iter().map(|u| (*u).clone()).collect(),
            fee,
        }
    }
}
