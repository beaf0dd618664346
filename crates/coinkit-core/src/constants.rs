//! Fee model and transaction defaults. All monetary values are in base
//! units (1 coin = 10^8 units on every supported UTXO chain).

/// Estimated size of a signed P2PKH input, in bytes.
pub const INPUT_SIZE: u64 = 148;

/// Estimated size contribution of a signed P2SH-P2WPKH input, in bytes.
pub const SEGWIT_INPUT_SIZE: u64 = 108;

/// Estimated size of a P2PKH output, in bytes.
pub const OUTPUT_SIZE: u64 = 34;

/// Version, counts and lock time.
pub const TX_OVERHEAD_SIZE: u64 = 10;

/// Outputs assumed by fee estimation: destination plus change.
pub const DEFAULT_NUM_OUTPUTS: u64 = 2;

pub const DEFAULT_FEE_PER_BYTE: u64 = 2;

/// Minimum change worth keeping, and the margin coin selection tries to
/// leave above target plus fee.
///
/// Chain-specific thresholds from [`crate::coin::Coin::dust_threshold`]
/// take precedence when non-zero.
pub const DEFAULT_DUST_THRESHOLD: u64 = 100_000;

pub const DEFAULT_TX_VERSION: u32 = 1;
pub const DEFAULT_LOCK_TIME: u32 = 0;

/// Final sequence number: lock time and replacement disabled.
pub const SEQUENCE_FINAL: u32 = 0xffff_ffff;

/// Estimated serialized size of a transaction.
///
/// # Examples
///
/// ```
/// use coinkit_core::constants::estimated_tx_size;
/// assert_eq!(estimated_tx_size(1, 2, false), 148 + 68 + 10);
/// assert_eq!(estimated_tx_size(3, 2, true), 3 * 108 + 68 + 10);
/// ```
pub const fn estimated_tx_size(num_inputs: u64, num_outputs: u64, segwit: bool) -> u64 {
    let input_size = if segwit { SEGWIT_INPUT_SIZE } else { INPUT_SIZE };
    input_size * num_inputs + OUTPUT_SIZE * num_outputs + TX_OVERHEAD_SIZE
}
