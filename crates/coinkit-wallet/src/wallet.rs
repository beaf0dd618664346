//! Single-key UTXO wallet: select, build, sign, serialize.
//!
//! [`UtxoWallet::create`] runs the whole pipeline and returns a
//! [`TransactionResult`]. The wallet keeps no per-call state, so one
//! instance may serve concurrent callers.

use coinkit_core::address::Address;
use coinkit_core::crypto::PrivateKey;
use coinkit_core::types::{Hash256, Transaction, UnspentOutput};
use tracing::{debug, info};

use crate::builder::{Recipient, StandardBuilder, TransactionBuilder};
use crate::coin_selection::UtxoSelector;
use crate::config::WalletConfig;
use crate::error::WalletError;
use crate::signer::{StandardSigner, TransactionSigner};

/// Outcome of a successful [`UtxoWallet::create`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionResult {
    /// Lowercase hex of the serialized signed transaction.
    pub hex: String,
    /// Witness-independent transaction id.
    pub txid: Hash256,
    /// Fee actually paid: inputs minus outputs, including absorbed dust.
    pub fee: u64,
    /// Value of the change output, or 0 when no change output was emitted.
    pub change: u64,
    /// The signed transaction.
    pub transaction: Transaction,
}

/// Wallet spending outputs locked to one private key.
///
/// The builder and signer are pluggable; [`UtxoWallet::new`] uses the
/// standard ones.
pub struct UtxoWallet<B = StandardBuilder, S = StandardSigner> {
    key: PrivateKey,
    config: WalletConfig,
    builder: B,
    signer: S,
}

impl UtxoWallet {
    /// Wallet with the standard builder and signer and defaults tuned for
    /// the key's chain.
    pub fn new(key: PrivateKey) -> Result<Self, WalletError> {
        let config = WalletConfig::for_coin(key.coin());
        Self::with_config(key, config)
    }

    /// Wallet with the standard builder and signer and an explicit config.
    pub fn with_config(key: PrivateKey, config: WalletConfig) -> Result<Self, WalletError> {
        let builder = StandardBuilder::new(&config);
        Self::with_components(key, config, builder, StandardSigner)
    }
}

impl<B: TransactionBuilder, S: TransactionSigner> UtxoWallet<B, S> {
    /// Wallet with a custom builder and signer.
    ///
    /// # Errors
    /// [`WalletError::UnsupportedCoin`] if the key belongs to an
    /// account-model chain.
    pub fn with_components(
        key: PrivateKey,
        config: WalletConfig,
        builder: B,
        signer: S,
    ) -> Result<Self, WalletError> {
        if !key.coin().is_utxo() {
            return Err(WalletError::UnsupportedCoin(key.coin()));
        }
        Ok(Self {
            key,
            config,
            builder,
            signer,
        })
    }

    pub fn key(&self) -> &PrivateKey {
        &self.key
    }

    pub fn config(&self) -> &WalletConfig {
        &self.config
    }

    /// Selector at the configured fee per byte, scaled by `fee_rate`.
    pub fn selector(&self, fee_rate: u64) -> UtxoSelector {
        UtxoSelector::new(self.config.selector.with_fee_rate(fee_rate))
    }

    /// Legacy P2PKH spend. See [`UtxoWallet::create`].
    pub fn create_transaction(
        &self,
        destination: &Address,
        amount: u64,
        utxos: &[UnspentOutput],
        fee_rate: u64,
    ) -> Result<TransactionResult, WalletError> {
        self.create(destination, amount, utxos, fee_rate, false)
    }

    /// Wrapped-segwit spend. See [`UtxoWallet::create`].
    pub fn create_segwit_transaction(
        &self,
        destination: &Address,
        amount: u64,
        utxos: &[UnspentOutput],
        fee_rate: u64,
    ) -> Result<TransactionResult, WalletError> {
        self.create(destination, amount, utxos, fee_rate, true)
    }

    /// Pay `amount` to `destination` from `utxos`.
    ///
    /// Non-zero change of at least the dust threshold goes back to the
    /// wallet's own address (wrapped segwit when `segwit` is set, legacy
    /// otherwise); smaller change is left to the miner.
    ///
    /// # Errors
    /// - [`WalletError::InvalidAmount`] for a zero amount or fee rate, or
    ///   when the selected inputs sum past `u64::MAX`
    /// - [`WalletError::BuildError`] for a destination on another chain
    /// - selection, builder and signer errors, unchanged
    pub fn create(
        &self,
        destination: &Address,
        amount: u64,
        utxos: &[UnspentOutput],
        fee_rate: u64,
        segwit: bool,
    ) -> Result<TransactionResult, WalletError> {
        if amount == 0 {
            return Err(WalletError::InvalidAmount("amount must be non-zero".into()));
        }
        if fee_rate == 0 {
            return Err(WalletError::InvalidAmount("fee rate must be non-zero".into()));
        }
        if destination.coin() != self.key.coin() {
            return Err(WalletError::BuildError(format!(
                "destination is a {} address, wallet is {}",
                destination.coin(),
                self.key.coin()
            )));
        }

        let selector = self.selector(fee_rate);
        let selection = selector.select(utxos, amount, segwit)?;
        let total = selection.total().ok_or_else(|| {
            WalletError::InvalidAmount("selected inputs overflow the value range".into())
        })?;
        let change = total
            .checked_sub(amount)
            .and_then(|v| v.checked_sub(selection.fee))
            .ok_or(WalletError::InsufficientFunds {
                have: total,
                need: amount.saturating_add(selection.fee),
            })?;
        debug!(
            inputs = selection.utxos.len(),
            total,
            fee = selection.fee,
            change,
            "coins selected"
        );

        let mut recipients = vec![Recipient::new(destination.clone(), amount)];
        let dust = selector.config().dust_threshold;
        // Zero change never becomes an output, even with a zero threshold.
        let change_out = if change > 0 && change >= dust {
            let pubkey = self.key.public_key();
            let change_address = if segwit {
                pubkey.utxo_segwit_address()?
            } else {
                pubkey.utxo_address()?
            };
            recipients.push(Recipient::new(change_address, change));
            change
        } else {
            debug!(change, dust, "change below dust threshold, absorbed into fee");
            0
        };

        let transaction = if segwit {
            let unsigned = self.builder.build_segwit(&recipients, &selection.utxos)?;
            self.signer.sign_segwit(&unsigned, &self.key)?
        } else {
            let unsigned = self.builder.build(&recipients, &selection.utxos)?;
            self.signer.sign(&unsigned, &self.key)?
        };

        let outputs = transaction.total_output_value().ok_or_else(|| {
            WalletError::BuildError("output values overflow".into())
        })?;
        let fee = total.checked_sub(outputs).ok_or_else(|| {
            WalletError::BuildError(format!("outputs {outputs} exceed inputs {total}"))
        })?;

        let txid = transaction.txid();
        info!(%txid, coin = %self.key.coin(), fee, change = change_out, segwit, "transaction created");

        Ok(TransactionResult {
            hex: transaction.to_hex(),
            txid,
            fee,
            change: change_out,
            transaction,
        })
    }
}
