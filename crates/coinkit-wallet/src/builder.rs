//! Unsigned transaction construction.
//!
//! A [`TransactionBuilder`] turns a recipient list and the utxos chosen by
//! coin selection into an [`UnsignedTransaction`]: inputs in utxo order with
//! empty scripts and witnesses, outputs in recipient order.

use coinkit_core::address::Address;
use coinkit_core::types::{total_value, Transaction, TxInput, TxOutput, UnspentOutput};

use crate::config::WalletConfig;
use crate::error::WalletError;

/// A transaction recipient: address and amount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    /// Destination address.
    pub address: Address,
    /// Amount in base units.
    pub amount: u64,
}

impl Recipient {
    pub fn new(address: Address, amount: u64) -> Self {
        Self { address, amount }
    }
}

/// An unsigned transaction ready for signing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedTransaction {
    /// The transaction with empty scripts and witnesses.
    pub tx: Transaction,
    /// The outputs spent by `tx.inputs`, index for index. Signers need
    /// their locking scripts and, for segwit, their amounts.
    pub utxos: Vec<UnspentOutput>,
}

impl UnsignedTransaction {
    /// Inputs minus outputs. None if outputs exceed inputs.
    pub fn fee(&self) -> Option<u64> {
        total_value(&self.utxos)?.checked_sub(self.tx.total_output_value()?)
    }
}

/// Assembles unsigned transactions.
pub trait TransactionBuilder {
    /// Build a legacy-encoded transaction.
    fn build(
        &self,
        recipients: &[Recipient],
        utxos: &[UnspentOutput],
    ) -> Result<UnsignedTransaction, WalletError>;

    /// Build a transaction that will carry witness data.
    fn build_segwit(
        &self,
        recipients: &[Recipient],
        utxos: &[UnspentOutput],
    ) -> Result<UnsignedTransaction, WalletError>;
}

/// Builder paying each recipient through its address's locking script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StandardBuilder {
    version: u32,
    lock_time: u32,
    sequence: u32,
}

impl StandardBuilder {
    pub fn new(config: &WalletConfig) -> Self {
        Self {
            version: config.tx_version,
            lock_time: config.lock_time,
            sequence: config.sequence,
        }
    }

    fn assemble(
        &self,
        recipients: &[Recipient],
        utxos: &[UnspentOutput],
        segwit: bool,
    ) -> Result<UnsignedTransaction, WalletError> {
        if utxos.is_empty() {
            return Err(WalletError::BuildError("no inputs".into()));
        }
        if recipients.is_empty() {
            return Err(WalletError::BuildError("no recipients".into()));
        }

        let mut outputs = Vec::with_capacity(recipients.len());
        for r in recipients {
            if r.amount == 0 {
                return Err(WalletError::InvalidAmount("recipient amount is zero".into()));
            }
            let script_pubkey = r.address.script_pubkey().ok_or_else(|| {
                WalletError::BuildError(format!("{} has no locking script", r.address))
            })?;
            outputs.push(TxOutput {
                value: r.amount,
                script_pubkey,
            });
        }

        let inputs = utxos
            .iter()
            .map(|u| TxInput::unsigned(u.outpoint, self.sequence))
            .collect();

        Ok(UnsignedTransaction {
            tx: Transaction {
                version: self.version,
                inputs,
                outputs,
                lock_time: self.lock_time,
                segwit,
            },
            utxos: utxos.to_vec(),
        })
    }
}

impl Default for StandardBuilder {
    fn default() -> Self {
        Self::new(&WalletConfig::default())
    }
}

impl TransactionBuilder for StandardBuilder {
    fn build(
        &self,
        recipients: &[Recipient],
        utxos: &[UnspentOutput],
    ) -> Result<UnsignedTransaction, WalletError> {
        self.assemble(recipients, utxos, false)
    }

    fn build_segwit(
        &self,
        recipients: &[Recipient],
        utxos: &[UnspentOutput],
    ) -> Result<UnsignedTransaction, WalletError> {
        self.assemble(recipients, utxos, true)
    }
}
