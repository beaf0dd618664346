//! Transaction signing.
//!
//! [`StandardSigner`] spends outputs locked to a single key:
//! - P2PKH: `script_sig = push(sig ‖ hash_type) push(pubkey)`
//! - P2SH-P2WPKH: `script_sig = push(redeem_script)`,
//!   `witness = [sig ‖ hash_type, pubkey]`
//!
//! Legacy inputs use the legacy digest, except on chains with a fork id,
//! which sign every input with the BIP-143 digest.

use coinkit_core::crypto::{hash160, PrivateKey};
use coinkit_core::script;
use coinkit_core::sighash::{legacy_sighash, segwit_sighash, sighash_type};
use coinkit_core::types::Transaction;
use tracing::trace;

use crate::builder::UnsignedTransaction;
use crate::error::WalletError;

/// Authorizes the inputs of an unsigned transaction.
pub trait TransactionSigner {
    /// Sign every input as a P2PKH spend.
    fn sign(&self, unsigned: &UnsignedTransaction, key: &PrivateKey)
        -> Result<Transaction, WalletError>;

    /// Sign every input as a P2SH-P2WPKH spend.
    fn sign_segwit(
        &self,
        unsigned: &UnsignedTransaction,
        key: &PrivateKey,
    ) -> Result<Transaction, WalletError>;
}

/// Single-key ECDSA signer.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardSigner;

fn check_shape(unsigned: &UnsignedTransaction, key: &PrivateKey) -> Result<(), WalletError> {
    if !key.coin().is_utxo() {
        return Err(WalletError::UnsupportedCoin(key.coin()));
    }
    if unsigned.utxos.len() != unsigned.tx.inputs.len() {
        return Err(WalletError::SignError(format!(
            "{} inputs but {} spent outputs",
            unsigned.tx.inputs.len(),
            unsigned.utxos.len()
        )));
    }
    Ok(())
}

fn not_ours(index: usize) -> WalletError {
    WalletError::SignError(format!("input {index} is not locked to the signing key"))
}

impl TransactionSigner for StandardSigner {
    fn sign(
        &self,
        unsigned: &UnsignedTransaction,
        key: &PrivateKey,
    ) -> Result<Transaction, WalletError> {
        check_shape(unsigned, key)?;
        let pubkey = key.public_key();
        let pkh = pubkey.pubkey_hash();
        let hash_type = sighash_type(key.coin());
        let fork_id = key.coin().uses_fork_id();

        let mut tx = unsigned.tx.clone();
        for (i, utxo) in unsigned.utxos.iter().enumerate() {
            let script_code = &utxo.output.script_pubkey;
            if script::parse_p2pkh(script_code) != Some(pkh) {
                return Err(not_ours(i));
            }
            let digest = if fork_id {
                segwit_sighash(&unsigned.tx, i, script_code, utxo.value(), hash_type)?
            } else {
                legacy_sighash(&unsigned.tx, i, script_code, hash_type)?
            };
            let mut sig = key.sign_digest(&digest)?;
            sig.push(hash_type as u8);

            let mut script_sig = script::push_data(&sig);
            script_sig.extend_from_slice(&script::push_data(pubkey.compressed()));
            trace!(input = i, len = script_sig.len(), "signed p2pkh input");
            tx.inputs[i].script_sig = script_sig;
        }
        Ok(tx)
    }

    fn sign_segwit(
        &self,
        unsigned: &UnsignedTransaction,
        key: &PrivateKey,
    ) -> Result<Transaction, WalletError> {
        check_shape(unsigned, key)?;
        if key.coin().uses_fork_id() {
            return Err(WalletError::SignError(format!(
                "{} has no segwit spends",
                key.coin()
            )));
        }
        let pubkey = key.public_key();
        let pkh = pubkey.pubkey_hash();
        let redeem_script = script::p2wpkh_redeem_script(&pkh);
        let script_hash = hash160(&redeem_script);
        let script_code = script::p2pkh_script(&pkh);
        let hash_type = sighash_type(key.coin());

        let mut tx = unsigned.tx.clone();
        tx.segwit = true;
        for (i, utxo) in unsigned.utxos.iter().enumerate() {
            if script::parse_p2sh(&utxo.output.script_pubkey) != Some(script_hash) {
                return Err(not_ours(i));
            }
            let digest = segwit_sighash(&unsigned.tx, i, &script_code, utxo.value(), hash_type)?;
            let mut sig = key.sign_digest(&digest)?;
            sig.push(hash_type as u8);

            trace!(input = i, "signed p2sh-p2wpkh input");
            tx.inputs[i].script_sig = script::push_data(&redeem_script);
            tx.inputs[i].witness = vec![sig, pubkey.compressed().to_vec()];
        }
        Ok(tx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coinkit_core::coin::Coin;
    use coinkit_core::crypto::PublicKey;
    use coinkit_core::sighash::{SIGHASH_ALL, SIGHASH_FORKID};
    use coinkit_core::types::{Hash256, OutPoint, TxOutput, UnspentOutput};

    use crate::builder::{Recipient, StandardBuilder, TransactionBuilder};

    fn key(coin: Coin) -> PrivateKey {
        PrivateKey::from_bytes([3u8; 32], coin).unwrap()
    }

    fn utxo_for(script_pubkey: Vec<u8>, index: u8, value: u64) -> UnspentOutput {
        UnspentOutput {
            outpoint: OutPoint {
                txid: Hash256([index; 32]),
                index: 1,
            },
            output: TxOutput {
                value,
                script_pubkey,
            },
        }
    }

    fn unsigned_legacy(key: &PrivateKey) -> UnsignedTransaction {
        let pk = key.public_key();
        let lock = pk.utxo_address().unwrap().script_pubkey().unwrap();
        let utxos = vec![utxo_for(lock.clone(), 1, 40_000), utxo_for(lock, 2, 70_000)];
        let to = Recipient::new(pk.utxo_address().unwrap(), 100_000);
        StandardBuilder::default().build(&[to], &utxos).unwrap()
    }

    fn unsigned_segwit(key: &PrivateKey) -> UnsignedTransaction {
        let pk = key.public_key();
        let lock = pk.utxo_segwit_address().unwrap().script_pubkey().unwrap();
        let utxos = vec![utxo_for(lock.clone(), 1, 40_000), utxo_for(lock, 2, 70_000)];
        let to = Recipient::new(pk.utxo_address().unwrap(), 100_000);
        StandardBuilder::default().build_segwit(&[to], &utxos).unwrap()
    }

    /// Split `push(sig) push(pubkey)` back into its two pushes.
    fn split_p2pkh_script_sig(script_sig: &[u8]) -> (Vec<u8>, Vec<u8>) {
        let sig_len = script_sig[0] as usize;
        let sig = script_sig[1..1 + sig_len].to_vec();
        let rest = &script_sig[1 + sig_len..];
        assert_eq!(rest[0] as usize, rest.len() - 1);
        (sig, rest[1..].to_vec())
    }

    fn verify(pubkey: &PublicKey, digest: &[u8; 32], sig_with_type: &[u8], hash_type: u32) {
        let (der, ty) = sig_with_type.split_at(sig_with_type.len() - 1);
        assert_eq!(ty[0] as u32, hash_type);
        pubkey.verify_digest(digest, der).unwrap();
    }

    // --- Legacy ---

    #[test]
    fn legacy_signatures_verify() {
        let key = key(Coin::Bitcoin);
        let unsigned = unsigned_legacy(&key);
        let signed = StandardSigner.sign(&unsigned, &key).unwrap();

        assert!(!signed.segwit);
        for (i, input) in signed.inputs.iter().enumerate() {
            assert!(input.witness.is_empty());
            let (sig, pubkey) = split_p2pkh_script_sig(&input.script_sig);
            assert_eq!(&pubkey[..], &key.public_key().compressed()[..]);
            let script_code = &unsigned.utxos[i].output.script_pubkey;
            let digest = legacy_sighash(&unsigned.tx, i, script_code, SIGHASH_ALL).unwrap();
            verify(&key.public_key(), &digest, &sig, SIGHASH_ALL);
        }
    }

    #[test]
    fn signing_preserves_layout() {
        let key = key(Coin::Litecoin);
        let unsigned = unsigned_legacy(&key);
        let signed = StandardSigner.sign(&unsigned, &key).unwrap();
        assert_eq!(signed.outputs, unsigned.tx.outputs);
        assert_eq!(signed.inputs.len(), unsigned.tx.inputs.len());
        for (s, u) in signed.inputs.iter().zip(&unsigned.tx.inputs) {
            assert_eq!(s.previous_output, u.previous_output);
            assert_eq!(s.sequence, u.sequence);
        }
    }

    #[test]
    fn bitcoin_cash_uses_fork_id_digest() {
        let key = key(Coin::BitcoinCash);
        let unsigned = unsigned_legacy(&key);
        let signed = StandardSigner.sign(&unsigned, &key).unwrap();
        let hash_type = SIGHASH_ALL | SIGHASH_FORKID;

        let (sig, _) = split_p2pkh_script_sig(&signed.inputs[0].script_sig);
        let script_code = &unsigned.utxos[0].output.script_pubkey;
        let digest =
            segwit_sighash(&unsigned.tx, 0, script_code, unsigned.utxos[0].value(), hash_type)
                .unwrap();
        verify(&key.public_key(), &digest, &sig, hash_type);
    }

    #[test]
    fn legacy_rejects_foreign_utxo() {
        let key = key(Coin::Bitcoin);
        let mut unsigned = unsigned_legacy(&key);
        unsigned.utxos[1].output.script_pubkey = script::p2pkh_script(&[0xEE; 20]);
        let err = StandardSigner.sign(&unsigned, &key).unwrap_err();
        assert_eq!(
            err,
            WalletError::SignError("input 1 is not locked to the signing key".into())
        );
    }

    #[test]
    fn legacy_rejects_segwit_utxo() {
        let key = key(Coin::Bitcoin);
        let unsigned = unsigned_segwit(&key);
        assert!(matches!(
            StandardSigner.sign(&unsigned, &key),
            Err(WalletError::SignError(_))
        ));
    }

    // --- Segwit ---

    #[test]
    fn segwit_signatures_verify() {
        let key = key(Coin::Bitcoin);
        let unsigned = unsigned_segwit(&key);
        let signed = StandardSigner.sign_segwit(&unsigned, &key).unwrap();
        let pkh = key.public_key().pubkey_hash();

        assert!(signed.segwit);
        for (i, input) in signed.inputs.iter().enumerate() {
            assert_eq!(input.script_sig, script::push_data(&script::p2wpkh_redeem_script(&pkh)));
            assert_eq!(input.witness.len(), 2);
            assert_eq!(&input.witness[1][..], &key.public_key().compressed()[..]);
            let digest = segwit_sighash(
                &unsigned.tx,
                i,
                &script::p2pkh_script(&pkh),
                unsigned.utxos[i].value(),
                SIGHASH_ALL,
            )
            .unwrap();
            verify(&key.public_key(), &digest, &input.witness[0], SIGHASH_ALL);
        }
    }

    #[test]
    fn segwit_rejects_legacy_utxo() {
        let key = key(Coin::Bitcoin);
        let unsigned = unsigned_legacy(&key);
        assert!(matches!(
            StandardSigner.sign_segwit(&unsigned, &key),
            Err(WalletError::SignError(_))
        ));
    }

    #[test]
    fn segwit_refused_on_fork_id_chain() {
        let key = key(Coin::BitcoinCash);
        let unsigned = unsigned_segwit(&key);
        assert!(matches!(
            StandardSigner.sign_segwit(&unsigned, &key),
            Err(WalletError::SignError(_))
        ));
    }

    // --- Shape ---

    #[test]
    fn account_chain_key_rejected() {
        let btc = key(Coin::Bitcoin);
        let unsigned = unsigned_legacy(&btc);
        let eth = btc.with_coin(Coin::Ethereum);
        assert_eq!(
            StandardSigner.sign(&unsigned, &eth).unwrap_err(),
            WalletError::UnsupportedCoin(Coin::Ethereum)
        );
    }

    #[test]
    fn mismatched_utxo_count_rejected() {
        let key = key(Coin::Bitcoin);
        let mut unsigned = unsigned_legacy(&key);
        unsigned.utxos.pop();
        assert!(matches!(
            StandardSigner.sign(&unsigned, &key),
            Err(WalletError::SignError(_))
        ));
    }

    #[test]
    fn signed_transaction_roundtrips() {
        let key = key(Coin::Bitcoin);
        let signed = StandardSigner.sign_segwit(&unsigned_segwit(&key), &key).unwrap();
        assert_eq!(Transaction::deserialize(&signed.serialize()).unwrap(), signed);
    }
}
