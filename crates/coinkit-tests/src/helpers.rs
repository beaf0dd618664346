//! Shared test helpers for integration tests.

use coinkit_core::address::Address;
use coinkit_core::coin::Coin;
use coinkit_core::crypto::PrivateKey;
use coinkit_core::script;
use coinkit_core::sighash::{legacy_sighash, segwit_sighash, sighash_type};
use coinkit_core::types::{Hash256, OutPoint, Transaction, TxOutput, UnspentOutput};

/// Deterministic private key from a seed byte.
pub fn key(seed: u8, coin: Coin) -> PrivateKey {
    let mut bytes = [0u8; 32];
    bytes[0] = 0x01;
    bytes[31] = seed;
    PrivateKey::from_bytes(bytes, coin).unwrap()
}

/// The address a key's outputs are locked to.
pub fn own_address(key: &PrivateKey, segwit: bool) -> Address {
    let pk = key.public_key();
    if segwit {
        pk.utxo_segwit_address().unwrap()
    } else {
        pk.utxo_address().unwrap()
    }
}

/// A legacy address owned by somebody else on `coin`.
pub fn foreign_address(coin: Coin) -> Address {
    own_address(&key(0xEE, coin), false)
}

/// Utxos with the given values, locked to `key`. Each has a distinct outpoint.
pub fn fund(key: &PrivateKey, values: &[u64], segwit: bool) -> Vec<UnspentOutput> {
    let lock = own_address(key, segwit).script_pubkey().unwrap();
    values
        .iter()
        .enumerate()
        .map(|(i, value)| UnspentOutput {
            outpoint: OutPoint {
                txid: Hash256([(i % 251) as u8 + 1; 32]),
                index: i as u32,
            },
            output: TxOutput {
                value: *value,
                script_pubkey: lock.clone(),
            },
        })
        .collect()
}

/// Look up the utxo each input of `tx` spends.
pub fn spent_utxos(tx: &Transaction, utxos: &[UnspentOutput]) -> Vec<UnspentOutput> {
    tx.inputs
        .iter()
        .map(|input| {
            utxos
                .iter()
                .find(|u| u.outpoint == input.previous_output)
                .cloned()
                .expect("input spends an offered utxo")
        })
        .collect()
}

/// Total value spent by `tx` out of `utxos`.
pub fn input_value(tx: &Transaction, utxos: &[UnspentOutput]) -> u64 {
    spent_utxos(tx, utxos).iter().map(|u| u.value()).sum()
}

/// Check every input's signature the way a node would for the two
/// single-key templates the standard signer produces.
pub fn verify_signatures(tx: &Transaction, utxos: &[UnspentOutput], key: &PrivateKey) {
    let pubkey = key.public_key();
    let pkh = pubkey.pubkey_hash();
    let hash_type = sighash_type(key.coin());

    // Sighashes commit to the unsigned form.
    let mut unsigned = tx.clone();
    for input in &mut unsigned.inputs {
        input.script_sig.clear();
        input.witness.clear();
    }

    for (i, (input, utxo)) in tx.inputs.iter().zip(spent_utxos(tx, utxos)).enumerate() {
        let lock = &utxo.output.script_pubkey;
        let (sig, digest) = if script::parse_p2pkh(lock).is_some() {
            let sig_len = input.script_sig[0] as usize;
            let sig = input.script_sig[1..1 + sig_len].to_vec();
            let digest = if key.coin().uses_fork_id() {
                segwit_sighash(&unsigned, i, lock, utxo.value(), hash_type).unwrap()
            } else {
                legacy_sighash(&unsigned, i, lock, hash_type).unwrap()
            };
            (sig, digest)
        } else {
            assert!(script::parse_p2sh(lock).is_some(), "input {i}: unexpected lock");
            assert_eq!(input.witness.len(), 2, "input {i}: witness items");
            let digest = segwit_sighash(
                &unsigned,
                i,
                &script::p2pkh_script(&pkh),
                utxo.value(),
                hash_type,
            )
            .unwrap();
            (input.witness[0].clone(), digest)
        };
        let (der, ty) = sig.split_at(sig.len() - 1);
        assert_eq!(ty[0] as u32, hash_type, "input {i}: hash type");
        pubkey
            .verify_digest(&digest, der)
            .unwrap_or_else(|e| panic!("input {i}: {e}"));
    }
}
