//! Property tests over the full wallet pipeline.

use coinkit_core::coin::Coin;
use coinkit_core::types::Transaction;
use coinkit_tests::helpers::*;
use coinkit_wallet::{SelectorConfig, UtxoSelector, UtxoWallet, WalletConfig, WalletError};
use proptest::prelude::*;

fn utxo_coin() -> impl Strategy<Value = Coin> {
    prop::sample::select(vec![
        Coin::Bitcoin,
        Coin::Litecoin,
        Coin::LitecoinTestnet,
        Coin::BitcoinCash,
        Coin::Dash,
        Coin::Dogecoin,
    ])
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Inputs = outputs + fee, change is emitted exactly when it reaches
    /// the dust threshold, and the hex decodes back to the same transaction.
    #[test]
    fn created_transactions_are_consistent(
        coin in utxo_coin(),
        values in prop::collection::vec(1_000u64..5_000_000, 1..8),
        amount in 1_000u64..10_000_000,
        fee_rate in 1u64..5,
        segwit in any::<bool>(),
    ) {
        let segwit = segwit && !coin.uses_fork_id();
        let wallet = UtxoWallet::with_config(key(1, coin), WalletConfig::default()).unwrap();
        let utxos = fund(wallet.key(), &values, segwit);

        match wallet.create(&foreign_address(coin), amount, &utxos, fee_rate, segwit) {
            Ok(result) => {
                let tx = Transaction::from_hex(&result.hex).unwrap();
                prop_assert_eq!(&tx, &result.transaction);

                let spent = input_value(&tx, &utxos);
                prop_assert_eq!(spent, tx.total_output_value().unwrap() + result.fee);
                prop_assert_eq!(tx.outputs[0].value, amount);

                let selector = wallet.selector(fee_rate);
                let selection_fee = selector.estimate_fee(tx.inputs.len(), 2, segwit);
                let change = spent - amount - selection_fee;
                if change >= WalletConfig::default().selector.dust_threshold {
                    prop_assert_eq!(tx.outputs.len(), 2);
                    prop_assert_eq!(result.change, change);
                    prop_assert_eq!(result.fee, selection_fee);
                } else {
                    prop_assert_eq!(tx.outputs.len(), 1);
                    prop_assert_eq!(result.change, 0);
                    prop_assert_eq!(result.fee, selection_fee + change);
                }
            }
            Err(WalletError::InsufficientFunds { have, .. }) => {
                prop_assert_eq!(have, values.iter().sum::<u64>());
            }
            Err(e) => prop_assert!(false, "unexpected error: {e}"),
        }
    }

    /// Signatures produced by the wallet verify against the spent outputs.
    #[test]
    fn created_transactions_verify(
        values in prop::collection::vec(200_000u64..2_000_000, 1..5),
        seed in 1u8..=255,
        segwit in any::<bool>(),
    ) {
        let wallet = UtxoWallet::new(key(seed, Coin::Bitcoin)).unwrap();
        let utxos = fund(wallet.key(), &values, segwit);
        let result = wallet
            .create(&foreign_address(Coin::Bitcoin), 100_000, &utxos, 1, segwit)
            .unwrap();
        verify_signatures(&result.transaction, &utxos, wallet.key());
    }

    /// Fee estimates never decrease with more inputs and segwit is never dearer.
    #[test]
    fn fee_estimates_are_monotonic(k in 0usize..1_000, fee_per_byte in 0u64..1_000) {
        let selector = UtxoSelector::new(SelectorConfig { fee_per_byte, dust_threshold: 0 });
        for segwit in [false, true] {
            prop_assert!(selector.estimate_fee(k, 2, segwit) <= selector.estimate_fee(k + 1, 2, segwit));
        }
        prop_assert!(selector.estimate_fee(k, 2, true) <= selector.estimate_fee(k, 2, false));
    }

    /// Legacy addresses are a pure function of key and chain.
    #[test]
    fn addresses_are_deterministic(seed in 1u8..=255, coin in utxo_coin()) {
        let pk = key(seed, coin).public_key();
        prop_assert_eq!(pk.address(), key(seed, coin).public_key().address());
        let other = if coin == Coin::Bitcoin { Coin::Litecoin } else { Coin::Bitcoin };
        if coin.p2pkh_version() != other.p2pkh_version() {
            prop_assert_ne!(pk.address(), pk.with_coin(other).address());
        }
    }
}
