//! Per-chain protocol constants.
//!
//! Every supported chain is a variant of [`Coin`]. UTXO-model chains carry a
//! full [`UtxoParams`] record; the account-model chain (Ethereum) carries
//! none, and asking it for a UTXO parameter is a programming error.
//!
//! Version bytes follow [SLIP-132] and each chain's chainparams.
//!
//! [SLIP-132]: https://github.com/satoshilabs/slips/blob/master/slip-0132.md

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoinError;

/// Version and prefix bytes that every UTXO-model chain must define.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UtxoParams {
    /// Extended private key version (`xprv`-style serialization).
    pub xprv_version: u32,
    /// P2PKH address version byte.
    pub p2pkh_version: u8,
    /// P2SH address version byte.
    pub p2sh_version: u8,
    /// Wallet Import Format prefix byte.
    pub wif_prefix: u8,
}

const BITCOIN: UtxoParams = UtxoParams {
    xprv_version: 0x0488_ADE4,
    p2pkh_version: 0x00,
    p2sh_version: 0x05,
    wif_prefix: 0x80,
};

const LITECOIN: UtxoParams = UtxoParams {
    xprv_version: 0x019D_9CFE,
    p2pkh_version: 0x30,
    p2sh_version: 0x32,
    wif_prefix: 0xB0,
};

const LITECOIN_TESTNET: UtxoParams = UtxoParams {
    xprv_version: 0x0435_8394,
    p2pkh_version: 0x6F,
    p2sh_version: 0x3A,
    wif_prefix: 0xEF,
};

// Legacy (non-CashAddr) Bitcoin Cash addresses share Bitcoin's bytes.
const BITCOIN_CASH: UtxoParams = BITCOIN;

const DASH: UtxoParams = UtxoParams {
    xprv_version: 0x02FE_52CC,
    p2pkh_version: 0x4C,
    p2sh_version: 0x10,
    wif_prefix: 0xCC,
};

const DOGECOIN: UtxoParams = UtxoParams {
    xprv_version: 0x0488_E1F4,
    p2pkh_version: 0x1E,
    p2sh_version: 0x16,
    wif_prefix: 0x9E,
};

/// A supported chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Coin {
    Bitcoin,
    Litecoin,
    LitecoinTestnet,
    BitcoinCash,
    Dash,
    Dogecoin,
    /// Account-model chain; only the checksummed hex address is defined.
    Ethereum,
}

impl Coin {
    /// All supported chains, in declaration order.
    pub const ALL: [Coin; 7] = [
        Coin::Bitcoin,
        Coin::Litecoin,
        Coin::LitecoinTestnet,
        Coin::BitcoinCash,
        Coin::Dash,
        Coin::Dogecoin,
        Coin::Ethereum,
    ];

    /// Stable lowercase name, used for display and errors.
    pub fn name(&self) -> &'static str {
        match self {
            Coin::Bitcoin => "bitcoin",
            Coin::Litecoin => "litecoin",
            Coin::LitecoinTestnet => "litecoin-testnet",
            Coin::BitcoinCash => "bitcoin-cash",
            Coin::Dash => "dash",
            Coin::Dogecoin => "dogecoin",
            Coin::Ethereum => "ethereum",
        }
    }

    /// Whether this chain uses the UTXO model.
    pub fn is_utxo(&self) -> bool {
        self.utxo_params().is_ok()
    }

    /// UTXO version/prefix bytes, or [`CoinError::Unsupported`] for the
    /// account-model chain.
    pub fn utxo_params(&self) -> Result<&'static UtxoParams, CoinError> {
        match self {
            Coin::Bitcoin => Ok(&BITCOIN),
            Coin::Litecoin => Ok(&LITECOIN),
            Coin::LitecoinTestnet => Ok(&LITECOIN_TESTNET),
            Coin::BitcoinCash => Ok(&BITCOIN_CASH),
            Coin::Dash => Ok(&DASH),
            Coin::Dogecoin => Ok(&DOGECOIN),
            Coin::Ethereum => Err(CoinError::Unsupported {
                coin: *self,
                parameter: "utxo parameters",
            }),
        }
    }

    fn expect_utxo(&self, parameter: &'static str) -> &'static UtxoParams {
        match self.utxo_params() {
            Ok(params) => params,
            Err(_) => panic!("{self} does not define {parameter}"),
        }
    }

    /// Extended private key version bytes.
    ///
    /// # Panics
    /// On the account-model chain.
    pub fn xprv_version(&self) -> u32 {
        self.expect_utxo("an extended key version").xprv_version
    }

    /// P2PKH address version byte.
    ///
    /// # Panics
    /// On the account-model chain.
    pub fn p2pkh_version(&self) -> u8 {
        self.expect_utxo("a p2pkh version").p2pkh_version
    }

    /// P2SH address version byte.
    ///
    /// # Panics
    /// On the account-model chain.
    pub fn p2sh_version(&self) -> u8 {
        self.expect_utxo("a p2sh version").p2sh_version
    }

    /// WIF prefix byte.
    ///
    /// # Panics
    /// On the account-model chain.
    pub fn wif_prefix(&self) -> u8 {
        self.expect_utxo("a wif prefix").wif_prefix
    }

    /// Address string prefix. Only the account-model chain has one.
    pub fn address_prefix(&self) -> &'static str {
        match self {
            Coin::Ethereum => "0x",
            _ => "",
        }
    }

    /// Suffix appended to a WIF payload to mark a compressed public key.
    pub fn compressed_key_suffix(&self) -> u8 {
        0x01
    }

    /// BIP-44 coin type.
    pub fn coin_type(&self) -> u32 {
        match self {
            Coin::Bitcoin => 0,
            Coin::LitecoinTestnet => 1,
            Coin::Litecoin => 2,
            Coin::Dogecoin => 3,
            Coin::Dash => 5,
            Coin::Ethereum => 60,
            Coin::BitcoinCash => 145,
        }
    }

    /// URI scheme; also the human-readable prefix for cash-style addresses.
    pub fn scheme(&self) -> &'static str {
        match self {
            Coin::Bitcoin => "bitcoin",
            Coin::Litecoin => "litecoin",
            Coin::LitecoinTestnet => "litecointest",
            Coin::BitcoinCash => "bitcoincash",
            Coin::Dogecoin => "dogecoin",
            Coin::Dash => "dash",
            Coin::Ethereum => "",
        }
    }

    /// Chain dust constant. Zero when the chain defines none.
    pub fn dust_threshold(&self) -> u64 {
        match self {
            Coin::Bitcoin => 564,
            Coin::Litecoin => 100_000,
            _ => 0,
        }
    }

    /// Whether signatures commit to the spent amount with `SIGHASH_FORKID`.
    pub fn uses_fork_id(&self) -> bool {
        matches!(self, Coin::BitcoinCash)
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
