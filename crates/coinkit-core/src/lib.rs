//! # coinkit-core
//! Chain parameters, keys, addresses and the transaction wire format shared
//! by the Coinkit wallet.

pub mod address;
pub mod codec;
pub mod coin;
pub mod constants;
pub mod crypto;
pub mod error;
pub mod script;
pub mod sighash;
pub mod types;

pub use address::{Address, AddressKind};
pub use coin::Coin;
pub use crypto::{PrivateKey, PublicKey};
pub use types::{Hash256, OutPoint, Transaction, TxInput, TxOutput, UnspentOutput};
