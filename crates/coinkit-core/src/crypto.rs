//! secp256k1 keys and the hash primitives used by addresses and txids.
//!
//! Uses `k256` for the curve, `sha2`/`ripemd` for HASH160 and double
//! SHA-256, and `sha3` for Keccak-256.
//!
//! # Public keys
//!
//! A [`PublicKey`] keeps both SEC1 encodings of the point together with the
//! chain it belongs to. Addresses are not stored; they are derived on demand
//! in [`crate::address`].

use k256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};
use sha3::Keccak256;
use std::fmt;
use zeroize::Zeroize;

use crate::coin::Coin;
use crate::error::{CoinError, CryptoError};

/// SHA-256 of `data`.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// SHA-256 applied twice. Used for txids, sighashes and Base58Check checksums.
pub fn double_sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(Sha256::digest(data)).into()
}

/// `RIPEMD160(SHA256(data))`.
pub fn hash160(data: &[u8]) -> [u8; 20] {
    Ripemd160::digest(Sha256::digest(data)).into()
}

/// Keccak-256 (the pre-standard SHA-3 padding used by Ethereum).
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

/// A secp256k1 private key bound to a chain.
///
/// The scalar is zeroized on drop by the underlying `k256::SecretKey`.
#[derive(Clone)]
pub struct PrivateKey {
    secret: k256::SecretKey,
    coin: Coin,
}

impl PrivateKey {
    /// Generate a random key using the OS cryptographic RNG.
    pub fn generate(coin: Coin) -> Self {
        use rand::RngCore;
        loop {
            let mut bytes = [0u8; 32];
            rand::rngs::OsRng.fill_bytes(&mut bytes);
            if let Ok(key) = Self::from_bytes(bytes, coin) {
                return key;
            }
        }
    }

    /// Create a key from a 32-byte scalar. Rejects zero and values ≥ n.
    pub fn from_bytes(bytes: [u8; 32], coin: Coin) -> Result<Self, CryptoError> {
        let secret =
            k256::SecretKey::from_slice(&bytes).map_err(|_| CryptoError::InvalidPrivateKey)?;
        Ok(Self { secret, coin })
    }

    /// The chain this key belongs to.
    pub fn coin(&self) -> Coin {
        self.coin
    }

    /// The same scalar bound to another chain.
    pub fn with_coin(&self, coin: Coin) -> Self {
        Self {
            secret: self.secret.clone(),
            coin,
        }
    }

    /// Raw scalar bytes. Handle with care.
    pub fn secret_bytes(&self) -> [u8; 32] {
        self.secret.to_bytes().into()
    }

    /// Derive the public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey::from_k256(&self.secret.public_key(), self.coin)
    }

    /// Wallet Import Format for a compressed public key:
    /// `Base58Check(wif_prefix ‖ key ‖ 0x01)`.
    pub fn wif(&self) -> Result<String, CoinError> {
        let params = self.coin.utxo_params()?;
        let mut payload = Vec::with_capacity(34);
        payload.push(params.wif_prefix);
        payload.extend_from_slice(&self.secret.to_bytes());
        payload.push(self.coin.compressed_key_suffix());
        let encoded = bs58::encode(&payload).with_check().into_string();
        payload.zeroize();
        Ok(encoded)
    }

    /// Sign a 32-byte digest. Returns a low-S DER signature.
    pub fn sign_digest(&self, digest: &[u8; 32]) -> Result<Vec<u8>, CryptoError> {
        let signing_key = k256::ecdsa::SigningKey::from(&self.secret);
        let signature: k256::ecdsa::Signature = signing_key
            .sign_prehash(digest)
            .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;
        let signature = signature.normalize_s().unwrap_or(signature);
        Ok(signature.to_der().as_bytes().to_vec())
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("coin", &self.coin)
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// A secp256k1 public key in both SEC1 encodings, bound to a chain.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PublicKey {
    compressed: [u8; 33],
    uncompressed: [u8; 65],
    coin: Coin,
}

impl PublicKey {
    fn from_k256(key: &k256::PublicKey, coin: Coin) -> Self {
        let mut compressed = [0u8; 33];
        compressed.copy_from_slice(key.to_encoded_point(true).as_bytes());
        let mut uncompressed = [0u8; 65];
        uncompressed.copy_from_slice(key.to_encoded_point(false).as_bytes());
        Self {
            compressed,
            uncompressed,
            coin,
        }
    }

    /// Parse a SEC1 point (33-byte compressed or 65-byte uncompressed).
    pub fn from_sec1_bytes(bytes: &[u8], coin: Coin) -> Result<Self, CryptoError> {
        let key =
            k256::PublicKey::from_sec1_bytes(bytes).map_err(|_| CryptoError::InvalidPublicKey)?;
        Ok(Self::from_k256(&key, coin))
    }

    /// Parse a Base58-encoded SEC1 point.
    pub fn from_base58(encoded: &str, coin: Coin) -> Result<Self, CryptoError> {
        let bytes = bs58::decode(encoded)
            .into_vec()
            .map_err(|_| CryptoError::InvalidPublicKey)?;
        Self::from_sec1_bytes(&bytes, coin)
    }

    /// The 33-byte compressed encoding.
    pub fn compressed(&self) -> &[u8; 33] {
        &self.compressed
    }

    /// The 65-byte uncompressed encoding (leading `0x04`).
    pub fn uncompressed(&self) -> &[u8; 65] {
        &self.uncompressed
    }

    /// The chain this key belongs to.
    pub fn coin(&self) -> Coin {
        self.coin
    }

    /// The same point bound to another chain.
    pub fn with_coin(&self, coin: Coin) -> Self {
        Self { coin, ..self.clone() }
    }

    /// HASH160 of the compressed encoding.
    pub fn pubkey_hash(&self) -> [u8; 20] {
        hash160(&self.compressed)
    }

    /// Lowercase hex of the compressed encoding.
    pub fn hex(&self) -> String {
        hex::encode(self.compressed)
    }

    /// Verify a DER signature over a 32-byte digest.
    pub fn verify_digest(&self, digest: &[u8; 32], der: &[u8]) -> Result<(), CryptoError> {
        let verifying_key = k256::ecdsa::VerifyingKey::from_sec1_bytes(&self.compressed)
            .map_err(|_| CryptoError::InvalidPublicKey)?;
        let signature =
            k256::ecdsa::Signature::from_der(der).map_err(|_| CryptoError::InvalidSignature)?;
        verifying_key
            .verify_prehash(digest, &signature)
            .map_err(|_| CryptoError::InvalidSignature)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({}, {})", self.coin, self.hex())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hex())
    }
}
