//! Cryptographic primitives.
//!
//! - [`hash`]: SHA-256 over bytes, text and compact JSON.
//! - [`cipher`]: scrypt key derivation and AES-256-GCM sealing of
//!   documents into [`EncryptedBlob`]s.
//!
//! Everything here is pure apart from drawing randomness, and may run on
//! any thread.

pub mod cipher;
pub mod hash;

use thiserror::Error;

pub use cipher::{Cipher, EncryptedBlob, KdfParams, Sealed, derive_key, random_hex};
pub use hash::{hash, hash_json, hash_str, serialize};

/// Errors raised by the crypto layer.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// Blob too short or not decodable; detected before decryption.
    #[error("malformed encrypted blob: {0}")]
    Malformed(String),
    /// Authentication failed; no plaintext is released.
    #[error("integrity check failed: {0}")]
    Integrity(String),
    /// Key derivation could not run with the configured parameters.
    #[error("key derivation error: {0}")]
    Kdf(String),
}

impl CryptoError {
    /// `true` for failures that mean "this blob cannot be trusted" rather
    /// than a local misconfiguration.
    pub fn is_integrity(&self) -> bool {
        matches!(self, CryptoError::Malformed(_) | CryptoError::Integrity(_))
    }
}
