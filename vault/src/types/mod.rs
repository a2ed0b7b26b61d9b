//! Core domain types shared across the vault.
//!
//! This module defines the strongly-typed digests and timestamps used by
//! the crypto, storage, proof and registry layers. The goal is to avoid
//! "naked" strings and byte buffers in public APIs and instead use
//! domain-specific newtypes.

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Types related to registered patent records.
pub mod record;

pub use record::{PatentId, PatentRecord, PatentStatus};

/// Length in bytes of all 256-bit hash types used in this module.
pub const HASH_LEN: usize = 32;

/// Strongly-typed 256-bit hash wrapper (SHA-256).
///
/// It is always exactly [`HASH_LEN`] bytes long. Most public APIs carry
/// the hex form ([`ContentHash`]) because every proof in the engine
/// concatenates digests as hex text before hashing them again.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Hash256(pub [u8; HASH_LEN]);

impl Hash256 {
    /// Computes a new [`Hash256`] as the SHA-256 hash of `data`.
    ///
    /// The result is deterministic for a given byte slice and is suitable
    /// for use as an identifier or content hash, but it is **not**
    /// a password hash or KDF.
    pub fn compute(data: &[u8]) -> Self {
        let digest = Sha256::digest(data);
        let mut bytes = [0u8; HASH_LEN];
        bytes.copy_from_slice(&digest);
        Hash256(bytes)
    }

    /// Returns the underlying 32-byte hash as a borrowed array.
    pub fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }

    /// Lowercase hex encoding (64 characters).
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

/// Hex-encoded SHA-256 digest of some exact byte content.
///
/// When a document is stored encrypted, its `ContentHash` is the hash of
/// the ciphertext blob; otherwise it is the hash of the plaintext.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(String);

impl ContentHash {
    /// Hashes `data` and wraps the hex digest.
    pub fn of(data: &[u8]) -> Self {
        ContentHash(Hash256::compute(data).to_hex())
    }

    /// Wraps an already hex-encoded digest without validating it.
    ///
    /// Digests arriving over the wire are opaque strings to the proof
    /// engine; it never decodes them.
    pub fn from_hex(hex: impl Into<String>) -> Self {
        ContentHash(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Hash256> for ContentHash {
    fn from(h: Hash256) -> Self {
        ContentHash(h.to_hex())
    }
}

impl AsRef<str> for ContentHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Returns the current wall-clock time as milliseconds since Unix epoch.
///
/// On error (system clock before epoch) this falls back to 0.
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_secs(0))
        .as_millis() as u64
}
