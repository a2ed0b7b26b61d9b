//! Hiding commitments and nullifiers.
//!
//! `commitment = H(serialize(payload) || randomness)` where `randomness` is
//! 32 random bytes in hex. Opening a commitment means revealing both the
//! payload and the randomness.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::crypto::{hash_str, random_hex, serialize};
use crate::types::{ContentHash, unix_millis};

/// Bytes of randomness mixed into every commitment.
pub const RANDOMNESS_LEN: usize = 32;

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Commitment {
    pub commitment: ContentHash,
    /// 64 hex characters.
    pub randomness: String,
    /// Milliseconds since Unix epoch.
    pub timestamp: u64,
}

fn commit(payload: &Value, randomness: &str) -> ContentHash {
    let mut text = serialize(payload);
    text.push_str(randomness);
    hash_str(&text)
}

/// Commits to `payload` with fresh randomness.
pub fn generate_commitment(payload: &Value) -> Commitment {
    let randomness = random_hex(RANDOMNESS_LEN);
    Commitment {
        commitment: commit(payload, &randomness),
        randomness,
        timestamp: unix_millis(),
    }
}

/// Checks that `commitment` opens to `payload` under `randomness`.
pub fn verify_commitment(payload: &Value, commitment: &ContentHash, randomness: &str) -> bool {
    commit(payload, randomness) == *commitment
}

/// `H(identifier || secret)`: a stable tag that marks `identifier` as used
/// without revealing `secret`.
pub fn generate_nullifier(identifier: &str, secret: &str) -> ContentHash {
    hash_str(&format!("{identifier}{secret}"))
}
