//! Originality proofs.
//!
//! A candidate hash is "original" when it is not in the known-hash set.
//! The proof binds the candidate (hidden behind fresh randomness) to the
//! exact sequence of known hashes at proving time:
//!
//! ```text
//! proof     = H(candidate || randomness)
//! challenge = H(proof || known[0] || known[1] || ...)
//! ```
//!
//! Verification recomputes the challenge against a caller-supplied set, so
//! a proof stops verifying as soon as the set grows or is reordered.

use serde::{Deserialize, Serialize};

use super::ProofError;
use crate::crypto::{hash_str, random_hex};
use crate::types::{ContentHash, unix_millis};

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OriginalityProof {
    pub proof: ContentHash,
    pub challenge: ContentHash,
    pub timestamp: u64,
    pub is_original: bool,
    /// Size of the known set the candidate was checked against.
    pub num_comparisons: usize,
}

fn challenge_for(proof: &ContentHash, known: &[ContentHash]) -> ContentHash {
    let mut text = String::with_capacity(proof.as_str().len() * (known.len() + 1));
    text.push_str(proof.as_str());
    for h in known {
        text.push_str(h.as_str());
    }
    hash_str(&text)
}

/// Proves that `candidate` does not occur in `known`.
///
/// Membership is a linear scan over `known`.
pub fn prove_originality(
    candidate: &ContentHash,
    known: &[ContentHash],
) -> Result<OriginalityProof, ProofError> {
    if known.contains(candidate) {
        return Err(ProofError::NotOriginal);
    }

    let randomness = random_hex(32);
    let proof = hash_str(&format!("{candidate}{randomness}"));
    let challenge = challenge_for(&proof, known);

    Ok(OriginalityProof {
        proof,
        challenge,
        timestamp: unix_millis(),
        is_original: true,
        num_comparisons: known.len(),
    })
}

/// Recomputes the challenge against `known`.
pub fn verify_originality_proof(proof: &OriginalityProof, known: &[ContentHash]) -> bool {
    if proof.proof.is_empty() || proof.challenge.is_empty() {
        return false;
    }
    challenge_for(&proof.proof, known) == proof.challenge
}
