//! Range and knowledge transcripts.
//!
//! Both follow a three-move commit / challenge / response shape with a
//! hash standing in for the verifier's challenge. Verification only checks
//! that the challenge was derived from the commitment; it does not bind
//! the response to the committed value or to `min`/`max`.

use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};

use super::ProofError;
use crate::crypto::{hash, hash_str, random_hex};
use crate::types::{ContentHash, unix_millis};

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RangeProof {
    pub commitment: ContentHash,
    pub challenge: ContentHash,
    pub response: ContentHash,
    pub min: i64,
    pub max: i64,
    pub valid: bool,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeProof {
    pub commitment: ContentHash,
    pub challenge: ContentHash,
    pub response: ContentHash,
    pub timestamp: u64,
}

/// Proves `min <= value <= max` in transcript form.
///
/// The commitment is taken over the decimal text of `value` followed by
/// 32 raw random bytes.
pub fn generate_range_proof(value: i64, min: i64, max: i64) -> Result<RangeProof, ProofError> {
    if value < min || value > max {
        return Err(ProofError::OutOfRange { value, min, max });
    }

    let mut randomness = [0u8; 32];
    OsRng.fill_bytes(&mut randomness);

    let mut preimage = value.to_string().into_bytes();
    preimage.extend_from_slice(&randomness);
    let commitment = hash(&preimage);
    let challenge = hash_str(commitment.as_str());
    let response = hash_str(&format!("{}{challenge}", hex::encode(randomness)));

    Ok(RangeProof {
        commitment,
        challenge,
        response,
        min,
        max,
        valid: true,
    })
}

fn challenge_matches(commitment: &ContentHash, challenge: &ContentHash, response: &ContentHash) -> bool {
    if commitment.is_empty() || challenge.is_empty() || response.is_empty() {
        return false;
    }
    hash_str(commitment.as_str()) == *challenge
}

pub fn verify_range_proof(proof: &RangeProof) -> bool {
    challenge_matches(&proof.commitment, &proof.challenge, &proof.response)
}

/// Proves knowledge of `secret` without including it in the transcript.
pub fn prove_knowledge(secret: &str) -> KnowledgeProof {
    let randomness = random_hex(32);
    let commitment = hash_str(&format!("{secret}{randomness}"));
    let challenge = hash_str(commitment.as_str());
    let response = hash_str(&format!("{randomness}{challenge}"));

    KnowledgeProof {
        commitment,
        challenge,
        response,
        timestamp: unix_millis(),
    }
}

pub fn verify_knowledge_proof(proof: &KnowledgeProof) -> bool {
    challenge_matches(&proof.commitment, &proof.challenge, &proof.response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_range_values_prove_and_verify() {
        for (v, lo, hi) in [(5, 0, 10), (0, 0, 0), (-3, -5, -1), (10, 0, 10)] {
            let p = generate_range_proof(v, lo, hi).expect("in range");
            assert!(p.valid);
            assert_eq!((p.min, p.max), (lo, hi));
            assert!(verify_range_proof(&p));
        }
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        assert_eq!(
            generate_range_proof(11, 0, 10).unwrap_err(),
            ProofError::OutOfRange {
                value: 11,
                min: 0,
                max: 10
            }
        );
        assert!(generate_range_proof(-1, 0, 10).is_err());
    }

    #[test]
    fn range_verification_ignores_bounds() {
        let mut p = generate_range_proof(5, 0, 10).expect("in range");
        p.min = 100;
        p.max = 200;
        assert!(verify_range_proof(&p));
    }

    #[test]
    fn mismatched_challenge_fails() {
        let mut p = generate_range_proof(5, 0, 10).expect("in range");
        p.challenge = hash_str("forged");
        assert!(!verify_range_proof(&p));

        let mut k = prove_knowledge("secret");
        k.commitment = hash_str("other");
        assert!(!verify_knowledge_proof(&k));
    }

    #[test]
    fn knowledge_proof_verifies_and_hides_secret() {
        let k = prove_knowledge("my secret");
        assert!(verify_knowledge_proof(&k));
        assert_eq!(k.challenge, hash_str(k.commitment.as_str()));

        let other = prove_knowledge("my secret");
        assert_ne!(k.commitment, other.commitment);
    }

    #[test]
    fn missing_response_fails() {
        let mut k = prove_knowledge("s");
        k.response = ContentHash::default();
        assert!(!verify_knowledge_proof(&k));
    }
}
