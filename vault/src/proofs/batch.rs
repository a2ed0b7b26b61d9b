//! Structural batch checks.
//!
//! A transcript counts as valid here when its commitment, challenge and
//! response are all present and non-empty. No hashes are recomputed.

use serde::{Deserialize, Serialize};

/// Any commit / challenge / response transcript, as received from a
/// client. Every field is optional.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ProofTranscript {
    #[serde(default)]
    pub commitment: Option<String>,
    #[serde(default)]
    pub challenge: Option<String>,
    #[serde(default)]
    pub response: Option<String>,
}

impl ProofTranscript {
    fn is_well_formed(&self) -> bool {
        [&self.commitment, &self.challenge, &self.response]
            .iter()
            .all(|f| f.as_deref().is_some_and(|s| !s.is_empty()))
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItem {
    pub index: usize,
    pub valid: bool,
    /// The transcript's commitment, used as its identifier.
    pub proof_id: Option<String>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    /// `true` when every transcript is well formed (vacuously for none).
    pub success: bool,
    pub results: Vec<BatchItem>,
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
}

pub fn batch_verify_proofs(proofs: &[ProofTranscript]) -> BatchReport {
    let results: Vec<BatchItem> = proofs
        .iter()
        .enumerate()
        .map(|(index, p)| BatchItem {
            index,
            valid: p.is_well_formed(),
            proof_id: p.commitment.clone(),
        })
        .collect();

    let valid = results.iter().filter(|r| r.valid).count();
    BatchReport {
        success: valid == results.len(),
        total: proofs.len(),
        invalid: results.len() - valid,
        valid,
        results,
    }
}
