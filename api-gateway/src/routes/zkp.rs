//! Proof endpoints.

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use vault::proofs::{MerkleTree, generate_commitment, verify_commitment};
use vault::{ContentHash, OriginalityProof, RegistryError};

use crate::error::AppError;
use crate::extractors::{Validate, extract_validated_json, is_present};
use crate::state::SharedState;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/zkp/prove-originality", post(prove_originality))
        .route("/api/zkp/verify-originality", post(verify_originality))
        .route("/api/zkp/generate-commitment", post(generate))
        .route("/api/zkp/verify-commitment", post(verify))
        .route("/api/zkp/create-merkle-tree", post(create_merkle_tree))
}

fn non_empty(s: &Option<String>) -> bool {
    s.as_deref().is_some_and(|s| !s.is_empty())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProveOriginalityRequest {
    #[serde(default)]
    pub patent_hash: Option<String>,
}

impl Validate for ProveOriginalityRequest {
    fn validate(&self) -> Result<(), String> {
        if !non_empty(&self.patent_hash) {
            return Err("Patent hash is required".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProveOriginalityResponse {
    pub success: bool,
    pub proof: OriginalityProof,
    pub is_original: bool,
}

/// `POST /api/zkp/prove-originality`
///
/// On success the hash joins the known set, so proving it again fails.
pub async fn prove_originality(
    State(state): State<SharedState>,
    body: Result<Json<ProveOriginalityRequest>, JsonRejection>,
) -> Result<Json<ProveOriginalityResponse>, AppError> {
    let req = extract_validated_json(body)?;
    let hash = ContentHash::from_hex(req.patent_hash.unwrap_or_default());

    let proof = match state.registry.claim_originality(hash).await {
        Ok(p) => p,
        Err(RegistryError::NotOriginal) => {
            state.metrics.vault.originality_rejections.inc();
            return Err(AppError::NotOriginal("Patent matches existing patent".to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    Ok(Json(ProveOriginalityResponse {
        success: true,
        is_original: proof.is_original,
        proof,
    }))
}

#[derive(Debug, Deserialize)]
pub struct VerifyOriginalityRequest {
    #[serde(default)]
    pub proof: Option<Value>,
}

impl Validate for VerifyOriginalityRequest {
    fn validate(&self) -> Result<(), String> {
        if !is_present(&self.proof) {
            return Err("Proof is required".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct ValidResponse {
    pub success: bool,
    pub valid: bool,
}

/// `POST /api/zkp/verify-originality`
///
/// Checks the proof against the known set as it is now.
pub async fn verify_originality(
    State(state): State<SharedState>,
    body: Result<Json<VerifyOriginalityRequest>, JsonRejection>,
) -> Result<Json<ValidResponse>, AppError> {
    let req = extract_validated_json(body)?;

    // A proof of the wrong shape is simply not valid.
    let valid = match req.proof.map(serde_json::from_value::<OriginalityProof>) {
        Some(Ok(proof)) => state.registry.verify_originality(&proof).await,
        _ => false,
    };

    Ok(Json(ValidResponse {
        success: true,
        valid,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateCommitmentRequest {
    #[serde(default)]
    pub patent_data: Option<Value>,
}

impl Validate for GenerateCommitmentRequest {
    fn validate(&self) -> Result<(), String> {
        if !is_present(&self.patent_data) {
            return Err("Patent data is required".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct GenerateCommitmentResponse {
    pub success: bool,
    pub commitment: ContentHash,
    pub randomness: String,
    pub timestamp: u64,
}

/// `POST /api/zkp/generate-commitment`
pub async fn generate(
    body: Result<Json<GenerateCommitmentRequest>, JsonRejection>,
) -> Result<Json<GenerateCommitmentResponse>, AppError> {
    let req = extract_validated_json(body)?;
    let c = generate_commitment(&req.patent_data.unwrap_or_default());

    Ok(Json(GenerateCommitmentResponse {
        success: true,
        commitment: c.commitment,
        randomness: c.randomness,
        timestamp: c.timestamp,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyCommitmentRequest {
    #[serde(default)]
    pub patent_data: Option<Value>,
    #[serde(default)]
    pub commitment: Option<String>,
    #[serde(default)]
    pub randomness: Option<String>,
}

impl Validate for VerifyCommitmentRequest {
    fn validate(&self) -> Result<(), String> {
        if !is_present(&self.patent_data) || !non_empty(&self.commitment) || !non_empty(&self.randomness)
        {
            return Err("Patent data, commitment, and randomness are required".to_string());
        }
        Ok(())
    }
}

/// `POST /api/zkp/verify-commitment`
pub async fn verify(
    body: Result<Json<VerifyCommitmentRequest>, JsonRejection>,
) -> Result<Json<ValidResponse>, AppError> {
    let req = extract_validated_json(body)?;
    let payload = req.patent_data.unwrap_or_default();
    let commitment = ContentHash::from_hex(req.commitment.unwrap_or_default());
    let randomness = req.randomness.unwrap_or_default();

    Ok(Json(ValidResponse {
        success: true,
        valid: verify_commitment(&payload, &commitment, &randomness),
    }))
}

#[derive(Debug, Deserialize)]
pub struct CreateMerkleTreeRequest {
    #[serde(default)]
    pub fields: Option<Value>,
}

impl Validate for CreateMerkleTreeRequest {
    fn validate(&self) -> Result<(), String> {
        match &self.fields {
            Some(Value::Array(items)) if !items.is_empty() => Ok(()),
            _ => Err("Fields array is required".to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MerkleTreeResponse {
    pub success: bool,
    pub root: ContentHash,
    pub leaves: Vec<ContentHash>,
}

/// `POST /api/zkp/create-merkle-tree`
pub async fn create_merkle_tree(
    body: Result<Json<CreateMerkleTreeRequest>, JsonRejection>,
) -> Result<Json<MerkleTreeResponse>, AppError> {
    let req = extract_validated_json(body)?;
    let fields = match req.fields {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    };

    let tree = MerkleTree::build(&fields)?;
    Ok(Json(MerkleTreeResponse {
        success: true,
        root: tree.root,
        leaves: tree.leaves,
    }))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn merkle_request_requires_non_empty_array() {
        let ok = CreateMerkleTreeRequest {
            fields: Some(json!(["a"])),
        };
        assert!(ok.validate().is_ok());

        for fields in [None, Some(json!([])), Some(json!("a")), Some(json!({ "a": 1 }))] {
            assert!(CreateMerkleTreeRequest { fields }.validate().is_err());
        }
    }

    #[test]
    fn commitment_verification_requires_all_parts() {
        let req = VerifyCommitmentRequest {
            patent_data: Some(json!({ "a": 1 })),
            commitment: Some("c".to_string()),
            randomness: None,
        };
        assert!(req.validate().is_err());
    }
}
