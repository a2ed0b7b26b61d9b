//! Patent registration and lookup.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use vault::{ContentHash, OriginalityProof, PatentId, PatentRecord, RegisterPatent, RegistryError};

use crate::error::AppError;
use crate::extractors::{Validate, extract_validated_json, is_truthy};
use crate::state::SharedState;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/patent/register", post(register))
        .route("/api/patent/{id}", get(get_patent))
        .route("/api/patents", get(list_patents))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub inventor: Option<String>,
    #[serde(default)]
    pub ipfs_hash: Option<String>,
    /// Optional payload to hash instead of `{title, description, inventor}`.
    #[serde(default)]
    pub patent_data: Option<Value>,
}

impl Validate for RegisterRequest {
    fn validate(&self) -> Result<(), String> {
        let filled = |s: &Option<String>| s.as_deref().is_some_and(|s| !s.is_empty());
        if !filled(&self.title) || !filled(&self.description) || !filled(&self.ipfs_hash) {
            return Err("Title, description, and IPFS hash are required".to_string());
        }
        Ok(())
    }
}

impl From<RegisterRequest> for RegisterPatent {
    fn from(req: RegisterRequest) -> Self {
        RegisterPatent {
            title: req.title.unwrap_or_default(),
            description: req.description.unwrap_or_default(),
            inventor: req.inventor,
            content_address: req.ipfs_hash.unwrap_or_default(),
            // Falsy payloads fall back to the default one.
            payload: req.patent_data.filter(is_truthy),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub success: bool,
    pub patent_id: PatentId,
    pub patent_hash: ContentHash,
    pub commitment: ContentHash,
    pub originality_proof: OriginalityProof,
    pub message: &'static str,
}

/// `POST /api/patent/register`
pub async fn register(
    State(state): State<SharedState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<RegisterResponse>, AppError> {
    let req = extract_validated_json(body)?;

    let record = match state.registry.register(req.into()).await {
        Ok(r) => r,
        Err(RegistryError::NotOriginal) => {
            state.metrics.vault.originality_rejections.inc();
            return Err(RegistryError::NotOriginal.into());
        }
        Err(e) => return Err(e.into()),
    };
    state.metrics.vault.registrations.inc();

    Ok(Json(RegisterResponse {
        success: true,
        patent_id: record.id,
        patent_hash: record.patent_hash,
        commitment: record.commitment,
        originality_proof: record.originality_proof,
        message: "Patent registered successfully",
    }))
}

#[derive(Debug, Serialize)]
pub struct PatentResponse {
    pub success: bool,
    pub patent: PatentRecord,
}

/// `GET /api/patent/{id}`
pub async fn get_patent(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<PatentResponse>, AppError> {
    let patent = state.registry.get(&id).await?;
    Ok(Json(PatentResponse {
        success: true,
        patent,
    }))
}

#[derive(Debug, Serialize)]
pub struct PatentListResponse {
    pub success: bool,
    pub count: usize,
    pub patents: Vec<PatentRecord>,
}

/// `GET /api/patents`
pub async fn list_patents(State(state): State<SharedState>) -> Json<PatentListResponse> {
    let patents = state.registry.list().await;
    Json(PatentListResponse {
        success: true,
        count: patents.len(),
        patents,
    })
}
