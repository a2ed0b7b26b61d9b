//! Document upload and retrieval.

use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use vault::ObjectStats;

use crate::error::AppError;
use crate::extractors::{Validate, extract_validated_json, is_present};
use crate::state::SharedState;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/ipfs/upload-patent", post(upload_patent))
        .route("/api/ipfs/upload-metadata", post(upload_metadata))
        .route("/api/ipfs/download/{hash}", get(download))
        .route("/api/ipfs/stats/{hash}", get(stats))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadPatentResponse {
    pub success: bool,
    pub ipfs_hash: String,
    pub cid: String,
    pub size: u64,
    pub encryption_key: Option<String>,
    pub encrypted: bool,
    pub url: String,
}

/// Parts of the `upload-patent` form.
#[derive(Default)]
struct UploadForm {
    file: Option<Vec<u8>>,
    encrypt: bool,
    password: Option<String>,
}

async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, AppError> {
    let mut form = UploadForm::default();
    let bad_form = |e: axum::extract::multipart::MultipartError| AppError::Validation(e.body_text());

    while let Some(field) = multipart.next_field().await.map_err(bad_form)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => form.file = Some(field.bytes().await.map_err(bad_form)?.to_vec()),
            // Only the literal text `true` turns encryption on.
            Some("encrypt") => form.encrypt = field.text().await.map_err(bad_form)? == "true",
            Some("password") => form.password = Some(field.text().await.map_err(bad_form)?),
            _ => {}
        }
    }
    Ok(form)
}

/// `POST /api/ipfs/upload-patent`
///
/// Multipart form with `file`, `encrypt` and an optional `password`.
pub async fn upload_patent(
    State(state): State<SharedState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadPatentResponse>, AppError> {
    let multipart = multipart.map_err(|e| AppError::Validation(e.body_text()))?;
    let form = read_upload_form(multipart).await?;
    let file = form
        .file
        .ok_or_else(|| AppError::Validation("No file uploaded".to_string()))?;

    let stored = state
        .store
        .upload(&file, form.encrypt, form.password.as_deref())
        .await?;

    Ok(Json(UploadPatentResponse {
        success: true,
        ipfs_hash: stored.content_address.clone(),
        cid: stored.content_address,
        size: stored.size,
        encryption_key: stored.encryption_key,
        encrypted: stored.encrypted,
        url: stored.url,
    }))
}

#[derive(Debug, Deserialize)]
pub struct UploadMetadataRequest {
    #[serde(default)]
    pub metadata: Option<Value>,
    #[serde(default)]
    pub encrypt: Option<Value>,
}

impl Validate for UploadMetadataRequest {
    fn validate(&self) -> Result<(), String> {
        if !is_present(&self.metadata) {
            return Err("Metadata is required".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadMetadataResponse {
    pub success: bool,
    pub ipfs_hash: String,
    pub cid: String,
    pub encryption_key: Option<String>,
    pub encrypted: bool,
}

/// `POST /api/ipfs/upload-metadata`
pub async fn upload_metadata(
    State(state): State<SharedState>,
    body: Result<Json<UploadMetadataRequest>, JsonRejection>,
) -> Result<Json<UploadMetadataResponse>, AppError> {
    let req = extract_validated_json(body)?;
    let metadata = req.metadata.unwrap_or_default();
    // Only boolean `true` turns encryption on here.
    let encrypt = matches!(req.encrypt, Some(Value::Bool(true)));

    let stored = state.store.upload_json(&metadata, encrypt).await?;

    Ok(Json(UploadMetadataResponse {
        success: true,
        ipfs_hash: stored.content_address.clone(),
        cid: stored.content_address,
        encryption_key: stored.encryption_key,
        encrypted: stored.encrypted,
    }))
}

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DownloadResponse {
    pub success: bool,
    /// Standard base64 of the (decrypted) bytes.
    pub data: String,
}

/// `GET /api/ipfs/download/{hash}?password=`
pub async fn download(
    State(state): State<SharedState>,
    Path(hash): Path<String>,
    Query(query): Query<DownloadQuery>,
) -> Result<Json<DownloadResponse>, AppError> {
    let data = state.store.download(&hash, query.password.as_deref()).await?;
    Ok(Json(DownloadResponse {
        success: true,
        data: BASE64.encode(data),
    }))
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub success: bool,
    pub stats: ObjectStats,
}

/// `GET /api/ipfs/stats/{hash}`
pub async fn stats(
    State(state): State<SharedState>,
    Path(hash): Path<String>,
) -> Result<Json<StatsResponse>, AppError> {
    let stats = state.store.stat(&hash).await?;
    Ok(Json(StatsResponse {
        success: true,
        stats,
    }))
}
