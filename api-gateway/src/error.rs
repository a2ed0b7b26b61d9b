//! Maps library errors to HTTP responses.
//!
//! Every error body has the shape `{"error": "<message>"}`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use vault::{ProofError, RegistryError, StoreError};

#[derive(Error, Debug)]
pub enum AppError {
    /// Missing or malformed input.
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotOriginal(String),
    #[error("{0}")]
    NotFound(String),
    /// A stored blob failed authentication or could not be decoded.
    #[error("{0}")]
    Integrity(String),
    #[error("{0}")]
    StorageUnavailable(String),
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::NotOriginal(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Integrity(_) | AppError::StorageUnavailable(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(addr) => AppError::NotFound(format!("Object not found: {addr}")),
            StoreError::Crypto(e) => AppError::Integrity(format!("Decryption failed: {e}")),
            StoreError::StorageUnavailable(msg) => AppError::StorageUnavailable(msg),
            StoreError::InvalidData(msg) | StoreError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<RegistryError> for AppError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::Validation(msg) => AppError::Validation(msg),
            RegistryError::NotOriginal => AppError::NotOriginal("Patent is not original".to_string()),
            RegistryError::NotFound(_) => AppError::NotFound("Patent not found".to_string()),
        }
    }
}

impl From<ProofError> for AppError {
    fn from(e: ProofError) -> Self {
        match e {
            ProofError::NotOriginal => AppError::NotOriginal("Patent matches existing patent".to_string()),
            other => AppError::Validation(other.to_string()),
        }
    }
}
