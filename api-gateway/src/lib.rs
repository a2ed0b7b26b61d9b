//! HTTP API for the patent vault.
//!
//! Routes:
//!
//! - `POST /api/ipfs/upload-patent`, `POST /api/ipfs/upload-metadata`,
//!   `GET /api/ipfs/download/{hash}`, `GET /api/ipfs/stats/{hash}`
//! - `POST /api/zkp/prove-originality`, `POST /api/zkp/verify-originality`,
//!   `POST /api/zkp/generate-commitment`, `POST /api/zkp/verify-commitment`,
//!   `POST /api/zkp/create-merkle-tree`
//! - `POST /api/patent/register`, `GET /api/patent/{id}`, `GET /api/patents`
//! - `GET /health`, `GET /`

pub mod config;
pub mod error;
pub mod extractors;
pub mod routes;
pub mod state;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use tower_http::trace::TraceLayer;

pub use config::ApiConfig;
pub use error::AppError;
pub use state::{AppState, SharedState};

/// Builds the router with the default body limit.
pub fn app(state: SharedState) -> Router {
    app_with_limit(state, config::DEFAULT_BODY_LIMIT)
}

pub fn app_with_limit(state: SharedState, body_limit: usize) -> Router {
    Router::new()
        .merge(routes::health::router())
        .merge(routes::ipfs::router())
        .merge(routes::zkp::router())
        .merge(routes::patents::router())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
