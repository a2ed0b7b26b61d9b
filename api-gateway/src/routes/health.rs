use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::state::SharedState;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", get(service_info))
        .route("/health", get(health))
}

/// Liveness response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Milliseconds since Unix epoch.
    pub timestamp: u64,
    /// Seconds since the gateway started.
    pub uptime: f64,
}

/// `GET /health`
pub async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        timestamp: vault::unix_millis(),
        uptime: state.started_at.elapsed().as_secs_f64(),
    })
}

#[derive(Serialize)]
pub struct Endpoints {
    pub ipfs: &'static str,
    pub zkp: &'static str,
    pub patents: &'static str,
}

#[derive(Serialize)]
pub struct ServiceInfo {
    pub service: &'static str,
    pub version: &'static str,
    pub status: &'static str,
    pub backend: &'static str,
    pub endpoints: Endpoints,
}

/// `GET /`
pub async fn service_info(State(state): State<SharedState>) -> Json<ServiceInfo> {
    Json(ServiceInfo {
        service: "Patent Vault API",
        version: env!("CARGO_PKG_VERSION"),
        status: "running",
        backend: state.store.backend().kind(),
        endpoints: Endpoints {
            ipfs: "/api/ipfs/*",
            zkp: "/api/zkp/*",
            patents: "/api/patent/*",
        },
    })
}
