// api-gateway/src/main.rs

//! API gateway binary.
//!
//! This binary exposes the patent vault over HTTP (see the `api_gateway`
//! library for the route list). It wires up a content store over the
//! configured backend (memory, RocksDB or IPFS), the in-process patent
//! registry, and a Prometheus metrics exporter on `/metrics`.

use std::sync::Arc;

use tokio::signal;
use tracing_subscriber::EnvFilter;

use api_gateway::{ApiConfig, AppState, SharedState};
use vault::{
    AnyBackend, Cipher, ContentStore, MetricsRegistry, VaultConfig, run_prometheus_http_server,
};

#[tokio::main]
async fn main() {
    // Basic tracing setup.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("api_gateway=info,vault=info,tower_http=info")),
        )
        .init();

    if let Err(e) = run().await {
        tracing::error!("fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    let api_cfg = ApiConfig::from_env().map_err(|e| format!("invalid API configuration: {e}"))?;
    let vault_cfg =
        VaultConfig::from_env().map_err(|e| format!("invalid vault configuration: {e}"))?;

    // ---------------------------
    // Metrics
    // ---------------------------

    let metrics = Arc::new(
        MetricsRegistry::new()
            .map_err(|e| format!("failed to initialise metrics registry: {e}"))?,
    );

    if vault_cfg.metrics.enabled {
        let metrics_clone = metrics.clone();
        let addr = vault_cfg.metrics.listen_addr;
        tokio::spawn(async move {
            if let Err(e) = run_prometheus_http_server(metrics_clone, addr).await {
                tracing::error!("metrics HTTP server error: {e}");
            }
        });
        tracing::info!("metrics exporter listening on http://{}/metrics", addr);
    }

    // ---------------------------
    // Content store
    // ---------------------------

    let backend = AnyBackend::from_config(&vault_cfg)
        .map_err(|e| format!("failed to initialise {:?} backend: {e}", vault_cfg.backend))?;
    tracing::info!(
        backend = backend.kind(),
        scrypt_log_n = vault_cfg.kdf.log_n,
        "content store ready"
    );

    let store = ContentStore::new(backend, Cipher::new(vault_cfg.kdf), vault_cfg.store.clone())
        .with_metrics(metrics.vault.clone());

    // ---------------------------
    // Shared state + router
    // ---------------------------

    let app_state: SharedState = Arc::new(AppState::new(store, metrics.clone()));
    let app = api_gateway::app_with_limit(app_state, api_cfg.body_limit_bytes);

    // ---------------------------
    // axum 0.8 server (hyper 1 / tokio 1.48 style)
    // ---------------------------

    tracing::info!("API gateway listening on http://{}", api_cfg.listen_addr);

    let listener = tokio::net::TcpListener::bind(api_cfg.listen_addr)
        .await
        .map_err(|e| format!("failed to bind {}: {e}", api_cfg.listen_addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| format!("API server error: {e}"))?;

    Ok(())
}

/// Waits for Ctrl-C and returns, used for graceful shutdown.
async fn shutdown_signal() {
    let _ = signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
