//! Shared application state.

use std::sync::Arc;
use std::time::Instant;

use vault::{DefaultContentStore, MetricsRegistry, PatentRegistry};

/// Shared state held by the request handlers.
///
/// This is wrapped in an [`Arc`] and passed to request handlers via Axum's
/// `State` extractor.
pub struct AppState {
    /// Encrypting content store over the configured backend.
    pub store: DefaultContentStore,
    /// Registered patents and the known-hash set.
    pub registry: PatentRegistry,
    /// Metrics registry shared with the content store.
    pub metrics: Arc<MetricsRegistry>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(store: DefaultContentStore, metrics: Arc<MetricsRegistry>) -> Self {
        Self {
            store,
            registry: PatentRegistry::new(),
            metrics,
            started_at: Instant::now(),
        }
    }
}

/// Thread-safe alias for `AppState`.
pub type SharedState = Arc<AppState>;
