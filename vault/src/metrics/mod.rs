//! Metrics and instrumentation for the vault.
//!
//! This module defines Prometheus-compatible metrics for the content store
//! and registry, and exposes a small HTTP exporter that serves `/metrics`
//! in Prometheus text format.
//!
//! Typical usage in a binary:
//!
//! ```ignore
//! use std::sync::Arc;
//! use vault::metrics::{MetricsRegistry, run_prometheus_http_server};
//!
//! let registry = Arc::new(MetricsRegistry::new()?);
//! tokio::spawn(run_prometheus_http_server(registry.clone(), cfg.metrics.listen_addr));
//!
//! let store = ContentStore::new(backend, cipher, cfg.store)
//!     .with_metrics(registry.vault.clone());
//! ```

pub mod prometheus;

pub use self::prometheus::{MetricsRegistry, VaultMetrics, run_prometheus_http_server};
