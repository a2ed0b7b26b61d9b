//! Prometheus-backed metrics and HTTP exporter.
//!
//! This module defines a [`MetricsRegistry`] that owns a Prometheus
//! registry and a set of strongly-typed vault metrics, and an async HTTP
//! exporter that serves `/metrics` using `hyper`.

use std::{convert::Infallible, net::SocketAddr, sync::Arc};

use bytes::Bytes;
use http_body_util::Full;
use hyper::{
    Method, Request, Response, StatusCode, body::Incoming, header, header::HeaderValue,
    server::conn::http1, service::service_fn,
};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;

use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry,
    TextEncoder,
};

/// Content store and registry metrics.
#[derive(Clone)]
pub struct VaultMetrics {
    /// Uploads accepted by the backend, labelled `encrypted="true"|"false"`.
    pub uploads: IntCounterVec,
    /// Downloads served, labelled `decrypted="true"|"false"`.
    pub downloads: IntCounterVec,
    /// Downloads refused because a blob failed authentication.
    pub integrity_failures: IntCounter,
    /// Patents registered.
    pub registrations: IntCounter,
    /// Registrations or claims refused because the hash was already known.
    pub originality_rejections: IntCounter,
    /// Latency of backend calls, labelled by operation (`add`, `cat`, `stat`).
    pub backend_seconds: HistogramVec,
}

impl VaultMetrics {
    /// Registers vault metrics into the given `Registry`.
    pub fn register(registry: &Registry) -> Result<Self, prometheus::Error> {
        let uploads = IntCounterVec::new(
            Opts::new("store_uploads_total", "Objects stored through the content store"),
            &["encrypted"],
        )?;
        registry.register(Box::new(uploads.clone()))?;

        let downloads = IntCounterVec::new(
            Opts::new("store_downloads_total", "Objects fetched through the content store"),
            &["decrypted"],
        )?;
        registry.register(Box::new(downloads.clone()))?;

        let integrity_failures = IntCounter::with_opts(Opts::new(
            "store_integrity_failures_total",
            "Downloads rejected because the blob failed authentication",
        ))?;
        registry.register(Box::new(integrity_failures.clone()))?;

        let registrations = IntCounter::with_opts(Opts::new(
            "registry_registrations_total",
            "Patents registered",
        ))?;
        registry.register(Box::new(registrations.clone()))?;

        let originality_rejections = IntCounter::with_opts(Opts::new(
            "registry_originality_rejections_total",
            "Registrations and claims rejected as not original",
        ))?;
        registry.register(Box::new(originality_rejections.clone()))?;

        let backend_seconds = HistogramVec::new(
            HistogramOpts::new(
                "store_backend_seconds",
                "Latency of content backend calls in seconds",
            )
            .buckets(vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
            ]),
            &["op"],
        )?;
        registry.register(Box::new(backend_seconds.clone()))?;

        Ok(Self {
            uploads,
            downloads,
            integrity_failures,
            registrations,
            originality_rejections,
            backend_seconds,
        })
    }
}

/// Wrapper around a Prometheus registry and the vault metrics.
///
/// This is the main handle passed around in a binary. It can be wrapped
/// in an [`Arc`] and shared across tasks.
#[derive(Clone)]
pub struct MetricsRegistry {
    registry: Registry,
    pub vault: VaultMetrics,
}

impl MetricsRegistry {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("vault".to_string()), None)?;
        let vault = VaultMetrics::register(&registry)?;
        Ok(Self { registry, vault })
    }

    /// Encodes all metrics in this registry into the Prometheus text format.
    pub fn gather_text(&self) -> String {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            tracing::warn!(error = %e, "failed to encode Prometheus metrics");
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

/// Runs an HTTP server that exposes Prometheus metrics.
///
/// The server listens on `addr` and serves `GET /metrics` with the
/// Prometheus text exposition format. All other paths return 404.
pub async fn run_prometheus_http_server(
    metrics: Arc<MetricsRegistry>,
    addr: SocketAddr,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "metrics exporter listening");

    loop {
        let (stream, _) = listener.accept().await?;
        let io = TokioIo::new(stream);
        let metrics = metrics.clone();

        tokio::spawn(async move {
            let svc = service_fn(move |req| {
                let metrics = metrics.clone();
                handle_request(req, metrics)
            });

            if let Err(err) = http1::Builder::new().serve_connection(io, svc).await {
                tracing::debug!(error = %err, "prometheus HTTP connection error");
            }
        });
    }
}

fn text_response(status: StatusCode, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    let mut resp = Response::new(Full::new(body.into()));
    *resp.status_mut() = status;
    resp
}

async fn handle_request(
    req: Request<Incoming>,
    metrics: Arc<MetricsRegistry>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    match (req.method(), req.uri().path()) {
        (&Method::GET, "/metrics") => {
            let mut resp = text_response(StatusCode::OK, metrics.gather_text());
            resp.headers_mut().insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain; version=0.0.4"),
            );
            Ok(resp)
        }
        _ => Ok(text_response(StatusCode::NOT_FOUND, "not found")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::Registry;

    #[test]
    fn vault_metrics_register_and_record() {
        let registry = Registry::new();
        let metrics = VaultMetrics::register(&registry).expect("register metrics");

        metrics.uploads.with_label_values(&["true"]).inc();
        metrics.downloads.with_label_values(&["false"]).inc();
        metrics.integrity_failures.inc();
        metrics.registrations.inc();
        metrics.originality_rejections.inc();
        metrics.backend_seconds.with_label_values(&["add"]).observe(0.01);

        let metric_families = registry.gather();
        assert_eq!(metric_families.len(), 6);
    }

    #[test]
    fn metrics_registry_gather_text_works() {
        let registry = MetricsRegistry::new().expect("create metrics registry");
        registry.vault.registrations.inc();
        let text = registry.gather_text();
        assert!(text.contains("vault_registry_registrations_total 1"));
    }

    #[test]
    fn registering_twice_into_one_registry_fails() {
        let registry = Registry::new();
        VaultMetrics::register(&registry).expect("first");
        assert!(VaultMetrics::register(&registry).is_err());
    }
}
