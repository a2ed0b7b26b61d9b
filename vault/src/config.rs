//! Top-level configuration for the vault.
//!
//! This module aggregates configuration for:
//!
//! - backend selection (`BackendKind`),
//! - the IPFS client (RPC URL + timeout),
//! - RocksDB storage (path and creation flags),
//! - scrypt cost parameters,
//! - the content store (per-call timeout, public gateway prefix),
//! - the metrics exporter (enable flag + listen address).
//!
//! Binaries start from [`VaultConfig::default()`] and apply environment
//! overrides with [`VaultConfig::from_env()`].

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::crypto::KdfParams;
use crate::store::{IpfsConfig, RocksDbConfig, StoreConfig};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Which content backend to run against.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum BackendKind {
    #[default]
    Memory,
    RocksDb,
    Ipfs,
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" | "mem" => Ok(BackendKind::Memory),
            "rocksdb" => Ok(BackendKind::RocksDb),
            "ipfs" => Ok(BackendKind::Ipfs),
            other => Err(format!("unknown backend {other:?}, expected memory, rocksdb or ipfs")),
        }
    }
}

/// Configuration for the Prometheus metrics exporter.
#[derive(Clone, Debug)]
pub struct MetricsConfig {
    /// Whether to run a `/metrics` HTTP exporter.
    pub enabled: bool,
    /// Address to bind the metrics HTTP server to.
    pub listen_addr: SocketAddr,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 9898)),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct VaultConfig {
    pub backend: BackendKind,
    pub ipfs: IpfsConfig,
    pub rocksdb: RocksDbConfig,
    pub kdf: KdfParams,
    pub store: StoreConfig,
    pub metrics: MetricsConfig,
}

impl VaultConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns.
    ///
    /// Recognised keys: `VAULT_BACKEND`, `IPFS_API_URL`, `IPFS_GATEWAY_URL`,
    /// `IPFS_TIMEOUT_SECS`, `VAULT_DB_PATH`, `VAULT_SCRYPT_LOG_N`,
    /// `METRICS_ENABLED`, `METRICS_ADDR`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut cfg = Self::default();

        if let Some(v) = lookup("VAULT_BACKEND") {
            cfg.backend = parse("VAULT_BACKEND", v)?;
        }
        if let Some(v) = lookup("IPFS_API_URL") {
            cfg.ipfs.api_url = v;
        }
        if let Some(v) = lookup("IPFS_GATEWAY_URL") {
            cfg.store.gateway_url = v;
        }
        if let Some(v) = lookup("IPFS_TIMEOUT_SECS") {
            let timeout = Duration::from_secs(parse("IPFS_TIMEOUT_SECS", v)?);
            cfg.ipfs.timeout = timeout;
            cfg.store.timeout = timeout;
        }
        if let Some(v) = lookup("VAULT_DB_PATH") {
            cfg.rocksdb.path = v;
        }
        if let Some(v) = lookup("VAULT_SCRYPT_LOG_N") {
            cfg.kdf.log_n = parse("VAULT_SCRYPT_LOG_N", v)?;
        }
        if let Some(v) = lookup("METRICS_ENABLED") {
            cfg.metrics.enabled = parse_flag("METRICS_ENABLED", v)?;
        }
        if let Some(v) = lookup("METRICS_ADDR") {
            cfg.metrics.listen_addr = parse("METRICS_ADDR", v)?;
        }

        Ok(cfg)
    }
}

fn parse<T>(key: &'static str, value: String) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let parsed = value.trim().parse::<T>();
    parsed.map_err(|e| ConfigError::Invalid {
        key,
        reason: e.to_string(),
        value,
    })
}

fn parse_flag(key: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value,
            reason: "expected a boolean".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<VaultConfig, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        VaultConfig::from_lookup(|k| env.get(k).cloned())
    }

    #[test]
    fn defaults_without_overrides() {
        let cfg = from_pairs(&[]).expect("defaults");
        assert_eq!(cfg.backend, BackendKind::Memory);
        assert_eq!(cfg.kdf, KdfParams::default());
        assert_eq!(cfg.ipfs.api_url, "http://127.0.0.1:5001");
        assert_eq!(cfg.store.gateway_url, "https://ipfs.io/ipfs/");
        assert!(cfg.metrics.enabled);
    }

    #[test]
    fn overrides_are_applied() {
        let cfg = from_pairs(&[
            ("VAULT_BACKEND", "IPFS"),
            ("IPFS_API_URL", "http://ipfs:5001"),
            ("IPFS_TIMEOUT_SECS", "7"),
            ("VAULT_SCRYPT_LOG_N", "10"),
            ("METRICS_ENABLED", "off"),
            ("METRICS_ADDR", "0.0.0.0:9100"),
        ])
        .expect("valid overrides");

        assert_eq!(cfg.backend, BackendKind::Ipfs);
        assert_eq!(cfg.ipfs.api_url, "http://ipfs:5001");
        assert_eq!(cfg.ipfs.timeout, Duration::from_secs(7));
        assert_eq!(cfg.store.timeout, Duration::from_secs(7));
        assert_eq!(cfg.kdf.log_n, 10);
        assert!(!cfg.metrics.enabled);
        assert_eq!(cfg.metrics.listen_addr.port(), 9100);
    }

    #[test]
    fn bad_values_are_reported_with_their_key() {
        let err = from_pairs(&[("VAULT_BACKEND", "s3")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "VAULT_BACKEND", .. }));

        let err = from_pairs(&[("IPFS_TIMEOUT_SECS", "soon")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "IPFS_TIMEOUT_SECS", .. }));

        let err = from_pairs(&[("METRICS_ENABLED", "maybe")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "METRICS_ENABLED", .. }));
    }
}
