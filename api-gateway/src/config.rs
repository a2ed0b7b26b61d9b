//! API gateway configuration.
//!
//! This configures the HTTP listener. Storage, crypto and metrics settings
//! come from `vault::VaultConfig::from_env()`.

use std::net::SocketAddr;

use vault::ConfigError;

/// Request bodies above this size are rejected before any handler runs.
pub const DEFAULT_BODY_LIMIT: usize = 50 * 1024 * 1024;

/// Configuration for the API gateway HTTP server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP server to.
    pub listen_addr: SocketAddr,
    /// Maximum accepted request body, uploads included.
    pub body_limit_bytes: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        // Bind to all interfaces so a container port mapping is reachable.
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 4000)),
            body_limit_bytes: DEFAULT_BODY_LIMIT,
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// `API_LISTEN_ADDR` wins over `PORT`, which only changes the port.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut cfg = Self::default();

        if let Some(port) = lookup("PORT") {
            cfg.listen_addr
                .set_port(port.trim().parse::<u16>().map_err(|e| ConfigError::Invalid {
                    key: "PORT",
                    reason: format!("{e}"),
                    value: port.clone(),
                })?);
        }
        if let Some(addr) = lookup("API_LISTEN_ADDR") {
            cfg.listen_addr = addr.trim().parse::<SocketAddr>().map_err(|e| ConfigError::Invalid {
                key: "API_LISTEN_ADDR",
                reason: format!("{e}"),
                value: addr.clone(),
            })?;
        }

        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_overrides_default_port_only() {
        let cfg = ApiConfig::from_lookup(|k| (k == "PORT").then(|| "8080".to_string())).unwrap();
        assert_eq!(cfg.listen_addr.to_string(), "0.0.0.0:8080");
        assert_eq!(cfg.body_limit_bytes, DEFAULT_BODY_LIMIT);
    }

    #[test]
    fn listen_addr_wins_over_port() {
        let cfg = ApiConfig::from_lookup(|k| match k {
            "PORT" => Some("8080".to_string()),
            "API_LISTEN_ADDR" => Some("127.0.0.1:9000".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(cfg.listen_addr.to_string(), "127.0.0.1:9000");
    }

    #[test]
    fn invalid_port_is_an_error() {
        let err = ApiConfig::from_lookup(|k| (k == "PORT").then(|| "http".to_string())).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "PORT", .. }));
    }
}
