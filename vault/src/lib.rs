//! Vault library crate.
//!
//! This crate provides the encrypted, content-addressed document store and
//! the integrity proofs behind the patent registry:
//!
//! - strongly-typed domain types (`types`),
//! - hashing and password-based sealing of documents (`crypto`),
//! - a content store over pluggable backends (`store`),
//! - Merkle, commitment and originality proofs (`proofs`),
//! - the in-process patent registry (`registry`),
//! - Prometheus-based metrics (`metrics`),
//! - and a top-level configuration (`config`).
//!
//! The `api-gateway` binary composes these pieces behind an HTTP API.

pub mod config;
pub mod crypto;
pub mod metrics;
pub mod proofs;
pub mod registry;
pub mod store;
pub mod types;

// Re-export top-level configuration types.
pub use config::{BackendKind, ConfigError, MetricsConfig, VaultConfig};

pub use crypto::{Cipher, CryptoError, EncryptedBlob, KdfParams};

// Re-export the content store and its backends.
pub use store::{
    AnyBackend, BackendError, ContentBackend, ContentStore, InMemoryBackend, IpfsBackend,
    IpfsConfig, ObjectStats, RocksDbBackend, RocksDbConfig, StoreConfig, StoreError, StoredObject,
    verify_integrity,
};

pub use proofs::{MerkleTree, OriginalityProof, ProofError, ProofStep};
pub use registry::{IdGenerator, PatentRegistry, RegisterPatent, RegistryError};

// Re-export metrics registry and vault metrics.
pub use metrics::{MetricsRegistry, VaultMetrics, run_prometheus_http_server};

// Re-export domain types at the crate root for convenience.
pub use types::*;

/// Type alias for the content store used by the gateway, whose backend is
/// chosen at startup.
pub type DefaultContentStore = ContentStore<AnyBackend>;
