//! Runtime-selected backend.
//!
//! [`ContentBackend`] uses `impl Future` returns and is therefore not
//! object safe. The gateway picks its backend from configuration at
//! startup, so the choice is expressed as an enum instead of a trait
//! object.

use super::ipfs::{IpfsBackend, IpfsConfig};
use super::mem::InMemoryBackend;
use super::rocksdb::{RocksDbBackend, RocksDbConfig};
use super::{BackendError, BackendReceipt, ContentBackend, ObjectStats};
use crate::config::{BackendKind, VaultConfig};

/// One of the backends shipped with this crate.
pub enum AnyBackend {
    Memory(InMemoryBackend),
    RocksDb(RocksDbBackend),
    Ipfs(IpfsBackend),
}

impl AnyBackend {
    /// Builds the backend named by `cfg.backend`.
    pub fn from_config(cfg: &VaultConfig) -> Result<Self, BackendError> {
        match cfg.backend {
            BackendKind::Memory => Ok(AnyBackend::Memory(InMemoryBackend::new())),
            BackendKind::RocksDb => Self::rocksdb(&cfg.rocksdb),
            BackendKind::Ipfs => Self::ipfs(&cfg.ipfs),
        }
    }

    pub fn rocksdb(cfg: &RocksDbConfig) -> Result<Self, BackendError> {
        RocksDbBackend::open(cfg).map(AnyBackend::RocksDb)
    }

    pub fn ipfs(cfg: &IpfsConfig) -> Result<Self, BackendError> {
        IpfsBackend::new(cfg).map(AnyBackend::Ipfs)
    }

    /// Short name used in logs and the metrics `backend` label.
    pub fn kind(&self) -> &'static str {
        match self {
            AnyBackend::Memory(_) => "memory",
            AnyBackend::RocksDb(_) => "rocksdb",
            AnyBackend::Ipfs(_) => "ipfs",
        }
    }
}

impl From<InMemoryBackend> for AnyBackend {
    fn from(b: InMemoryBackend) -> Self {
        AnyBackend::Memory(b)
    }
}

impl ContentBackend for AnyBackend {
    async fn add(&self, data: Vec<u8>) -> Result<BackendReceipt, BackendError> {
        match self {
            AnyBackend::Memory(b) => b.add(data).await,
            AnyBackend::RocksDb(b) => b.add(data).await,
            AnyBackend::Ipfs(b) => b.add(data).await,
        }
    }

    async fn cat(&self, address: &str) -> Result<Vec<u8>, BackendError> {
        match self {
            AnyBackend::Memory(b) => b.cat(address).await,
            AnyBackend::RocksDb(b) => b.cat(address).await,
            AnyBackend::Ipfs(b) => b.cat(address).await,
        }
    }

    async fn stat(&self, address: &str) -> Result<ObjectStats, BackendError> {
        match self {
            AnyBackend::Memory(b) => b.stat(address).await,
            AnyBackend::RocksDb(b) => b.stat(address).await,
            AnyBackend::Ipfs(b) => b.stat(address).await,
        }
    }
}
