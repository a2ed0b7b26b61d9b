//! RocksDB-backed content backend.
//!
//! Objects are persisted in a dedicated column family:
//!
//! - `"objects"`: maps the hex SHA-256 address -> raw object bytes.
//!
//! Writes are idempotent because the key is derived from the value.

use std::path::Path;

use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, Options};

use super::mem::local_stats;
use super::{BackendError, BackendReceipt, ContentBackend, ObjectStats};
use crate::types::ContentHash;

const CF_OBJECTS: &str = "objects";

/// Configuration for [`RocksDbBackend`].
#[derive(Clone, Debug)]
pub struct RocksDbConfig {
    /// Filesystem path to the RocksDB database directory.
    pub path: String,
    /// Whether to create the database and missing column families if they
    /// do not yet exist.
    pub create_if_missing: bool,
}

impl Default for RocksDbConfig {
    fn default() -> Self {
        Self {
            path: "data/vault-db".to_string(),
            create_if_missing: true,
        }
    }
}

impl From<rocksdb::Error> for BackendError {
    fn from(e: rocksdb::Error) -> Self {
        BackendError::Unavailable(format!("rocksdb: {e}"))
    }
}

/// RocksDB-backed implementation of [`ContentBackend`].
pub struct RocksDbBackend {
    db: DB,
}

impl RocksDbBackend {
    /// Opens (or creates) a store at the configured path.
    ///
    /// The `"default"` column family is also opened to keep RocksDB happy,
    /// but it is not used.
    pub fn open(cfg: &RocksDbConfig) -> Result<Self, BackendError> {
        let path = Path::new(&cfg.path);

        let mut opts = Options::default();
        opts.create_if_missing(cfg.create_if_missing);
        opts.create_missing_column_families(cfg.create_if_missing);

        let cfs = vec![
            ColumnFamilyDescriptor::new("default", Options::default()),
            ColumnFamilyDescriptor::new(CF_OBJECTS, Options::default()),
        ];

        let db = DB::open_cf_descriptors(&opts, path, cfs)?;
        tracing::info!(path = %cfg.path, "opened RocksDB content store");

        Ok(Self { db })
    }

    fn cf_objects(&self) -> Result<&ColumnFamily, BackendError> {
        self.db
            .cf_handle(CF_OBJECTS)
            .ok_or_else(|| BackendError::Unavailable(format!("missing column family {CF_OBJECTS}")))
    }
}

impl ContentBackend for RocksDbBackend {
    async fn add(&self, data: Vec<u8>) -> Result<BackendReceipt, BackendError> {
        let address = ContentHash::of(&data).into_string();
        let cf = self.cf_objects()?;
        self.db.put_cf(cf, address.as_bytes(), &data)?;

        Ok(BackendReceipt {
            address,
            size: data.len() as u64,
        })
    }

    async fn cat(&self, address: &str) -> Result<Vec<u8>, BackendError> {
        let cf = self.cf_objects()?;
        self.db
            .get_cf(cf, address.as_bytes())?
            .ok_or_else(|| BackendError::NotFound(address.to_string()))
    }

    async fn stat(&self, address: &str) -> Result<ObjectStats, BackendError> {
        let cf = self.cf_objects()?;
        let value = self
            .db
            .get_pinned_cf(cf, address.as_bytes())?
            .ok_or_else(|| BackendError::NotFound(address.to_string()))?;
        Ok(local_stats(address, value.len() as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_temp() -> (TempDir, RocksDbBackend) {
        let tmp = TempDir::new().expect("create temp dir");
        let cfg = RocksDbConfig {
            path: tmp.path().to_string_lossy().to_string(),
            create_if_missing: true,
        };
        let backend = RocksDbBackend::open(&cfg).expect("open RocksDB");
        (tmp, backend)
    }

    #[tokio::test]
    async fn rocksdb_roundtrip_and_stat() {
        let (_tmp, backend) = open_temp();

        let receipt = backend.add(b"sealed bytes".to_vec()).await.expect("add");
        assert_eq!(receipt.address, ContentHash::of(b"sealed bytes").into_string());

        let fetched = backend.cat(&receipt.address).await.expect("cat");
        assert_eq!(fetched, b"sealed bytes");

        let stats = backend.stat(&receipt.address).await.expect("stat");
        assert_eq!(stats.size, 12);
    }

    #[tokio::test]
    async fn rocksdb_objects_survive_reopen() {
        let tmp = TempDir::new().expect("create temp dir");
        let cfg = RocksDbConfig {
            path: tmp.path().to_string_lossy().to_string(),
            create_if_missing: true,
        };

        let address = {
            let backend = RocksDbBackend::open(&cfg).expect("open");
            backend.add(b"persisted".to_vec()).await.unwrap().address
        };

        let backend = RocksDbBackend::open(&cfg).expect("reopen");
        assert_eq!(backend.cat(&address).await.unwrap(), b"persisted");
    }

    #[tokio::test]
    async fn rocksdb_missing_key_is_not_found() {
        let (_tmp, backend) = open_temp();
        assert!(matches!(
            backend.cat("absent").await,
            Err(BackendError::NotFound(_))
        ));
    }
}
