//! Content-addressed document storage.
//!
//! [`ContentStore`] sits between callers and a [`ContentBackend`]. It
//! optionally seals documents with [`crate::crypto::Cipher`] before they
//! leave the process and opens them again on download. Backends only ever
//! see opaque bytes.
//!
//! Backends provided here:
//!
//! - [`mem::InMemoryBackend`] for tests and throwaway demos,
//! - [`rocksdb::RocksDbBackend`] for a persistent single-node store,
//! - [`ipfs::IpfsBackend`] talking to a Kubo node over its HTTP RPC API.
//!
//! The store does not remember whether an object was encrypted. That flag
//! is returned once in [`StoredObject`]; callers that need it later must
//! keep it themselves.

pub mod any;
pub mod ipfs;
pub mod mem;
pub mod rocksdb;

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::crypto::{Cipher, CryptoError};
use crate::metrics::VaultMetrics;
use crate::types::ContentHash;

pub use self::any::AnyBackend;
pub use self::ipfs::{IpfsBackend, IpfsConfig};
pub use self::mem::InMemoryBackend;
pub use self::rocksdb::{RocksDbBackend, RocksDbConfig};

/// What a backend reports after accepting bytes.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BackendReceipt {
    /// Content address; a pure function of the stored bytes.
    pub address: String,
    /// Size as reported by the backend.
    pub size: u64,
}

/// Object metadata reported by `stat`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectStats {
    pub cid: String,
    pub size: u64,
    pub cumulative_size: u64,
    pub blocks: u64,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Errors surfaced by a backend implementation.
#[derive(Error, Debug)]
pub enum BackendError {
    /// Transport-level failure (connection refused, timeout, I/O error).
    #[error("backend unavailable: {0}")]
    Unavailable(String),
    /// No object stored under this address.
    #[error("object not found: {0}")]
    NotFound(String),
    /// The backend answered with something we could not interpret.
    #[error("backend protocol error: {0}")]
    Protocol(String),
}

/// Abstract content-addressed backend used by [`ContentStore`].
///
/// Implementations must be idempotent: adding the same bytes twice yields
/// the same address.
pub trait ContentBackend: Send + Sync {
    fn add(&self, data: Vec<u8>)
    -> impl Future<Output = Result<BackendReceipt, BackendError>> + Send;

    fn cat(&self, address: &str) -> impl Future<Output = Result<Vec<u8>, BackendError>> + Send;

    fn stat(&self, address: &str)
    -> impl Future<Output = Result<ObjectStats, BackendError>> + Send;
}

/// Errors returned by [`ContentStore`].
#[derive(Error, Debug)]
pub enum StoreError {
    /// Backend unreachable, timed out or misbehaving. Not retried here.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Crypto(#[from] CryptoError),
    /// Downloaded bytes were not the expected format (e.g. not JSON).
    #[error("invalid data: {0}")]
    InvalidData(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<BackendError> for StoreError {
    fn from(e: BackendError) -> Self {
        match e {
            BackendError::NotFound(addr) => StoreError::NotFound(addr),
            other => StoreError::StorageUnavailable(other.to_string()),
        }
    }
}

/// Configuration for [`ContentStore`].
#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Upper bound for every backend call.
    pub timeout: Duration,
    /// Prefix used to build public URLs, e.g. `https://ipfs.io/ipfs/`.
    pub gateway_url: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(300),
            gateway_url: "https://ipfs.io/ipfs/".to_string(),
        }
    }
}

/// Result of an upload. Immutable once returned.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredObject {
    pub content_address: String,
    pub size: u64,
    pub encrypted: bool,
    /// Password needed to open the object; `None` for plaintext uploads.
    pub encryption_key: Option<String>,
    /// SHA-256 of the bytes handed to the backend.
    pub content_hash: ContentHash,
    pub url: String,
}

/// Encrypting front-end over a [`ContentBackend`].
pub struct ContentStore<B> {
    backend: B,
    cipher: Cipher,
    cfg: StoreConfig,
    metrics: Option<VaultMetrics>,
}

impl<B: ContentBackend> ContentStore<B> {
    pub fn new(backend: B, cipher: Cipher, cfg: StoreConfig) -> Self {
        Self {
            backend,
            cipher,
            cfg,
            metrics: None,
        }
    }

    /// Records uploads, downloads and backend latency into `metrics`.
    pub fn with_metrics(mut self, metrics: VaultMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn cipher(&self) -> &Cipher {
        &self.cipher
    }

    /// Stores `data`, sealing it first when `encrypt` is set.
    ///
    /// With `encrypt` and no (or an empty) password, a random key is
    /// generated and returned in [`StoredObject::encryption_key`].
    pub async fn upload(
        &self,
        data: &[u8],
        encrypt: bool,
        password: Option<&str>,
    ) -> Result<StoredObject, StoreError> {
        let (bytes, encryption_key) = if encrypt {
            let sealed = self.seal(data.to_vec(), non_empty(password)).await?;
            (sealed.blob.to_bytes(), Some(sealed.encryption_key))
        } else {
            (data.to_vec(), None)
        };

        let content_hash = ContentHash::of(&bytes);
        let stored_len = bytes.len();
        let receipt = self.bounded("add", self.backend.add(bytes)).await?;

        tracing::info!(
            address = %receipt.address,
            bytes = stored_len,
            encrypted = encrypt,
            "uploaded object"
        );
        if let Some(m) = &self.metrics {
            m.uploads.with_label_values(&[bool_label(encrypt)]).inc();
        }

        Ok(StoredObject {
            url: format!("{}{}", self.cfg.gateway_url, receipt.address),
            content_address: receipt.address,
            size: receipt.size,
            encrypted: encrypt,
            encryption_key,
            content_hash,
        })
    }

    /// Stores a JSON document pretty-printed with two-space indentation.
    pub async fn upload_json(&self, value: &Value, encrypt: bool) -> Result<StoredObject, StoreError> {
        let text = serde_json::to_vec_pretty(value)
            .map_err(|e| StoreError::Internal(format!("failed to serialize metadata: {e}")))?;
        self.upload(&text, encrypt, None).await
    }

    /// Fetches the bytes at `address`, opening them with `password` when
    /// one is given. Without a password the raw stored bytes come back
    /// unchanged, sealed or not.
    pub async fn download(&self, address: &str, password: Option<&str>) -> Result<Vec<u8>, StoreError> {
        let raw = self.bounded("cat", self.backend.cat(address)).await?;

        let decrypt = non_empty(password);
        let result = match decrypt {
            Some(pw) => self.open(raw, pw.to_string()).await,
            None => Ok(raw),
        };

        match (&result, &self.metrics) {
            (Err(StoreError::Crypto(e)), m) => {
                tracing::warn!(address, error = %e, "download failed to decrypt");
                if let Some(m) = m {
                    m.integrity_failures.inc();
                }
            }
            (Ok(_), Some(m)) => {
                m.downloads
                    .with_label_values(&[bool_label(decrypt.is_some())])
                    .inc();
            }
            _ => {}
        }
        result
    }

    /// [`ContentStore::download`] followed by JSON parsing.
    pub async fn download_json(&self, address: &str, password: Option<&str>) -> Result<Value, StoreError> {
        let bytes = self.download(address, password).await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| StoreError::InvalidData(format!("object {address} is not JSON: {e}")))
    }

    pub async fn stat(&self, address: &str) -> Result<ObjectStats, StoreError> {
        self.bounded("stat", self.backend.stat(address)).await
    }

    async fn bounded<T>(
        &self,
        op: &'static str,
        fut: impl Future<Output = Result<T, BackendError>>,
    ) -> Result<T, StoreError> {
        let _timer = self
            .metrics
            .as_ref()
            .map(|m| m.backend_seconds.with_label_values(&[op]).start_timer());

        match tokio::time::timeout(self.cfg.timeout, fut).await {
            Ok(res) => res.map_err(StoreError::from),
            Err(_) => {
                tracing::warn!(op, timeout = ?self.cfg.timeout, "backend call timed out");
                Err(StoreError::StorageUnavailable(format!(
                    "backend {op} timed out after {:?}",
                    self.cfg.timeout
                )))
            }
        }
    }

    // scrypt is deliberately expensive; keep it off the async workers.
    async fn seal(&self, data: Vec<u8>, password: Option<&str>) -> Result<crate::crypto::Sealed, StoreError> {
        let cipher = self.cipher;
        let password = password.map(str::to_string);
        tokio::task::spawn_blocking(move || cipher.encrypt(&data, password.as_deref()))
            .await
            .map_err(|e| StoreError::Internal(format!("encryption task failed: {e}")))?
            .map_err(StoreError::from)
    }

    async fn open(&self, blob: Vec<u8>, password: String) -> Result<Vec<u8>, StoreError> {
        let cipher = self.cipher;
        tokio::task::spawn_blocking(move || cipher.decrypt(&blob, &password))
            .await
            .map_err(|e| StoreError::Internal(format!("decryption task failed: {e}")))?
            .map_err(StoreError::from)
    }
}

/// Recomputes `hash(data)` and compares it with `expected`.
///
/// This guards against accidental corruption only; tampering with sealed
/// objects is caught by the GCM tag instead.
pub fn verify_integrity(data: &[u8], expected: &ContentHash) -> bool {
    ContentHash::of(data) == *expected
}

fn non_empty(password: Option<&str>) -> Option<&str> {
    password.filter(|p| !p.is_empty())
}

fn bool_label(flag: bool) -> &'static str {
    if flag { "true" } else { "false" }
}
