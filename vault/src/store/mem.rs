//! In-memory content backend.
//!
//! This implementation is useful for unit tests and local demos. It keeps
//! all objects in a `HashMap` keyed by the hex SHA-256 of their bytes, so
//! addresses are stable across processes even though the data is not.

use std::collections::HashMap;

use tokio::sync::RwLock;

use super::{BackendError, BackendReceipt, ContentBackend, ObjectStats};
use crate::types::ContentHash;

/// In-memory implementation of [`ContentBackend`].
#[derive(Default)]
pub struct InMemoryBackend {
    objects: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryBackend {
    /// Creates a new, empty in-memory backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of distinct objects currently stored.
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    /// Returns `true` if no objects are stored.
    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

impl ContentBackend for InMemoryBackend {
    async fn add(&self, data: Vec<u8>) -> Result<BackendReceipt, BackendError> {
        let address = ContentHash::of(&data).into_string();
        let size = data.len() as u64;
        self.objects
            .write()
            .await
            .entry(address.clone())
            .or_insert(data);
        Ok(BackendReceipt { address, size })
    }

    async fn cat(&self, address: &str) -> Result<Vec<u8>, BackendError> {
        self.objects
            .read()
            .await
            .get(address)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(address.to_string()))
    }

    async fn stat(&self, address: &str) -> Result<ObjectStats, BackendError> {
        let objects = self.objects.read().await;
        let data = objects
            .get(address)
            .ok_or_else(|| BackendError::NotFound(address.to_string()))?;
        Ok(local_stats(address, data.len() as u64))
    }
}

/// Stats for a single-block object held by a local backend.
pub(crate) fn local_stats(address: &str, size: u64) -> ObjectStats {
    ObjectStats {
        cid: address.to_string(),
        size,
        cumulative_size: size,
        blocks: 1,
        kind: "file".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn add_and_cat_roundtrip() {
        let backend = InMemoryBackend::new();
        let receipt = backend.add(b"hello".to_vec()).await.expect("add");

        assert_eq!(receipt.size, 5);
        assert_eq!(receipt.address, ContentHash::of(b"hello").into_string());
        assert_eq!(backend.cat(&receipt.address).await.unwrap(), b"hello");
        assert_eq!(backend.len().await, 1);
    }

    #[tokio::test]
    async fn adding_same_bytes_is_idempotent() {
        let backend = InMemoryBackend::new();
        let a = backend.add(b"x".to_vec()).await.unwrap();
        let b = backend.add(b"x".to_vec()).await.unwrap();

        assert_eq!(a, b);
        assert_eq!(backend.len().await, 1);
    }

    #[tokio::test]
    async fn missing_objects_are_not_found() {
        let backend = InMemoryBackend::new();
        assert!(backend.is_empty().await);
        assert!(matches!(
            backend.cat("nope").await,
            Err(BackendError::NotFound(_))
        ));
        assert!(matches!(
            backend.stat("nope").await,
            Err(BackendError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn stat_reports_size() {
        let backend = InMemoryBackend::new();
        let r = backend.add(vec![7u8; 42]).await.unwrap();
        let stats = backend.stat(&r.address).await.unwrap();
        assert_eq!(stats.size, 42);
        assert_eq!(stats.cid, r.address);
    }
}
