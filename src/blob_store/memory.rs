// In-process blob store, used by tests and dry runs.

use std::collections::BTreeMap;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;

use super::{BlobStore, BlobStoreError, common_prefixes};

#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<BTreeMap<String, Bytes>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.blobs.read().await.contains_key(key)
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn list(&self, prefix: &str) -> Result<Vec<String>, BlobStoreError> {
        let blobs = self.blobs.read().await;
        Ok(blobs
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect())
    }

    async fn list_common_prefixes(&self, delimiter: &str) -> Result<Vec<String>, BlobStoreError> {
        let blobs = self.blobs.read().await;
        Ok(common_prefixes(blobs.keys().map(String::as_str), delimiter))
    }

    async fn get(&self, key: &str) -> Result<Bytes, BlobStoreError> {
        self.blobs
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| BlobStoreError::NotFound(key.to_string()))
    }

    async fn put(&self, key: &str, body: Bytes) -> Result<(), BlobStoreError> {
        if key.is_empty() {
            return Err(BlobStoreError::InvalidKey(key.to_string()));
        }
        self.blobs.write().await.insert(key.to_string(), body);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), BlobStoreError> {
        self.blobs.write().await.remove(key);
        Ok(())
    }
}
