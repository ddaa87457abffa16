// Blob storage seam. Raw exports and dashboard documents live in (possibly different) stores.

mod fs;
mod memory;

pub use fs::FsBlobStore;
pub use memory::MemoryBlobStore;

use std::collections::BTreeSet;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BlobStoreError {
    #[error("blob not found: {0}")]
    NotFound(String),
    #[error("invalid blob key {0:?}")]
    InvalidKey(String),
    #[error("blob store I/O on {key:?}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("blob store backend: {0}")]
    Backend(String),
}

impl BlobStoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, BlobStoreError::NotFound(_))
    }
}

/// Object-store style access: flat string keys, `/` as the conventional separator.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Keys starting with `prefix`, ascending.
    async fn list(&self, prefix: &str) -> Result<Vec<String>, BlobStoreError>;

    /// Distinct key prefixes up to and including the first `delimiter`, ascending.
    /// Keys without the delimiter are not reported.
    async fn list_common_prefixes(&self, delimiter: &str) -> Result<Vec<String>, BlobStoreError>;

    async fn get(&self, key: &str) -> Result<Bytes, BlobStoreError>;

    async fn put(&self, key: &str, body: Bytes) -> Result<(), BlobStoreError>;

    /// Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), BlobStoreError>;
}

pub(crate) fn common_prefixes<'a, I>(keys: I, delimiter: &str) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    if delimiter.is_empty() {
        return Vec::new();
    }
    keys.into_iter()
        .filter_map(|key| {
            key.find(delimiter)
                .map(|idx| key[..idx + delimiter.len()].to_string())
        })
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
