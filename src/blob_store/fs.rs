// Directory-backed blob store: one root directory per bucket, keys are relative paths.
// Writes go to a `.partial` sibling and are renamed into place.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tracing::instrument;

use super::{BlobStore, BlobStoreError, common_prefixes};

const PARTIAL_SUFFIX: &str = ".partial";

#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, BlobStoreError> {
        let relative = Path::new(key);
        let valid = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !valid {
            return Err(BlobStoreError::InvalidKey(key.to_string()));
        }
        Ok(key
            .split('/')
            .filter(|s| !s.is_empty())
            .fold(self.root.clone(), |p, s| p.join(s)))
    }

    /// Directory under which every key with `prefix` must live.
    fn search_dir(&self, prefix: &str) -> PathBuf {
        match prefix.rfind('/') {
            Some(idx) => prefix[..idx]
                .split('/')
                .filter(|s| !s.is_empty() && *s != "." && *s != "..")
                .fold(self.root.clone(), |p, s| p.join(s)),
            None => self.root.clone(),
        }
    }

    fn key_for(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let parts: Option<Vec<&str>> = relative
            .components()
            .map(|c| c.as_os_str().to_str())
            .collect();
        Some(parts?.join("/"))
    }

    async fn walk(&self, start: PathBuf) -> Result<Vec<String>, BlobStoreError> {
        let mut keys = Vec::new();
        let mut pending = vec![start];
        while let Some(dir) = pending.pop() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(io_error(&dir, e)),
            };
            while let Some(entry) = entries.next_entry().await.map_err(|e| io_error(&dir, e))? {
                let file_type = entry.file_type().await.map_err(|e| io_error(&entry.path(), e))?;
                let path = entry.path();
                if file_type.is_dir() {
                    pending.push(path);
                } else if file_type.is_file()
                    && let Some(key) = self.key_for(&path)
                    && !key.ends_with(PARTIAL_SUFFIX)
                {
                    keys.push(key);
                }
            }
        }
        Ok(keys)
    }

    /// Non-empty directories directly under the root, without descending into them.
    async fn top_level_dirs(&self) -> Result<Vec<String>, BlobStoreError> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error(&self.root, e)),
        };
        let mut dirs = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| io_error(&self.root, e))? {
            let path = entry.path();
            let file_type = entry.file_type().await.map_err(|e| io_error(&path, e))?;
            if !file_type.is_dir() {
                continue;
            }
            let mut children = tokio::fs::read_dir(&path).await.map_err(|e| io_error(&path, e))?;
            let occupied = children.next_entry().await.map_err(|e| io_error(&path, e))?.is_some();
            if occupied && let Some(name) = entry.file_name().to_str() {
                dirs.push(name.to_string());
            }
        }
        dirs.sort();
        Ok(dirs)
    }
}

fn io_error(path: &Path, source: std::io::Error) -> BlobStoreError {
    BlobStoreError::Io {
        key: path.display().to_string(),
        source,
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    #[instrument(skip(self), fields(store = "fs", operation = "list"))]
    async fn list(&self, prefix: &str) -> Result<Vec<String>, BlobStoreError> {
        let mut keys: Vec<String> = self
            .walk(self.search_dir(prefix))
            .await?
            .into_iter()
            .filter(|k| k.starts_with(prefix))
            .collect();
        keys.sort();
        Ok(keys)
    }

    #[instrument(skip(self), fields(store = "fs", operation = "list_common_prefixes"))]
    async fn list_common_prefixes(&self, delimiter: &str) -> Result<Vec<String>, BlobStoreError> {
        if delimiter == "/" {
            let dirs = self.top_level_dirs().await?;
            return Ok(dirs.into_iter().map(|d| format!("{d}/")).collect());
        }
        let keys = self.walk(self.root.clone()).await?;
        Ok(common_prefixes(keys.iter().map(String::as_str), delimiter))
    }

    async fn get(&self, key: &str) -> Result<Bytes, BlobStoreError> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(BlobStoreError::NotFound(key.to_string()))
            }
            Err(source) => Err(BlobStoreError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    #[instrument(skip(self, body), fields(store = "fs", operation = "put", bytes = body.len()))]
    async fn put(&self, key: &str, body: Bytes) -> Result<(), BlobStoreError> {
        let path = self.path_for(key)?;
        let to_io = |source| BlobStoreError::Io {
            key: key.to_string(),
            source,
        };
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(to_io)?;
        }
        let mut partial = path.clone().into_os_string();
        partial.push(PARTIAL_SUFFIX);
        let partial = PathBuf::from(partial);
        tokio::fs::write(&partial, &body).await.map_err(to_io)?;
        tokio::fs::rename(&partial, &path).await.map_err(to_io)?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), BlobStoreError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(BlobStoreError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }
}
