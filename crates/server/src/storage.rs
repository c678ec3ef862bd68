//! Object storage abstraction for certification documents.
//!
//! Production fronts the store with the provider's pre-signed URLs; the
//! service itself only needs deterministic puts and stable URLs.

use crate::error::StorageError;
use std::path::PathBuf;

/// Write-side interface to the document object store.
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync + std::fmt::Debug {
    /// Store `bytes` under `key`. Keys are hash-derived, so overwriting an
    /// existing key with identical content is harmless.
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError>;

    /// Public URL a stored object is served from.
    fn url_for(&self, key: &str) -> String;
}

/// Filesystem-backed store. Keys are slash-separated relative paths.
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
    public_base_url: String,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into(),
        }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        // Keys come from content hashes, but reject traversal anyway.
        if key.is_empty() || key.starts_with('/') || key.split('/').any(|part| part == "..") {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(key))
    }
}

#[async_trait::async_trait]
impl ObjectStore for FsObjectStore {
    #[tracing::instrument(skip(self, bytes), fields(key = %key, size = bytes.len()))]
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        Ok(())
    }

    fn url_for(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url.trim_end_matches('/'), key)
    }
}
