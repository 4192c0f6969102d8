//! Filesystem backend.

use std::path::{Path, PathBuf};

use admissions_core::submission::{CollaboratorError, ObjectStorage};
use async_trait::async_trait;

use crate::{join_url, validate_path, StorageError};

#[derive(Debug, Clone)]
pub struct LocalObjectStorage {
    base_dir: PathBuf,
    public_base_url: String,
}

impl LocalObjectStorage {
    /// Create the base directory if needed.
    pub async fn new(base_dir: PathBuf, public_base_url: String) -> Result<Self, StorageError> {
        tokio::fs::create_dir_all(&base_dir).await?;
        Ok(Self {
            base_dir,
            public_base_url,
        })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Write `bytes` to `<base_dir>/<path>`, creating parent directories.
    pub async fn put(&self, path: &str, bytes: &[u8]) -> Result<PathBuf, StorageError> {
        validate_path(path)?;
        let target = self.base_dir.join(path);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, bytes).await?;
        tracing::debug!(path, size = bytes.len(), "Stored object on local disk");
        Ok(target)
    }
}

#[async_trait]
impl ObjectStorage for LocalObjectStorage {
    async fn upload(
        &self,
        path: &str,
        bytes: &[u8],
        _content_type: &str,
    ) -> Result<String, CollaboratorError> {
        self.put(path, bytes).await?;
        Ok(path.to_string())
    }

    fn public_url(&self, path: &str) -> String {
        join_url(&self.public_base_url, path)
    }
}
