//! In-memory backend.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use admissions_core::submission::{CollaboratorError, ObjectStorage};
use async_trait::async_trait;

use crate::{join_url, validate_path};

/// A stored object and its declared content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

#[derive(Debug, Default)]
pub struct MemoryObjectStorage {
    public_base_url: String,
    objects: Mutex<HashMap<String, StoredObject>>,
}

impl MemoryObjectStorage {
    pub fn new(public_base_url: impl Into<String>) -> Self {
        Self {
            public_base_url: public_base_url.into(),
            objects: Mutex::default(),
        }
    }

    fn objects(&self) -> MutexGuard<'_, HashMap<String, StoredObject>> {
        self.objects.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn get(&self, path: &str) -> Option<StoredObject> {
        self.objects().get(path).cloned()
    }

    /// Stored paths in sorted order.
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.objects().keys().cloned().collect();
        paths.sort();
        paths
    }
}

#[async_trait]
impl ObjectStorage for MemoryObjectStorage {
    async fn upload(
        &self,
        path: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<String, CollaboratorError> {
        validate_path(path)?;
        self.objects().insert(
            path.to_string(),
            StoredObject {
                bytes: bytes.to_vec(),
                content_type: content_type.to_string(),
            },
        );
        Ok(path.to_string())
    }

    fn public_url(&self, path: &str) -> String {
        join_url(&self.public_base_url, path)
    }
}
