//! Object storage for uploaded applicant photos and signatures.
//!
//! Three backends implement [`ObjectStorage`]:
//!
//! - [`LocalObjectStorage`]: files under a base directory, served by the API
//!   at `/uploads`.
//! - [`S3ObjectStorage`]: an S3 bucket via `aws-sdk-s3`.
//! - [`MemoryObjectStorage`]: process memory, for tests and demos.
//!
//! Uploads overwrite whatever is stored at the same path.

use std::path::PathBuf;
use std::sync::Arc;

use admissions_core::submission::{CollaboratorError, ObjectStorage};

pub mod local;
pub mod memory;
pub mod s3;

pub use local::LocalObjectStorage;
pub use memory::MemoryObjectStorage;
pub use s3::S3ObjectStorage;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Invalid object path '{0}'")]
    InvalidPath(String),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Storage configuration error: {0}")]
    Config(String),
}

impl From<StorageError> for CollaboratorError {
    fn from(e: StorageError) -> Self {
        CollaboratorError(e.to_string())
    }
}

/// Reject paths that could escape the storage root.
///
/// Paths are relative, `/`-separated, and may not contain empty, `.` or
/// `..` segments.
pub fn validate_path(path: &str) -> Result<(), StorageError> {
    let invalid = path.is_empty()
        || path.starts_with('/')
        || path.contains('\\')
        || path
            .split('/')
            .any(|seg| seg.is_empty() || seg == "." || seg == "..");
    if invalid {
        Err(StorageError::InvalidPath(path.to_string()))
    } else {
        Ok(())
    }
}

/// Join a base URL and an object path with exactly one slash.
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    Local {
        base_dir: PathBuf,
        public_base_url: String,
    },
    S3 {
        bucket: String,
        public_base_url: String,
    },
    Memory {
        public_base_url: String,
    },
}

impl StorageConfig {
    /// Load the backend selection from environment variables.
    ///
    /// | Env Var                   | Default                          |
    /// |---------------------------|----------------------------------|
    /// | `STORAGE_BACKEND`         | `local` (`local`, `s3`, `memory`) |
    /// | `STORAGE_LOCAL_DIR`       | `./uploads`                      |
    /// | `STORAGE_PUBLIC_BASE_URL` | `http://localhost:3000/uploads`  |
    /// | `S3_BUCKET`               | required for `s3`                |
    /// | `S3_PUBLIC_BASE_URL`      | `https://<bucket>.s3.amazonaws.com` |
    pub fn from_env() -> Result<Self, StorageError> {
        let backend = std::env::var("STORAGE_BACKEND").unwrap_or_else(|_| "local".into());
        let public_base_url = std::env::var("STORAGE_PUBLIC_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3000/uploads".into());

        match backend.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local {
                base_dir: std::env::var("STORAGE_LOCAL_DIR")
                    .unwrap_or_else(|_| "./uploads".into())
                    .into(),
                public_base_url,
            }),
            "s3" => {
                let bucket = std::env::var("S3_BUCKET").map_err(|_| {
                    StorageError::Config("S3_BUCKET must be set when STORAGE_BACKEND=s3".into())
                })?;
                let public_base_url = std::env::var("S3_PUBLIC_BASE_URL")
                    .unwrap_or_else(|_| format!("https://{bucket}.s3.amazonaws.com"));
                Ok(Self::S3 {
                    bucket,
                    public_base_url,
                })
            }
            "memory" => Ok(Self::Memory { public_base_url }),
            other => Err(StorageError::Config(format!(
                "Unknown STORAGE_BACKEND '{other}'. Must be one of: local, s3, memory"
            ))),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::Local { .. } => "local",
            Self::S3 { .. } => "s3",
            Self::Memory { .. } => "memory",
        }
    }

    /// Directory to serve at `/uploads`, for the local backend only.
    pub fn local_dir(&self) -> Option<&PathBuf> {
        match self {
            Self::Local { base_dir, .. } => Some(base_dir),
            _ => None,
        }
    }
}

/// Construct the configured backend.
pub async fn connect(config: &StorageConfig) -> Result<Arc<dyn ObjectStorage>, StorageError> {
    let storage: Arc<dyn ObjectStorage> = match config {
        StorageConfig::Local {
            base_dir,
            public_base_url,
        } => Arc::new(LocalObjectStorage::new(base_dir.clone(), public_base_url.clone()).await?),
        StorageConfig::S3 {
            bucket,
            public_base_url,
        } => Arc::new(S3ObjectStorage::from_env(bucket.clone(), public_base_url.clone()).await),
        StorageConfig::Memory { public_base_url } => {
            Arc::new(MemoryObjectStorage::new(public_base_url.clone()))
        }
    };
    tracing::info!(backend = config.backend_name(), "Object storage ready");
    Ok(storage)
}
