//! S3 backend.

use admissions_core::submission::{CollaboratorError, ObjectStorage};
use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;

use crate::{join_url, validate_path, StorageError};

#[derive(Debug, Clone)]
pub struct S3ObjectStorage {
    client: aws_sdk_s3::Client,
    bucket: String,
    public_base_url: String,
}

impl S3ObjectStorage {
    pub fn new(client: aws_sdk_s3::Client, bucket: String, public_base_url: String) -> Self {
        Self {
            client,
            bucket,
            public_base_url,
        }
    }

    /// Build a client from the standard AWS environment (region, credentials).
    pub async fn from_env(bucket: String, public_base_url: String) -> Self {
        let sdk_config = aws_config::load_from_env().await;
        Self::new(aws_sdk_s3::Client::new(&sdk_config), bucket, public_base_url)
    }

    pub async fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<(), StorageError> {
        validate_path(key)?;
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(bytes.to_vec()))
            .send()
            .await
            .map_err(|e| StorageError::Backend(DisplayErrorContext(&e).to_string()))?;
        tracing::debug!(bucket = %self.bucket, key, size = bytes.len(), "Stored object in S3");
        Ok(())
    }
}

#[async_trait]
impl ObjectStorage for S3ObjectStorage {
    async fn upload(
        &self,
        path: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<String, CollaboratorError> {
        self.put(path, bytes, content_type).await?;
        Ok(path.to_string())
    }

    fn public_url(&self, path: &str) -> String {
        join_url(&self.public_base_url, path)
    }
}
