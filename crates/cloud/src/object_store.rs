//! Artifact storage.

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use storymill_core::PipelineError;

/// Durable blob storage with time-limited retrieval URLs.
///
/// Keys are derived from the story id and artifact kind, so re-processing
/// the same event overwrites the same object instead of accumulating
/// duplicates.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store (or overwrite) an object.
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), PipelineError>;

    /// A presigned GET URL valid for `ttl_secs`.
    async fn presigned_get_url(&self, key: &str, ttl_secs: u64) -> Result<String, PipelineError>;
}

/// S3-backed [`ObjectStore`] for a single bucket.
pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3ObjectStore {
    pub fn new(client: aws_sdk_s3::Client, bucket: String) -> Self {
        Self { client, bucket }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), PipelineError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(PipelineError::upstream)?;

        tracing::debug!(bucket = %self.bucket, key, "Stored artifact");
        Ok(())
    }

    async fn presigned_get_url(&self, key: &str, ttl_secs: u64) -> Result<String, PipelineError> {
        let config = PresigningConfig::expires_in(Duration::from_secs(ttl_secs))
            .map_err(PipelineError::upstream)?;

        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(config)
            .await
            .map_err(PipelineError::upstream)?;

        Ok(presigned.uri().to_string())
    }
}
