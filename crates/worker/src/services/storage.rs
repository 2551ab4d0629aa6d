//! S3-compatible object storage client.
//!
//! Uploads finished artifacts and produces presigned download links.
//! The endpoint is a custom S3-compatible host, so the client is built
//! with an explicit endpoint URL and path-style addressing.

use std::time::Duration;

use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use thiserror::Error;

use crate::config::StorageConfig;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload of '{key}' failed: {message}")]
    Upload { key: String, message: String },

    #[error("Presigning of '{key}' failed: {message}")]
    Presign { key: String, message: String },
}

/// Client handle for one bucket on an S3-compatible endpoint.
///
/// Constructed once at startup and injected into the services that
/// need it; nothing here is process-global.
#[derive(Clone)]
pub struct ObjectStorage {
    client: Client,
    bucket: String,
    link_expiry: Duration,
}

impl ObjectStorage {
    pub async fn new(config: &StorageConfig) -> Self {
        let credentials = Credentials::new(
            config.access_key_id.clone(),
            config.secret_access_key.clone(),
            None,
            None,
            "export-worker",
        );

        let base = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .endpoint_url(format!("https://{}", config.host))
            .load()
            .await;

        let s3_config = aws_sdk_s3::config::Builder::from(&base)
            .force_path_style(true)
            .build();

        Self {
            client: Client::from_conf(s3_config),
            bucket: config.bucket.clone(),
            link_expiry: Duration::from_secs(config.link_expiry_secs),
        }
    }

    /// Uploads the artifact bytes under the given object key.
    pub async fn upload(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| StorageError::Upload {
                key: key.to_string(),
                message: e.to_string(),
            })?;

        tracing::info!(key = %key, bucket = %self.bucket, "Artifact uploaded");
        Ok(())
    }

    /// Presigns a GET for the object, valid for the configured expiry.
    pub async fn presign_download(&self, key: &str) -> Result<String, StorageError> {
        let presigning = PresigningConfig::expires_in(self.link_expiry).map_err(|e| {
            StorageError::Presign {
                key: key.to_string(),
                message: e.to_string(),
            }
        })?;

        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| StorageError::Presign {
                key: key.to_string(),
                message: e.to_string(),
            })?;

        Ok(request.uri().to_string())
    }
}
