use async_trait::async_trait;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;
use tracing::info;

use crate::blob::{content_type_for, validate_key, BlobError, BlobStore, StoredBlob};
use crate::config::S3Settings;

/// Blob store backed by an S3 bucket.
pub struct S3BlobStore {
    client: Client,
    bucket: String,
}

impl S3BlobStore {
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// Connects to MinIO (local) or AWS (production) with static credentials.
    pub async fn connect(settings: &S3Settings) -> Self {
        let credentials = Credentials::new(
            &settings.access_key_id,
            &settings.secret_access_key,
            None,
            None,
            "portfolio-static",
        );

        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(settings.region.clone()))
            .credentials_provider(credentials)
            .endpoint_url(&settings.endpoint)
            .load()
            .await;

        // MinIO only understands path-style bucket addressing.
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(true)
            .build();

        info!(
            "S3 blob store targeting bucket '{}' at {}",
            settings.bucket, settings.endpoint
        );
        Self::new(Client::from_conf(s3_config), settings.bucket.clone())
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    fn backend(&self) -> &'static str {
        "s3"
    }

    async fn put(&self, key: &str, bytes: Bytes) -> Result<(), BlobError> {
        validate_key(key)?;
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .content_type(content_type_for(key))
            .send()
            .await
            .map_err(|e| BlobError::S3(format!("upload of {key} failed: {e}")))?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<StoredBlob, BlobError> {
        validate_key(key)?;
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().map(|se| se.is_no_such_key()) == Some(true) {
                    BlobError::NotFound(key.to_string())
                } else {
                    BlobError::S3(format!("download of {key} failed: {e}"))
                }
            })?;

        let data = output
            .body
            .collect()
            .await
            .map_err(|e| BlobError::S3(format!("reading {key} failed: {e}")))?;

        Ok(StoredBlob {
            bytes: data.into_bytes(),
            content_type: content_type_for(key).to_string(),
        })
    }

    async fn delete(&self, key: &str) -> Result<(), BlobError> {
        validate_key(key)?;
        // S3 reports success for absent keys, so NotFound never surfaces here.
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| BlobError::S3(format!("delete of {key} failed: {e}")))?;
        Ok(())
    }
}
