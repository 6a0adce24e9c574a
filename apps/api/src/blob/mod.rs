//! Blob Store — durable storage for uploaded attachments, addressed by a
//! server-generated key.
//!
//! `AppState` reaches the active backend through `Arc<dyn BlobStore>`, chosen at
//! startup from `BLOB_BACKEND`.

pub mod keys;
pub mod local;
pub mod s3;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

pub use keys::{content_type_for, generate_storage_key, public_path, serves_inline, validate_key};
pub use local::LocalBlobStore;
pub use s3::S3BlobStore;

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("Blob '{0}' does not exist")]
    NotFound(String),

    #[error("Invalid blob key '{0}'")]
    InvalidKey(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("S3 error: {0}")]
    S3(String),
}

/// Bytes read back from the store, with the content type to serve them under.
#[derive(Debug, Clone)]
pub struct StoredBlob {
    pub bytes: Bytes,
    pub content_type: String,
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Short backend name for logs.
    fn backend(&self) -> &'static str;

    /// Stores `bytes` under `key`. The served content type always follows the key's
    /// extension, never what the client claimed.
    async fn put(&self, key: &str, bytes: Bytes) -> Result<(), BlobError>;

    async fn get(&self, key: &str) -> Result<StoredBlob, BlobError>;

    /// Removes a blob. Returns `BlobError::NotFound` if there was nothing to remove.
    async fn delete(&self, key: &str) -> Result<(), BlobError>;
}
