use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tracing::info;

use crate::blob::{content_type_for, validate_key, BlobError, BlobStore, StoredBlob};

/// Blob store backed by a directory on local disk.
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Creates the upload directory if needed and returns a store rooted there.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, BlobError> {
        let store = Self::new(root);
        tokio::fs::create_dir_all(&store.root).await?;
        info!("Local blob store ready at {}", store.root().display());
        Ok(store)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, BlobError> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    fn backend(&self) -> &'static str {
        "local"
    }

    async fn put(&self, key: &str, bytes: Bytes) -> Result<(), BlobError> {
        let path = self.path_for(key)?;
        // Write beside the target first; dot-prefixed names are never servable keys.
        let partial = self.root.join(format!(".{key}.partial"));
        let written = async {
            tokio::fs::write(&partial, &bytes).await?;
            tokio::fs::rename(&partial, &path).await
        }
        .await;

        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<StoredBlob, BlobError> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(StoredBlob {
                bytes: Bytes::from(data),
                content_type: content_type_for(key).to_string(),
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(BlobError::NotFound(key.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), BlobError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(BlobError::NotFound(key.to_string())),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("nested").join("uploads");

        let store = LocalBlobStore::open(&root).await.unwrap();

        assert!(store.root().is_dir());
    }

    #[tokio::test]
    async fn test_put_get_delete_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path());

        store
            .put("cv.pdf", Bytes::from_static(b"%PDF-1.7"))
            .await
            .unwrap();

        let blob = store.get("cv.pdf").await.unwrap();
        assert_eq!(&blob.bytes[..], b"%PDF-1.7");
        assert_eq!(blob.content_type, "application/pdf");

        // Only the final file is left behind, no partial writes.
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["cv.pdf".to_string()]);

        store.delete("cv.pdf").await.unwrap();
        assert!(matches!(
            store.get("cv.pdf").await,
            Err(BlobError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_missing_blob_reports_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path());

        assert!(matches!(
            store.delete("gone.pdf").await,
            Err(BlobError::NotFound(key)) if key == "gone.pdf"
        ));
    }

    #[tokio::test]
    async fn test_keys_outside_the_namespace_are_refused() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path().join("uploads"));

        let err = store
            .put("../escape.txt", Bytes::from_static(b"x"))
            .await
            .unwrap_err();
        assert!(matches!(err, BlobError::InvalidKey(_)));
        assert!(!dir.path().join("escape.txt").exists());
    }

    #[tokio::test]
    async fn test_failed_put_leaves_no_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path());
        // A non-empty directory where the blob should land makes the final rename fail.
        std::fs::create_dir_all(dir.path().join("taken.pdf").join("inner")).unwrap();

        let err = store
            .put("taken.pdf", Bytes::from_static(b"%PDF"))
            .await
            .unwrap_err();

        assert!(matches!(err, BlobError::Io(_)));
        assert!(!dir.path().join(".taken.pdf.partial").exists());
    }

    #[tokio::test]
    async fn test_put_into_missing_directory_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path().join("not-created"));

        let err = store
            .put("cv.pdf", Bytes::from_static(b"%PDF"))
            .await
            .unwrap_err();

        assert!(matches!(err, BlobError::Io(_)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
