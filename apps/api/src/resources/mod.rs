//! Resource Store — accepts uploaded attachments, ties them to catalog records,
//! and keeps the résumé a singleton while projects accumulate.
//!
//! Résumé replacement is stage-then-swap: the new blob is written first, the
//! catalog swaps rows in one transaction, and only then are the displaced blobs
//! removed. A failed upload therefore never leaves the site without a résumé.

pub mod handlers;
pub mod upload;

use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::blob::{generate_storage_key, public_path, BlobError, BlobStore, StoredBlob};
use crate::catalog::Catalog;
use crate::errors::AppError;
use crate::models::{NewProject, NewResume, ProjectRecord, ResumeRecord};

/// A file received in a multipart request.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Bytes,
}

impl Upload {
    /// Browsers submit an empty, unnamed part when a file input is left blank.
    pub fn is_blank(&self) -> bool {
        self.file_name.is_empty() && self.bytes.is_empty()
    }
}

/// Free-text project fields. No format validation is applied.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectFields {
    pub title: String,
    pub description: String,
    pub github_link: String,
    pub live_link: String,
}

#[derive(Clone)]
pub struct ResourceStore {
    catalog: Arc<dyn Catalog>,
    blobs: Arc<dyn BlobStore>,
}

impl ResourceStore {
    pub fn new(catalog: Arc<dyn Catalog>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { catalog, blobs }
    }

    pub async fn submit_project(
        &self,
        fields: ProjectFields,
        image: Option<Upload>,
    ) -> Result<ProjectRecord, AppError> {
        let image_key = match image.filter(|u| !u.is_blank()) {
            Some(upload) => Some(self.store_upload(upload).await?),
            None => None,
        };

        let project = NewProject {
            title: fields.title,
            description: fields.description,
            github_link: fields.github_link,
            live_link: fields.live_link,
            image: image_key.as_deref().map(public_path).unwrap_or_default(),
        };

        match self.catalog.insert_project(project).await {
            Ok(record) => {
                info!("Inserted project {} ({:?})", record.id, record.title);
                Ok(record)
            }
            Err(e) => {
                if let Some(key) = image_key {
                    self.discard(&key).await;
                }
                Err(e.into())
            }
        }
    }

    pub async fn list_projects(&self) -> Result<Vec<ProjectRecord>, AppError> {
        Ok(self.catalog.list_projects().await?)
    }

    pub async fn submit_resume(&self, upload: Option<Upload>) -> Result<ResumeRecord, AppError> {
        let upload = upload
            .filter(|u| !u.is_blank())
            .ok_or(AppError::MissingAttachment)?;

        let file_name = if upload.file_name.is_empty() {
            "resume".to_string()
        } else {
            upload.file_name.clone()
        };
        let key = self.store_upload(upload).await?;

        let resume = NewResume {
            file_name,
            file_path: public_path(&key),
            storage_key: key.clone(),
            uploaded_at: Utc::now(),
        };

        let swap = match self.catalog.replace_resume(resume).await {
            Ok(swap) => swap,
            Err(e) => {
                self.discard(&key).await;
                return Err(e.into());
            }
        };

        for old in &swap.retired {
            self.retire_blob(&old.storage_key).await;
        }
        info!(
            "Installed resume {} ({}), retired {} previous row(s)",
            swap.record.id,
            swap.record.storage_key,
            swap.retired.len()
        );

        Ok(swap.record)
    }

    pub async fn latest_resume(&self) -> Result<ResumeRecord, AppError> {
        self.catalog
            .latest_resume()
            .await?
            .ok_or_else(|| AppError::NotFound("No resume found".to_string()))
    }

    /// Reads a stored blob for public serving. Unknown or malformed keys are `NotFound`.
    pub async fn open_blob(&self, key: &str) -> Result<StoredBlob, AppError> {
        match self.blobs.get(key).await {
            Ok(blob) => Ok(blob),
            Err(BlobError::NotFound(_) | BlobError::InvalidKey(_)) => {
                Err(AppError::NotFound("File not found".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn store_upload(&self, upload: Upload) -> Result<String, BlobError> {
        let key = generate_storage_key(&upload.file_name);
        let size = upload.bytes.len();
        self.blobs.put(&key, upload.bytes).await?;
        info!(
            "Stored {size} byte upload {:?} as {key} ({})",
            upload.file_name,
            self.blobs.backend()
        );
        Ok(key)
    }

    /// Removes a blob displaced by a newer résumé. Failures are logged, never raised:
    /// the new résumé is already live by the time this runs.
    async fn retire_blob(&self, key: &str) {
        match self.blobs.delete(key).await {
            Ok(()) => info!("Retired blob {key}"),
            Err(BlobError::NotFound(_)) => warn!("Retired blob {key} was already gone"),
            Err(e) => error!("Failed to remove retired blob {key}: {e}"),
        }
    }

    /// Best-effort cleanup of a blob whose catalog write failed.
    async fn discard(&self, key: &str) {
        if let Err(e) = self.blobs.delete(key).await {
            warn!("Could not discard orphaned blob {key}: {e}");
        }
    }
}
