//! Metadata Catalog — persistent records for projects and the résumé.
//!
//! Production uses `PgCatalog`; tests swap in `MemoryCatalog` behind the same trait.

#[cfg(test)]
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{NewProject, NewResume, ProjectRecord, ResumeRecord};

#[cfg(test)]
pub use memory::MemoryCatalog;
pub use postgres::PgCatalog;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Outcome of installing a new résumé: the live record plus every row it displaced.
#[derive(Debug, Clone)]
pub struct ResumeSwap {
    pub record: ResumeRecord,
    pub retired: Vec<ResumeRecord>,
}

#[async_trait]
pub trait Catalog: Send + Sync {
    async fn insert_project(&self, project: NewProject) -> Result<ProjectRecord, CatalogError>;

    /// All projects, most recently created first.
    async fn list_projects(&self) -> Result<Vec<ProjectRecord>, CatalogError>;

    /// Atomically removes every existing résumé row and inserts `resume`.
    async fn replace_resume(&self, resume: NewResume) -> Result<ResumeSwap, CatalogError>;

    async fn latest_resume(&self) -> Result<Option<ResumeRecord>, CatalogError>;

    async fn count_resumes(&self) -> Result<i64, CatalogError>;
}
