use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::catalog::{Catalog, CatalogError, ResumeSwap};
use crate::models::{NewProject, NewResume, ProjectRecord, ResumeRecord};

#[derive(Default)]
struct Tables {
    next_project_id: i64,
    projects: Vec<ProjectRecord>,
    resumes: Vec<ResumeRecord>,
}

/// In-process catalog with the same contract as `PgCatalog`.
#[derive(Default)]
pub struct MemoryCatalog {
    tables: RwLock<Tables>,
    fail_writes: AtomicBool,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent write fail as if the database were gone.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Inserts a résumé row directly, bypassing the singleton swap.
    pub async fn push_resume_row(&self, record: ResumeRecord) {
        self.tables.write().await.resumes.push(record);
    }

    fn check_writable(&self) -> Result<(), CatalogError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CatalogError::Database(sqlx::Error::PoolClosed));
        }
        Ok(())
    }
}

#[async_trait]
impl Catalog for MemoryCatalog {
    async fn insert_project(&self, project: NewProject) -> Result<ProjectRecord, CatalogError> {
        self.check_writable()?;
        let mut tables = self.tables.write().await;
        tables.next_project_id += 1;
        let record = ProjectRecord {
            id: tables.next_project_id,
            title: project.title,
            description: project.description,
            github_link: project.github_link,
            live_link: project.live_link,
            image: project.image,
            created_at: Utc::now(),
        };
        tables.projects.push(record.clone());
        Ok(record)
    }

    async fn list_projects(&self) -> Result<Vec<ProjectRecord>, CatalogError> {
        let tables = self.tables.read().await;
        Ok(tables.projects.iter().rev().cloned().collect())
    }

    async fn replace_resume(&self, resume: NewResume) -> Result<ResumeSwap, CatalogError> {
        self.check_writable()?;
        let mut tables = self.tables.write().await;
        let retired = std::mem::take(&mut tables.resumes);
        let record = ResumeRecord {
            id: Uuid::new_v4(),
            file_name: resume.file_name,
            file_path: resume.file_path,
            storage_key: resume.storage_key,
            uploaded_at: resume.uploaded_at,
        };
        tables.resumes.push(record.clone());
        Ok(ResumeSwap { record, retired })
    }

    async fn latest_resume(&self) -> Result<Option<ResumeRecord>, CatalogError> {
        let tables = self.tables.read().await;
        Ok(tables
            .resumes
            .iter()
            .max_by_key(|r| r.uploaded_at)
            .cloned())
    }

    async fn count_resumes(&self) -> Result<i64, CatalogError> {
        Ok(self.tables.read().await.resumes.len() as i64)
    }
}
