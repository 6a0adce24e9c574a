use async_trait::async_trait;
use std::time::Duration;

use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::catalog::{Catalog, CatalogError, ResumeSwap};
use crate::models::{NewProject, NewResume, ProjectRecord, ResumeRecord};

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Advisory lock id guarding the résumé singleton ("resume" in ASCII).
const RESUME_LOCK_KEY: i64 = 0x7265_7375_6d65;

/// PostgreSQL-backed catalog.
#[derive(Clone)]
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a PostgreSQL connection pool and wraps it.
    pub async fn connect(database_url: &str) -> Result<Self, CatalogError> {
        info!("Connecting to PostgreSQL...");

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;

        info!("PostgreSQL connection pool established");
        Ok(Self::new(pool))
    }

    /// Waits for in-flight queries and closes every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("PostgreSQL connection pool closed");
    }

    /// Applies pending schema migrations.
    pub async fn migrate(&self) -> Result<(), CatalogError> {
        MIGRATOR.run(&self.pool).await?;
        info!("Catalog migrations applied");
        Ok(())
    }
}

#[async_trait]
impl Catalog for PgCatalog {
    async fn insert_project(&self, project: NewProject) -> Result<ProjectRecord, CatalogError> {
        let record = sqlx::query_as::<_, ProjectRecord>(
            r#"
            INSERT INTO projects (title, description, github_link, live_link, image)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, title, description, github_link, live_link, image, created_at
            "#,
        )
        .bind(&project.title)
        .bind(&project.description)
        .bind(&project.github_link)
        .bind(&project.live_link)
        .bind(&project.image)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    async fn list_projects(&self) -> Result<Vec<ProjectRecord>, CatalogError> {
        Ok(sqlx::query_as::<_, ProjectRecord>(
            r#"
            SELECT id, title, description, github_link, live_link, image, created_at
            FROM projects
            ORDER BY id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?)
    }

    async fn replace_resume(&self, resume: NewResume) -> Result<ResumeSwap, CatalogError> {
        let mut tx = self.pool.begin().await?;

        // Serialise writers so two uploads can never both survive.
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(RESUME_LOCK_KEY)
            .execute(&mut *tx)
            .await?;

        // Every row goes, not only the newest, so a previously broken singleton heals.
        let retired = sqlx::query_as::<_, ResumeRecord>(
            "DELETE FROM resumes RETURNING id, file_name, file_path, storage_key, uploaded_at",
        )
        .fetch_all(&mut *tx)
        .await?;

        let record = sqlx::query_as::<_, ResumeRecord>(
            r#"
            INSERT INTO resumes (id, file_name, storage_key, file_path, uploaded_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, file_name, file_path, storage_key, uploaded_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&resume.file_name)
        .bind(&resume.storage_key)
        .bind(&resume.file_path)
        .bind(resume.uploaded_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(ResumeSwap { record, retired })
    }

    async fn latest_resume(&self) -> Result<Option<ResumeRecord>, CatalogError> {
        Ok(sqlx::query_as::<_, ResumeRecord>(
            r#"
            SELECT id, file_name, file_path, storage_key, uploaded_at
            FROM resumes
            ORDER BY uploaded_at DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn count_resumes(&self) -> Result<i64, CatalogError> {
        Ok(sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM resumes")
            .fetch_one(&self.pool)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, Utc};

    fn new_resume(name: &str) -> NewResume {
        NewResume {
            file_name: name.to_string(),
            storage_key: format!("{name}-key.pdf"),
            file_path: format!("/uploads/{name}-key.pdf"),
            uploaded_at: Utc::now(),
        }
    }

    async fn seed_row(catalog: &PgCatalog, name: &str, age_minutes: i64) {
        sqlx::query(
            "INSERT INTO resumes (id, file_name, storage_key, file_path, uploaded_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(format!("{name}-key.pdf"))
        .bind(format!("/uploads/{name}-key.pdf"))
        .bind(Utc::now() - ChronoDuration::minutes(age_minutes))
        .execute(&catalog.pool)
        .await
        .unwrap();
    }

    /// Runs against a scratch database: `DATABASE_URL=... cargo test -- --ignored`.
    /// The `resumes` table is wiped.
    #[tokio::test]
    #[ignore]
    async fn test_replace_resume_heals_duplicates_and_swaps_in_order() {
        let Ok(url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL not set, skipping");
            return;
        };
        let catalog = PgCatalog::connect(&url).await.unwrap();
        catalog.migrate().await.unwrap();
        sqlx::query("DELETE FROM resumes")
            .execute(&catalog.pool)
            .await
            .unwrap();

        seed_row(&catalog, "stale-a", 10).await;
        seed_row(&catalog, "stale-b", 5).await;
        assert_eq!(catalog.count_resumes().await.unwrap(), 2);

        let first = catalog.replace_resume(new_resume("first")).await.unwrap();
        let mut retired: Vec<_> = first.retired.iter().map(|r| r.file_name.clone()).collect();
        retired.sort();
        assert_eq!(retired, vec!["stale-a", "stale-b"]);
        assert_eq!(catalog.count_resumes().await.unwrap(), 1);

        let second = catalog.replace_resume(new_resume("second")).await.unwrap();
        assert_eq!(second.retired.len(), 1);
        assert_eq!(second.retired[0].id, first.record.id);
        assert_eq!(second.retired[0].storage_key, "first-key.pdf");

        let latest = catalog.latest_resume().await.unwrap().unwrap();
        assert_eq!(latest.id, second.record.id);
        assert_eq!(latest.file_name, "second");
        assert_eq!(catalog.count_resumes().await.unwrap(), 1);

        catalog.close().await;
    }
}
