use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// The live résumé. At most one exists at any time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ResumeRecord {
    pub id: Uuid,
    pub file_name: String,
    pub file_path: String,
    #[serde(skip)]
    pub storage_key: String,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewResume {
    pub file_name: String,
    pub storage_key: String,
    pub file_path: String,
    pub uploaded_at: DateTime<Utc>,
}
