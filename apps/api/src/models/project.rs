use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A portfolio project as stored in the catalog.
/// `image` is the public blob path, or empty when no image was attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub github_link: String,
    pub live_link: String,
    pub image: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewProject {
    pub title: String,
    pub description: String,
    pub github_link: String,
    pub live_link: String,
    pub image: String,
}
