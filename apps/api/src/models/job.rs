use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobRow {
    pub id: Uuid,
    pub poster_id: Uuid,
    pub title: String,
    pub description: String,
    /// Structured record extracted from the JD file; overwritten wholesale on
    /// re-upload.
    pub jd_data: Option<serde_json::Value>,
    /// S3 key of the raw uploaded JD file, if one has been ingested.
    pub jd_object_key: Option<String>,
    pub created_at: DateTime<Utc>,
}
