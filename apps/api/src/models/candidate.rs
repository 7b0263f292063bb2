use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One row per candidate; `resume_data` holds the latest validated structured
/// record and is overwritten wholesale on re-ingestion.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CandidateProfileRow {
    pub user_id: Uuid,
    pub resume_data: Option<serde_json::Value>,
    pub updated_at: DateTime<Utc>,
}
