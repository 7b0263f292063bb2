pub mod handlers;

use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::job::JobRow;

/// Loads a job only if it belongs to `poster_id`. Jobs outside the caller's
/// scope are indistinguishable from absent ones.
pub async fn fetch_owned_job(
    pool: &PgPool,
    job_id: Uuid,
    poster_id: Uuid,
) -> Result<JobRow, AppError> {
    let job: Option<JobRow> = sqlx::query_as("SELECT * FROM jobs WHERE id = $1 AND poster_id = $2")
        .bind(job_id)
        .bind(poster_id)
        .fetch_optional(pool)
        .await?;

    job.ok_or_else(|| AppError::NotFound("job not found or not yours".to_string()))
}
