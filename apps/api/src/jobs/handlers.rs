use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::ingest::upload::{read_multipart, store_raw_document, write_temp_file, UploadedDocument};
use crate::ingest::{run_pipeline, IngestRole};
use crate::jobs::fetch_owned_job;
use crate::models::job::JobRow;
use crate::models::user::Role;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct JobResponse {
    #[serde(flatten)]
    pub job: JobRow,
    pub structured_jd: serde_json::Value,
}

/// POST /api/v1/jobs
///
/// Creates a job from multipart fields (`title`, optional `description`) and
/// a required `jd_file`, then ingests the JD keyed by the new job id.
pub async fn handle_create_job(
    State(state): State<AppState>,
    auth: AuthUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<JobResponse>), AppError> {
    auth.require_role(Role::Job)?;

    let upload = read_multipart(multipart, "jd_file").await?;
    let doc = upload
        .file
        .ok_or_else(|| AppError::Validation("no jd_file provided".to_string()))?;
    let title = upload
        .fields
        .get("title")
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| AppError::Validation("title is required".to_string()))?
        .clone();
    let description = upload.fields.get("description").cloned().unwrap_or_default();

    let job: JobRow = sqlx::query_as(
        "INSERT INTO jobs (poster_id, title, description) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(auth.user_id)
    .bind(&title)
    .bind(&description)
    .fetch_one(&state.db)
    .await?;

    let (job, structured_jd) = ingest_jd(&state, job, &doc).await?;

    Ok((
        StatusCode::CREATED,
        Json(JobResponse { job, structured_jd }),
    ))
}

/// POST /api/v1/jobs/:id/jd
///
/// Attaches or replaces the JD file on an existing owned job. Re-ingestion
/// overwrites both the index entry and the stored structured record.
pub async fn handle_upload_jd(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(job_id): Path<Uuid>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<JobResponse>), AppError> {
    auth.require_role(Role::Job)?;

    let job = fetch_owned_job(&state.db, job_id, auth.user_id).await?;

    let upload = read_multipart(multipart, "jd_file").await?;
    let doc = upload
        .file
        .ok_or_else(|| AppError::Validation("no jd_file provided".to_string()))?;

    let (job, structured_jd) = ingest_jd(&state, job, &doc).await?;

    Ok((
        StatusCode::CREATED,
        Json(JobResponse { job, structured_jd }),
    ))
}

/// GET /api/v1/jobs
pub async fn handle_list_jobs(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<JobRow>>, AppError> {
    auth.require_role(Role::Job)?;

    let jobs: Vec<JobRow> =
        sqlx::query_as("SELECT * FROM jobs WHERE poster_id = $1 ORDER BY created_at DESC")
            .bind(auth.user_id)
            .fetch_all(&state.db)
            .await?;

    Ok(Json(jobs))
}

/// GET /api/v1/jobs/:id
pub async fn handle_get_job(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(job_id): Path<Uuid>,
) -> Result<Json<JobRow>, AppError> {
    auth.require_role(Role::Job)?;
    let job = fetch_owned_job(&state.db, job_id, auth.user_id).await?;
    Ok(Json(job))
}

/// DELETE /api/v1/jobs/:id
pub async fn handle_delete_job(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(job_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    auth.require_role(Role::Job)?;
    let job = fetch_owned_job(&state.db, job_id, auth.user_id).await?;

    sqlx::query("DELETE FROM jobs WHERE id = $1")
        .bind(job.id)
        .execute(&state.db)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Shared JD ingestion tail: pipeline → raw-byte storage → wholesale
/// overwrite of the job's structured record.
async fn ingest_jd(
    state: &AppState,
    job: JobRow,
    doc: &UploadedDocument,
) -> Result<(JobRow, serde_json::Value), AppError> {
    let tmp = write_temp_file(doc)?;
    let outcome = run_pipeline(
        state.embedder.as_ref(),
        state.extractor.as_ref(),
        state.index.as_ref(),
        tmp.path(),
        job.id,
        IngestRole::JobDescription,
    )
    .await?;

    tracing::debug!(
        "JD '{}' ingested for job {} ({} chars)",
        outcome.document_id,
        job.id,
        outcome.text.len()
    );

    let object_key =
        store_raw_document(&state.s3, &state.config.s3_bucket, &outcome.document_id, doc).await?;

    let structured_jd = outcome.record.to_value();
    let job: JobRow = sqlx::query_as(
        "UPDATE jobs SET jd_data = $1, jd_object_key = $2 WHERE id = $3 RETURNING *",
    )
    .bind(&structured_jd)
    .bind(&object_key)
    .bind(job.id)
    .fetch_one(&state.db)
    .await?;

    Ok((job, structured_jd))
}
