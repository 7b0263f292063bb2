use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::ingest::upload::{read_multipart, store_raw_document, write_temp_file};
use crate::ingest::{run_pipeline, IngestRole};
use crate::models::candidate::CandidateProfileRow;
use crate::models::user::Role;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ResumeUploadResponse {
    pub message: String,
    pub structured_resume: serde_json::Value,
}

/// POST /api/v1/candidate/resume
///
/// Runs the full ingestion pipeline on the uploaded resume and overwrites the
/// candidate's stored structured record wholesale.
pub async fn handle_resume_upload(
    State(state): State<AppState>,
    auth: AuthUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ResumeUploadResponse>), AppError> {
    auth.require_role(Role::Candidate)?;

    let upload = read_multipart(multipart, "resume_file").await?;
    let doc = upload
        .file
        .ok_or_else(|| AppError::Validation("no resume_file provided".to_string()))?;

    let tmp = write_temp_file(&doc)?;
    let outcome = run_pipeline(
        state.embedder.as_ref(),
        state.extractor.as_ref(),
        state.index.as_ref(),
        tmp.path(),
        auth.user_id,
        IngestRole::Resume,
    )
    .await?;

    tracing::debug!(
        "resume '{}' ingested for candidate {} ({} chars)",
        outcome.document_id,
        auth.user_id,
        outcome.text.len()
    );

    store_raw_document(&state.s3, &state.config.s3_bucket, &outcome.document_id, &doc).await?;

    let resume_data = outcome.record.to_value();
    sqlx::query(
        "INSERT INTO candidate_profiles (user_id, resume_data, updated_at) \
         VALUES ($1, $2, now()) \
         ON CONFLICT (user_id) DO UPDATE SET resume_data = EXCLUDED.resume_data, updated_at = now()",
    )
    .bind(auth.user_id)
    .bind(&resume_data)
    .execute(&state.db)
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ResumeUploadResponse {
            message: "Resume uploaded and processed successfully".to_string(),
            structured_resume: resume_data,
        }),
    ))
}

/// GET /api/v1/candidate/profile
pub async fn handle_get_profile(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<CandidateProfileRow>, AppError> {
    auth.require_role(Role::Candidate)?;

    let profile: CandidateProfileRow = sqlx::query_as(
        "INSERT INTO candidate_profiles (user_id) VALUES ($1) \
         ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id \
         RETURNING *",
    )
    .bind(auth.user_id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(profile))
}
