use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::jobs::fetch_owned_job;
use crate::models::user::Role;
use crate::ranking::{rank_candidates, SimilarityResult};
use crate::state::AppState;

/// GET /api/v1/jobs/:id/ranking
///
/// Ranks every candidate with a stored representation against the job's JD,
/// most similar first.
pub async fn handle_job_ranking(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(job_id): Path<Uuid>,
) -> Result<Json<Vec<SimilarityResult>>, AppError> {
    auth.require_role(Role::Job)?;

    let job = fetch_owned_job(&state.db, job_id, auth.user_id).await?;

    let results = rank_candidates(
        &state.db,
        state.index.as_ref(),
        state.scorer.as_ref(),
        &job,
    )
    .await?;

    Ok(Json(results))
}
