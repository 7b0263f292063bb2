use axum::{extract::State, Json};
use serde::Serialize;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct IndexIdsResponse {
    pub ids: Vec<String>,
    pub count: usize,
}

/// GET /api/v1/index/ids
/// Lists every identifier stored in the vector index. Diagnostics only.
pub async fn handle_index_ids(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<IndexIdsResponse>, AppError> {
    let ids = state.index.list_ids().await?;
    let count = ids.len();
    Ok(Json(IndexIdsResponse { ids, count }))
}
