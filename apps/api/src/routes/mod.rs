pub mod diagnostics;
pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::auth::handlers as auth_handlers;
use crate::candidate::handlers as candidate_handlers;
use crate::jobs::handlers as job_handlers;
use crate::ranking::handlers as ranking_handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Auth
        .route("/api/v1/auth/register", post(auth_handlers::handle_register))
        .route("/api/v1/auth/login", post(auth_handlers::handle_login))
        .route("/api/v1/auth/profile", get(auth_handlers::handle_profile))
        // Candidate
        .route(
            "/api/v1/candidate/resume",
            post(candidate_handlers::handle_resume_upload),
        )
        .route(
            "/api/v1/candidate/profile",
            get(candidate_handlers::handle_get_profile),
        )
        // Jobs
        .route(
            "/api/v1/jobs",
            post(job_handlers::handle_create_job).get(job_handlers::handle_list_jobs),
        )
        .route(
            "/api/v1/jobs/:id",
            get(job_handlers::handle_get_job).delete(job_handlers::handle_delete_job),
        )
        .route("/api/v1/jobs/:id/jd", post(job_handlers::handle_upload_jd))
        // Ranking
        .route(
            "/api/v1/jobs/:id/ranking",
            get(ranking_handlers::handle_job_ranking),
        )
        // Diagnostics
        .route("/api/v1/index/ids", get(diagnostics::handle_index_ids))
        .with_state(state)
}
