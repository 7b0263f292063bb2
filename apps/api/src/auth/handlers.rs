use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{hash_password, issue_token, verify_password, AuthUser};
use crate::errors::AppError;
use crate::models::user::{Role, UserRow};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: String,
}

impl From<UserRow> for UserResponse {
    fn from(row: UserRow) -> Self {
        UserResponse {
            id: row.id,
            username: row.username,
            email: row.email,
            role: row.role,
        }
    }
}

/// POST /api/v1/auth/register
pub async fn handle_register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    if req.username.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::Validation(
            "username and password must not be empty".to_string(),
        ));
    }

    let password_hash = hash_password(&req.password)?;

    let user: UserRow = sqlx::query_as(
        "INSERT INTO users (username, email, password_hash, role) \
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(&req.username)
    .bind(&req.email)
    .bind(&password_hash)
    .bind(req.role.as_str())
    .fetch_one(&state.db)
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Validation("username or email already taken".to_string())
        }
        _ => AppError::Database(e),
    })?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access: String,
    pub user: UserResponse,
}

/// POST /api/v1/auth/login
pub async fn handle_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let user: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE username = $1")
        .bind(&req.username)
        .fetch_optional(&state.db)
        .await?;

    let user = user
        .filter(|u| verify_password(&req.password, &u.password_hash))
        .ok_or_else(|| AppError::Validation("invalid credentials".to_string()))?;

    let role = Role::parse(&user.role)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("unknown role '{}'", user.role)))?;
    let access = issue_token(&state.config.jwt_secret, user.id, role)?;

    Ok(Json(LoginResponse {
        access,
        user: user.into(),
    }))
}

/// GET /api/v1/auth/profile
pub async fn handle_profile(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<UserResponse>, AppError> {
    let user: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(auth.user_id)
        .fetch_optional(&state.db)
        .await?;

    let user = user.ok_or_else(|| AppError::NotFound("user not found".to_string()))?;
    Ok(Json(user.into()))
}
