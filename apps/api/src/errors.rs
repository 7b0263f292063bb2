use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::embeddings::EmbeddingError;
use crate::extract::ExtractError;
use crate::ingest::records::StructuredExtractionError;
use crate::ranking::scoring::ScoringError;
use crate::vector_index::IndexError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("Text extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("Embedding generation failed: {0}")]
    EmbeddingFailed(String),

    #[error("Structured extraction failed: {0}")]
    StructuredExtractionFailed(String),

    #[error("Vector index unavailable: {0}")]
    IndexUnavailable(String),

    #[error("Vector dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Scoring unavailable: {0}")]
    ScoringUnavailable(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ExtractError> for AppError {
    fn from(e: ExtractError) -> Self {
        match e {
            ExtractError::UnsupportedFormat(ext) => AppError::UnsupportedFormat(ext),
            other => AppError::ExtractionFailed(other.to_string()),
        }
    }
}

impl From<EmbeddingError> for AppError {
    fn from(e: EmbeddingError) -> Self {
        AppError::EmbeddingFailed(e.to_string())
    }
}

impl From<StructuredExtractionError> for AppError {
    fn from(e: StructuredExtractionError) -> Self {
        AppError::StructuredExtractionFailed(e.to_string())
    }
}

impl From<IndexError> for AppError {
    fn from(e: IndexError) -> Self {
        match e {
            IndexError::DimensionMismatch { expected, got } => {
                AppError::DimensionMismatch { expected, got }
            }
            other => AppError::IndexUnavailable(other.to_string()),
        }
    }
}

impl From<ScoringError> for AppError {
    fn from(e: ScoringError) -> Self {
        AppError::ScoringUnavailable(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Authentication required".to_string(),
            ),
            AppError::Forbidden => (
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
                "Access denied".to_string(),
            ),
            AppError::UnsupportedFormat(ext) => (
                StatusCode::BAD_REQUEST,
                "UNSUPPORTED_FORMAT",
                format!("Unsupported document format: {ext}"),
            ),
            AppError::ExtractionFailed(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "EXTRACTION_FAILED",
                msg.clone(),
            ),
            AppError::EmbeddingFailed(msg) => {
                tracing::error!("Embedding error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "EMBEDDING_FAILED",
                    "The embedding model call failed".to_string(),
                )
            }
            AppError::StructuredExtractionFailed(msg) => {
                tracing::error!("Structured extraction error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "STRUCTURED_EXTRACTION_FAILED",
                    "Structured field extraction failed".to_string(),
                )
            }
            AppError::IndexUnavailable(msg) => {
                tracing::error!("Vector index error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "INDEX_UNAVAILABLE",
                    "The vector index is unavailable".to_string(),
                )
            }
            AppError::DimensionMismatch { expected, got } => {
                tracing::error!("Vector dimension mismatch: expected {expected}, got {got}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DIMENSION_MISMATCH",
                    "Embedding dimension disagrees with the index configuration".to_string(),
                )
            }
            AppError::ScoringUnavailable(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "SCORING_UNAVAILABLE",
                msg.clone(),
            ),
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Storage(msg) => {
                tracing::error!("Storage error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_ERROR",
                    "A storage error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
