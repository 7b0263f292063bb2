//! Embedding Generator — turns normalized text into a fixed-dimension vector.
//!
//! Callers own truncation: the full normalized text is sent as-is. No retry
//! is performed here; retry policy belongs to the caller or infrastructure.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const OPENAI_EMBEDDINGS_URL: &str = "https://api.openai.com/v1/embeddings";
/// Hardcoded to prevent accidental drift: vectors are only comparable to
/// vectors produced by the same model.
pub const EMBEDDING_MODEL: &str = "text-embedding-3-small";

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("embedding response contained no vector")]
    EmptyResponse,
}

/// Seam for the embedding backend. Production uses `OpenAiEmbedder`; tests
/// substitute fakes.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
    dimensions: usize,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Client for the OpenAI embeddings API.
#[derive(Clone)]
pub struct OpenAiEmbedder {
    client: Client,
    api_key: String,
    dimensions: usize,
}

impl OpenAiEmbedder {
    pub fn new(api_key: String, dimensions: usize) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
            dimensions,
        }
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let request = EmbeddingRequest {
            model: EMBEDDING_MODEL,
            input: text,
            dimensions: self.dimensions,
        };

        let response = self
            .client
            .post(OPENAI_EMBEDDINGS_URL)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: EmbeddingResponse = response.json().await?;
        let vector = parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or(EmbeddingError::EmptyResponse)?;

        debug!("embedding generated: {} dimensions", vector.len());
        Ok(vector)
    }
}
