//! Vector Index — content-addressed store of document embeddings.
//!
//! Backed by Pinecone, spoken over its REST API. Upsert is a wholesale
//! replace-by-id, so re-ingesting a document with its stable id overwrites
//! rather than duplicates. Nearest-neighbor search is the natural extension
//! point but is not part of the current surface.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{debug, info};

const PINECONE_API_URL: &str = "https://api.pinecone.io";
const PINECONE_API_VERSION: &str = "2025-01";
const FETCH_BATCH_SIZE: usize = 100;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("vector index unavailable: {0}")]
    Unavailable(String),

    #[error("vector dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}

/// Seam for the vector index backend. Production uses `PineconeIndex`; tests
/// substitute fakes.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Creates the backing index if absent; a no-op otherwise. Concurrent
    /// callers may race — an "already exists" response counts as success.
    async fn ensure_index(&self, dimensions: usize, metric: &str) -> Result<(), IndexError>;

    /// Idempotent replace-by-id: a later upsert with the same id fully
    /// replaces the stored vector and metadata.
    async fn upsert(
        &self,
        id: &str,
        values: Vec<f32>,
        metadata: HashMap<String, String>,
    ) -> Result<(), IndexError>;

    /// Batched read of stored vectors. Ids with no entry are simply absent
    /// from the result map.
    async fn fetch(&self, ids: &[String]) -> Result<HashMap<String, Vec<f32>>, IndexError>;

    /// All currently stored identifiers. Diagnostics only, not on the hot
    /// path.
    async fn list_ids(&self) -> Result<Vec<String>, IndexError>;
}

#[derive(Debug, Serialize)]
struct CreateIndexRequest<'a> {
    name: &'a str,
    dimension: usize,
    metric: &'a str,
    spec: IndexSpec<'a>,
}

#[derive(Debug, Serialize)]
struct IndexSpec<'a> {
    serverless: ServerlessSpec<'a>,
}

#[derive(Debug, Serialize)]
struct ServerlessSpec<'a> {
    cloud: &'a str,
    region: &'a str,
}

#[derive(Debug, Deserialize)]
struct DescribeIndexResponse {
    host: String,
}

#[derive(Debug, Serialize)]
struct UpsertRequest {
    vectors: Vec<IndexVector>,
}

#[derive(Debug, Serialize, Deserialize)]
struct IndexVector {
    id: String,
    values: Vec<f32>,
    #[serde(default)]
    metadata: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct FetchResponse {
    #[serde(default)]
    vectors: HashMap<String, IndexVector>,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    vectors: Vec<ListedId>,
    pagination: Option<Pagination>,
}

#[derive(Debug, Deserialize)]
struct ListedId {
    id: String,
}

#[derive(Debug, Deserialize)]
struct Pagination {
    next: Option<String>,
}

/// Pinecone-backed index. The control plane (create/describe) lives at the
/// global API host; vector operations go to the per-index data-plane host,
/// discovered once on first use.
pub struct PineconeIndex {
    client: Client,
    api_key: String,
    index_name: String,
    cloud: String,
    region: String,
    dimension: usize,
    host: OnceCell<String>,
}

impl PineconeIndex {
    pub fn new(
        api_key: String,
        index_name: String,
        cloud: String,
        region: String,
        dimension: usize,
    ) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
            index_name,
            cloud,
            region,
            dimension,
            host: OnceCell::new(),
        }
    }

    /// Resolves and caches the data-plane host for this index.
    async fn host(&self) -> Result<&str, IndexError> {
        self.host
            .get_or_try_init(|| async {
                let url = format!("{PINECONE_API_URL}/indexes/{}", self.index_name);
                let response = self
                    .client
                    .get(&url)
                    .header("Api-Key", &self.api_key)
                    .header("X-Pinecone-API-Version", PINECONE_API_VERSION)
                    .send()
                    .await
                    .map_err(|e| IndexError::Unavailable(e.to_string()))?;

                let status = response.status();
                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(IndexError::Unavailable(format!(
                        "describe index returned {status}: {body}"
                    )));
                }

                let described: DescribeIndexResponse = response
                    .json()
                    .await
                    .map_err(|e| IndexError::Unavailable(e.to_string()))?;
                debug!("resolved index host: {}", described.host);
                Ok(format!("https://{}", described.host))
            })
            .await
            .map(String::as_str)
    }
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    async fn ensure_index(&self, dimensions: usize, metric: &str) -> Result<(), IndexError> {
        let request = CreateIndexRequest {
            name: &self.index_name,
            dimension: dimensions,
            metric,
            spec: IndexSpec {
                serverless: ServerlessSpec {
                    cloud: &self.cloud,
                    region: &self.region,
                },
            },
        };

        let response = self
            .client
            .post(format!("{PINECONE_API_URL}/indexes"))
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", PINECONE_API_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| IndexError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !create_succeeded(status) {
            let body = response.text().await.unwrap_or_default();
            return Err(IndexError::Unavailable(format!(
                "create index returned {status}: {body}"
            )));
        }

        if status == StatusCode::CONFLICT {
            info!("index '{}' already exists", self.index_name);
        } else {
            info!("index '{}' created", self.index_name);
        }
        Ok(())
    }

    async fn upsert(
        &self,
        id: &str,
        values: Vec<f32>,
        metadata: HashMap<String, String>,
    ) -> Result<(), IndexError> {
        check_dimension(self.dimension, values.len())?;

        let host = self.host().await?;
        let request = UpsertRequest {
            vectors: vec![IndexVector {
                id: id.to_string(),
                values,
                metadata,
            }],
        };

        let response = self
            .client
            .post(format!("{host}/vectors/upsert"))
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", PINECONE_API_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| IndexError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IndexError::Unavailable(format!(
                "upsert returned {status}: {body}"
            )));
        }

        debug!("upserted vector '{id}'");
        Ok(())
    }

    async fn fetch(&self, ids: &[String]) -> Result<HashMap<String, Vec<f32>>, IndexError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let host = self.host().await?;
        let mut vectors = HashMap::new();

        // The fetch endpoint caps the id list per request.
        for chunk in ids.chunks(FETCH_BATCH_SIZE) {
            let query: Vec<(&str, &str)> = chunk.iter().map(|id| ("ids", id.as_str())).collect();

            let response = self
                .client
                .get(format!("{host}/vectors/fetch"))
                .header("Api-Key", &self.api_key)
                .header("X-Pinecone-API-Version", PINECONE_API_VERSION)
                .query(&query)
                .send()
                .await
                .map_err(|e| IndexError::Unavailable(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(IndexError::Unavailable(format!(
                    "fetch returned {status}: {body}"
                )));
            }

            let parsed: FetchResponse = response
                .json()
                .await
                .map_err(|e| IndexError::Unavailable(e.to_string()))?;

            vectors.extend(parsed.vectors.into_iter().map(|(id, v)| (id, v.values)));
        }

        Ok(vectors)
    }

    async fn list_ids(&self) -> Result<Vec<String>, IndexError> {
        let host = self.host().await?;
        let mut ids = Vec::new();
        let mut token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .get(format!("{host}/vectors/list"))
                .header("Api-Key", &self.api_key)
                .header("X-Pinecone-API-Version", PINECONE_API_VERSION);
            if let Some(t) = &token {
                request = request.query(&[("paginationToken", t.as_str())]);
            }

            let response = request
                .send()
                .await
                .map_err(|e| IndexError::Unavailable(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(IndexError::Unavailable(format!(
                    "list returned {status}: {body}"
                )));
            }

            let page: ListResponse = response
                .json()
                .await
                .map_err(|e| IndexError::Unavailable(e.to_string()))?;

            ids.extend(page.vectors.into_iter().map(|v| v.id));

            token = page.pagination.and_then(|p| p.next);
            if token.is_none() {
                break;
            }
        }

        Ok(ids)
    }
}

/// Success interpretation for index creation: 409 means another caller won
/// the creation race, which satisfies ensure-semantics.
fn create_succeeded(status: StatusCode) -> bool {
    status.is_success() || status == StatusCode::CONFLICT
}

fn check_dimension(expected: usize, got: usize) -> Result<(), IndexError> {
    if expected != got {
        return Err(IndexError::DimensionMismatch { expected, got });
    }
    Ok(())
}
