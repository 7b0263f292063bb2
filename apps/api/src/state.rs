use std::sync::Arc;

use aws_sdk_s3::Client as S3Client;
use sqlx::PgPool;

use crate::config::Config;
use crate::embeddings::Embedder;
use crate::ingest::records::StructuredExtractor;
use crate::ranking::scoring::SimilarityScorer;
use crate::vector_index::VectorIndex;

/// Shared application state injected into all route handlers via Axum
/// extractors. The pipeline seams are trait objects so backends can be
/// swapped at startup without touching handler code.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub s3: S3Client,
    pub config: Config,
    pub embedder: Arc<dyn Embedder>,
    pub extractor: Arc<dyn StructuredExtractor>,
    pub index: Arc<dyn VectorIndex>,
    pub scorer: Arc<dyn SimilarityScorer>,
}
