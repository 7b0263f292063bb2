mod auth;
mod candidate;
mod config;
mod db;
mod embeddings;
mod errors;
mod extract;
mod ingest;
mod jobs;
mod llm_client;
mod models;
mod ranking;
mod routes;
mod state;
mod vector_index;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::embeddings::OpenAiEmbedder;
use crate::ingest::records::LlmFieldExtractor;
use crate::llm_client::LlmClient;
use crate::ranking::scoring::CosineScorer;
use crate::routes::build_router;
use crate::state::AppState;
use crate::vector_index::{PineconeIndex, VectorIndex};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Hirelens API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Initialize S3 / MinIO
    let s3 = build_s3_client(&config).await;
    info!("S3 client initialized");

    // Initialize embedding client
    let embedder = Arc::new(OpenAiEmbedder::new(
        config.openai_api_key.clone(),
        config.embedding_dimensions,
    ));
    info!(
        "Embedding client initialized (model: {}, {} dims)",
        embeddings::EMBEDDING_MODEL,
        config.embedding_dimensions
    );

    // Initialize LLM-backed structured extractor
    let llm = LlmClient::new(config.anthropic_api_key.clone());
    let extractor = Arc::new(LlmFieldExtractor::new(llm));
    info!(
        "Structured extractor initialized (model: {})",
        llm_client::MODEL
    );

    // Initialize vector index; creation is idempotent and tolerates races
    let index = Arc::new(PineconeIndex::new(
        config.pinecone_api_key.clone(),
        config.pinecone_index.clone(),
        config.pinecone_cloud.clone(),
        config.pinecone_region.clone(),
        config.embedding_dimensions,
    ));
    index
        .ensure_index(config.embedding_dimensions, "cosine")
        .await?;
    info!("Vector index '{}' ready", config.pinecone_index);

    // Initialize similarity scorer (cosine over embeddings)
    let scorer = Arc::new(CosineScorer);

    // Build app state
    let state = AppState {
        db,
        s3,
        config: config.clone(),
        embedder,
        extractor,
        index,
        scorer,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "hirelens-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    aws_sdk_s3::Client::new(&s3_config)
}
