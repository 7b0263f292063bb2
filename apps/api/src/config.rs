use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Constructed once at startup and carried in `AppState`; no module reads
/// the environment after this point.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub openai_api_key: String,
    pub anthropic_api_key: String,
    pub pinecone_api_key: String,
    pub pinecone_index: String,
    pub pinecone_cloud: String,
    pub pinecone_region: String,
    pub jwt_secret: String,
    /// Embedding vector length. Must match the model's output and the
    /// dimension the vector index was created with.
    pub embedding_dimensions: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            s3_bucket: require_env("S3_BUCKET")?,
            s3_endpoint: require_env("S3_ENDPOINT")?,
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            openai_api_key: require_env("OPENAI_API_KEY")?,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            pinecone_api_key: require_env("PINECONE_API_KEY")?,
            pinecone_index: std::env::var("PINECONE_INDEX").unwrap_or_else(|_| "ats".to_string()),
            pinecone_cloud: std::env::var("PINECONE_CLOUD").unwrap_or_else(|_| "aws".to_string()),
            pinecone_region: require_env("PINECONE_REGION")?,
            jwt_secret: require_env("JWT_SECRET")?,
            embedding_dimensions: std::env::var("EMBEDDING_DIMENSIONS")
                .unwrap_or_else(|_| "1536".to_string())
                .parse::<usize>()
                .context("EMBEDDING_DIMENSIONS must be a positive integer")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
