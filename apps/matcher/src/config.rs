use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::matching::MatchMode;

/// S3 / MinIO connection. Present only when `S3_BUCKET` is set.
#[derive(Debug, Clone)]
pub struct S3Settings {
    pub bucket: String,
    pub endpoint: Option<String>,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub google_api_key: Option<String>,
    pub match_mode: MatchMode,
    pub taxonomy_path: PathBuf,
    pub s3: Option<S3Settings>,
    pub remote_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub vector_dir: PathBuf,
    pub vector_collection: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &str| {
            var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
        };

        let match_mode: MatchMode = var("MATCH_MODE")
            .unwrap_or_else(|| "semantic".to_string())
            .parse()?;

        let s3 = match var("S3_BUCKET") {
            Some(bucket) => Some(S3Settings {
                bucket,
                endpoint: var("S3_ENDPOINT"),
                region: var("AWS_REGION").unwrap_or_else(|| "us-east-1".to_string()),
                access_key_id: require("AWS_ACCESS_KEY_ID")?,
                secret_access_key: require("AWS_SECRET_ACCESS_KEY")?,
            }),
            None => None,
        };

        Ok(Config {
            anthropic_api_key: require("ANTHROPIC_API_KEY")?,
            google_api_key: var("GOOGLE_API_KEY"),
            match_mode,
            taxonomy_path: var("TAXONOMY_PATH")
                .unwrap_or_else(|| "config/skills.json".to_string())
                .into(),
            s3,
            remote_dir: var("REMOTE_DIR")
                .unwrap_or_else(|| "data/remote".to_string())
                .into(),
            cache_dir: var("CACHE_DIR")
                .unwrap_or_else(|| "data/cache".to_string())
                .into(),
            vector_dir: var("VECTOR_DIR")
                .unwrap_or_else(|| "data/vectors".to_string())
                .into(),
            vector_collection: var("VECTOR_COLLECTION")
                .unwrap_or_else(|| "job_matcher".to_string()),
            port: var("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: var("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// The Gemini key, required once semantic matching is in effect.
    pub fn require_google_api_key(&self) -> Result<&str> {
        self.google_api_key.as_deref().context(
            "Required environment variable 'GOOGLE_API_KEY' is not set (needed for MATCH_MODE=semantic)",
        )
    }
}
