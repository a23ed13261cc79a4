//! Embedding oracle: turns a skill text into a vector for similarity search.
//!
//! `GeminiEmbedder` calls the Gemini `embedContent` REST endpoint directly with `reqwest`.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::llm_client::LlmError;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const EMBEDDING_MODEL: &str = "gemini-embedding-001";
const TASK_TYPE: &str = "SEMANTIC_SIMILARITY";

/// Produces one embedding vector per call. An empty vector is a valid response
/// at this layer; callers that index vectors must reject it.
#[async_trait]
pub trait EmbeddingOracle: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedRequest<'a> {
    model: String,
    content: EmbedContent<'a>,
    task_type: &'a str,
}

#[derive(Serialize)]
struct EmbedContent<'a> {
    parts: Vec<EmbedPart<'a>>,
}

#[derive(Serialize)]
struct EmbedPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Option<EmbeddingValues>,
}

#[derive(Deserialize)]
struct EmbeddingValues {
    #[serde(default)]
    values: Vec<f32>,
}

#[derive(Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Deserialize)]
struct GeminiErrorBody {
    message: String,
}

#[derive(Clone)]
pub struct GeminiEmbedder {
    client: Client,
    api_key: String,
}

impl GeminiEmbedder {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(60))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
        }
    }
}

#[async_trait]
impl EmbeddingOracle for GeminiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        debug!(provider = "Gemini", text_len = text.len(), "embedding text");

        let url = format!("{GEMINI_API_BASE}/models/{EMBEDDING_MODEL}:embedContent");
        let body = EmbedRequest {
            model: format!("models/{EMBEDDING_MODEL}"),
            content: EmbedContent {
                parts: vec![EmbedPart { text }],
            },
            task_type: TASK_TYPE,
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GeminiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            error!(provider = "Gemini", %status, "embedding API error");
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: EmbedResponse = response.json().await?;
        Ok(parsed.embedding.map(|e| e.values).unwrap_or_default())
    }
}
