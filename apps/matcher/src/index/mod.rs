//! Vector Index: per-document skill embeddings with nearest-neighbour lookup.
//!
//! `VectorIndex` is the storage seam; `LocalVectorIndex` is the default backend.
//! `JobIndex` pairs an index with an `EmbeddingOracle` so callers deal in
//! documents, not vectors.

pub mod local;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::AppError;
use crate::llm_client::embedding::EmbeddingOracle;
use crate::models::{DocType, FormattedDocument};

pub use local::LocalVectorIndex;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryMetadata {
    pub doc_type: DocType,
    pub source_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexHit {
    pub doc_id: String,
    pub distance: f64,
}

#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Inserts or replaces the entry for `doc_id`. A replaced entry keeps its position.
    async fn upsert(
        &self,
        doc_id: &str,
        embedding: Vec<f32>,
        metadata: EntryMetadata,
    ) -> Result<(), AppError>;

    /// Up to `k` entries by ascending cosine distance, ties in insertion order.
    async fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<IndexHit>, AppError>;

    /// Discards every entry and recreates the empty collection.
    async fn reset(&self) -> Result<(), AppError>;

    async fn len(&self) -> usize;
}

/// `1 − cos(a, b)`. A zero vector is at distance 1 from everything.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| *x as f64 * *y as f64).sum();
    let norm_a = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    1.0 - dot / (norm_a * norm_b)
}

/// Job postings keyed by document id, embedded over their skill text.
#[derive(Clone)]
pub struct JobIndex {
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn EmbeddingOracle>,
}

impl JobIndex {
    pub fn new(index: Arc<dyn VectorIndex>, embedder: Arc<dyn EmbeddingOracle>) -> Self {
        Self { index, embedder }
    }

    pub async fn reset(&self) -> Result<(), AppError> {
        self.index.reset().await?;
        info!("Vector index reset");
        Ok(())
    }

    /// Embeds the document's skills and stores them. Nothing is inserted when
    /// the document has no skills or the embedding comes back empty.
    pub async fn store_document(&self, doc: &FormattedDocument) -> Result<(), AppError> {
        if doc.skills.is_empty() {
            return Err(AppError::Validation(format!(
                "Document {} has no skills to index",
                doc.doc_id
            )));
        }
        let embedding = self.embedder.embed(&doc.skill_text()).await?;
        if embedding.is_empty() {
            return Err(AppError::OracleContract(format!(
                "Empty embedding for document {}",
                doc.doc_id
            )));
        }
        let metadata = EntryMetadata {
            doc_type: doc.doc_type,
            source_name: doc.file_name.clone(),
        };
        self.index.upsert(&doc.doc_id, embedding, metadata).await?;
        debug!(doc_id = %doc.doc_id, "Stored document embedding");
        Ok(())
    }

    /// Nearest stored postings for a resume. A resume without skills has no neighbours.
    pub async fn nearest(
        &self,
        resume: &FormattedDocument,
        k: usize,
    ) -> Result<Vec<IndexHit>, AppError> {
        if resume.skills.is_empty() {
            return Ok(Vec::new());
        }
        let embedding = self.embedder.embed(&resume.skill_text()).await?;
        if embedding.is_empty() {
            return Err(AppError::OracleContract(format!(
                "Empty embedding for document {}",
                resume.doc_id
            )));
        }
        self.index.query(&embedding, k).await
    }
}
