use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::errors::AppError;
use crate::index::{cosine_distance, EntryMetadata, IndexHit, VectorIndex};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexEntry {
    doc_id: String,
    embedding: Vec<f32>,
    metadata: EntryMetadata,
}

/// A brute-force cosine index. With a path, the collection is mirrored to
/// `<dir>/<collection>.json` after every write.
pub struct LocalVectorIndex {
    path: Option<PathBuf>,
    entries: RwLock<Vec<IndexEntry>>,
}

impl LocalVectorIndex {
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Opens (or starts) the collection file under `dir`.
    pub async fn open(dir: &Path, collection: &str) -> Result<Self, AppError> {
        tokio::fs::create_dir_all(dir).await.map_err(|e| {
            AppError::Storage(format!("Cannot create vector directory {}: {e}", dir.display()))
        })?;
        let path = dir.join(format!("{collection}.json"));
        let entries = match tokio::fs::read(&path).await {
            Ok(raw) => serde_json::from_slice::<Vec<IndexEntry>>(&raw).map_err(|e| {
                AppError::Storage(format!("Corrupt vector collection {}: {e}", path.display()))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                return Err(AppError::Storage(format!(
                    "Cannot read vector collection {}: {e}",
                    path.display()
                )))
            }
        };
        info!(path = %path.display(), entries = entries.len(), "Vector collection opened");
        Ok(Self {
            path: Some(path),
            entries: RwLock::new(entries),
        })
    }

    async fn persist(&self, entries: &[IndexEntry]) -> Result<(), AppError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let raw = serde_json::to_vec(entries)
            .map_err(|e| AppError::Storage(format!("Cannot encode vector collection: {e}")))?;
        tokio::fs::write(path, raw).await.map_err(|e| {
            AppError::Storage(format!("Cannot write vector collection {}: {e}", path.display()))
        })
    }
}

#[async_trait]
impl VectorIndex for LocalVectorIndex {
    async fn upsert(
        &self,
        doc_id: &str,
        embedding: Vec<f32>,
        metadata: EntryMetadata,
    ) -> Result<(), AppError> {
        if embedding.is_empty() {
            return Err(AppError::Validation(format!("Empty embedding for {doc_id}")));
        }
        let mut entries = self.entries.write().await;
        if let Some(existing) = entries.iter().find(|e| e.doc_id != doc_id) {
            if existing.embedding.len() != embedding.len() {
                return Err(AppError::Validation(format!(
                    "Embedding dimension {} does not match collection dimension {}",
                    embedding.len(),
                    existing.embedding.len()
                )));
            }
        }

        let entry = IndexEntry {
            doc_id: doc_id.to_string(),
            embedding,
            metadata,
        };
        match entries.iter_mut().find(|e| e.doc_id == doc_id) {
            Some(slot) => *slot = entry,
            None => entries.push(entry),
        }
        self.persist(&entries).await?;
        debug!(doc_id, total = entries.len(), "Vector upserted");
        Ok(())
    }

    async fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<IndexHit>, AppError> {
        let entries = self.entries.read().await;
        if let Some(first) = entries.first() {
            if first.embedding.len() != embedding.len() {
                return Err(AppError::Validation(format!(
                    "Query dimension {} does not match collection dimension {}",
                    embedding.len(),
                    first.embedding.len()
                )));
            }
        }

        let mut hits: Vec<IndexHit> = entries
            .iter()
            .map(|e| IndexHit {
                doc_id: e.doc_id.clone(),
                distance: cosine_distance(embedding, &e.embedding),
            })
            .collect();
        // sort_by is stable, so equal distances keep insertion order
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(k);
        Ok(hits)
    }

    async fn reset(&self) -> Result<(), AppError> {
        let mut entries = self.entries.write().await;
        entries.clear();
        if let Some(path) = &self.path {
            match tokio::fs::remove_file(path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(AppError::Storage(format!(
                        "Cannot remove vector collection {}: {e}",
                        path.display()
                    )))
                }
            }
        }
        Ok(())
    }

    async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}
