use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::errors::AppError;
use crate::models::{DocType, InputDocument, SkippedDocument};
use crate::pipeline::ingest::{ingest_file, supported_extension};

/// Documents a source produced, plus the ones it could not read.
#[derive(Debug, Default)]
pub struct SourceBatch {
    pub documents: Vec<InputDocument>,
    pub rejected: Vec<SkippedDocument>,
}

/// Where a batch run gets its documents of one type.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    fn doc_type(&self) -> DocType;

    async fn load(&self) -> Result<SourceBatch, AppError>;
}

/// Every supported file in one directory, in file-name order.
pub struct DirectorySource {
    dir: PathBuf,
    doc_type: DocType,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>, doc_type: DocType) -> Self {
        Self {
            dir: dir.into(),
            doc_type,
        }
    }

    async fn list_files(&self) -> Result<Vec<PathBuf>, AppError> {
        let mut reader = tokio::fs::read_dir(&self.dir).await.map_err(|e| {
            AppError::Validation(format!(
                "Cannot read {} directory {}: {e}",
                self.doc_type,
                self.dir.display()
            ))
        })?;

        let mut files = Vec::new();
        while let Some(entry) = reader
            .next_entry()
            .await
            .map_err(|e| AppError::Storage(format!("Cannot list {}: {e}", self.dir.display())))?
        {
            let path = entry.path();
            let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
            if !is_file {
                continue;
            }
            match path.file_name().and_then(|n| n.to_str()) {
                Some(name) if supported_extension(name).is_some() => files.push(path),
                _ => debug!(file = %path.display(), "Ignoring unsupported file"),
            }
        }
        files.sort();
        Ok(files)
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string()
}

#[async_trait]
impl DocumentSource for DirectorySource {
    fn doc_type(&self) -> DocType {
        self.doc_type
    }

    async fn load(&self) -> Result<SourceBatch, AppError> {
        let mut batch = SourceBatch::default();
        for path in self.list_files().await? {
            match ingest_file(&path, self.doc_type).await {
                Ok(doc) => batch.documents.push(doc),
                Err(e) => {
                    warn!(file = %path.display(), "Skipping unreadable document: {e}");
                    batch.rejected.push(SkippedDocument {
                        doc_id: display_name(&path),
                        doc_type: self.doc_type,
                        reason: e.to_string(),
                    });
                }
            }
        }
        info!(
            dir = %self.dir.display(),
            doc_type = %self.doc_type,
            loaded = batch.documents.len(),
            rejected = batch.rejected.len(),
            "Loaded documents"
        );
        Ok(batch)
    }
}

/// A fixed, already-extracted list of documents.
pub struct StaticSource {
    doc_type: DocType,
    documents: Vec<InputDocument>,
}

impl StaticSource {
    pub fn new(doc_type: DocType, documents: Vec<InputDocument>) -> Self {
        Self {
            doc_type,
            documents,
        }
    }
}

#[async_trait]
impl DocumentSource for StaticSource {
    fn doc_type(&self) -> DocType {
        self.doc_type
    }

    async fn load(&self) -> Result<SourceBatch, AppError> {
        Ok(SourceBatch {
            documents: self.documents.clone(),
            rejected: Vec::new(),
        })
    }
}
