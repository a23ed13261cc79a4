use std::path::{Path, PathBuf};
use std::time::SystemTime;

use async_trait::async_trait;
use bytes::Bytes;

use crate::errors::AppError;
use crate::storage::BlobStore;

/// A directory standing in for the remote bucket. Keys map to relative paths.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Last modification time of `key`, or `None` when it does not exist.
    pub async fn modified(&self, key: &str) -> Result<Option<SystemTime>, AppError> {
        let path = self.path_for(key)?;
        match tokio::fs::metadata(&path).await {
            Ok(meta) => meta
                .modified()
                .map(Some)
                .map_err(|e| AppError::Storage(format!("No mtime for {}: {e}", path.display()))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Storage(format!(
                "Cannot stat {}: {e}",
                path.display()
            ))),
        }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, AppError> {
        let escapes = key.starts_with('/') || key.split('/').any(|s| s == ".." || s.is_empty());
        if key.is_empty() || escapes {
            return Err(AppError::Validation(format!("Invalid storage key '{key}'")));
        }
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, key: &str, body: Bytes) -> Result<(), AppError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Storage(format!("Cannot create {}: {e}", parent.display())))?;
        }
        tokio::fs::write(&path, &body)
            .await
            .map_err(|e| AppError::Storage(format!("Cannot write {}: {e}", path.display())))
    }

    async fn get(&self, key: &str) -> Result<Option<Bytes>, AppError> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(raw) => Ok(Some(Bytes::from(raw))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Storage(format!(
                "Cannot read {}: {e}",
                path.display()
            ))),
        }
    }
}
