//! Document Store: JSON records written through to the remote store and
//! mirrored to a local cache.
//!
//! Reads prefer a cache entry younger than the TTL (24 h by default). Remote
//! calls get 3 attempts with a fixed 1 s pause; a missing key is not retried.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, warn};

use crate::errors::AppError;
use crate::storage::{BlobStore, LocalBlobStore};

pub const MAX_ATTEMPTS: u32 = 3;
pub const RETRY_BACKOFF: Duration = Duration::from_secs(1);

pub fn default_cache_ttl() -> chrono::Duration {
    chrono::Duration::hours(24)
}

#[derive(Clone)]
pub struct DocumentStore {
    remote: Arc<dyn BlobStore>,
    cache: LocalBlobStore,
    cache_ttl: chrono::Duration,
}

impl DocumentStore {
    pub fn new(remote: Arc<dyn BlobStore>, cache: LocalBlobStore) -> Self {
        Self {
            remote,
            cache,
            cache_ttl: default_cache_ttl(),
        }
    }

    pub fn with_cache_ttl(mut self, ttl: chrono::Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub async fn save<T: Serialize + Sync>(&self, key: &str, value: &T) -> Result<(), AppError> {
        let body = serde_json::to_vec_pretty(value)
            .map(Bytes::from)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Cannot encode {key}: {e}")))?;

        with_retry("upload", key, || self.remote.put(key, body.clone())).await?;
        info!(key, "Saved document");

        if let Err(e) = self.cache.put(key, body).await {
            warn!(key, "Cache write failed: {e}");
        }
        Ok(())
    }

    pub async fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, AppError> {
        if let Some(value) = self.load_cached(key).await {
            debug!(key, "Cache hit");
            return Ok(Some(value));
        }

        let Some(body) = with_retry("download", key, || self.remote.get(key)).await? else {
            debug!(key, "Not found in remote store");
            return Ok(None);
        };
        let value = serde_json::from_slice(&body)
            .map_err(|e| AppError::Storage(format!("Corrupt record at {key}: {e}")))?;

        if let Err(e) = self.cache.put(key, body).await {
            warn!(key, "Cache refresh failed: {e}");
        }
        Ok(Some(value))
    }

    /// A fresh, decodable cache entry, or `None`. Unusable entries count as misses.
    async fn load_cached<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let modified = match self.cache.modified(key).await {
            Ok(Some(modified)) => DateTime::<Utc>::from(modified),
            Ok(None) => return None,
            Err(e) => {
                warn!(key, "Cache stat failed: {e}");
                return None;
            }
        };
        if Utc::now() - modified >= self.cache_ttl {
            debug!(key, "Cache entry is stale");
            return None;
        }

        let body = match self.cache.get(key).await {
            Ok(Some(body)) => body,
            Ok(None) => return None,
            Err(e) => {
                warn!(key, "Cache read failed: {e}");
                return None;
            }
        };
        match serde_json::from_slice(&body) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, "Ignoring corrupt cache entry: {e}");
                None
            }
        }
    }
}

/// Runs `op` up to `MAX_ATTEMPTS` times, sleeping `RETRY_BACKOFF` between attempts.
/// Only `Storage` errors are retried; anything else is returned as is.
async fn with_retry<T, F, Fut>(action: &str, key: &str, mut op: F) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e @ AppError::Storage(_)) if attempt < MAX_ATTEMPTS => {
                warn!(
                    "{action} of {key} failed (attempt {attempt}/{MAX_ATTEMPTS}), retrying after {}ms: {e}",
                    RETRY_BACKOFF.as_millis()
                );
                tokio::time::sleep(RETRY_BACKOFF).await;
                attempt += 1;
            }
            Err(AppError::Storage(e)) => {
                return Err(AppError::Storage(format!(
                    "{action} of {key} failed after {MAX_ATTEMPTS} attempts: {e}"
                )))
            }
            Err(e) => return Err(e),
        }
    }
}
