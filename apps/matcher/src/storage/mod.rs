//! Blob persistence: remote key-value store behind `BlobStore`, fronted by
//! `DocumentStore` for JSON encoding, local caching and retry.

pub mod document_store;
pub mod local;
pub mod s3;

use async_trait::async_trait;
use bytes::Bytes;

use crate::errors::AppError;

pub use document_store::DocumentStore;
pub use local::LocalBlobStore;
pub use s3::S3BlobStore;

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, key: &str, body: Bytes) -> Result<(), AppError>;

    /// `Ok(None)` when the key does not exist.
    async fn get(&self, key: &str) -> Result<Option<Bytes>, AppError>;
}

pub fn processed_key(doc_id: &str) -> String {
    format!("processed/{doc_id}.json")
}

pub fn matches_key(doc_id: &str) -> String {
    format!("matches/{doc_id}.json")
}
