use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};

use super::errors::StorageError;

/// Metadata of a stored object.
#[derive(Debug, Clone)]
pub struct ObjectMeta {
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
}

/// Bucket-scoped object storage. Implementations decide what a bucket and
/// a key map to; the engine treats keys as opaque strings.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Reads a whole object into memory.
    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes, StorageError>;

    /// Stores a local file under `bucket`/`key`, replacing any previous
    /// object of that name.
    async fn put_file(&self, bucket: &str, key: &str, source: &Path) -> Result<(), StorageError>;

    /// Looks an object up without reading it.
    async fn stat(&self, bucket: &str, key: &str) -> Result<ObjectMeta, StorageError>;
}
