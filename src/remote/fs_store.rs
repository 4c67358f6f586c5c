use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tracing::debug;

use super::errors::StorageError;
use super::storage::{ObjectMeta, ObjectStore};

const LOG_TARGET: &str = "remote::fs_store";

/// Object store backed by a local directory tree: one directory per
/// bucket, one file per key. Keys containing `/` become nested paths.
#[derive(Debug)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn object_path(&self, bucket: &str, key: &str) -> PathBuf {
        self.root.join(bucket).join(key)
    }
}

fn map_read_error(err: std::io::Error, bucket: &str, key: &str) -> StorageError {
    if err.kind() == std::io::ErrorKind::NotFound {
        StorageError::NotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        }
    } else {
        StorageError::Transient(err.to_string())
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes, StorageError> {
        let path = self.object_path(bucket, key);
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| map_read_error(e, bucket, key))?;
        debug!(target: LOG_TARGET, bucket, key, bytes = bytes.len(), "Object read");
        Ok(Bytes::from(bytes))
    }

    async fn put_file(&self, bucket: &str, key: &str, source: &Path) -> Result<(), StorageError> {
        let dest = self.object_path(bucket, key);
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::Transient(e.to_string()))?;
        }

        // Copy to a sibling name first, then rename: readers never observe
        // a partially written object.
        let mut tmp = dest.clone().into_os_string();
        tmp.push(".part");
        let tmp = PathBuf::from(tmp);

        tokio::fs::copy(source, &tmp)
            .await
            .map_err(|e| StorageError::Transient(e.to_string()))?;
        tokio::fs::rename(&tmp, &dest)
            .await
            .map_err(|e| StorageError::Transient(e.to_string()))?;
        debug!(target: LOG_TARGET, bucket, key, "Object written");
        Ok(())
    }

    async fn stat(&self, bucket: &str, key: &str) -> Result<ObjectMeta, StorageError> {
        let path = self.object_path(bucket, key);
        let meta = tokio::fs::metadata(&path)
            .await
            .map_err(|e| map_read_error(e, bucket, key))?;
        Ok(ObjectMeta {
            size: meta.len(),
            modified: meta.modified().ok().map(DateTime::<Utc>::from),
        })
    }
}
