use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use crate::engine::cache::{CacheLimits, FileCache};
use crate::remote::ObjectStore;

use super::{INPUT_BUCKET, MemoryObjectStore};

/// Builds a download cache over an in-memory store, with timings shrunk
/// so retry and timeout paths settle in milliseconds.
pub struct CacheFactory {
    limits: CacheLimits,
}

pub struct TestCache {
    pub cache: Arc<FileCache>,
    pub store: Arc<MemoryObjectStore>,
    pub dir: TempDir,
}

impl CacheFactory {
    pub fn new() -> Self {
        Self {
            limits: CacheLimits {
                capacity_bytes: 64 * 1024 * 1024,
                max_attempts: 3,
                retry_backoff: Duration::from_millis(5),
                download_timeout: Duration::from_secs(5),
            },
        }
    }

    pub fn with_capacity_bytes(mut self, bytes: u64) -> Self {
        self.limits.capacity_bytes = bytes;
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.limits.max_attempts = attempts;
        self
    }

    pub fn with_download_timeout(mut self, timeout: Duration) -> Self {
        self.limits.download_timeout = timeout;
        self
    }

    pub fn create(self) -> TestCache {
        let dir = tempfile::tempdir().expect("tempdir creation failed");
        let store = Arc::new(MemoryObjectStore::new());
        let cache = Arc::new(FileCache::new(
            Arc::clone(&store) as Arc<dyn ObjectStore>,
            INPUT_BUCKET.to_string(),
            dir.path().join("cache"),
            self.limits,
        ));
        TestCache { cache, store, dir }
    }
}

impl TestCache {
    pub fn seed(&self, key: &str, data: &[u8]) {
        self.store.seed(INPUT_BUCKET, key, data);
    }
}
