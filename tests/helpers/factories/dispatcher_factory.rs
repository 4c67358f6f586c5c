use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use crate::engine::cache::{CacheLimits, FileCache};
use crate::engine::dispatcher::Dispatcher;
use crate::engine::job::{JobRegistry, ZipperTuning};
use crate::engine::lease::BrokerTuning;
use crate::remote::{Notifier, ObjectStore};
use crate::test_helpers::poll;

use super::{MemoryNotifier, MemoryObjectStore};

pub const INPUT_BUCKET: &str = "incoming";
pub const OUTPUT_BUCKET: &str = "bundles";

/// Builds a fully wired dispatcher on top of in-memory doubles, with
/// timings shrunk so tests settle in milliseconds.
pub struct DispatcherFactory {
    max_attempts: u32,
    max_parallel_jobs: usize,
    extend_interval: Duration,
}

pub struct TestEngine {
    pub dispatcher: Arc<Dispatcher>,
    pub registry: Arc<JobRegistry>,
    pub cache: Arc<FileCache>,
    pub store: Arc<MemoryObjectStore>,
    pub notifier: Arc<MemoryNotifier>,
    pub dir: TempDir,
}

impl DispatcherFactory {
    pub fn new() -> Self {
        Self {
            max_attempts: 3,
            max_parallel_jobs: 4,
            extend_interval: Duration::from_millis(25),
        }
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn with_max_parallel_jobs(mut self, jobs: usize) -> Self {
        self.max_parallel_jobs = jobs;
        self
    }

    pub fn with_extend_interval(mut self, interval: Duration) -> Self {
        self.extend_interval = interval;
        self
    }

    pub fn create(self) -> TestEngine {
        let dir = tempfile::tempdir().expect("tempdir creation failed");
        let store = Arc::new(MemoryObjectStore::new());
        let notifier = Arc::new(MemoryNotifier::new());
        let registry = Arc::new(JobRegistry::new());
        let cache = Arc::new(FileCache::new(
            Arc::clone(&store) as Arc<dyn ObjectStore>,
            INPUT_BUCKET.to_string(),
            dir.path().join("cache"),
            CacheLimits {
                capacity_bytes: 64 * 1024 * 1024,
                max_attempts: self.max_attempts,
                retry_backoff: Duration::from_millis(5),
                download_timeout: Duration::from_secs(5),
            },
        ));
        let dispatcher = Arc::new(Dispatcher::new(
            Arc::clone(&registry),
            Arc::clone(&cache),
            Arc::clone(&store) as Arc<dyn ObjectStore>,
            Arc::clone(&notifier) as Arc<dyn Notifier>,
            ZipperTuning {
                output_bucket: OUTPUT_BUCKET.to_string(),
                scratch_dir: dir.path().join("scratch"),
                max_parallel_jobs: self.max_parallel_jobs,
                per_job_fanout: 4,
                job_timeout: Duration::from_secs(10),
            },
            BrokerTuning {
                extend_interval: self.extend_interval,
                max_extension: Duration::from_secs(600),
            },
        ));

        TestEngine {
            dispatcher,
            registry,
            cache,
            store,
            notifier,
            dir,
        }
    }
}

impl TestEngine {
    pub fn seed(&self, key: &str, data: &[u8]) {
        self.store.seed(INPUT_BUCKET, key, data);
    }

    /// Waits until no job is queued, running, or registered.
    pub async fn wait_idle(&self, timeout: Duration) {
        poll::wait_for(timeout, "engine to go idle", || {
            let stats = self.dispatcher.stats();
            self.registry.is_empty() && stats.active_jobs == 0 && stats.queued_jobs == 0
        })
        .await;
    }
}
