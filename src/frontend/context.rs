use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;

use crate::engine::cache::{CacheLimits, FileCache};
use crate::engine::dispatcher::Dispatcher;
use crate::engine::job::{JobRegistry, ZipperTuning};
use crate::engine::lease::BrokerTuning;
use crate::remote::{FsObjectStore, HttpNotifier, Notifier, ObjectStore};
use crate::shared::config::CONFIG;

#[derive(Clone)]
pub struct FrontendContext {
    pub dispatcher: Arc<Dispatcher>,
}

impl FrontendContext {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Arc<Self> {
        Arc::new(Self { dispatcher })
    }

    pub fn from_config() -> anyhow::Result<Arc<Self>> {
        if CONFIG.storage.backend != "fs" {
            bail!("unsupported storage backend: {}", CONFIG.storage.backend);
        }
        let store: Arc<dyn ObjectStore> =
            Arc::new(FsObjectStore::new(PathBuf::from(&CONFIG.storage.fs_root)));
        let notifier: Arc<dyn Notifier> = Arc::new(HttpNotifier::new(
            CONFIG.notify.url.clone(),
            Duration::from_secs(CONFIG.notify.timeout_secs),
        )?);

        let registry = Arc::new(JobRegistry::new());
        let cache = Arc::new(FileCache::new(
            Arc::clone(&store),
            CONFIG.storage.input_bucket.clone(),
            PathBuf::from(&CONFIG.cache.dir),
            CacheLimits {
                capacity_bytes: CONFIG.cache.capacity_bytes,
                max_attempts: CONFIG.cache.max_attempts,
                retry_backoff: Duration::from_millis(CONFIG.cache.retry_backoff_ms),
                download_timeout: Duration::from_secs(CONFIG.cache.download_timeout_secs),
            },
        ));
        let dispatcher = Arc::new(Dispatcher::new(
            registry,
            cache,
            store,
            notifier,
            ZipperTuning {
                output_bucket: CONFIG.storage.output_bucket.clone(),
                scratch_dir: PathBuf::from(&CONFIG.zipper.scratch_dir),
                max_parallel_jobs: CONFIG.zipper.max_parallel_jobs,
                per_job_fanout: CONFIG.zipper.per_job_fanout,
                job_timeout: Duration::from_secs(CONFIG.zipper.job_timeout_secs),
            },
            BrokerTuning {
                extend_interval: Duration::from_secs(CONFIG.broker.extend_interval_secs),
                max_extension: Duration::from_secs(CONFIG.broker.max_extension_secs),
            },
        ));

        Ok(Self::new(dispatcher))
    }
}
