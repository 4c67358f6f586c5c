use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{debug, info};

use crate::engine::cache::{FileCache, FileCacheStats};
use crate::engine::errors::SubmitError;
use crate::engine::job::{Job, JobRegistry, Submission, ZipJobWorker, ZipperTuning};
use crate::engine::lease::{BrokerTuning, LeaseExtender};
use crate::remote::{Notifier, ObjectStore};
use crate::request::fingerprint::canonical_keys;
use crate::request::{Fingerprint, ZipRequest};

const LOG_TARGET: &str = "engine::dispatcher";

/// What a submission produced, echoed back to the requesting frontend.
#[derive(Debug, Clone, Serialize)]
pub struct SubmitReceipt {
    pub fingerprint: String,
    pub merged: bool,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct DispatcherStats {
    pub active_jobs: u64,
    pub queued_jobs: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub jobs: DispatcherStats,
    pub cache: FileCacheStats,
}

/// Front door of the engine: validates requests, dedups them into the
/// registry, and runs each fresh job on a bounded pool while a lease
/// extender keeps its broker deadlines pushed out.
pub struct Dispatcher {
    registry: Arc<JobRegistry>,
    cache: Arc<FileCache>,
    worker: Arc<ZipJobWorker>,
    pool: Arc<Semaphore>,
    broker_tuning: BrokerTuning,
    active_jobs: Arc<AtomicU64>,
    queued_jobs: Arc<AtomicU64>,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<JobRegistry>,
        cache: Arc<FileCache>,
        store: Arc<dyn ObjectStore>,
        notifier: Arc<dyn Notifier>,
        tuning: ZipperTuning,
        broker_tuning: BrokerTuning,
    ) -> Self {
        let pool = Arc::new(Semaphore::new(tuning.max_parallel_jobs.max(1)));
        let worker = Arc::new(ZipJobWorker::new(
            Arc::clone(&registry),
            Arc::clone(&cache),
            store,
            notifier,
            tuning,
        ));
        Self {
            registry,
            cache,
            worker,
            pool,
            broker_tuning,
            active_jobs: Arc::new(AtomicU64::new(0)),
            queued_jobs: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Validates and registers a request, returning as soon as the job is
    /// queued. Duplicates of an in-flight job merge into it instead of
    /// spawning a second one.
    pub fn submit(&self, request: ZipRequest) -> Result<SubmitReceipt, SubmitError> {
        validate(&request)?;
        let keys = canonical_keys(request.file_keys());
        let fingerprint = Fingerprint::from_keys(&keys).map_err(|_| SubmitError::EmptyFileList)?;
        debug!(
            target: LOG_TARGET,
            fingerprint = %fingerprint,
            files = keys.len(),
            requester = %request.requester,
            "Request accepted"
        );

        match self
            .registry
            .submit(fingerprint.clone(), keys, request.requester, request.lease)
        {
            Submission::Created(job) => {
                LeaseExtender::spawn(Arc::clone(&job), self.broker_tuning.clone());
                self.spawn_job(job);
                Ok(SubmitReceipt {
                    fingerprint: fingerprint.to_string(),
                    merged: false,
                })
            }
            Submission::Joined(_) => Ok(SubmitReceipt {
                fingerprint: fingerprint.to_string(),
                merged: true,
            }),
        }
    }

    fn spawn_job(&self, job: Arc<Job>) {
        let worker = Arc::clone(&self.worker);
        let pool = Arc::clone(&self.pool);
        let active = Arc::clone(&self.active_jobs);
        let queued = Arc::clone(&self.queued_jobs);
        queued.fetch_add(1, Ordering::SeqCst);
        info!(
            target: LOG_TARGET,
            fingerprint = %job.fingerprint(),
            "Job queued"
        );
        tokio::spawn(async move {
            let permit = pool.acquire_owned().await;
            queued.fetch_sub(1, Ordering::SeqCst);
            let _permit = match permit {
                Ok(permit) => permit,
                Err(_) => return,
            };
            active.fetch_add(1, Ordering::SeqCst);
            worker.run(job).await;
            active.fetch_sub(1, Ordering::SeqCst);
        });
    }

    pub fn stats(&self) -> DispatcherStats {
        DispatcherStats {
            active_jobs: self.active_jobs.load(Ordering::SeqCst),
            queued_jobs: self.queued_jobs.load(Ordering::SeqCst),
        }
    }

    pub fn status(&self) -> StatusReport {
        StatusReport {
            jobs: self.stats(),
            cache: self.cache.stats(),
        }
    }
}

fn validate(request: &ZipRequest) -> Result<(), SubmitError> {
    if request.files.is_empty() {
        return Err(SubmitError::EmptyFileList);
    }
    if request.requester.name.trim().is_empty() || request.requester.email.trim().is_empty() {
        return Err(SubmitError::InvalidRequester);
    }
    Ok(())
}
