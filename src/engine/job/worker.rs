use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use futures::stream;
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::engine::cache::{CacheLease, FileCache};
use crate::engine::errors::{JobError, ZipBuildError};
use crate::engine::job::registry::JobRegistry;
use crate::engine::job::types::{Job, JobState};
use crate::engine::zip::build_archive;
use crate::remote::{Notification, NotificationOutcome, Notifier, ObjectStore};
use crate::request::Requester;

const LOG_TARGET: &str = "engine::job::worker";

/// Assembly knobs, fixed at startup.
#[derive(Debug, Clone)]
pub struct ZipperTuning {
    pub output_bucket: String,
    pub scratch_dir: PathBuf,
    pub max_parallel_jobs: usize,
    pub per_job_fanout: usize,
    pub job_timeout: Duration,
}

/// Runs one job end to end: pull every object through the shared cache,
/// assemble the archive in scratch space, upload it, verify it landed,
/// then settle the registry and notify every requester.
pub struct ZipJobWorker {
    registry: Arc<JobRegistry>,
    cache: Arc<FileCache>,
    store: Arc<dyn ObjectStore>,
    notifier: Arc<dyn Notifier>,
    tuning: ZipperTuning,
}

impl ZipJobWorker {
    pub fn new(
        registry: Arc<JobRegistry>,
        cache: Arc<FileCache>,
        store: Arc<dyn ObjectStore>,
        notifier: Arc<dyn Notifier>,
        tuning: ZipperTuning,
    ) -> Self {
        Self {
            registry,
            cache,
            store,
            notifier,
            tuning,
        }
    }

    pub async fn run(&self, job: Arc<Job>) {
        job.mark_running();
        info!(
            target: LOG_TARGET,
            fingerprint = %job.fingerprint(),
            files = job.total_files(),
            "Job started"
        );

        let result = match timeout(self.tuning.job_timeout, self.execute(&job)).await {
            Ok(result) => result,
            Err(_) => Err(JobError::Timeout),
        };
        self.sweep_scratch(&job).await;

        match result {
            Ok(object) => {
                let requesters = self.registry.finish(&job, JobState::Succeeded);
                info!(
                    target: LOG_TARGET,
                    fingerprint = %job.fingerprint(),
                    object = %object,
                    elapsed_ms = job.elapsed().as_millis() as u64,
                    "Job succeeded"
                );
                let outcome = NotificationOutcome::Completed {
                    bucket: self.tuning.output_bucket.clone(),
                    object,
                };
                self.notify_all(&job, &requesters, outcome).await;
            }
            Err(e) => {
                let retryable = e.is_retryable();
                error!(
                    target: LOG_TARGET,
                    fingerprint = %job.fingerprint(),
                    error = %e,
                    retryable,
                    "Job failed"
                );
                let reason = e.to_string();
                let requesters = self.registry.finish(
                    &job,
                    JobState::Failed {
                        retryable,
                        reason: reason.clone(),
                    },
                );
                // A nacked message comes back, so requesters hear about the
                // attempt. A poisoned request is acked and notifies nobody.
                if retryable {
                    self.notify_all(&job, &requesters, NotificationOutcome::Failed { reason })
                        .await;
                }
            }
        }
    }

    async fn execute(&self, job: &Arc<Job>) -> Result<String, JobError> {
        let leases = self.acquire_all(job).await?;

        let entries: Vec<(String, PathBuf)> = leases
            .iter()
            .map(|lease| (lease.key().to_string(), lease.path().to_path_buf()))
            .collect();
        let scratch = self.scratch_dir(job);
        let fingerprint = job.fingerprint().clone();
        let keys = job.keys().to_vec();
        let built =
            tokio::task::spawn_blocking(move || build_archive(&scratch, &fingerprint, &keys, &entries))
                .await
                .map_err(|e| {
                    JobError::Build(ZipBuildError::Io(io::Error::other(format!(
                        "archive build task failed: {e}"
                    ))))
                })?;
        let zip_path = built?;
        drop(leases);

        let object = job.fingerprint().archive_object_name();
        self.store
            .put_file(&self.tuning.output_bucket, &object, &zip_path)
            .await
            .map_err(JobError::Upload)?;
        let meta = self
            .store
            .stat(&self.tuning.output_bucket, &object)
            .await
            .map_err(JobError::Verify)?;
        info!(
            target: LOG_TARGET,
            fingerprint = %job.fingerprint(),
            object = %object,
            size = meta.size,
            "Archive uploaded"
        );
        Ok(object)
    }

    /// Pulls every object through the cache with bounded fan-out. The
    /// first failure wins; outstanding acquisitions are dropped and any
    /// download they started finishes detached inside the cache.
    async fn acquire_all(&self, job: &Arc<Job>) -> Result<Vec<CacheLease>, JobError> {
        let fanout = self.tuning.per_job_fanout.max(1);
        let mut pending = stream::iter(job.keys().iter().cloned().map(|key| {
            let cache = Arc::clone(&self.cache);
            async move { cache.acquire(&key).await }
        }))
        .buffer_unordered(fanout);

        let mut leases = Vec::with_capacity(job.total_files());
        while let Some(acquired) = pending.next().await {
            let lease = acquired?;
            job.note_file_done();
            leases.push(lease);
        }
        Ok(leases)
    }

    fn scratch_dir(&self, job: &Job) -> PathBuf {
        self.tuning.scratch_dir.join(job.fingerprint().as_str())
    }

    async fn sweep_scratch(&self, job: &Job) {
        let scratch = self.scratch_dir(job);
        if let Err(e) = tokio::fs::remove_dir_all(&scratch).await {
            if e.kind() != io::ErrorKind::NotFound {
                warn!(
                    target: LOG_TARGET,
                    path = %scratch.display(),
                    error = %e,
                    "Scratch cleanup failed"
                );
            }
        }
    }

    async fn notify_all(&self, job: &Job, requesters: &[Requester], outcome: NotificationOutcome) {
        for requester in requesters {
            let notification = Notification {
                requester: requester.clone(),
                files: job.keys().to_vec(),
                outcome: outcome.clone(),
            };
            if let Err(e) = self.notifier.send(&notification).await {
                warn!(
                    target: LOG_TARGET,
                    fingerprint = %job.fingerprint(),
                    requester = %requester,
                    error = %e,
                    "Notification delivery failed"
                );
            }
        }
    }
}
