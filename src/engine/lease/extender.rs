use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::engine::job::{Job, JobState};
use crate::remote::LeaseError;

const LOG_TARGET: &str = "engine::lease";

/// Deadline-keeping knobs. `extend_interval` must stay well below the
/// broker's base message deadline, or redelivery wins the race.
#[derive(Debug, Clone)]
pub struct BrokerTuning {
    pub extend_interval: Duration,
    pub max_extension: Duration,
}

impl Default for BrokerTuning {
    fn default() -> Self {
        Self {
            extend_interval: Duration::from_secs(60),
            max_extension: Duration::from_secs(600),
        }
    }
}

/// Keeps every lease attached to a job alive while the job runs, then
/// settles them once when the job reaches a terminal state.
///
/// One extender task runs per job, not per lease: redelivered duplicates
/// merge into the job, and their leases ride the same ticker.
pub struct LeaseExtender;

impl LeaseExtender {
    pub fn spawn(job: Arc<Job>, tuning: BrokerTuning) -> JoinHandle<()> {
        tokio::spawn(Self::run(job, tuning))
    }

    async fn run(job: Arc<Job>, tuning: BrokerTuning) {
        let mut state_rx = job.subscribe();
        let mut ticker = time::interval_at(
            time::Instant::now() + tuning.extend_interval,
            tuning.extend_interval,
        );
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if job.state().is_terminal() {
                Self::settle(&job).await;
                return;
            }
            tokio::select! {
                _ = ticker.tick() => Self::extend_all(&job, &tuning).await,
                changed = state_rx.changed() => {
                    if changed.is_err() {
                        // Job dropped without reaching a terminal state.
                        return;
                    }
                }
            }
        }
    }

    async fn extend_all(job: &Job, tuning: &BrokerTuning) {
        let (done, total) = job.progress();
        let by = estimate_remaining(done, total, job.elapsed(), tuning.max_extension);
        if by.is_zero() {
            return;
        }
        for lease in job.lease_snapshot() {
            match lease.extend(by).await {
                Ok(()) => {
                    debug!(
                        target: LOG_TARGET,
                        fingerprint = %job.fingerprint(),
                        lease = lease.id(),
                        extended_secs = by.as_secs(),
                        "Lease extended"
                    );
                }
                Err(LeaseError::Expired) => {
                    warn!(
                        target: LOG_TARGET,
                        fingerprint = %job.fingerprint(),
                        lease = lease.id(),
                        "Lease expired; dropping it while the job runs on"
                    );
                    job.detach_lease(lease.id());
                }
                Err(LeaseError::Transport(reason)) => {
                    warn!(
                        target: LOG_TARGET,
                        fingerprint = %job.fingerprint(),
                        lease = lease.id(),
                        %reason,
                        "Lease extension failed; retrying next tick"
                    );
                }
            }
        }
    }

    /// Acks on success. Acks non-retryable failures too, so a poisoned
    /// request cannot loop through redelivery forever. Nacks retryable
    /// failures to hand the message back to the broker.
    async fn settle(job: &Job) {
        let ack = match job.state() {
            JobState::Succeeded => true,
            JobState::Failed { retryable, .. } => !retryable,
            JobState::Queued | JobState::Running => return,
        };
        for lease in job.take_leases() {
            let settled = if ack {
                lease.ack().await
            } else {
                lease.nack().await
            };
            match settled {
                Ok(()) => {
                    info!(
                        target: LOG_TARGET,
                        fingerprint = %job.fingerprint(),
                        lease = lease.id(),
                        acked = ack,
                        "Lease settled"
                    );
                }
                Err(e) => {
                    warn!(
                        target: LOG_TARGET,
                        fingerprint = %job.fingerprint(),
                        lease = lease.id(),
                        error = %e,
                        "Lease settlement failed"
                    );
                }
            }
        }
    }
}

/// Estimates how much longer the job needs from its per-file pace so far,
/// scaled by 1.5 for slack and capped at `max`. Before the first file
/// completes there is no pace to go on, so the cap is used.
pub fn estimate_remaining(done: usize, total: usize, elapsed: Duration, max: Duration) -> Duration {
    let remaining = total.saturating_sub(done);
    if remaining == 0 {
        return Duration::ZERO;
    }
    if done == 0 {
        return max;
    }
    let per_file = elapsed.as_secs_f64() / done as f64;
    let estimate = per_file * remaining as f64 * 1.5;
    Duration::from_secs(estimate.ceil() as u64).min(max)
}
