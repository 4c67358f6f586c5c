use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::{debug, info};

use crate::engine::job::types::{Job, JobState};
use crate::remote::BrokerLease;
use crate::request::{Fingerprint, Requester};

const LOG_TARGET: &str = "engine::job::registry";

/// Outcome of a submission: a fresh job the caller must run, or a live
/// job the request merged into.
pub enum Submission {
    Created(Arc<Job>),
    Joined(Arc<Job>),
}

/// In-flight jobs keyed by fingerprint. Merging into a job and removing a
/// finished job both happen under the table lock, so a concurrent
/// duplicate either joins a live job or creates a fresh one, never
/// neither. At most one non-terminal job exists per fingerprint.
pub struct JobRegistry {
    jobs: Mutex<HashMap<Fingerprint, Arc<Job>>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self {
            jobs: Mutex::new(HashMap::new()),
        }
    }

    pub fn submit(
        &self,
        fingerprint: Fingerprint,
        keys: Vec<String>,
        requester: Requester,
        lease: Option<Arc<dyn BrokerLease>>,
    ) -> Submission {
        let mut jobs = self.jobs.lock().unwrap();
        if let Some(job) = jobs.get(&fingerprint) {
            job.add_requester(requester);
            if let Some(lease) = lease {
                if !job.attach_lease(lease) {
                    debug!(target: LOG_TARGET, fingerprint = %fingerprint, "Redelivered lease ignored");
                }
            }
            debug!(target: LOG_TARGET, fingerprint = %fingerprint, "Request merged into in-flight job");
            Submission::Joined(Arc::clone(job))
        } else {
            let job = Arc::new(Job::new(fingerprint.clone(), keys, requester, lease));
            jobs.insert(fingerprint.clone(), Arc::clone(&job));
            info!(target: LOG_TARGET, fingerprint = %fingerprint, files = job.total_files(), "Job created");
            Submission::Created(job)
        }
    }

    /// Settles a job: marks it terminal, snapshots its requesters and
    /// drops it from the table, all in one critical section. A duplicate
    /// submitted during this window either merged before (and is in the
    /// snapshot) or finds the table empty and starts a fresh job.
    pub fn finish(&self, job: &Arc<Job>, state: JobState) -> Vec<Requester> {
        debug_assert!(state.is_terminal());
        let mut jobs = self.jobs.lock().unwrap();
        let requesters = job.requesters();
        job.set_state(state);
        jobs.remove(job.fingerprint());
        info!(
            target: LOG_TARGET,
            fingerprint = %job.fingerprint(),
            requesters = requesters.len(),
            "Job settled"
        );
        requesters
    }

    pub fn get(&self, fingerprint: &Fingerprint) -> Option<Arc<Job>> {
        self.jobs.lock().unwrap().get(fingerprint).cloned()
    }

    pub fn len(&self) -> usize {
        self.jobs.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new()
    }
}
