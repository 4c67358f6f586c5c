use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::sync::watch;

use crate::remote::BrokerLease;
use crate::request::{Fingerprint, Requester};

/// Lifecycle of one deduplicated zip job.
#[derive(Debug, Clone, PartialEq)]
pub enum JobState {
    Queued,
    Running,
    Succeeded,
    Failed { retryable: bool, reason: String },
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Succeeded | JobState::Failed { .. })
    }
}

struct JobInner {
    requesters: Vec<Requester>,
    leases: HashMap<String, Arc<dyn BrokerLease>>,
}

/// One in-flight archive build. Every duplicate request for the same
/// fingerprint merges into a single `Job`; its state is published over a
/// watch channel for the lease extender.
pub struct Job {
    fingerprint: Fingerprint,
    keys: Vec<String>,
    state_tx: watch::Sender<JobState>,
    inner: Mutex<JobInner>,
    files_done: AtomicUsize,
    created_at: Instant,
}

impl Job {
    pub(crate) fn new(
        fingerprint: Fingerprint,
        keys: Vec<String>,
        requester: Requester,
        lease: Option<Arc<dyn BrokerLease>>,
    ) -> Self {
        let (state_tx, _) = watch::channel(JobState::Queued);
        let mut leases = HashMap::new();
        if let Some(lease) = lease {
            leases.insert(lease.id().to_string(), lease);
        }
        Self {
            fingerprint,
            keys,
            state_tx,
            inner: Mutex::new(JobInner {
                requesters: vec![requester],
                leases,
            }),
            files_done: AtomicUsize::new(0),
            created_at: Instant::now(),
        }
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    /// Canonical (sorted, deduplicated) keys this job archives.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn total_files(&self) -> usize {
        self.keys.len()
    }

    pub fn state(&self) -> JobState {
        self.state_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<JobState> {
        self.state_tx.subscribe()
    }

    pub(crate) fn set_state(&self, state: JobState) {
        self.state_tx.send_replace(state);
    }

    pub(crate) fn mark_running(&self) {
        self.set_state(JobState::Running);
    }

    /// Duplicate identities collapse; the first occurrence wins.
    pub(crate) fn add_requester(&self, requester: Requester) {
        let mut inner = self.inner.lock().unwrap();
        if !inner.requesters.contains(&requester) {
            inner.requesters.push(requester);
        }
    }

    pub fn requesters(&self) -> Vec<Requester> {
        self.inner.lock().unwrap().requesters.clone()
    }

    /// Attaches a broker lease. Returns false when a lease with the same
    /// id is already attached (a redelivered duplicate).
    pub(crate) fn attach_lease(&self, lease: Arc<dyn BrokerLease>) -> bool {
        let mut inner = self.inner.lock().unwrap();
        match inner.leases.entry(lease.id().to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(lease);
                true
            }
        }
    }

    pub(crate) fn detach_lease(&self, id: &str) {
        self.inner.lock().unwrap().leases.remove(id);
    }

    pub(crate) fn lease_snapshot(&self) -> Vec<Arc<dyn BrokerLease>> {
        self.inner.lock().unwrap().leases.values().cloned().collect()
    }

    /// Drains the lease set for final settlement.
    pub(crate) fn take_leases(&self) -> Vec<Arc<dyn BrokerLease>> {
        let mut inner = self.inner.lock().unwrap();
        inner.leases.drain().map(|(_, lease)| lease).collect()
    }

    pub fn lease_count(&self) -> usize {
        self.inner.lock().unwrap().leases.len()
    }

    pub(crate) fn note_file_done(&self) {
        self.files_done.fetch_add(1, Ordering::Relaxed);
    }

    /// (files fetched so far, files total), as fed to deadline estimation.
    pub fn progress(&self) -> (usize, usize) {
        let done = self.files_done.load(Ordering::Relaxed).min(self.keys.len());
        (done, self.keys.len())
    }

    pub fn elapsed(&self) -> Duration {
        self.created_at.elapsed()
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("fingerprint", &self.fingerprint)
            .field("files", &self.keys.len())
            .field("state", &self.state())
            .finish()
    }
}
