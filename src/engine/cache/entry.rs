use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use tokio::sync::watch;

/// Terminal failure of a download, fanned out to every waiter of the entry.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheFailure {
    NotFound,
    Io(String),
    RetriesExhausted { attempts: u32, last_error: String },
}

/// Download lifecycle of one cached object, published over a watch channel
/// so waiters suspend instead of polling.
#[derive(Debug, Clone)]
pub enum DownloadState {
    Pending,
    Downloading { attempt: u32 },
    Ready { path: PathBuf, bytes: u64 },
    Failed(CacheFailure),
}

impl DownloadState {
    pub fn is_ready(&self) -> bool {
        matches!(self, DownloadState::Ready { .. })
    }
}

/// One object tracked by the cache. Reference counts are only touched
/// while holding the cache table lock.
#[derive(Debug)]
pub struct CacheEntry {
    key: String,
    state_tx: watch::Sender<DownloadState>,
    refs: AtomicUsize,
    bytes: AtomicU64,
}

impl CacheEntry {
    pub fn new(key: &str) -> Self {
        let (state_tx, _) = watch::channel(DownloadState::Pending);
        Self {
            key: key.to_string(),
            state_tx,
            refs: AtomicUsize::new(0),
            bytes: AtomicU64::new(0),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn subscribe(&self) -> watch::Receiver<DownloadState> {
        self.state_tx.subscribe()
    }

    pub fn state(&self) -> DownloadState {
        self.state_tx.borrow().clone()
    }

    pub(crate) fn set_state(&self, state: DownloadState) {
        self.state_tx.send_replace(state);
    }

    pub fn bytes(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }

    pub(crate) fn set_bytes(&self, bytes: u64) {
        self.bytes.store(bytes, Ordering::Relaxed);
    }

    pub fn ref_count(&self) -> usize {
        self.refs.load(Ordering::Relaxed)
    }

    pub(crate) fn add_ref(&self) {
        self.refs.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the count remaining after the release.
    pub(crate) fn drop_ref(&self) -> usize {
        self.refs.fetch_sub(1, Ordering::Relaxed) - 1
    }
}
