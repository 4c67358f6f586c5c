use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use lru::LruCache;
use rand::Rng;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::engine::cache::entry::{CacheEntry, CacheFailure, DownloadState};
use crate::engine::cache::stats::FileCacheStats;
use crate::engine::errors::CacheError;
use crate::remote::{ObjectStore, StorageError};

const LOG_TARGET: &str = "engine::cache";

/// Tuning for the shared download cache.
#[derive(Debug, Clone)]
pub struct CacheLimits {
    pub capacity_bytes: u64,
    pub max_attempts: u32,
    pub retry_backoff: Duration,
    pub download_timeout: Duration,
}

impl Default for CacheLimits {
    fn default() -> Self {
        Self {
            capacity_bytes: 1024 * 1024 * 1024,
            max_attempts: 4,
            retry_backoff: Duration::from_millis(250),
            download_timeout: Duration::from_secs(120),
        }
    }
}

struct CacheState {
    entries: HashMap<String, Arc<CacheEntry>>,
    // Ready entries with zero references, least recently released first.
    // Only these are eviction candidates.
    idle: LruCache<String, ()>,
    current_bytes: u64,
}

struct CacheShared {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    dir: PathBuf,
    limits: CacheLimits,
    state: Mutex<CacheState>,
    hits: AtomicU64,
    misses: AtomicU64,
    waits: AtomicU64,
    evictions: AtomicU64,
}

impl CacheShared {
    fn file_path(&self, key: &str) -> PathBuf {
        // Keys may contain separators; store under a digest name instead.
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        self.dir.join(hex::encode(hasher.finalize()))
    }

    fn evict_over_capacity(&self, state: &mut CacheState) {
        while state.current_bytes > self.limits.capacity_bytes {
            if let Some((key, ())) = state.idle.pop_lru() {
                if let Some(entry) = state.entries.remove(&key) {
                    state.current_bytes = state.current_bytes.saturating_sub(entry.bytes());
                    self.evictions.fetch_add(1, Ordering::Relaxed);
                    if let Err(e) = std::fs::remove_file(self.file_path(&key)) {
                        debug!(target: LOG_TARGET, key = %key, error = %e, "Evicted file was already gone");
                    }
                    debug!(target: LOG_TARGET, key = %key, bytes = entry.bytes(), "Evicted cached object");
                }
            } else {
                break;
            }
        }
    }
}

/// Handle to a cached file. Holding it pins the file against eviction;
/// dropping it releases the reference.
pub struct CacheLease {
    key: String,
    path: PathBuf,
    bytes: u64,
    _guard: RefGuard,
}

impl CacheLease {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn bytes(&self) -> u64 {
        self.bytes
    }
}

impl std::fmt::Debug for CacheLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheLease")
            .field("key", &self.key)
            .field("path", &self.path)
            .field("bytes", &self.bytes)
            .finish()
    }
}

struct RefGuard {
    shared: Arc<CacheShared>,
    entry: Arc<CacheEntry>,
}

impl Drop for RefGuard {
    fn drop(&mut self) {
        let mut state = self.shared.state.lock().unwrap();
        if self.entry.drop_ref() > 0 {
            return;
        }
        let still_tracked = state
            .entries
            .get(self.entry.key())
            .is_some_and(|current| Arc::ptr_eq(current, &self.entry));
        if still_tracked && self.entry.state().is_ready() {
            state.idle.put(self.entry.key().to_string(), ());
            self.shared.evict_over_capacity(&mut state);
        }
    }
}

/// Shared download cache. Every object is fetched at most once no matter
/// how many jobs want it concurrently: the first caller starts the
/// download, everyone else suspends on the entry's watch channel. Files
/// live on local disk and are evicted least-recently-released once the
/// capacity is exceeded; entries with live references are never evicted.
pub struct FileCache {
    shared: Arc<CacheShared>,
}

impl FileCache {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        bucket: String,
        dir: impl Into<PathBuf>,
        limits: CacheLimits,
    ) -> Self {
        Self {
            shared: Arc::new(CacheShared {
                store,
                bucket,
                dir: dir.into(),
                limits,
                state: Mutex::new(CacheState {
                    entries: HashMap::new(),
                    idle: LruCache::unbounded(),
                    current_bytes: 0,
                }),
                hits: AtomicU64::new(0),
                misses: AtomicU64::new(0),
                waits: AtomicU64::new(0),
                evictions: AtomicU64::new(0),
            }),
        }
    }

    /// Pins `key` in the cache, downloading it first if no entry exists.
    /// Concurrent callers for the same key share one download; a terminal
    /// download failure is reported to every one of them.
    pub async fn acquire(&self, key: &str) -> Result<CacheLease, CacheError> {
        let (entry, mut rx, guard, created) = {
            let mut state = self.shared.state.lock().unwrap();
            match state.entries.get(key) {
                Some(existing) => {
                    let entry = Arc::clone(existing);
                    entry.add_ref();
                    state.idle.pop(key);
                    if entry.state().is_ready() {
                        self.shared.hits.fetch_add(1, Ordering::Relaxed);
                    } else {
                        self.shared.waits.fetch_add(1, Ordering::Relaxed);
                    }
                    let rx = entry.subscribe();
                    let guard = RefGuard {
                        shared: Arc::clone(&self.shared),
                        entry: Arc::clone(&entry),
                    };
                    (entry, rx, guard, false)
                }
                None => {
                    let entry = Arc::new(CacheEntry::new(key));
                    entry.add_ref();
                    state.entries.insert(key.to_string(), Arc::clone(&entry));
                    self.shared.misses.fetch_add(1, Ordering::Relaxed);
                    let rx = entry.subscribe();
                    let guard = RefGuard {
                        shared: Arc::clone(&self.shared),
                        entry: Arc::clone(&entry),
                    };
                    (entry, rx, guard, true)
                }
            }
        };

        if created {
            // The download runs detached from the acquiring task, so a
            // cancelled acquire (job timeout) cannot strand co-waiters.
            let shared = Arc::clone(&self.shared);
            let owner = Arc::clone(&entry);
            tokio::spawn(async move {
                let task = tokio::spawn(run_download(Arc::clone(&shared), Arc::clone(&owner)));
                if let Err(join_err) = task.await {
                    warn!(target: LOG_TARGET, key = owner.key(), error = %join_err, "Download task aborted");
                    fail_entry(
                        &shared,
                        &owner,
                        CacheFailure::Io(format!("download task aborted: {join_err}")),
                    );
                }
            });
        }

        let outcome = loop {
            match entry.state() {
                DownloadState::Ready { path, bytes } => break Ok((path, bytes)),
                DownloadState::Failed(failure) => break Err(failure),
                DownloadState::Pending | DownloadState::Downloading { .. } => {}
            }
            if rx.changed().await.is_err() {
                break Err(CacheFailure::Io(
                    "download state channel closed".to_string(),
                ));
            }
        };

        match outcome {
            Ok((path, bytes)) => Ok(CacheLease {
                key: entry.key().to_string(),
                path,
                bytes,
                _guard: guard,
            }),
            Err(failure) => Err(CacheError::from_failure(entry.key(), failure)),
        }
    }

    pub fn stats(&self) -> FileCacheStats {
        let state = self.shared.state.lock().unwrap();
        FileCacheStats {
            hits: self.shared.hits.load(Ordering::Relaxed),
            misses: self.shared.misses.load(Ordering::Relaxed),
            waits: self.shared.waits.load(Ordering::Relaxed),
            evictions: self.shared.evictions.load(Ordering::Relaxed),
            current_bytes: state.current_bytes,
            capacity_bytes: self.shared.limits.capacity_bytes,
            tracked_objects: state.entries.len() as u64,
        }
    }
}

async fn run_download(shared: Arc<CacheShared>, entry: Arc<CacheEntry>) {
    let key = entry.key().to_string();
    let max_attempts = shared.limits.max_attempts.max(1);
    let mut last_error = String::new();

    for attempt in 1..=max_attempts {
        entry.set_state(DownloadState::Downloading { attempt });
        debug!(target: LOG_TARGET, key = %key, attempt, "Downloading object");

        let fetch = shared.store.get(&shared.bucket, &key);
        match tokio::time::timeout(shared.limits.download_timeout, fetch).await {
            Ok(Ok(bytes)) => {
                if let Err(e) = persist(&shared, &entry, &bytes).await {
                    fail_entry(&shared, &entry, CacheFailure::Io(e.to_string()));
                }
                return;
            }
            Ok(Err(StorageError::NotFound { .. })) => {
                warn!(target: LOG_TARGET, key = %key, "Object missing from input bucket");
                fail_entry(&shared, &entry, CacheFailure::NotFound);
                return;
            }
            Ok(Err(StorageError::Transient(reason))) => {
                warn!(target: LOG_TARGET, key = %key, attempt, error = %reason, "Download attempt failed");
                last_error = reason;
            }
            Err(_) => {
                warn!(target: LOG_TARGET, key = %key, attempt, "Download attempt timed out");
                last_error = format!(
                    "timed out after {}ms",
                    shared.limits.download_timeout.as_millis()
                );
            }
        }

        if attempt < max_attempts {
            tokio::time::sleep(backoff_delay(shared.limits.retry_backoff, attempt)).await;
        }
    }

    fail_entry(
        &shared,
        &entry,
        CacheFailure::RetriesExhausted {
            attempts: max_attempts,
            last_error,
        },
    );
}

async fn persist(
    shared: &Arc<CacheShared>,
    entry: &Arc<CacheEntry>,
    bytes: &[u8],
) -> std::io::Result<()> {
    tokio::fs::create_dir_all(&shared.dir).await?;
    let path = shared.file_path(entry.key());
    tokio::fs::write(&path, bytes).await?;
    let len = bytes.len() as u64;

    let mut state = shared.state.lock().unwrap();
    state.current_bytes += len;
    entry.set_bytes(len);
    entry.set_state(DownloadState::Ready {
        path,
        bytes: len,
    });
    // Every waiter may have been cancelled while the download ran; without
    // a release to trigger it, the entry must enter the idle list here.
    if entry.ref_count() == 0 {
        state.idle.put(entry.key().to_string(), ());
    }
    shared.evict_over_capacity(&mut state);
    drop(state);

    info!(target: LOG_TARGET, key = entry.key(), bytes = len, "Object cached");
    Ok(())
}

fn fail_entry(shared: &Arc<CacheShared>, entry: &Arc<CacheEntry>, failure: CacheFailure) {
    // Drop the entry from the table before publishing the failure: the
    // next acquire for this key starts a fresh download.
    let mut state = shared.state.lock().unwrap();
    let still_tracked = state
        .entries
        .get(entry.key())
        .is_some_and(|current| Arc::ptr_eq(current, entry));
    if still_tracked {
        state.entries.remove(entry.key());
        state.idle.pop(entry.key());
    }
    drop(state);
    entry.set_state(DownloadState::Failed(failure));
}

fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let base_ms = base.as_millis() as u64;
    let scaled = base_ms.saturating_mul(1 << (attempt - 1).min(16));
    let jitter = if scaled == 0 {
        0
    } else {
        rand::thread_rng().gen_range(0..=scaled / 2)
    };
    Duration::from_millis(scaled + jitter)
}
