use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;

use crate::remote::{ObjectMeta, ObjectStore, StorageError};

/// In-memory object store with scripted failures, for exercising retry,
/// upload, and verification paths without touching disk.
pub struct MemoryObjectStore {
    state: Mutex<StoreState>,
}

#[derive(Default)]
struct StoreState {
    objects: HashMap<(String, String), Vec<u8>>,
    get_counts: HashMap<String, u64>,
    get_failures: HashMap<String, u32>,
    get_delay: Option<Duration>,
    put_failures: u32,
    discard_puts: bool,
    put_count: u64,
}

impl StoreState {
    fn lookup(&self, bucket: &str, key: &str) -> Result<Bytes, StorageError> {
        self.objects
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .map(Bytes::from)
            .ok_or_else(|| StorageError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
    }
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(StoreState::default()),
        }
    }

    pub fn seed(&self, bucket: &str, key: &str, data: &[u8]) {
        let mut state = self.state.lock().unwrap();
        state
            .objects
            .insert((bucket.to_string(), key.to_string()), data.to_vec());
    }

    /// The next `times` reads of `key` fail with a transient error.
    pub fn fail_times(&self, key: &str, times: u32) {
        let mut state = self.state.lock().unwrap();
        state.get_failures.insert(key.to_string(), times);
    }

    /// Every read sleeps `delay` before returning.
    pub fn set_get_delay(&self, delay: Duration) {
        self.state.lock().unwrap().get_delay = Some(delay);
    }

    /// The next `times` uploads fail with a transient error.
    pub fn fail_puts(&self, times: u32) {
        self.state.lock().unwrap().put_failures = times;
    }

    /// Uploads report success but store nothing, so verification misses.
    pub fn set_discard_puts(&self, discard: bool) {
        self.state.lock().unwrap().discard_puts = discard;
    }

    pub fn get_count(&self, key: &str) -> u64 {
        self.state
            .lock()
            .unwrap()
            .get_counts
            .get(key)
            .copied()
            .unwrap_or(0)
    }

    pub fn put_count(&self) -> u64 {
        self.state.lock().unwrap().put_count
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.state
            .lock()
            .unwrap()
            .objects
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes, StorageError> {
        let (delay, outcome) = {
            let mut state = self.state.lock().unwrap();
            *state.get_counts.entry(key.to_string()).or_insert(0) += 1;
            let scripted = match state.get_failures.get_mut(key) {
                Some(left) if *left > 0 => {
                    *left -= 1;
                    true
                }
                _ => false,
            };
            let outcome = if scripted {
                Err(StorageError::Transient(format!(
                    "scripted read failure for {key}"
                )))
            } else {
                state.lookup(bucket, key)
            };
            (state.get_delay, outcome)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        outcome
    }

    async fn put_file(&self, bucket: &str, key: &str, source: &Path) -> Result<(), StorageError> {
        let data = tokio::fs::read(source)
            .await
            .map_err(|e| StorageError::Transient(format!("read {}: {e}", source.display())))?;
        let mut state = self.state.lock().unwrap();
        state.put_count += 1;
        if state.put_failures > 0 {
            state.put_failures -= 1;
            return Err(StorageError::Transient(format!(
                "scripted upload failure for {key}"
            )));
        }
        if !state.discard_puts {
            state
                .objects
                .insert((bucket.to_string(), key.to_string()), data);
        }
        Ok(())
    }

    async fn stat(&self, bucket: &str, key: &str) -> Result<ObjectMeta, StorageError> {
        let state = self.state.lock().unwrap();
        let data = state
            .objects
            .get(&(bucket.to_string(), key.to_string()))
            .ok_or_else(|| StorageError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })?;
        Ok(ObjectMeta {
            size: data.len() as u64,
            modified: Some(Utc::now()),
        })
    }
}
