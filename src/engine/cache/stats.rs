use serde::Serialize;

/// Point-in-time counters for the download cache.
#[derive(Debug, Clone, Serialize)]
pub struct FileCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub waits: u64,
    pub evictions: u64,
    pub current_bytes: u64,
    pub capacity_bytes: u64,
    pub tracked_objects: u64,
}
