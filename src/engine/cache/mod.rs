pub mod entry;
pub mod manager;
pub mod stats;

pub use entry::{CacheEntry, CacheFailure, DownloadState};
pub use manager::{CacheLease, CacheLimits, FileCache};
pub use stats::FileCacheStats;
