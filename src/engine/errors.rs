use thiserror::Error;

use crate::engine::cache::entry::CacheFailure;
use crate::remote::StorageError;

/// Errors surfaced by the download cache to each waiter of a failed entry.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("object not found: {key}")]
    ObjectNotFound { key: String },

    #[error("cache I/O error for {key}: {reason}")]
    Io { key: String, reason: String },

    #[error("download of {key} failed after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        key: String,
        attempts: u32,
        last_error: String,
    },
}

impl CacheError {
    pub fn from_failure(key: &str, failure: CacheFailure) -> Self {
        match failure {
            CacheFailure::NotFound => CacheError::ObjectNotFound {
                key: key.to_string(),
            },
            CacheFailure::Io(reason) => CacheError::Io {
                key: key.to_string(),
                reason,
            },
            CacheFailure::RetriesExhausted {
                attempts,
                last_error,
            } => CacheError::RetriesExhausted {
                key: key.to_string(),
                attempts,
                last_error,
            },
        }
    }
}

#[derive(Debug, Error)]
pub enum ZipBuildError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("manifest encoding error: {0}")]
    Manifest(#[from] serde_json::Error),
}

/// Terminal failure of one job, classified for the broker: retryable
/// failures are nacked so the message comes back, the rest are acked so a
/// poisoned message cannot loop forever.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("file acquisition failed: {0}")]
    Acquire(#[from] CacheError),

    #[error("archive build failed: {0}")]
    Build(#[from] ZipBuildError),

    #[error("archive upload failed: {0}")]
    Upload(StorageError),

    #[error("uploaded archive missing from destination: {0}")]
    Verify(StorageError),

    #[error("job ran past its deadline")]
    Timeout,
}

impl JobError {
    pub fn is_retryable(&self) -> bool {
        !matches!(self, JobError::Acquire(CacheError::ObjectNotFound { .. }))
    }
}

/// Synchronous rejection of a request before any job exists.
#[derive(Debug, Error, PartialEq)]
pub enum SubmitError {
    #[error("request contains no files")]
    EmptyFileList,

    #[error("requester must carry a name and an email")]
    InvalidRequester,
}
