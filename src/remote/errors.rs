use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    #[error("transient storage error: {0}")]
    Transient(String),
}

#[derive(Debug, Error)]
pub enum LeaseError {
    #[error("lease already expired")]
    Expired,

    #[error("broker transport error: {0}")]
    Transport(String),
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification delivery failed: {0}")]
    Delivery(String),
}
