use thiserror::Error;

/// Failures of the key-value storage port. Public progress/resume operations
/// never surface these; they log and degrade to `None`/`false`.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("storage quota exceeded for key {0}")]
    QuotaExceeded(String),
    #[error("storage io error: {0}")]
    Io(String),
    #[error("corrupt value under {key}: {reason}")]
    Corrupt { key: String, reason: String },
    #[error("encode error: {0}")]
    Encode(String),
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("external call failed: {0}")]
    External(String),
}
