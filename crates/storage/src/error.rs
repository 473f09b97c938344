use ancora_primitives::BlockHeight;
use thiserror::Error;

/// Errors surfaced by the storage adapter (spec.md §6, §7 "Data corruption").
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("header missing at height {0} where required")]
    MissingHeader(BlockHeight),

    #[error("retryable storage conflict: {0}")]
    RetryableConflict(String),

    #[error("backend error: {0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;
