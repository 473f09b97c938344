use thiserror::Error;

/// Failures surfaced by the bulk-sync controller (spec.md §4.2).
#[derive(Debug, Error)]
pub enum BulkSyncError {
    #[error(transparent)]
    Storage(#[from] ancora_storage::StorageError),

    /// A phase's unit of work (header/transaction download, checksum
    /// generation, witness sync, epoch finalization) failed. The pipeline
    /// collaborator owns the underlying cause; this crate only sequences
    /// and checkpoints phases.
    #[error("sync phase failed: {0}")]
    Pipeline(String),

    /// Cancellation observed mid-phase; a checkpoint was written before
    /// returning (spec.md §4.2 "Cancellation").
    #[error("bulk sync cancelled")]
    Cancelled,

    /// No checkpoint existed and no explicit resume range was given.
    #[error("bulk sync has no starting point: no checkpoint and no explicit start height")]
    NoStartingPoint,
}

pub type Result<T> = std::result::Result<T, BulkSyncError>;
