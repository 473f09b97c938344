use ancora_primitives::BlockHeight;
use thiserror::Error;

/// Failures surfaced by the chain follower (spec.md §4.1 "Failure model").
#[derive(Debug, Error)]
pub enum ChainFollowerError {
    #[error(transparent)]
    Btcio(#[from] ancora_btcio::BtcioError),

    #[error(transparent)]
    Storage(#[from] ancora_storage::StorageError),

    /// A stored header is missing at a height where continuity or
    /// safe-rewind requires it to exist — treated as fatal data corruption,
    /// never retried.
    #[error("stored header missing at height {height}, data corruption")]
    MissingStoredHeader { height: BlockHeight },

    /// Safe-rewind walked back to height 0 without finding a fork point.
    #[error("no fork point found down to genesis")]
    NoForkPointFound,
}

pub type Result<T> = std::result::Result<T, ChainFollowerError>;
