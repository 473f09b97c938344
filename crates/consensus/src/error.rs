use thiserror::Error;

/// Top-level consensus engine failures (spec.md §7). Transient and
/// data-continuity errors are handled by the collaborators that own them
/// ([`ancora_btcio`]'s back-off, [`ancora_chain_follower`]'s safe-rewind);
/// what reaches here is either a wrapped collaborator error or one of the
/// corruption/validation failures the block processor and epoch driver
/// detect directly.
#[derive(Debug, Error)]
pub enum ConsensusError {
    #[error(transparent)]
    Storage(#[from] ancora_storage::StorageError),

    #[error(transparent)]
    Btcio(#[from] ancora_btcio::BtcioError),

    #[error(transparent)]
    ChainFollower(#[from] ancora_chain_follower::ChainFollowerError),

    #[error(transparent)]
    BulkSync(#[from] ancora_bulk_sync::BulkSyncError),

    #[error(transparent)]
    TxOrder(#[from] ancora_txorder::TxOrderError),

    #[error(transparent)]
    Epoch(#[from] ancora_epoch::EpochError),

    /// Header missing where the processor requires one (spec.md §7 "Data
    /// corruption"). Fatal: requires operator intervention.
    #[error("missing header at height {height}")]
    MissingHeader { height: ancora_primitives::BlockHeight },

    /// The block handed to the processor does not sit at
    /// `last_committed_height + 1` (spec.md §5 "Ordering: strict monotonic
    /// height order across commits").
    #[error("out-of-order block: expected height {expected}, got {actual}")]
    OutOfOrderBlock { expected: ancora_primitives::BlockHeight, actual: ancora_primitives::BlockHeight },

    /// Epoch finalization invoked before (or well after) its boundary
    /// height — indicates a driver bug, not a protocol failure (spec.md
    /// §7 "Epoch" category: fatal at finalization).
    #[error("epoch {epoch} is not ready to finalize at height {height}")]
    EpochNotReady { epoch: ancora_primitives::EpochNumber, height: ancora_primitives::BlockHeight },

    /// The block decoder collaborator rejected a raw header or block
    /// (malformed bytes, unsupported wire version). Fatal: the bulk-sync
    /// phase this happened in aborts and reports the range unfinished.
    #[error("failed to decode base-chain payload: {0}")]
    Decode(String),
}

pub type Result<T> = std::result::Result<T, ConsensusError>;
