//! Immutable consensus configuration, passed by reference into every
//! component at construction (see the design note on global configuration).
//! Parsing this from TOML/CLI flags is delegated to the external
//! configuration collaborator; this crate only defines the value and its
//! defaults.

mod shutdown;

pub use shutdown::Shutdown;

use ancora_primitives::{BlockHeight, Buf32};
use serde::{Deserialize, Serialize};

/// Enumerated CLI/configuration options that affect the core engine
/// (spec.md §6). Every field here is read-only for the lifetime of a run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusConfig {
    /// Base-chain height at which protocol-payload indexing begins.
    pub enabled_at_block: BlockHeight,
    /// Whether a full reindex was requested.
    pub reindex: bool,
    /// Height to reindex from, when `reindex` is set.
    pub reindex_from_block: Option<BlockHeight>,

    /// `K`: number of base-chain blocks per epoch.
    pub blocks_per_epoch: u64,
    /// Minimum number of leading matching bits for a valid PoW submission.
    pub min_difficulty: u32,
    /// Maximum permitted graffiti length, in bytes.
    pub graffiti_length: usize,
    /// Cap on attestations aggregated per block within an epoch.
    pub max_attestation_per_block: usize,

    /// Maximum inter-contract call depth.
    pub call_depth_max: u32,
    /// Maximum nested contract-deployment depth.
    pub deploy_depth_max: u32,
    /// Default gas budget for a single transaction.
    pub gas_limit_per_tx: u64,
    /// Satoshi-to-gas conversion ratio.
    pub sat_to_gas: u64,

    /// Minimum height gap that activates bulk sync.
    pub ibd_threshold: u64,
    /// Height interval between bulk-sync checkpoints.
    pub checkpoint_interval: u64,
    /// Number of parallel bulk-sync workers.
    pub worker_count: usize,
    /// Max headers fetched per worker request.
    pub header_batch_size: usize,
    /// Max transactions fetched per worker request.
    pub transaction_batch_size: usize,

    /// Winner declared when no submission in an epoch is valid (spec.md
    /// §4.7 step 4).
    pub genesis_proposer_public_key: Buf32,

    /// Epoch Merkle tree metadata (spec.md §4.8): identifies which chain
    /// and protocol deployment an epoch artifact belongs to.
    pub chain_id: u32,
    pub protocol_id: u32,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            enabled_at_block: 0,
            reindex: false,
            reindex_from_block: None,

            blocks_per_epoch: DEFAULT_BLOCKS_PER_EPOCH,
            min_difficulty: DEFAULT_MIN_DIFFICULTY,
            graffiti_length: DEFAULT_GRAFFITI_LENGTH,
            max_attestation_per_block: DEFAULT_MAX_ATTESTATION_PER_BLOCK,

            call_depth_max: DEFAULT_CALL_DEPTH_MAX,
            deploy_depth_max: DEFAULT_DEPLOY_DEPTH_MAX,
            gas_limit_per_tx: DEFAULT_GAS_LIMIT_PER_TX,
            sat_to_gas: DEFAULT_SAT_TO_GAS,

            ibd_threshold: DEFAULT_IBD_THRESHOLD,
            checkpoint_interval: DEFAULT_CHECKPOINT_INTERVAL,
            worker_count: DEFAULT_WORKER_COUNT,
            header_batch_size: DEFAULT_HEADER_BATCH_SIZE,
            transaction_batch_size: DEFAULT_TRANSACTION_BATCH_SIZE,

            genesis_proposer_public_key: Buf32::ZERO,

            chain_id: DEFAULT_CHAIN_ID,
            protocol_id: DEFAULT_PROTOCOL_ID,
        }
    }
}

/// Fast-path threshold above which the reorg watchdog skips the continuity
/// check entirely (spec.md §4.1).
pub const REORG_FAST_PATH_GAP: u64 = 100;

pub const DEFAULT_BLOCKS_PER_EPOCH: u64 = 144;
pub const DEFAULT_MIN_DIFFICULTY: u32 = 20;
pub const DEFAULT_GRAFFITI_LENGTH: usize = 32;
pub const DEFAULT_MAX_ATTESTATION_PER_BLOCK: usize = 8;

pub const DEFAULT_CALL_DEPTH_MAX: u32 = 16;
pub const DEFAULT_DEPLOY_DEPTH_MAX: u32 = 4;
pub const DEFAULT_GAS_LIMIT_PER_TX: u64 = 50_000_000;
pub const DEFAULT_SAT_TO_GAS: u64 = 100;

pub const DEFAULT_IBD_THRESHOLD: u64 = 2_000;
pub const DEFAULT_CHECKPOINT_INTERVAL: u64 = 500;
pub const DEFAULT_WORKER_COUNT: usize = 8;
pub const DEFAULT_HEADER_BATCH_SIZE: usize = 2_000;
pub const DEFAULT_TRANSACTION_BATCH_SIZE: usize = 500;

pub const DEFAULT_CHAIN_ID: u32 = 1;
pub const DEFAULT_PROTOCOL_ID: u32 = 1;

/// Minimum number of attestations the epoch manager ships in every epoch
/// artifact, padding with `EMPTY_ATTESTATION` leaves when fewer are
/// collected (spec.md §4.7 step 5).
pub const MIN_ATTESTATIONS_PER_EPOCH: usize = 2;

/// Offset between an epoch and the prior epoch it attests to (spec.md
/// §3, §4.8, §8 invariant 5).
pub const ATTESTED_EPOCH_OFFSET: u64 = 4;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_roundtrip_through_json() {
        let cfg = ConsensusConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: ConsensusConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg, back);
    }
}
