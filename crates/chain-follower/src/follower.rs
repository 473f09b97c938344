use ancora_btcio::{BackoffPolicy, BaseChainReader};
use ancora_primitives::BlockHeight;
use ancora_storage::{HeaderRecord, Storage};
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::continuity::is_continuous;
use crate::error::{ChainFollowerError, Result};
use crate::listener::ReorgEvent;
use crate::rewind::safe_rewind;

/// Result of feeding one candidate header through the watchdog (spec.md
/// §4.1).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReorgOutcome {
    /// Continuity held; the candidate was accepted as the new pending tip.
    Continuous,
    /// The gap to the base-chain tip was at or beyond the fast-path
    /// threshold; continuity was not checked.
    FastPathBypassed,
    /// Continuity broke; state above `rewind_to` was discarded and
    /// listeners were notified.
    RewoundTo(BlockHeight),
}

/// Tracks the canonical base-chain tip and the last-validated indexed
/// height, running the continuity check and safe-rewind algorithm of
/// spec.md §4.1.
pub struct ChainFollower<'s, R: BaseChainReader + ?Sized> {
    storage: &'s dyn Storage,
    reader: &'s R,
    backoff: BackoffPolicy,
    fast_path_gap: u64,
    pending: Mutex<BlockHeight>,
    reorg_tx: broadcast::Sender<ReorgEvent>,
}

impl<'s, R: BaseChainReader + ?Sized> ChainFollower<'s, R> {
    pub fn new(
        storage: &'s dyn Storage,
        reader: &'s R,
        pending_start: BlockHeight,
        fast_path_gap: u64,
        backoff: BackoffPolicy,
    ) -> Self {
        let (reorg_tx, _) = broadcast::channel(64);
        Self { storage, reader, backoff, fast_path_gap, pending: Mutex::new(pending_start), reorg_tx }
    }

    /// Subscribes to reorg notifications (spec.md §4.1 `subscribe`).
    pub fn subscribe(&self) -> broadcast::Receiver<ReorgEvent> {
        self.reorg_tx.subscribe()
    }

    pub fn pending_height(&self) -> BlockHeight {
        *self.pending.lock()
    }

    /// Continuity check for an incoming block (spec.md §4.1
    /// `verify_continuity`). Genesis has no predecessor and is always
    /// continuous.
    pub fn verify_continuity(&self, candidate: &HeaderRecord) -> Result<bool> {
        if candidate.height == 0 {
            return Ok(true);
        }
        let previous = self
            .storage
            .get_header(candidate.height - 1)?
            .ok_or(ChainFollowerError::MissingStoredHeader { height: candidate.height - 1 })?;
        Ok(is_continuous(&previous, candidate))
    }

    /// Notification input for a newly observed candidate header (spec.md
    /// §4.1 `on_new_tip`). Runs the fast path, then continuity, then
    /// safe-rewind recovery as needed.
    pub async fn on_new_tip(&self, candidate: HeaderRecord) -> Result<ReorgOutcome> {
        let base_tip = self.backoff.retry(|| self.reader.get_block_count()).await?;
        let gap = base_tip.saturating_sub(candidate.height);
        if gap >= self.fast_path_gap {
            warn!(height = candidate.height, gap, "fast-path bypassing continuity check");
            *self.pending.lock() = candidate.height;
            return Ok(ReorgOutcome::FastPathBypassed);
        }

        if self.verify_continuity(&candidate)? {
            *self.pending.lock() = candidate.height;
            return Ok(ReorgOutcome::Continuous);
        }

        warn!(height = candidate.height, "continuity broken, entering reorg recovery");
        let rewind_target =
            safe_rewind(self.storage, self.reader, candidate.height.saturating_sub(1)).await?;
        self.storage.rollback_to_height(rewind_target)?;
        *self.pending.lock() = rewind_target;

        let event = ReorgEvent {
            rewind_to: rewind_target,
            new_tip_height: candidate.height,
            new_best_hash: candidate.hash,
        };
        // No subscribers is a valid state (e.g. during startup); the send
        // failing just means nobody is listening yet.
        let _ = self.reorg_tx.send(event);
        info!(rewind_target, "reorg recovery complete");
        Ok(ReorgOutcome::RewoundTo(rewind_target))
    }

    /// Pulls already-stored headers forward from the current pending
    /// height up to `target_height`, validating continuity at each step
    /// (spec.md §4.1 `advance_to`).
    pub async fn advance_to(&self, target_height: BlockHeight) -> Result<ReorgOutcome> {
        let mut outcome = ReorgOutcome::Continuous;
        let mut height = self.pending_height() + 1;
        while height <= target_height {
            let header = self
                .storage
                .get_header(height)?
                .ok_or(ChainFollowerError::MissingStoredHeader { height })?;
            outcome = self.on_new_tip(header).await?;
            height = match outcome {
                ReorgOutcome::RewoundTo(rewound) => rewound + 1,
                _ => height + 1,
            };
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use ancora_btcio::MockBaseChainReader;
    use ancora_checksum::{build_checksum_tree, ChecksumLeaves};
    use ancora_primitives::{BlockHash, Buf32};
    use ancora_storage::InMemoryStorage;

    use super::*;

    fn header(height: u64, tag: u8, prev_hash: BlockHash, prev_checksum: Buf32) -> HeaderRecord {
        let leaves = ChecksumLeaves {
            previous_block_hash: *prev_hash.as_buf(),
            previous_block_checksum: prev_checksum,
            block_hash: Buf32::new([tag; 32]),
            block_merkle_root: Buf32::new([tag; 32]),
            state_root: Buf32::new([tag; 32]),
            receipt_root: Buf32::new([tag; 32]),
        };
        let artifact = build_checksum_tree(leaves);
        HeaderRecord {
            height,
            hash: BlockHash::new(leaves.block_hash),
            previous_block_hash: prev_hash,
            merkle_root: leaves.block_merkle_root,
            state_root: leaves.state_root,
            receipt_root: leaves.receipt_root,
            checksum_root: Buf32::from(artifact.root),
            previous_block_checksum: prev_checksum,
            checksum_proofs: artifact.proofs.to_vec(),
        }
    }

    #[tokio::test]
    async fn continuous_tip_advances_pending_height() {
        let storage = InMemoryStorage::new();
        let genesis = header(0, 0, BlockHash::ZERO, Buf32::ZERO);
        storage.put_header(genesis.clone()).unwrap();
        let next = header(1, 1, genesis.hash, genesis.checksum_root);
        storage.put_header(next.clone()).unwrap();

        let mut reader = MockBaseChainReader::new();
        reader.expect_get_block_count().returning(|| Ok(1));

        let follower = ChainFollower::new(&storage, &reader, 0, 100, BackoffPolicy::default());
        let outcome = follower.on_new_tip(next).await.unwrap();
        assert_eq!(outcome, ReorgOutcome::Continuous);
        assert_eq!(follower.pending_height(), 1);
    }

    #[tokio::test]
    async fn fast_path_bypasses_continuity_when_gap_is_large() {
        let storage = InMemoryStorage::new();
        let genesis = header(0, 0, BlockHash::ZERO, Buf32::ZERO);
        storage.put_header(genesis).unwrap();
        // Candidate deliberately has a bogus previous_block_hash; only the
        // fast path lets this through.
        let bogus = header(1, 1, BlockHash::new(Buf32::new([0xaa; 32])), Buf32::ZERO);

        let mut reader = MockBaseChainReader::new();
        reader.expect_get_block_count().returning(|| Ok(500));

        let follower = ChainFollower::new(&storage, &reader, 0, 100, BackoffPolicy::default());
        let outcome = follower.on_new_tip(bogus).await.unwrap();
        assert_eq!(outcome, ReorgOutcome::FastPathBypassed);
    }

    #[tokio::test]
    async fn broken_continuity_triggers_rewind_and_notifies_listeners() {
        let storage = InMemoryStorage::new();
        let genesis = header(0, 0, BlockHash::ZERO, Buf32::ZERO);
        storage.put_header(genesis.clone()).unwrap();
        let good = header(1, 1, genesis.hash, genesis.checksum_root);
        storage.put_header(good.clone()).unwrap();
        // A candidate at height 2 whose previous_block_hash doesn't match
        // the stored header at height 1.
        let bad_candidate = header(2, 2, BlockHash::new(Buf32::new([0xee; 32])), Buf32::ZERO);

        let mut reader = MockBaseChainReader::new();
        reader.expect_get_block_count().returning(|| Ok(2));
        // Safe-rewind compares base hash at each height walking down from 1.
        reader.expect_get_block_hash().returning(move |h| {
            if h == 1 { Ok(good.hash) } else { Ok(BlockHash::new(Buf32::new([0xff; 32]))) }
        });

        let follower = ChainFollower::new(&storage, &reader, 1, 100, BackoffPolicy::default());
        let mut rx = follower.subscribe();
        let outcome = follower.on_new_tip(bad_candidate).await.unwrap();
        assert_eq!(outcome, ReorgOutcome::RewoundTo(1));
        let event = rx.try_recv().unwrap();
        assert_eq!(event.rewind_to, 1);
    }
}
