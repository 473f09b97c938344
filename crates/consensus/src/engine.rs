use ancora_btcio::{BackoffPolicy, BaseChainReader, BlockVerbosity};
use ancora_bulk_sync::BulkSyncController;
use ancora_chain_follower::{ChainFollower, ReorgOutcome};
use ancora_exec::ContractRuntime;
use ancora_params::{ConsensusConfig, Shutdown};
use ancora_primitives::BlockHeight;
use ancora_storage::Storage;
use tracing::info;

use crate::decode::BlockDecoder;
use crate::epoch_driver::EpochDriver;
use crate::error::Result;
use crate::ibd_pipeline::IbdPipeline;
use crate::input::BlockInput;
use crate::processor::{build_header, BlockProcessor, ProcessedBlock};

/// Ties the reorg watchdog, bulk-sync controller, and live block processor
/// into the single-owner event loop spec.md §5 describes: strictly
/// sequential block commits, with bulk sync activated only when the gap to
/// the base-chain tip crosses `IBD_THRESHOLD`.
pub struct Engine<'s, R, D>
where
    R: BaseChainReader + ?Sized,
    D: BlockDecoder,
{
    storage: &'s dyn Storage,
    reader: &'s R,
    decoder: &'s D,
    runtime: &'s dyn ContractRuntime,
    cfg: &'s ConsensusConfig,
    backoff: BackoffPolicy,
    follower: ChainFollower<'s, R>,
    shutdown: Shutdown,
}

impl<'s, R, D> Engine<'s, R, D>
where
    R: BaseChainReader + ?Sized,
    D: BlockDecoder,
{
    pub fn new(
        storage: &'s dyn Storage,
        reader: &'s R,
        decoder: &'s D,
        runtime: &'s dyn ContractRuntime,
        cfg: &'s ConsensusConfig,
        backoff: BackoffPolicy,
        pending_start: BlockHeight,
        shutdown: Shutdown,
    ) -> Self {
        let follower = ChainFollower::new(
            storage,
            reader,
            pending_start,
            ancora_params::REORG_FAST_PATH_GAP,
            backoff,
        );
        Self { storage, reader, decoder, runtime, cfg, backoff, follower, shutdown }
    }

    pub fn subscribe_reorgs(&self) -> tokio::sync::broadcast::Receiver<ancora_chain_follower::ReorgEvent> {
        self.follower.subscribe()
    }

    /// Catches the indexer up to `target_height` via bulk sync if the gap
    /// warrants it (spec.md §4.2 `should_activate`); otherwise does nothing
    /// and leaves live processing to [`Self::process_live_block`].
    pub async fn maybe_bulk_sync(&self, target_height: BlockHeight) -> Result<()> {
        let last_completed = self.follower.pending_height();
        let pipeline =
            IbdPipeline::new(self.storage, self.reader, self.decoder, self.runtime, self.cfg, self.backoff);
        let controller = BulkSyncController::new(self.storage, &pipeline, self.cfg, self.shutdown.clone());

        if !controller.should_activate(last_completed, target_height) {
            return Ok(());
        }

        info!(last_completed, target_height, "activating bulk sync");
        controller.run(last_completed + 1, target_height).await?;
        Ok(())
    }

    /// Fetches and decodes the block at `height`, checks it against the
    /// reorg watchdog, and — if accepted — runs it through the block
    /// processor and, if it closes an epoch, the epoch driver (spec.md §5
    /// "Ordering: strict monotonic height order across commits").
    pub async fn process_live_block(&self, height: BlockHeight) -> Result<Option<ProcessedBlock>> {
        let hash = self.backoff.retry(|| self.reader.get_block_hash(height)).await?;
        let raw_header = self.backoff.retry(|| self.reader.get_block_header(hash)).await?;
        let decoded = self
            .decoder
            .decode_header(&raw_header)
            .map_err(|e| crate::error::ConsensusError::Decode(e.to_string()))?;
        let raw_block = self.backoff.retry(|| self.reader.get_block(hash, BlockVerbosity::Full)).await?;
        let transactions = self
            .decoder
            .decode_transactions(&raw_block)
            .map_err(|e| crate::error::ConsensusError::Decode(e.to_string()))?;

        let block = BlockInput {
            height,
            hash,
            previous_block_hash: decoded.previous_block_hash,
            merkle_root: decoded.merkle_root,
            state_root: decoded.state_root,
            receipt_root: decoded.receipt_root,
            median_time: decoded.median_time,
            transactions,
        };

        let previous = if height == 0 { None } else { self.storage.get_header(height - 1)? };
        let candidate = build_header(&block, previous.as_ref());

        match self.follower.on_new_tip(candidate).await? {
            ReorgOutcome::RewoundTo(rewound) => {
                info!(rewound, "reorg rewound below the requested height, skipping commit");
                Ok(None)
            }
            ReorgOutcome::Continuous | ReorgOutcome::FastPathBypassed => {
                let processor = BlockProcessor::new(self.storage, self.runtime, self.cfg);
                let processed = processor.process_block(block)?;

                let driver = EpochDriver::new(self.storage, self.cfg);
                if let Some(epoch) = driver.epoch_closed_by(height) {
                    let generated_at = std::time::SystemTime::now()
                        .duration_since(std::time::UNIX_EPOCH)
                        .map(|d| d.as_secs())
                        .unwrap_or(0);
                    driver.finalize(epoch, generated_at)?;
                }

                Ok(Some(processed))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use ancora_btcio::{MockBaseChainReader, RawBlock, RawHeader};
    use ancora_primitives::{BlockHash, Buf32};
    use ancora_storage::InMemoryStorage;
    use mockall::predicate::eq;

    use super::*;
    use crate::decode::test_utils::NullDecoder;

    struct NoopRuntime;
    impl ContractRuntime for NoopRuntime {
        fn invoke(&self, _: &[u8], _: &[u8], _: &mut dyn ancora_exec::HostAbi) -> ancora_exec::Result<Vec<u8>> {
            Ok(Vec::new())
        }
        fn validate_bytecode(&self, _: &[u8]) -> ancora_exec::Result<()> {
            Ok(())
        }
    }

    fn hash_for(height: BlockHeight) -> BlockHash {
        BlockHash::new(Buf32::new([height as u8 + 1; 32]))
    }

    #[tokio::test]
    async fn processes_genesis_block_and_commits_header() {
        let storage = InMemoryStorage::new();
        let mut reader = MockBaseChainReader::new();
        reader.expect_get_block_hash().with(eq(0u64)).returning(|_| Ok(hash_for(0)));
        reader.expect_get_block_header().with(eq(hash_for(0))).returning(|_| Ok(RawHeader(vec![0u8; 32])));
        reader.expect_get_block().with(eq(hash_for(0)), eq(BlockVerbosity::Full)).returning(|_, _| Ok(RawBlock(vec![])));
        reader.expect_get_block_count().returning(|| Ok(0));

        let decoder = NullDecoder;
        let runtime = NoopRuntime;
        let cfg = ConsensusConfig::default();
        let engine = Engine::new(
            &storage,
            &reader,
            &decoder,
            &runtime,
            &cfg,
            BackoffPolicy::default(),
            0,
            Shutdown::new(),
        );

        let processed = engine.process_live_block(0).await.unwrap().unwrap();
        assert_eq!(processed.header.height, 0);
        assert!(storage.get_header(0).unwrap().is_some());
    }
}
