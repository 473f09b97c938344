use ancora_params::{ConsensusConfig, Shutdown};
use ancora_primitives::BlockHeight;
use ancora_storage::{IbdCheckpoint, IbdPhase, Storage};
use tracing::info;

use crate::error::{BulkSyncError, Result};
use crate::pipeline::SyncPipeline;
use crate::worker::{contiguous_prefix, fan_out, merge_ranges};

/// Phased, resumable initial block download controller (spec.md §4.2).
/// Owns phase sequencing, checkpointing, and the parallel/sequential fan-out
/// for each phase; the phases' own domain logic is supplied by a
/// [`SyncPipeline`].
pub struct BulkSyncController<'s, P: SyncPipeline> {
    storage: &'s dyn Storage,
    pipeline: &'s P,
    cfg: &'s ConsensusConfig,
    shutdown: Shutdown,
}

impl<'s, P: SyncPipeline> BulkSyncController<'s, P> {
    pub fn new(
        storage: &'s dyn Storage,
        pipeline: &'s P,
        cfg: &'s ConsensusConfig,
        shutdown: Shutdown,
    ) -> Self {
        Self { storage, pipeline, cfg, shutdown }
    }

    /// Activation condition: `target_height - last_completed_height >=
    /// IBD_THRESHOLD` (spec.md §4.2).
    pub fn should_activate(&self, last_completed_height: BlockHeight, target_height: BlockHeight) -> bool {
        target_height.saturating_sub(last_completed_height) >= self.cfg.ibd_threshold
    }

    /// Runs bulk sync from either an existing checkpoint (resuming
    /// idempotently) or fresh from `start_height`, through every phase up
    /// to `target_height`, handing off to the live follower on completion.
    pub async fn run(&self, start_height: BlockHeight, target_height: BlockHeight) -> Result<()> {
        let mut checkpoint = match self.storage.get_checkpoint()? {
            Some(cp) if cp.phase != IbdPhase::Complete => {
                info!(phase = ?cp.phase, last_completed = cp.last_completed, "resuming bulk sync");
                cp
            }
            _ => {
                let cp = IbdCheckpoint {
                    phase: IbdPhase::HeaderDownload,
                    original_start: start_height,
                    last_completed: start_height.saturating_sub(1),
                    target: target_height,
                    timestamp: 0,
                    completed_ranges: Vec::new(),
                    last_finalized_epoch: None,
                };
                self.storage.put_checkpoint(cp.clone())?;
                cp
            }
        };

        loop {
            match checkpoint.phase {
                IbdPhase::HeaderDownload => {
                    self.run_phase(&mut checkpoint, true, |range| self.pipeline.download_headers(range)).await?;
                    checkpoint = self.advance_phase(checkpoint, IbdPhase::ChecksumGeneration)?;
                }
                IbdPhase::ChecksumGeneration => {
                    self.run_phase(&mut checkpoint, false, |range| self.pipeline.generate_checksums(range))
                        .await?;
                    checkpoint = self.advance_phase(checkpoint, IbdPhase::TransactionDownload)?;
                }
                IbdPhase::TransactionDownload => {
                    self.run_phase(&mut checkpoint, true, |range| {
                        self.pipeline.download_transactions(range)
                    })
                    .await?;
                    checkpoint = self.advance_phase(checkpoint, IbdPhase::WitnessSync)?;
                }
                IbdPhase::WitnessSync => {
                    self.run_phase(&mut checkpoint, true, |range| self.pipeline.sync_witnesses(range))
                        .await?;
                    checkpoint = self.advance_phase(checkpoint, IbdPhase::EpochFinalization)?;
                }
                IbdPhase::EpochFinalization => {
                    self.run_phase(&mut checkpoint, false, |range| self.pipeline.finalize_epochs(range))
                        .await?;
                    checkpoint = self.advance_phase(checkpoint, IbdPhase::Complete)?;
                }
                IbdPhase::Complete => {
                    info!("bulk sync complete, handing off to live follower");
                    return Ok(());
                }
            }
        }
    }

    fn advance_phase(&self, checkpoint: IbdCheckpoint, next: IbdPhase) -> Result<IbdCheckpoint> {
        let next_cp = IbdCheckpoint {
            phase: next,
            last_completed: checkpoint.original_start.saturating_sub(1),
            completed_ranges: Vec::new(),
            ..checkpoint
        };
        self.storage.put_checkpoint(next_cp.clone())?;
        Ok(next_cp)
    }

    /// Runs one phase's unit of work over `[checkpoint.last_completed + 1,
    /// checkpoint.target]`, either fanned out across `worker_count` workers
    /// or strictly sequentially (checksum generation and epoch finalization
    /// bind each step to the previous one), checkpointing every
    /// `CHECKPOINT_INTERVAL` blocks.
    async fn run_phase<F, Fut>(
        &self,
        checkpoint: &mut IbdCheckpoint,
        parallel: bool,
        op: F,
    ) -> Result<()>
    where
        F: Fn(std::ops::RangeInclusive<BlockHeight>) -> Fut,
        Fut: std::future::Future<Output = std::result::Result<(), String>>,
    {
        let start = checkpoint.last_completed + 1;
        let end = checkpoint.target;
        if start > end {
            return Ok(());
        }

        if parallel {
            // Batches complete out of order; track every finished range and
            // checkpoint once the *contiguous* prefix advances by at least
            // CHECKPOINT_INTERVAL, so a resume never has to redo more than
            // one interval's worth of work.
            let mut completed = checkpoint.completed_ranges.clone();
            let mut last_checkpointed = checkpoint.last_completed;
            let mut write_err = None;

            let result = fan_out(
                start,
                end,
                self.cfg.header_batch_size.max(self.cfg.transaction_batch_size),
                self.cfg.worker_count,
                &self.shutdown,
                |range| async move {
                    op(range.clone()).await.map(|_| range).map_err(BulkSyncError::Pipeline)
                },
                |range| {
                    completed.push((*range.start(), *range.end()));
                    let merged = merge_ranges(&completed);
                    let contiguous = contiguous_prefix(&merged, checkpoint.last_completed);
                    if contiguous.saturating_sub(last_checkpointed) >= self.cfg.checkpoint_interval
                        || contiguous == end
                    {
                        checkpoint.last_completed = contiguous;
                        checkpoint.completed_ranges = merged.clone();
                        if let Err(e) = self.storage.put_checkpoint(checkpoint.clone()) {
                            write_err.get_or_insert(e);
                        }
                        last_checkpointed = contiguous;
                    }
                    completed = merged;
                },
            )
            .await;

            if let Some(e) = write_err {
                return Err(e.into());
            }

            match result {
                Ok(()) => {
                    checkpoint.last_completed = end;
                    checkpoint.completed_ranges = Vec::new();
                    self.storage.put_checkpoint(checkpoint.clone())?;
                    Ok(())
                }
                Err(BulkSyncError::Cancelled) => {
                    self.storage.put_checkpoint(checkpoint.clone())?;
                    Err(BulkSyncError::Cancelled)
                }
                Err(e) => Err(e),
            }
        } else {
            let mut height = start;
            while height <= end {
                if self.shutdown.is_triggered() {
                    self.storage.put_checkpoint(checkpoint.clone())?;
                    return Err(BulkSyncError::Cancelled);
                }
                op(height..=height).await.map_err(BulkSyncError::Pipeline)?;
                checkpoint.last_completed = height;
                if height % self.cfg.checkpoint_interval == 0 || height == end {
                    self.storage.put_checkpoint(checkpoint.clone())?;
                }
                height += 1;
            }
            Ok(())
        }
    }
}
