use ancora_epoch::{finalize_epoch, FinalizeInput};
use ancora_params::{ConsensusConfig, ATTESTED_EPOCH_OFFSET};
use ancora_primitives::{BlockHeight, Buf32, EpochNumber};
use ancora_storage::{EpochRecord, Storage};

use crate::error::{ConsensusError, Result};

/// Drives epoch finalization (spec.md §4.7) from whatever's already been
/// committed to storage: submissions, witnesses, and the checksum trees of
/// the epoch's own and the attested epoch's final blocks.
pub struct EpochDriver<'s> {
    storage: &'s dyn Storage,
    cfg: &'s ConsensusConfig,
}

impl<'s> EpochDriver<'s> {
    pub fn new(storage: &'s dyn Storage, cfg: &'s ConsensusConfig) -> Self {
        Self { storage, cfg }
    }

    fn start_block(&self, epoch: EpochNumber) -> BlockHeight {
        epoch * self.cfg.blocks_per_epoch
    }

    fn end_block(&self, epoch: EpochNumber) -> BlockHeight {
        self.start_block(epoch) + self.cfg.blocks_per_epoch - 1
    }

    /// `height` is the first block of a new epoch iff it is a nonzero
    /// multiple of `blocks_per_epoch`; the epoch that just closed is
    /// `height / blocks_per_epoch - 1` (spec.md §4.7 "When the processor
    /// commits the first block of epoch N+1, epoch N is finalized").
    pub fn epoch_closed_by(&self, height: BlockHeight) -> Option<EpochNumber> {
        if height == 0 || height % self.cfg.blocks_per_epoch != 0 {
            return None;
        }
        Some(height / self.cfg.blocks_per_epoch - 1)
    }

    fn checksum_root_at(&self, height: BlockHeight) -> Result<Buf32> {
        Ok(self.storage.get_header(height)?.ok_or(ConsensusError::MissingHeader { height })?.checksum_root)
    }

    /// Finalizes epoch `epoch_number` and persists the result: the epoch
    /// record, attestation proofs on the witnesses they cover, and obsolete
    /// target-epoch hints (spec.md §4.7 step 7). `generated_at` is a
    /// wall-clock timestamp for the epoch artifact's metadata only — it
    /// never feeds into any consensus-relevant hash.
    pub fn finalize(&self, epoch_number: EpochNumber, generated_at: u64) -> Result<EpochRecord> {
        let start_block = self.start_block(epoch_number);
        let end_block = self.end_block(epoch_number);

        let target = if epoch_number == 0 {
            Buf32::ZERO
        } else {
            self.checksum_root_at(self.start_block(epoch_number) - 1)?
        };
        let checksum_root = self.checksum_root_at(end_block)?;
        let previous_epoch_hash = if epoch_number == 0 {
            Buf32::ZERO
        } else {
            self.storage.get_epoch_by_number(epoch_number - 1)?.map(|e| e.epoch_hash).unwrap_or(Buf32::ZERO)
        };

        // Per spec.md §9 design notes: epochs below the attestation offset
        // substitute zero rather than a negative epoch number.
        let (attested_epoch_number, attested_checksum_root) = if epoch_number >= ATTESTED_EPOCH_OFFSET {
            let attested = epoch_number - ATTESTED_EPOCH_OFFSET;
            (attested, self.checksum_root_at(self.end_block(attested))?)
        } else {
            (0, Buf32::ZERO)
        };

        let submissions: Vec<_> = self
            .storage
            .get_submissions_for_epoch(epoch_number)?
            .into_iter()
            .map(|s| ancora_epoch::SubmissionInput {
                public_key: s.public_key,
                salt: s.salt,
                graffiti: s.graffiti,
                declared_epoch_number: s.epoch_number,
            })
            .collect();

        let witness_cap = self.cfg.max_attestation_per_block * self.cfg.blocks_per_epoch as usize;
        let witnesses = self.storage.get_witnesses_for_range(start_block, end_block, witness_cap)?;

        let input = FinalizeInput {
            epoch_number,
            start_block,
            end_block,
            target,
            checksum_root,
            previous_epoch_hash,
            attested_epoch_number,
            attested_checksum_root,
            submissions,
            witnesses,
            chain_id: self.cfg.chain_id,
            protocol_id: self.cfg.protocol_id,
            generated_at,
        };

        let output = finalize_epoch(input, self.cfg);

        self.storage.put_epoch(output.record.clone())?;
        if !output.witness_attestations.is_empty() {
            self.storage.update_witness_proofs(output.witness_attestations)?;
        }
        if epoch_number > 0 {
            self.storage.delete_target_epochs_before(epoch_number)?;
        }

        Ok(output.record)
    }
}
