use ancora_merkle::MerkleProof;
use ancora_primitives::{BlockHeight, Buf32, ContractAddress, EpochNumber, Word256};

use crate::error::Result;
use crate::types::{
    ContractRecord, EpochRecord, HeaderRecord, IbdCheckpoint, PointerWrite, SubmissionRecord,
    TransactionRecord, WitnessRecord,
};

/// The storage collaborator (spec.md §6). Typed collections for headers,
/// transactions, contracts, pointer-storage, witnesses, epochs,
/// submissions, and the IBD checkpoint, with atomic per-block batch
/// commits. Concrete backends (sled, rocksdb, …) are an external
/// collaborator; this trait is the boundary the rest of the engine is
/// written against.
#[cfg_attr(any(test, feature = "test_utils"), mockall::automock)]
pub trait Storage: Send + Sync {
    fn get_header(&self, height: BlockHeight) -> Result<Option<HeaderRecord>>;
    fn put_header(&self, header: HeaderRecord) -> Result<()>;

    fn get_transactions(&self, height: BlockHeight) -> Result<Vec<TransactionRecord>>;
    fn put_transactions(&self, height: BlockHeight, txs: Vec<TransactionRecord>) -> Result<()>;

    fn get_contract(
        &self,
        address: ContractAddress,
        at_height: BlockHeight,
    ) -> Result<Option<ContractRecord>>;
    fn put_contract(&self, contract: ContractRecord) -> Result<()>;

    fn get_pointer(
        &self,
        address: ContractAddress,
        pointer: Word256,
        at_height: BlockHeight,
    ) -> Result<Option<Word256>>;
    fn put_pointer(
        &self,
        address: ContractAddress,
        pointer: Word256,
        write: PointerWrite,
    ) -> Result<()>;

    fn get_submissions_for_epoch(&self, epoch: EpochNumber) -> Result<Vec<SubmissionRecord>>;
    fn put_submission(&self, submission: SubmissionRecord) -> Result<()>;

    fn get_witnesses_for_range(
        &self,
        start: BlockHeight,
        end: BlockHeight,
        cap: usize,
    ) -> Result<Vec<WitnessRecord>>;
    fn put_witness(&self, witness: WitnessRecord) -> Result<()>;
    /// Attaches the epoch's attestation proof to each witness named in
    /// `batch` as `(block_number, public_key)`.
    fn update_witness_proofs(&self, batch: Vec<((BlockHeight, Buf32), MerkleProof)>) -> Result<()>;

    fn put_epoch(&self, epoch: EpochRecord) -> Result<()>;
    fn get_epoch_by_number(&self, epoch: EpochNumber) -> Result<Option<EpochRecord>>;

    fn get_checkpoint(&self) -> Result<Option<IbdCheckpoint>>;
    fn put_checkpoint(&self, checkpoint: IbdCheckpoint) -> Result<()>;
    fn delete_checkpoint(&self) -> Result<()>;

    /// Drops cached `(epoch_number -> target)` hints below `epoch`, once
    /// they can no longer be referenced by a future finalization.
    fn delete_target_epochs_before(&self, epoch: EpochNumber) -> Result<()>;

    /// Discards every mutation recorded at a height greater than `height`.
    /// Used by the reorg watchdog's safe-rewind (spec.md §4.1, §5).
    fn rollback_to_height(&self, height: BlockHeight) -> Result<()>;
}
