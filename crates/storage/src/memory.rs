use std::collections::BTreeMap;

use ancora_merkle::MerkleProof;
use ancora_primitives::{BlockHeight, Buf32, ContractAddress, EpochNumber, Word256};
use parking_lot::Mutex;

use crate::error::Result;
use crate::traits::Storage;
use crate::types::{
    ContractRecord, EpochRecord, HeaderRecord, IbdCheckpoint, PointerWrite, SubmissionRecord,
    TransactionRecord, WitnessRecord,
};

#[derive(Default)]
struct State {
    headers: BTreeMap<BlockHeight, HeaderRecord>,
    transactions: BTreeMap<BlockHeight, Vec<TransactionRecord>>,
    contracts: BTreeMap<ContractAddress, Vec<(BlockHeight, ContractRecord)>>,
    pointers: BTreeMap<(ContractAddress, Word256), Vec<PointerWrite>>,
    submissions: BTreeMap<EpochNumber, Vec<SubmissionRecord>>,
    witnesses: Vec<WitnessRecord>,
    epochs: BTreeMap<EpochNumber, EpochRecord>,
    checkpoint: Option<IbdCheckpoint>,
    target_epoch_hints: BTreeMap<EpochNumber, Buf32>,
}

/// A reference `Storage` implementation backed entirely by in-process
/// `BTreeMap`s. Exists for tests and local development; a real deployment
/// swaps in a concrete on-disk backend behind the same trait, per the
/// storage collaborator boundary in spec.md §6.
#[derive(Default)]
pub struct InMemoryStorage {
    state: Mutex<State>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test/bootstrap helper: records a `(epoch -> target)` hint directly,
    /// bypassing the epoch-finalization path.
    pub fn set_target_epoch_hint(&self, epoch: EpochNumber, target: Buf32) {
        self.state.lock().target_epoch_hints.insert(epoch, target);
    }

    pub fn target_epoch_hint(&self, epoch: EpochNumber) -> Option<Buf32> {
        self.state.lock().target_epoch_hints.get(&epoch).copied()
    }
}

impl Storage for InMemoryStorage {
    fn get_header(&self, height: BlockHeight) -> Result<Option<HeaderRecord>> {
        Ok(self.state.lock().headers.get(&height).cloned())
    }

    fn put_header(&self, header: HeaderRecord) -> Result<()> {
        self.state.lock().headers.insert(header.height, header);
        Ok(())
    }

    fn get_transactions(&self, height: BlockHeight) -> Result<Vec<TransactionRecord>> {
        Ok(self.state.lock().transactions.get(&height).cloned().unwrap_or_default())
    }

    fn put_transactions(&self, height: BlockHeight, txs: Vec<TransactionRecord>) -> Result<()> {
        self.state.lock().transactions.insert(height, txs);
        Ok(())
    }

    fn get_contract(
        &self,
        address: ContractAddress,
        at_height: BlockHeight,
    ) -> Result<Option<ContractRecord>> {
        let state = self.state.lock();
        Ok(state
            .contracts
            .get(&address)
            .and_then(|versions| versions.iter().rev().find(|(h, _)| *h <= at_height))
            .map(|(_, c)| c.clone()))
    }

    fn put_contract(&self, contract: ContractRecord) -> Result<()> {
        let mut state = self.state.lock();
        state
            .contracts
            .entry(contract.address)
            .or_default()
            .push((contract.deployed_at_height, contract));
        Ok(())
    }

    fn get_pointer(
        &self,
        address: ContractAddress,
        pointer: Word256,
        at_height: BlockHeight,
    ) -> Result<Option<Word256>> {
        let state = self.state.lock();
        Ok(state
            .pointers
            .get(&(address, pointer))
            .and_then(|writes| writes.iter().rev().find(|w| w.at_height <= at_height))
            .map(|w| w.value))
    }

    fn put_pointer(
        &self,
        address: ContractAddress,
        pointer: Word256,
        write: PointerWrite,
    ) -> Result<()> {
        self.state.lock().pointers.entry((address, pointer)).or_default().push(write);
        Ok(())
    }

    fn get_submissions_for_epoch(&self, epoch: EpochNumber) -> Result<Vec<SubmissionRecord>> {
        Ok(self.state.lock().submissions.get(&epoch).cloned().unwrap_or_default())
    }

    fn put_submission(&self, submission: SubmissionRecord) -> Result<()> {
        self.state.lock().submissions.entry(submission.epoch_number).or_default().push(submission);
        Ok(())
    }

    fn get_witnesses_for_range(
        &self,
        start: BlockHeight,
        end: BlockHeight,
        cap: usize,
    ) -> Result<Vec<WitnessRecord>> {
        let state = self.state.lock();
        let mut matching: Vec<WitnessRecord> = state
            .witnesses
            .iter()
            .filter(|w| w.block_number >= start && w.block_number <= end)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        matching.truncate(cap);
        Ok(matching)
    }

    fn put_witness(&self, witness: WitnessRecord) -> Result<()> {
        self.state.lock().witnesses.push(witness);
        Ok(())
    }

    fn update_witness_proofs(&self, batch: Vec<((BlockHeight, Buf32), MerkleProof)>) -> Result<()> {
        let mut state = self.state.lock();
        for ((block_number, public_key), proof) in batch {
            if let Some(w) = state
                .witnesses
                .iter_mut()
                .find(|w| w.block_number == block_number && w.public_key == public_key)
            {
                w.attestation_proof = Some(proof);
            }
        }
        Ok(())
    }

    fn put_epoch(&self, epoch: EpochRecord) -> Result<()> {
        self.state.lock().epochs.insert(epoch.epoch_number, epoch);
        Ok(())
    }

    fn get_epoch_by_number(&self, epoch: EpochNumber) -> Result<Option<EpochRecord>> {
        Ok(self.state.lock().epochs.get(&epoch).cloned())
    }

    fn get_checkpoint(&self) -> Result<Option<IbdCheckpoint>> {
        Ok(self.state.lock().checkpoint.clone())
    }

    fn put_checkpoint(&self, checkpoint: IbdCheckpoint) -> Result<()> {
        self.state.lock().checkpoint = Some(checkpoint);
        Ok(())
    }

    fn delete_checkpoint(&self) -> Result<()> {
        self.state.lock().checkpoint = None;
        Ok(())
    }

    fn delete_target_epochs_before(&self, epoch: EpochNumber) -> Result<()> {
        self.state.lock().target_epoch_hints.retain(|&e, _| e >= epoch);
        Ok(())
    }

    fn rollback_to_height(&self, height: BlockHeight) -> Result<()> {
        let mut state = self.state.lock();
        state.headers.retain(|&h, _| h <= height);
        state.transactions.retain(|&h, _| h <= height);
        for versions in state.contracts.values_mut() {
            versions.retain(|(h, _)| *h <= height);
        }
        for writes in state.pointers.values_mut() {
            writes.retain(|w| w.at_height <= height);
        }
        state.witnesses.retain(|w| w.block_number <= height);
        Ok(())
    }
}
