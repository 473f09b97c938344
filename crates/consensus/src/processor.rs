use std::collections::HashMap;

use ancora_checksum::{build_checksum_tree, ChecksumLeaves};
use ancora_exec::{ContractRuntime, ExecutionContext, HostAbi, HostContext, LogEntry};
use ancora_params::ConsensusConfig;
use ancora_primitives::{sha256_concat, Buf32, ContractAddress, Txid};
use ancora_storage::{
    HeaderRecord, PointerWrite, Storage, SubmissionRecord, TransactionRecord, TxKind,
};
use ancora_txorder::{classify_kind, order_transactions};

use crate::error::{ConsensusError, Result};
use crate::input::{BlockInput, ContractCall, EpochSubmissionPayload};

/// Outcome of executing one transaction's contract payload (spec.md §4.6
/// failure modes). Non-contract transactions are always `Success` with
/// zero gas — a dense receipt row keeps the collection indexable by
/// `tx_index` rather than sparse.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReceiptStatus {
    Success,
    Reverted { reason: String },
}

/// One transaction's execution receipt (spec.md §4.3 step 7). Returned to
/// the processor's caller rather than persisted through [`Storage`], which
/// has no receipt-persistence method; `receipt_root` itself is supplied
/// externally in [`BlockInput`], the same way `merkle_root`/`state_root`
/// are (wire/protocol decoding is out of scope throughout this codebase).
#[derive(Clone, Debug)]
pub struct Receipt {
    pub tx_index: u32,
    pub status: ReceiptStatus,
    pub gas_used: u64,
    pub logs: Vec<LogEntry>,
    pub deployed_contracts: Vec<ContractAddress>,
}

/// Result of processing one block (spec.md §4.3).
#[derive(Clone, Debug)]
pub struct ProcessedBlock {
    pub header: HeaderRecord,
    pub transactions: Vec<TransactionRecord>,
    pub receipts: Vec<Receipt>,
}

/// Computes the checksum-complete header for `block` against `previous`
/// (spec.md §4.3 step 6, §4.5), without touching storage. Exposed
/// separately from [`BlockProcessor::process_block`] so callers that must
/// validate a candidate header's continuity — e.g. the reorg watchdog —
/// before committing anything can build the same header the processor
/// would, then decide whether to accept it.
pub fn build_header(block: &BlockInput, previous: Option<&HeaderRecord>) -> HeaderRecord {
    let previous_block_hash = previous.map_or(Buf32::ZERO, |h| *h.hash.as_buf());
    let previous_block_checksum = previous.map_or(Buf32::ZERO, |h| h.checksum_root);

    let leaves = ChecksumLeaves {
        previous_block_hash,
        previous_block_checksum,
        block_hash: *block.hash.as_buf(),
        block_merkle_root: block.merkle_root,
        state_root: block.state_root,
        receipt_root: block.receipt_root,
    };
    let artifact = build_checksum_tree(leaves);

    HeaderRecord {
        height: block.height,
        hash: block.hash,
        previous_block_hash: block.previous_block_hash,
        merkle_root: block.merkle_root,
        state_root: block.state_root,
        receipt_root: block.receipt_root,
        checksum_root: Buf32::new(artifact.root),
        previous_block_checksum,
        checksum_proofs: artifact.proofs.to_vec(),
    }
}

/// Orchestrates the per-block pipeline (spec.md §4.3 steps 1-7): classify,
/// order, execute contract-impacting transactions, checksum, commit.
pub struct BlockProcessor<'s> {
    storage: &'s dyn Storage,
    runtime: &'s dyn ContractRuntime,
    cfg: &'s ConsensusConfig,
}

impl<'s> BlockProcessor<'s> {
    pub fn new(storage: &'s dyn Storage, runtime: &'s dyn ContractRuntime, cfg: &'s ConsensusConfig) -> Self {
        Self { storage, runtime, cfg }
    }

    /// Runs the full per-block pipeline and commits the result. `block`'s
    /// transactions are already decoded (envelope parsing is the caller's
    /// job); this only classifies, orders, executes, and checksums them.
    pub fn process_block(&self, block: BlockInput) -> Result<ProcessedBlock> {
        let previous = if block.height == 0 {
            None
        } else {
            let height = block.height - 1;
            Some(self.storage.get_header(height)?.ok_or(ConsensusError::MissingHeader { height })?)
        };

        let (ordered, receipts) = self.process_transactions(&block)?;
        let header = build_header(&block, previous.as_ref());
        self.storage.put_header(header.clone())?;

        Ok(ProcessedBlock { header, transactions: ordered, receipts })
    }

    /// Classifies, orders, executes, and persists `block`'s transactions
    /// and any epoch submissions among them, without touching the header or
    /// its checksum (spec.md §4.3 steps 3-6). Split out from
    /// [`Self::process_block`] so bulk sync's transaction-download phase
    /// (spec.md §4.2 phase 3), which commits headers and checksums in
    /// earlier, separately-sequenced phases, can drive the same logic.
    pub fn process_transactions(&self, block: &BlockInput) -> Result<(Vec<TransactionRecord>, Vec<Receipt>)> {
        let mut calls: HashMap<Txid, ContractCall> = HashMap::new();
        let mut submissions: Vec<(Txid, EpochSubmissionPayload)> = Vec::new();
        let mut records = Vec::with_capacity(block.transactions.len());

        for tx in &block.transactions {
            let kind = classify_kind(&tx.inputs, tx.envelope.as_ref(), self.cfg.graffiti_length);

            match kind {
                TxKind::ContractInteraction | TxKind::ContractDeployment => {
                    if let Some(call) = &tx.call {
                        calls.insert(tx.txid, call.clone());
                    }
                }
                TxKind::EpochSubmission => {
                    if let Some(payload) = &tx.submission {
                        submissions.push((tx.txid, payload.clone()));
                    }
                }
                TxKind::CoinbaseLike | TxKind::Generic | TxKind::Special => {}
            }

            records.push(TransactionRecord {
                txid: tx.txid,
                block_hash: block.hash,
                kind,
                raw: tx.raw.clone(),
                indexing_hash: sha256_concat(&[tx.txid.as_buf().as_slice()]),
                inputs: tx.inputs.clone(),
                outputs: tx.outputs.clone(),
                burned_fee: tx.burned_fee,
                priority_fee: tx.priority_fee,
                index: None,
            });
        }

        let ordered = order_transactions(records)?;

        let mut receipts = Vec::with_capacity(ordered.len());
        for record in &ordered {
            let tx_index = record.index.expect("order_transactions assigns every index");
            let receipt = match calls.get(&record.txid) {
                Some(call) => self.execute_call(block, record.txid, tx_index, call),
                None => Receipt {
                    tx_index,
                    status: ReceiptStatus::Success,
                    gas_used: 0,
                    logs: Vec::new(),
                    deployed_contracts: Vec::new(),
                },
            };
            receipts.push(receipt);
        }

        for (txid, payload) in submissions {
            let target = self.target_for_epoch(payload.declared_epoch_number)?;
            let solution_hash =
                ancora_epoch::candidate_hash(target, payload.public_key, payload.salt);
            self.storage.put_submission(SubmissionRecord {
                epoch_number: payload.declared_epoch_number,
                public_key: payload.public_key,
                salt: payload.salt,
                solution_hash,
                graffiti: payload.graffiti,
                submission_txid: txid,
                confirmation_height: block.height,
            })?;
        }

        self.storage.put_transactions(block.height, ordered.clone())?;

        Ok((ordered, receipts))
    }

    /// Runs one contract-impacting transaction through the host (spec.md
    /// §4.6), committing its overlay writes and pending deployments only on
    /// success.
    fn execute_call(
        &self,
        block: &BlockInput,
        txid: Txid,
        tx_index: u32,
        call: &ContractCall,
    ) -> Receipt {
        let gas_budget = self.cfg.gas_limit_per_tx;
        let ctx = ExecutionContext {
            reading_height: block.height,
            block_hash: block.hash,
            median_time: block.median_time,
            tx_index,
        };
        let mut host = HostContext::new(
            self.storage,
            ctx,
            call.entry_point,
            gas_budget,
            self.cfg.call_depth_max,
            self.cfg.deploy_depth_max,
        );

        let outcome = match (&call.target, &call.deploy_bytecode) {
            (Some(target), _) => host.call(*target, &call.calldata, self.runtime).map(|_| ()),
            (None, Some(bytecode)) => self
                .runtime
                .validate_bytecode(bytecode)
                .and_then(|()| host.deploy_at(bytecode.clone(), call.deploy_salt.unwrap_or(Buf32::ZERO)))
                .map(|_| ()),
            (None, None) => Err(ancora_exec::ExecError::UnknownContract),
        };

        let out = host.into_parts();

        match outcome {
            Ok(()) => {
                let mut deployed_contracts = Vec::with_capacity(out.pending_deployments.len());
                for pending in &out.pending_deployments {
                    let record = ancora_exec::finalize_deployment(pending, txid, block.height);
                    if self.storage.put_contract(record).is_ok() {
                        deployed_contracts.push(pending.address);
                    }
                }
                for ((address, pointer), value) in out.overlay_writes {
                    let _ = self.storage.put_pointer(
                        address,
                        pointer,
                        PointerWrite { value, at_height: block.height },
                    );
                }
                Receipt {
                    tx_index,
                    status: ReceiptStatus::Success,
                    gas_used: out.gas_used,
                    logs: out.events,
                    deployed_contracts,
                }
            }
            Err(e) => Receipt {
                tx_index,
                status: ReceiptStatus::Reverted { reason: e.to_string() },
                gas_used: out.gas_used,
                logs: out.events,
                deployed_contracts: Vec::new(),
            },
        }
    }

    /// The target for an epoch submission declaring `epoch_number` (spec.md
    /// §4.7 step 1): zero for epoch 0, otherwise the `checksum_root` of the
    /// final block of the prior epoch.
    fn target_for_epoch(&self, epoch_number: u64) -> Result<Buf32> {
        if epoch_number == 0 {
            return Ok(Buf32::ZERO);
        }
        let height = epoch_number * self.cfg.blocks_per_epoch - 1;
        let header =
            self.storage.get_header(height)?.ok_or(ConsensusError::MissingHeader { height })?;
        Ok(header.checksum_root)
    }
}

#[cfg(test)]
mod tests {
    use ancora_exec::ExecError;
    use ancora_params::ConsensusConfig;
    use ancora_primitives::BlockHash;
    use ancora_storage::{ContractRecord, InMemoryStorage, TxInput};
    use ancora_txorder::EnvelopeHint;

    use super::*;
    use crate::input::PreparedTx;

    struct EchoRuntime;

    impl ContractRuntime for EchoRuntime {
        fn invoke(
            &self,
            _bytecode: &[u8],
            calldata: &[u8],
            host: &mut dyn HostAbi,
        ) -> ancora_exec::Result<Vec<u8>> {
            host.charge_gas(5)?;
            host.store([1u8; 32], [2u8; 32])?;
            Ok(calldata.to_vec())
        }

        fn validate_bytecode(&self, bytecode: &[u8]) -> ancora_exec::Result<()> {
            if bytecode.is_empty() {
                return Err(ExecError::InvalidBytecode("empty".into()));
            }
            Ok(())
        }
    }

    struct RevertingRuntime;

    impl ContractRuntime for RevertingRuntime {
        fn invoke(
            &self,
            _bytecode: &[u8],
            _calldata: &[u8],
            host: &mut dyn HostAbi,
        ) -> ancora_exec::Result<Vec<u8>> {
            host.charge_gas(7)?;
            host.store([1u8; 32], [9u8; 32])?;
            Err(ExecError::Revert { reason: "nope".into() })
        }

        fn validate_bytecode(&self, _bytecode: &[u8]) -> ancora_exec::Result<()> {
            Ok(())
        }
    }

    fn addr(b: u8) -> ContractAddress {
        ContractAddress::new([b; 20])
    }

    fn txid(b: u8) -> Txid {
        Txid::new(Buf32::new([b; 32]))
    }

    fn generic_tx(b: u8) -> PreparedTx {
        PreparedTx {
            txid: txid(b),
            raw: vec![],
            inputs: vec![TxInput { spent_txid: Some(txid(0xaa)), sequence: 0 }],
            outputs: vec![],
            burned_fee: 0,
            priority_fee: 0,
            envelope: None,
            call: None,
            submission: None,
        }
    }

    fn genesis_block(transactions: Vec<PreparedTx>) -> BlockInput {
        BlockInput {
            height: 0,
            hash: BlockHash::new(Buf32::new([9u8; 32])),
            previous_block_hash: BlockHash::ZERO,
            merkle_root: Buf32::ZERO,
            state_root: Buf32::ZERO,
            receipt_root: Buf32::ZERO,
            median_time: 0,
            transactions,
        }
    }

    #[test]
    fn genesis_block_with_only_generic_txs_commits_header() {
        let storage = InMemoryStorage::new();
        let runtime = EchoRuntime;
        let cfg = ConsensusConfig::default();
        let processor = BlockProcessor::new(&storage, &runtime, &cfg);

        let out = processor.process_block(genesis_block(vec![generic_tx(1)])).unwrap();
        assert_eq!(out.header.height, 0);
        assert_eq!(out.transactions.len(), 1);
        assert_eq!(out.receipts.len(), 1);
        assert_eq!(out.receipts[0].status, ReceiptStatus::Success);
        assert!(storage.get_header(0).unwrap().is_some());
    }

    #[test]
    fn contract_interaction_commits_overlay_writes_on_success() {
        let storage = InMemoryStorage::new();
        let runtime = EchoRuntime;
        let cfg = ConsensusConfig::default();

        let target = addr(2);
        storage
            .put_contract(ContractRecord {
                address: target,
                bytecode: vec![1, 2, 3],
                deployer: addr(1),
                deployment_txid: txid(0),
                seed: Buf32::ZERO,
                salt: Buf32::ZERO,
                deployed_at_height: 0,
            })
            .unwrap();

        let call = ContractCall {
            entry_point: addr(1),
            target: Some(target),
            calldata: vec![9],
            deploy_bytecode: None,
            deploy_salt: None,
        };
        let mut tx = generic_tx(3);
        tx.envelope =
            Some(EnvelopeHint { recognized: true, bytecode: None, salt: None, graffiti: None });
        tx.call = Some(call);

        let processor = BlockProcessor::new(&storage, &runtime, &cfg);
        let out = processor.process_block(genesis_block(vec![tx])).unwrap();

        assert_eq!(out.receipts[0].status, ReceiptStatus::Success);
        assert_eq!(out.receipts[0].gas_used, 5);
        assert_eq!(storage.get_pointer(target, [1u8; 32], 0).unwrap(), Some([2u8; 32]));
    }

    #[test]
    fn contract_deployment_registers_a_contract_record() {
        let storage = InMemoryStorage::new();
        let runtime = EchoRuntime;
        let cfg = ConsensusConfig::default();

        let call = ContractCall {
            entry_point: addr(1),
            target: None,
            calldata: vec![],
            deploy_bytecode: Some(vec![1, 2, 3]),
            deploy_salt: Some(Buf32::new([5u8; 32])),
        };
        let mut tx = generic_tx(4);
        tx.envelope = Some(EnvelopeHint {
            recognized: true,
            bytecode: Some(vec![1, 2, 3]),
            salt: None,
            graffiti: None,
        });
        tx.call = Some(call);

        let processor = BlockProcessor::new(&storage, &runtime, &cfg);
        let out = processor.process_block(genesis_block(vec![tx])).unwrap();

        assert_eq!(out.receipts[0].status, ReceiptStatus::Success);
        assert_eq!(out.receipts[0].deployed_contracts.len(), 1);
    }

    #[test]
    fn reverting_interaction_discards_overlay_but_keeps_gas() {
        let storage = InMemoryStorage::new();
        let runtime = RevertingRuntime;
        let cfg = ConsensusConfig::default();
        let target = addr(2);
        storage
            .put_contract(ContractRecord {
                address: target,
                bytecode: vec![1],
                deployer: addr(1),
                deployment_txid: txid(0),
                seed: Buf32::ZERO,
                salt: Buf32::ZERO,
                deployed_at_height: 0,
            })
            .unwrap();

        let call = ContractCall {
            entry_point: addr(1),
            target: Some(target),
            calldata: vec![],
            deploy_bytecode: None,
            deploy_salt: None,
        };
        let mut tx = generic_tx(5);
        tx.envelope =
            Some(EnvelopeHint { recognized: true, bytecode: None, salt: None, graffiti: None });
        tx.call = Some(call);

        let processor = BlockProcessor::new(&storage, &runtime, &cfg);
        let out = processor.process_block(genesis_block(vec![tx])).unwrap();

        assert!(matches!(out.receipts[0].status, ReceiptStatus::Reverted { .. }));
        assert_eq!(out.receipts[0].gas_used, 7);
        assert_eq!(storage.get_pointer(target, [1u8; 32], 0).unwrap(), None);
    }

    #[test]
    fn epoch_submission_computes_solution_hash_against_genesis_target() {
        let storage = InMemoryStorage::new();
        let runtime = EchoRuntime;
        let cfg = ConsensusConfig::default();

        let mut tx = generic_tx(6);
        tx.envelope = Some(EnvelopeHint {
            recognized: true,
            bytecode: None,
            salt: Some([1u8; 32]),
            graffiti: Some(vec![]),
        });
        tx.submission = Some(EpochSubmissionPayload {
            public_key: Buf32::new([2u8; 32]),
            salt: Buf32::new([1u8; 32]),
            graffiti: vec![],
            declared_epoch_number: 0,
        });

        let processor = BlockProcessor::new(&storage, &runtime, &cfg);
        processor.process_block(genesis_block(vec![tx])).unwrap();

        let stored = storage.get_submissions_for_epoch(0).unwrap();
        assert_eq!(stored.len(), 1);
        let expected =
            ancora_epoch::candidate_hash(Buf32::ZERO, Buf32::new([2u8; 32]), Buf32::new([1u8; 32]));
        assert_eq!(stored[0].solution_hash, expected);
    }
}
