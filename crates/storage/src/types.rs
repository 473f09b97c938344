use ancora_primitives::{BlockHash, BlockHeight, Buf20, Buf32, ContractAddress, EpochNumber, Txid, Word256};
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use ancora_merkle::MerkleProof;

/// A stored block header (spec.md §3 "Block header").
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct HeaderRecord {
    pub height: BlockHeight,
    pub hash: BlockHash,
    pub previous_block_hash: BlockHash,
    pub merkle_root: Buf32,
    pub state_root: Buf32,
    pub receipt_root: Buf32,
    pub checksum_root: Buf32,
    pub previous_block_checksum: Buf32,
    /// Proof for each of the six checksum leaves, keyed by leaf index.
    pub checksum_proofs: Vec<MerkleProof>,
}

/// Transaction shape classification (spec.md §3 "Transaction").
#[derive(Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub enum TxKind {
    CoinbaseLike,
    Generic,
    ContractInteraction,
    ContractDeployment,
    EpochSubmission,
    Special,
}

#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct TxInput {
    /// Empty for coinbase-like inputs.
    pub spent_txid: Option<Txid>,
    pub sequence: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct TxOutput {
    pub value: u64,
    pub script_pubkey: Vec<u8>,
}

/// A classified, block-scoped transaction (spec.md §3 "Transaction").
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub txid: Txid,
    pub block_hash: BlockHash,
    pub kind: TxKind,
    pub raw: Vec<u8>,
    pub indexing_hash: Buf32,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
    pub burned_fee: u64,
    pub priority_fee: u64,
    /// Set once the ordering step (spec.md §4.4) has run.
    pub index: Option<u32>,
}

/// A deployed contract (spec.md §3 "Contract").
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct ContractRecord {
    pub address: ContractAddress,
    pub bytecode: Vec<u8>,
    pub deployer: ContractAddress,
    pub deployment_txid: Txid,
    pub seed: Buf32,
    pub salt: Buf32,
    pub deployed_at_height: BlockHeight,
}

/// A single `(contract, pointer) -> value` write, version-stamped by the
/// height at which it was committed (spec.md §3 "Pointer storage").
#[derive(Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct PointerWrite {
    pub value: Word256,
    pub at_height: BlockHeight,
}

/// A validator attestation for a specific block (spec.md §3 "Block witness").
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct WitnessRecord {
    pub block_number: BlockHeight,
    pub checksum_root: Buf32,
    pub signature: Buf64Bytes,
    pub timestamp: u64,
    pub public_key: Buf32,
    /// Populated once the enclosing epoch is finalized.
    pub attestation_proof: Option<MerkleProof>,
}

/// 64-byte signature, kept distinct from [`Buf32`] for clarity at call sites.
pub type Buf64Bytes = ancora_primitives::Buf64;

/// A PoW-style epoch submission (spec.md §3 "Epoch submission").
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub epoch_number: EpochNumber,
    pub public_key: Buf32,
    pub salt: Buf32,
    pub solution_hash: Buf20,
    pub graffiti: Vec<u8>,
    pub submission_txid: Txid,
    pub confirmation_height: BlockHeight,
}

/// A finalized epoch record (spec.md §3 "Epoch").
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct EpochRecord {
    pub epoch_number: EpochNumber,
    pub start_block: BlockHeight,
    pub end_block: BlockHeight,
    pub target: Buf32,
    pub target_hash: Buf20,
    pub winner_public_key: Buf32,
    pub winner_matching_bits: u16,
    pub winner_salt: Buf32,
    pub winner_solution_hash: Buf20,
    pub winner_graffiti: Vec<u8>,
    pub epoch_root: Buf32,
    pub epoch_hash: Buf32,
    pub epoch_data_proof: MerkleProof,
}

/// Bulk-sync phases, persisted as part of the IBD checkpoint (spec.md §4.2).
#[derive(Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub enum IbdPhase {
    HeaderDownload,
    ChecksumGeneration,
    TransactionDownload,
    WitnessSync,
    EpochFinalization,
    Complete,
}

/// Singleton IBD checkpoint record (spec.md §3 "IBD checkpoint").
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct IbdCheckpoint {
    pub phase: IbdPhase,
    pub original_start: BlockHeight,
    pub last_completed: BlockHeight,
    pub target: BlockHeight,
    pub timestamp: u64,
    /// Height ranges already fully processed within the current phase.
    pub completed_ranges: Vec<(BlockHeight, BlockHeight)>,
    /// Last epoch number finalized during this sync run.
    pub last_finalized_epoch: Option<EpochNumber>,
}
