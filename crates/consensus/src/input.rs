use ancora_primitives::{BlockHash, BlockHeight, Buf32, ContractAddress, EpochNumber, Txid};
use ancora_storage::{TxInput, TxOutput};
use ancora_txorder::EnvelopeHint;

/// A contract-impacting transaction's execution payload, recovered from
/// its protocol envelope (spec.md §4.6). Decoding the envelope itself is
/// the protocol-envelope parser's job (spec.md §1 "Explicit non-goals");
/// the block processor only ever sees this already-decoded shape.
#[derive(Clone, Debug)]
pub struct ContractCall {
    /// The caller identity the host executes as — the deployer for a
    /// fresh deployment, or the account driving a `ContractInteraction`.
    pub entry_point: ContractAddress,
    /// `Some` for `ContractInteraction`, `None` for `ContractDeployment`.
    pub target: Option<ContractAddress>,
    pub calldata: Vec<u8>,
    /// `Some` for `ContractDeployment`.
    pub deploy_bytecode: Option<Vec<u8>>,
    pub deploy_salt: Option<Buf32>,
}

/// An epoch-submission transaction's payload (spec.md §3 "Epoch
/// submission").
#[derive(Clone, Debug)]
pub struct EpochSubmissionPayload {
    pub public_key: Buf32,
    pub salt: Buf32,
    pub graffiti: Vec<u8>,
    pub declared_epoch_number: EpochNumber,
}

/// One transaction as handed to the block processor: enough to classify
/// (spec.md §4.3 step 3), order (§4.4), and — if contract- or
/// epoch-impacting — act on (§4.6, §4.7).
#[derive(Clone, Debug)]
pub struct PreparedTx {
    pub txid: Txid,
    pub raw: Vec<u8>,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
    pub burned_fee: u64,
    pub priority_fee: u64,
    pub envelope: Option<EnvelopeHint>,
    pub call: Option<ContractCall>,
    pub submission: Option<EpochSubmissionPayload>,
}

/// One block as handed to the block processor (spec.md §4.3). Header
/// fields other than the checksum triple are decoded upstream (wire
/// decoding is out of scope, spec.md §1); `checksum_root`,
/// `previous_block_checksum`, and the checksum proofs are computed by the
/// processor itself (spec.md §4.5).
#[derive(Clone, Debug)]
pub struct BlockInput {
    pub height: BlockHeight,
    pub hash: BlockHash,
    pub previous_block_hash: BlockHash,
    pub merkle_root: Buf32,
    pub state_root: Buf32,
    pub receipt_root: Buf32,
    pub median_time: u64,
    pub transactions: Vec<PreparedTx>,
}
