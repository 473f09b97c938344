use ancora_storage::{TxInput, TxKind};

/// What the recognized-envelope parser (out of scope here, spec.md §1) found
/// in a transaction's extra data, if anything. Passed in by the block
/// processor so classification stays a pure function of shape.
#[derive(Clone, Debug, Default)]
pub struct EnvelopeHint {
    pub recognized: bool,
    pub bytecode: Option<Vec<u8>>,
    pub salt: Option<[u8; 32]>,
    pub graffiti: Option<Vec<u8>>,
}

/// Classifies a transaction by shape (spec.md §4.3). Coinbase-like beats
/// every envelope-based classification; epoch-submission and
/// contract-deployment both require a recognized envelope plus a specific
/// payload shape, checked before falling back to a bare interaction.
pub fn classify_kind(
    inputs: &[TxInput],
    envelope: Option<&EnvelopeHint>,
    max_graffiti_len: usize,
) -> TxKind {
    if inputs.iter().any(|i| i.spent_txid.is_none()) {
        return TxKind::CoinbaseLike;
    }

    let Some(envelope) = envelope.filter(|e| e.recognized) else {
        return TxKind::Generic;
    };

    let graffiti_len = envelope.graffiti.as_ref().map_or(0, |g| g.len());
    if envelope.salt.is_some() && graffiti_len <= max_graffiti_len {
        return TxKind::EpochSubmission;
    }

    if envelope.bytecode.is_some() {
        return TxKind::ContractDeployment;
    }

    TxKind::ContractInteraction
}
