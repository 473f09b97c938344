use ancora_epoch_merkle::{empty_attestation_leaf, AttestationLeafFields, AttestationLeafType};
use ancora_primitives::{BlockHeight, Buf32};
use ancora_storage::WitnessRecord;

/// A leaf ready for tree construction, plus the `(block_number,
/// public_key)` key to thread attestation proofs back to their stored
/// witness — `None` for filler leaves, which have no corresponding
/// witness record.
pub struct AggregatedLeaf {
    pub fields: AttestationLeafFields,
    pub witness_key: Option<(BlockHeight, Buf32)>,
}

fn witness_to_leaf(w: &WitnessRecord) -> AttestationLeafFields {
    AttestationLeafFields {
        leaf_type: AttestationLeafType::Real,
        block_number: w.block_number,
        checksum_root: w.checksum_root,
        signature: w.signature,
        timestamp: w.timestamp,
        public_key: w.public_key,
    }
}

/// Collects attestation leaves for one epoch (spec.md §4.7 step 5).
/// `witnesses` must already be filtered to `[start, end]`, capped, and
/// sorted descending by timestamp — that's the storage collaborator's
/// `get_witnesses_for_range` contract.
pub fn aggregate_attestations(
    witnesses: Vec<WitnessRecord>,
    start: BlockHeight,
    end: BlockHeight,
    min_attestations: usize,
) -> Vec<AggregatedLeaf> {
    let mut leaves: Vec<AggregatedLeaf> = witnesses
        .iter()
        .map(|w| AggregatedLeaf {
            fields: witness_to_leaf(w),
            witness_key: Some((w.block_number, w.public_key)),
        })
        .collect();

    let fillers = [
        empty_attestation_leaf(start),
        empty_attestation_leaf(end.saturating_sub(1)),
    ];
    let mut filler_iter = fillers.into_iter();
    while leaves.len() < min_attestations {
        let Some(filler) = filler_iter.next() else { break };
        leaves.push(AggregatedLeaf { fields: filler, witness_key: None });
    }

    leaves
}
