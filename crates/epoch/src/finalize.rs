use ancora_epoch_merkle::{build_epoch_tree, encode_attestation_leaf, encode_epoch_data_leaf, epoch_hash, EpochDataFields};
use ancora_merkle::MerkleProof;
use ancora_params::ConsensusConfig;
use ancora_primitives::{BlockHeight, Buf32, EpochNumber};
use ancora_storage::{EpochRecord, WitnessRecord};

use crate::aggregate::aggregate_attestations;
use crate::submission::{select_winner, target_hash, SubmissionInput};

/// Everything the epoch manager needs to finalize epoch `N` (spec.md §4.7).
pub struct FinalizeInput {
    pub epoch_number: EpochNumber,
    pub start_block: BlockHeight,
    pub end_block: BlockHeight,
    /// The target for this epoch: zero for epoch 0, otherwise the prior
    /// epoch's final checksum root (`submission::target_for_epoch`).
    pub target: Buf32,
    /// `checksum_root` of this epoch's own `end_block`.
    pub checksum_root: Buf32,
    pub previous_epoch_hash: Buf32,
    pub attested_epoch_number: u64,
    pub attested_checksum_root: Buf32,
    pub submissions: Vec<SubmissionInput>,
    pub witnesses: Vec<WitnessRecord>,
    pub chain_id: u32,
    pub protocol_id: u32,
    pub generated_at: u64,
}

/// Attestation proofs to attach to stored witnesses, keyed the same way
/// `Storage::update_witness_proofs` expects.
pub struct FinalizeOutput {
    pub record: EpochRecord,
    pub witness_attestations: Vec<((BlockHeight, Buf32), MerkleProof)>,
}

/// Runs epoch-finalization steps 1-6 of spec.md §4.7 (step 1, target
/// selection, is the caller's job via `submission::target_for_epoch`;
/// everything from submission validation through tree construction
/// happens here).
pub fn finalize_epoch(input: FinalizeInput, cfg: &ConsensusConfig) -> FinalizeOutput {
    let target_hash_value = target_hash(input.target);

    let valid: Vec<_> = input
        .submissions
        .iter()
        .filter_map(|s| {
            crate::submission::validate_submission(
                input.target,
                target_hash_value,
                input.epoch_number,
                cfg.min_difficulty,
                cfg.graffiti_length,
                s,
            )
        })
        .collect();

    let winner = select_winner(&valid, cfg.genesis_proposer_public_key);

    let aggregated = aggregate_attestations(
        input.witnesses,
        input.start_block,
        input.end_block,
        ancora_params::MIN_ATTESTATIONS_PER_EPOCH,
    );
    let attestation_leaf_bytes: Vec<Vec<u8>> =
        aggregated.iter().map(|l| encode_attestation_leaf(&l.fields)).collect();

    let epoch_data_fields = EpochDataFields {
        chain_id: input.chain_id,
        protocol_id: input.protocol_id,
        epoch_number: input.epoch_number,
        start_block: input.start_block,
        end_block: input.end_block,
        checksum_root: input.checksum_root,
        previous_epoch_hash: input.previous_epoch_hash,
        attested_epoch_number: input.attested_epoch_number,
        attested_checksum_root: input.attested_checksum_root,
        winner_public_key: winner.public_key,
        winner_matching_bits: winner.matching_bits as u16,
        winner_salt: winner.salt,
        winner_solution_hash: winner.solution_hash,
        winner_graffiti: winner.graffiti.clone(),
    };
    let epoch_data_leaf_bytes = encode_epoch_data_leaf(&epoch_data_fields, cfg.graffiti_length);
    let epoch_hash_value = epoch_hash(&epoch_data_leaf_bytes);

    let tree = build_epoch_tree(
        epoch_data_leaf_bytes,
        attestation_leaf_bytes,
        input.chain_id,
        input.protocol_id,
        input.generated_at,
    );

    let witness_attestations = aggregated
        .iter()
        .zip(tree.attestation_proofs.iter())
        .filter_map(|(leaf, proof)| leaf.witness_key.map(|key| (key, proof.proof.clone())))
        .collect();

    let record = EpochRecord {
        epoch_number: input.epoch_number,
        start_block: input.start_block,
        end_block: input.end_block,
        target: input.target,
        target_hash: target_hash_value,
        winner_public_key: winner.public_key,
        winner_matching_bits: winner.matching_bits as u16,
        winner_salt: winner.salt,
        winner_solution_hash: winner.solution_hash,
        winner_graffiti: winner.graffiti,
        epoch_root: Buf32::new(tree.root),
        epoch_hash: epoch_hash_value,
        epoch_data_proof: tree.epoch_data_proof,
    };

    FinalizeOutput { record, witness_attestations }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ancora_primitives::Buf64;

    #[test]
    fn finalizes_genesis_epoch_with_no_submissions() {
        let cfg = ConsensusConfig::default();
        let input = FinalizeInput {
            epoch_number: 0,
            start_block: 0,
            end_block: cfg.blocks_per_epoch - 1,
            target: Buf32::ZERO,
            checksum_root: Buf32::new([1u8; 32]),
            previous_epoch_hash: Buf32::ZERO,
            attested_epoch_number: 0,
            attested_checksum_root: Buf32::ZERO,
            submissions: vec![],
            witnesses: vec![],
            chain_id: 1,
            protocol_id: 1,
            generated_at: 1000,
        };
        let out = finalize_epoch(input, &cfg);
        assert_eq!(out.record.winner_public_key, cfg.genesis_proposer_public_key);
        assert_eq!(out.record.epoch_number, 0);
        assert!(out.witness_attestations.is_empty());
    }

    #[test]
    fn real_witnesses_get_attestation_proofs() {
        let cfg = ConsensusConfig::default();
        let witness = WitnessRecord {
            block_number: 5,
            checksum_root: Buf32::new([2u8; 32]),
            signature: Buf64::ZERO,
            timestamp: 10,
            public_key: Buf32::new([3u8; 32]),
            attestation_proof: None,
        };
        let input = FinalizeInput {
            epoch_number: 0,
            start_block: 0,
            end_block: 10,
            target: Buf32::ZERO,
            checksum_root: Buf32::new([1u8; 32]),
            previous_epoch_hash: Buf32::ZERO,
            attested_epoch_number: 0,
            attested_checksum_root: Buf32::ZERO,
            submissions: vec![],
            witnesses: vec![witness.clone()],
            chain_id: 1,
            protocol_id: 1,
            generated_at: 1,
        };
        let out = finalize_epoch(input, &cfg);
        assert_eq!(out.witness_attestations.len(), 1);
        assert_eq!(out.witness_attestations[0].0, (witness.block_number, witness.public_key));
    }
}
