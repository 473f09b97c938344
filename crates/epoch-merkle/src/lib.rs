//! Epoch Merkle tree (spec.md §4.8): leaf 0 is the epoch-data leaf, leaves
//! 1..M are attestation leaves, built leaf-sorted like the per-block
//! checksum tree (`ancora_merkle`).

mod leaf;

pub use leaf::{
    empty_attestation_leaf, encode_attestation_leaf, encode_epoch_data_leaf,
    AttestationLeafFields, AttestationLeafType, EpochDataFields,
};

use ancora_merkle::{Hash32, MerkleProof, MerkleTree};
use ancora_primitives::Buf32;

/// Metadata shipped alongside an epoch's Merkle artifact.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EpochTreeMetadata {
    pub chain_id: u32,
    pub protocol_id: u32,
    pub tree_height: u32,
    pub leaf_count: usize,
    pub generated_at: u64,
}

#[derive(Clone, Debug)]
pub struct AttestationProof {
    pub index: usize,
    pub leaf_hash: Hash32,
    pub proof: MerkleProof,
}

#[derive(Clone, Debug)]
pub struct EpochTreeArtifact {
    pub root: Hash32,
    pub epoch_data_proof: MerkleProof,
    pub epoch_data_leaf_hash: Hash32,
    pub attestation_proofs: Vec<AttestationProof>,
    pub metadata: EpochTreeMetadata,
}

/// `epoch_hash = SHA-256(epoch_data_leaf_bytes)`, independent of
/// attestations (spec.md §4.8 invariant).
pub fn epoch_hash(epoch_data_leaf_bytes: &[u8]) -> Buf32 {
    Buf32::new(ancora_merkle::leaf_hash(epoch_data_leaf_bytes))
}

/// Builds the epoch tree from the already-encoded leaf 0 plus the
/// already-encoded attestation leaves (in collection order; sorting
/// happens inside the tree).
pub fn build_epoch_tree(
    epoch_data_leaf: Vec<u8>,
    attestation_leaves: Vec<Vec<u8>>,
    chain_id: u32,
    protocol_id: u32,
    generated_at: u64,
) -> EpochTreeArtifact {
    let mut leaves = Vec::with_capacity(1 + attestation_leaves.len());
    leaves.push(epoch_data_leaf);
    leaves.extend(attestation_leaves.iter().cloned());

    let tree = MerkleTree::build(&leaves);

    let attestation_proofs = (0..attestation_leaves.len())
        .map(|i| {
            let index = i + 1;
            AttestationProof { index, leaf_hash: tree.leaf_hash_at(index), proof: tree.prove(index) }
        })
        .collect();

    EpochTreeArtifact {
        root: tree.root(),
        epoch_data_proof: tree.prove(0),
        epoch_data_leaf_hash: tree.leaf_hash_at(0),
        attestation_proofs,
        metadata: EpochTreeMetadata {
            chain_id,
            protocol_id,
            tree_height: tree.height(),
            leaf_count: tree.leaf_count(),
            generated_at,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_hash_matches_tree_leaf_zero_hash() {
        let data_leaf = vec![1u8, 2, 3, 4];
        let attestations = vec![vec![9u8; 8], vec![8u8; 8]];
        let artifact = build_epoch_tree(data_leaf.clone(), attestations, 1, 1, 1000);
        assert_eq!(artifact.epoch_data_leaf_hash, epoch_hash(&data_leaf).into_inner());
    }

    #[test]
    fn all_proofs_verify_against_root() {
        let data_leaf = vec![1u8; 16];
        let attestations = vec![vec![2u8; 8], vec![3u8; 8], vec![4u8; 8]];
        let artifact = build_epoch_tree(data_leaf.clone(), attestations.clone(), 7, 9, 42);
        assert!(ancora_merkle::verify(artifact.root, &data_leaf, &artifact.epoch_data_proof));
        for (att, leaf_bytes) in artifact.attestation_proofs.iter().zip(attestations.iter()) {
            assert!(ancora_merkle::verify(artifact.root, leaf_bytes, &att.proof));
        }
    }

    #[test]
    fn tree_height_matches_leaf_count_formula() {
        let data_leaf = vec![0u8; 4];
        let attestations: Vec<Vec<u8>> = (0..5).map(|i| vec![i as u8; 4]).collect();
        let artifact = build_epoch_tree(data_leaf, attestations, 1, 1, 1);
        assert_eq!(artifact.metadata.leaf_count, 6);
        assert_eq!(artifact.metadata.tree_height, 3); // ceil(log2(7)) = 3
    }
}
