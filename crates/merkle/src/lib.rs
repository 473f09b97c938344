//! Generic leaf-sorted binary Merkle tree.
//!
//! Both the per-block checksum tree (spec.md §4.5) and the per-epoch tree
//! (spec.md §4.8) are built the same way: leaves are hashed independently,
//! sorted by hash value so the resulting root is independent of leaf
//! insertion order, then combined pairwise up to a single root. Proofs are
//! the standard sibling-hash vector, with an explicit left/right flag per
//! step since sorting discards positional information.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub type Hash32 = [u8; 32];

fn sha256(parts: &[&[u8]]) -> Hash32 {
    let mut hasher = Sha256::new();
    for p in parts {
        hasher.update(p);
    }
    hasher.finalize().into()
}

/// Hashes a leaf's raw bytes into its tree-node value.
pub fn leaf_hash(bytes: &[u8]) -> Hash32 {
    sha256(&[bytes])
}

fn node_hash(left: &Hash32, right: &Hash32) -> Hash32 {
    sha256(&[left, right])
}

/// One step of a Merkle proof: the sibling hash, and whether that sibling
/// sits to the right of the node being proved at this layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct ProofStep {
    pub sibling: Hash32,
    pub sibling_is_right: bool,
}

/// A Merkle inclusion proof for a single leaf.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct MerkleProof {
    pub steps: Vec<ProofStep>,
}

impl MerkleProof {
    /// Reconstructs the root implied by `leaf_hash` and this proof.
    pub fn reconstruct_root(&self, leaf: Hash32) -> Hash32 {
        let mut acc = leaf;
        for step in &self.steps {
            acc = if step.sibling_is_right {
                node_hash(&acc, &step.sibling)
            } else {
                node_hash(&step.sibling, &acc)
            };
        }
        acc
    }
}

/// A leaf-sorted binary Merkle tree. Construction hashes every input leaf,
/// sorts the hashes, and retains a mapping from each input's original index
/// to its sorted position so callers (which usually want to prove a leaf by
/// its semantic index, e.g. "leaf 0 is the epoch-data leaf") can still
/// address it after sorting.
#[derive(Clone, Debug)]
pub struct MerkleTree {
    /// Layer 0: sorted leaf hashes. Each subsequent layer halves (rounding
    /// up, duplicating the final odd node) until a single root remains.
    layers: Vec<Vec<Hash32>>,
    /// `original_index_order[i]` is the original input index whose hash
    /// ended up at sorted position `i`.
    original_index_order: Vec<usize>,
}

impl MerkleTree {
    /// Builds a tree from raw leaf byte-strings. `leaves[i]` corresponds to
    /// semantic leaf index `i` before sorting.
    pub fn build(leaves: &[Vec<u8>]) -> Self {
        assert!(!leaves.is_empty(), "merkle tree requires at least one leaf");

        let mut hashed: Vec<(usize, Hash32)> =
            leaves.iter().enumerate().map(|(i, l)| (i, leaf_hash(l))).collect();
        hashed.sort_by(|a, b| a.1.cmp(&b.1));

        let original_index_order = hashed.iter().map(|(i, _)| *i).collect();
        let mut layer: Vec<Hash32> = hashed.into_iter().map(|(_, h)| h).collect();

        let mut layers = vec![layer.clone()];
        while layer.len() > 1 {
            let mut next = Vec::with_capacity(layer.len().div_ceil(2));
            let mut i = 0;
            while i < layer.len() {
                let left = layer[i];
                let right = if i + 1 < layer.len() { layer[i + 1] } else { layer[i] };
                next.push(node_hash(&left, &right));
                i += 2;
            }
            layers.push(next.clone());
            layer = next;
        }

        Self { layers, original_index_order }
    }

    pub fn root(&self) -> Hash32 {
        self.layers.last().expect("at least one layer")[0]
    }

    pub fn leaf_count(&self) -> usize {
        self.layers[0].len()
    }

    /// Tree height as `ceil(log2(leaf_count + 1))`, matching the epoch
    /// artifact's `tree_height` metadata field (spec.md §4.8).
    pub fn height(&self) -> u32 {
        let n = self.leaf_count() as u64 + 1;
        64 - (n - 1).leading_zeros()
    }

    fn sorted_position_of(&self, original_index: usize) -> usize {
        self.original_index_order
            .iter()
            .position(|&i| i == original_index)
            .expect("original_index out of range")
    }

    /// Produces a proof for the leaf that was passed in at `original_index`
    /// during [`MerkleTree::build`].
    pub fn prove(&self, original_index: usize) -> MerkleProof {
        let mut pos = self.sorted_position_of(original_index);
        let mut steps = Vec::with_capacity(self.layers.len() - 1);

        for layer in &self.layers[..self.layers.len() - 1] {
            let sibling_pos = if pos % 2 == 0 {
                let right = pos + 1;
                if right < layer.len() { right } else { pos }
            } else {
                pos - 1
            };
            let sibling = layer[sibling_pos];
            steps.push(ProofStep { sibling, sibling_is_right: pos % 2 == 0 });
            pos /= 2;
        }

        MerkleProof { steps }
    }

    /// Leaf hash at semantic `original_index`, useful for exporting proof
    /// artifacts alongside the proof itself.
    pub fn leaf_hash_at(&self, original_index: usize) -> Hash32 {
        let pos = self.sorted_position_of(original_index);
        self.layers[0][pos]
    }
}

/// Verifies a proof against a known root, given the original (unhashed)
/// leaf bytes.
pub fn verify(root: Hash32, leaf_bytes: &[u8], proof: &MerkleProof) -> bool {
    proof.reconstruct_root(leaf_hash(leaf_bytes)) == root
}
