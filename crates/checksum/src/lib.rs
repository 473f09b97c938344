//! Per-block checksum Merkle tree (spec.md §4.5).
//!
//! Six fixed leaves, always in this order: previous-block-hash,
//! previous-block-checksum, block-hash, block-Merkle-root, state-root,
//! receipt-root. A missing field (e.g. the genesis block's previous-block
//! fields) is substituted with the all-zero 32-byte value rather than
//! omitted, so every block always has exactly six leaves.

use ancora_merkle::{verify, Hash32, MerkleProof, MerkleTree};
use ancora_primitives::Buf32;

pub const LEAF_COUNT: usize = 6;

pub const PREVIOUS_BLOCK_HASH: usize = 0;
pub const PREVIOUS_BLOCK_CHECKSUM: usize = 1;
pub const BLOCK_HASH: usize = 2;
pub const BLOCK_MERKLE_ROOT: usize = 3;
pub const STATE_ROOT: usize = 4;
pub const RECEIPT_ROOT: usize = 5;

/// The six 32-byte leaf values for one block's checksum tree, in leaf-index
/// order. Use [`Buf32::ZERO`] for a field that doesn't exist at this height.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChecksumLeaves {
    pub previous_block_hash: Buf32,
    pub previous_block_checksum: Buf32,
    pub block_hash: Buf32,
    pub block_merkle_root: Buf32,
    pub state_root: Buf32,
    pub receipt_root: Buf32,
}

impl ChecksumLeaves {
    fn as_array(&self) -> [Buf32; LEAF_COUNT] {
        [
            self.previous_block_hash,
            self.previous_block_checksum,
            self.block_hash,
            self.block_merkle_root,
            self.state_root,
            self.receipt_root,
        ]
    }
}

/// The built tree for one block: its root and a proof for every leaf,
/// stored alongside the header (spec.md §4.5).
#[derive(Clone, Debug)]
pub struct ChecksumArtifact {
    pub root: Hash32,
    pub proofs: [MerkleProof; LEAF_COUNT],
}

/// Builds the leaf-sorted checksum tree for one block.
pub fn build_checksum_tree(leaves: ChecksumLeaves) -> ChecksumArtifact {
    let raw: Vec<Vec<u8>> = leaves.as_array().iter().map(|b| b.as_slice().to_vec()).collect();
    let tree = MerkleTree::build(&raw);
    let proofs = std::array::from_fn(|i| tree.prove(i));
    ChecksumArtifact { root: tree.root(), proofs }
}

/// Verification contract (spec.md §4.5): does `proof` reconstruct
/// `checksum_root` from the 32-byte leaf `value`?
pub fn verify_leaf(checksum_root: Hash32, value: Buf32, proof: &MerkleProof) -> bool {
    verify(checksum_root, value.as_slice(), proof)
}
