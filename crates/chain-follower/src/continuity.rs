use ancora_checksum::verify_leaf;
use ancora_storage::HeaderRecord;

/// Rebuilds a block's six checksum leaf values, in the fixed order
/// `ancora_checksum` defines, from its stored header (spec.md §4.5). Every
/// block carries all six fields; genesis substitutes zero for the fields
/// that don't exist.
fn leaves_of(header: &HeaderRecord) -> [ancora_primitives::Buf32; ancora_checksum::LEAF_COUNT] {
    [
        *header.previous_block_hash.as_buf(),
        header.previous_block_checksum,
        *header.hash.as_buf(),
        header.merkle_root,
        header.state_root,
        header.receipt_root,
    ]
}

/// Re-verifies every stored checksum proof for `header` against its own
/// `checksum_root` (spec.md §4.1 continuity check, third bullet).
pub fn checksum_proofs_are_valid(header: &HeaderRecord) -> bool {
    if header.checksum_proofs.len() != ancora_checksum::LEAF_COUNT {
        return false;
    }
    let root = header.checksum_root.into_inner();
    leaves_of(header)
        .iter()
        .zip(header.checksum_proofs.iter())
        .all(|(value, proof)| verify_leaf(root, *value, proof))
}

/// Continuity check for an incoming block `candidate` at height `h`, given
/// the locally stored header at `h - 1` (spec.md §4.1):
///
/// - `candidate.previous_block_hash` equals the cached hash at `h - 1`;
/// - the cached `checksum_root` at `h - 1` equals
///   `candidate.previous_block_checksum`;
/// - the cached checksum proofs at `h - 1` re-verify under that root.
pub fn is_continuous(previous: &HeaderRecord, candidate: &HeaderRecord) -> bool {
    candidate.previous_block_hash == previous.hash
        && candidate.previous_block_checksum == previous.checksum_root
        && checksum_proofs_are_valid(previous)
}

#[cfg(test)]
mod tests {
    use ancora_checksum::{build_checksum_tree, ChecksumLeaves};
    use ancora_primitives::{BlockHash, Buf32};

    use super::*;

    fn header(height: u64, hash: u8) -> HeaderRecord {
        let leaves = ChecksumLeaves {
            previous_block_hash: Buf32::ZERO,
            previous_block_checksum: Buf32::ZERO,
            block_hash: Buf32::new([hash; 32]),
            block_merkle_root: Buf32::new([hash.wrapping_add(1); 32]),
            state_root: Buf32::new([hash.wrapping_add(2); 32]),
            receipt_root: Buf32::new([hash.wrapping_add(3); 32]),
        };
        let artifact = build_checksum_tree(leaves);
        HeaderRecord {
            height,
            hash: BlockHash::new(leaves.block_hash),
            previous_block_hash: BlockHash::ZERO,
            merkle_root: leaves.block_merkle_root,
            state_root: leaves.state_root,
            receipt_root: leaves.receipt_root,
            checksum_root: Buf32::from(artifact.root),
            previous_block_checksum: Buf32::ZERO,
            checksum_proofs: artifact.proofs.to_vec(),
        }
    }

    #[test]
    fn detects_continuity() {
        let prev = header(9, 1);
        let mut next = header(10, 2);
        next.previous_block_hash = prev.hash;
        next.previous_block_checksum = prev.checksum_root;
        assert!(is_continuous(&prev, &next));
    }

    #[test]
    fn rejects_mismatched_previous_hash() {
        let prev = header(9, 1);
        let mut next = header(10, 2);
        next.previous_block_checksum = prev.checksum_root;
        assert!(!is_continuous(&prev, &next));
    }

    #[test]
    fn rejects_tampered_checksum_proof() {
        let mut prev = header(9, 1);
        let mut next = header(10, 2);
        next.previous_block_hash = prev.hash;
        next.previous_block_checksum = prev.checksum_root;
        prev.checksum_proofs[0] = prev.checksum_proofs[1].clone();
        assert!(!is_continuous(&prev, &next));
    }
}
