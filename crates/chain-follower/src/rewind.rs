use ancora_btcio::BaseChainReader;
use ancora_primitives::BlockHeight;
use ancora_storage::Storage;

use crate::continuity::checksum_proofs_are_valid;
use crate::error::{ChainFollowerError, Result};

/// Safe-rewind (spec.md §4.1): starting from `from_height` (the height just
/// below the block that failed continuity), walk downward comparing the
/// locally stored header hash with the base chain's hash at that height.
/// The first equal hash is the fork-point *candidate*; from there downward,
/// the stored checksum proofs must also re-verify. The first height
/// satisfying both is the definitive rewind target.
pub async fn safe_rewind<R: BaseChainReader + ?Sized>(
    storage: &dyn Storage,
    reader: &R,
    from_height: BlockHeight,
) -> Result<BlockHeight> {
    let mut height = from_height;
    loop {
        let stored = storage
            .get_header(height)?
            .ok_or(ChainFollowerError::MissingStoredHeader { height })?;
        let base_hash = reader.get_block_hash(height).await?;

        if stored.hash == base_hash && checksum_proofs_are_valid(&stored) {
            return Ok(height);
        }

        if height == 0 {
            return Err(ChainFollowerError::NoForkPointFound);
        }
        height -= 1;
    }
}

#[cfg(test)]
mod tests {
    use ancora_btcio::MockBaseChainReader;
    use ancora_checksum::{build_checksum_tree, ChecksumLeaves};
    use ancora_primitives::{BlockHash, Buf32};
    use ancora_storage::{HeaderRecord, InMemoryStorage};

    use super::*;

    fn header(height: u64, tag: u8) -> HeaderRecord {
        let leaves = ChecksumLeaves {
            previous_block_hash: Buf32::ZERO,
            previous_block_checksum: Buf32::ZERO,
            block_hash: Buf32::new([tag; 32]),
            block_merkle_root: Buf32::new([tag; 32]),
            state_root: Buf32::new([tag; 32]),
            receipt_root: Buf32::new([tag; 32]),
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

    #[tokio::test]
    async fn finds_fork_point_below_divergence() {
        let storage = InMemoryStorage::new();
        for h in 0..=10u64 {
            storage.put_header(header(h, h as u8)).unwrap();
        }
        let mut reader = MockBaseChainReader::new();
        reader.expect_get_block_hash().returning(|h| {
            // Base chain agrees up to height 7, diverges at 8..=10.
            let tag = if h <= 7 { h as u8 } else { h as u8 + 100 };
            Ok(BlockHash::new(Buf32::new([tag; 32])))
        });

        let target = safe_rewind(&storage, &reader, 10).await.unwrap();
        assert_eq!(target, 7);
    }

    #[tokio::test]
    async fn fatal_when_stored_header_missing() {
        let storage = InMemoryStorage::new();
        let mut reader = MockBaseChainReader::new();
        reader.expect_get_block_hash().returning(|h| Ok(BlockHash::new(Buf32::new([h as u8; 32]))));
        let err = safe_rewind(&storage, &reader, 5).await.unwrap_err();
        assert!(matches!(err, ChainFollowerError::MissingStoredHeader { height: 5 }));
    }

    #[tokio::test]
    async fn no_fork_point_down_to_genesis_is_an_error() {
        let storage = InMemoryStorage::new();
        storage.put_header(header(0, 0)).unwrap();
        let mut reader = MockBaseChainReader::new();
        reader.expect_get_block_hash().returning(|_| Ok(BlockHash::new(Buf32::new([255u8; 32]))));
        let err = safe_rewind(&storage, &reader, 0).await.unwrap_err();
        assert!(matches!(err, ChainFollowerError::NoForkPointFound));
    }
}
