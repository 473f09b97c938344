use arbitrary::Arbitrary;
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::buf::Buf32;

/// Height of a block on the base chain. Non-negative, strictly monotonic on
/// the canonical chain.
pub type BlockHeight = u64;

/// Epoch number. Epoch `N` spans `[N * K, N * K + K - 1]` for `K =
/// BLOCKS_PER_EPOCH`.
pub type EpochNumber = u64;

/// Base-chain block hash.
#[derive(
    Copy, Clone, PartialEq, Eq, Hash, Arbitrary, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub struct BlockHash(Buf32);

impl BlockHash {
    pub const ZERO: Self = Self(Buf32::ZERO);

    pub fn new(buf: Buf32) -> Self {
        Self(buf)
    }

    pub fn as_buf(&self) -> &Buf32 {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl std::fmt::Debug for BlockHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BlockHash({})", self.0)
    }
}

impl From<Buf32> for BlockHash {
    fn from(buf: Buf32) -> Self {
        Self(buf)
    }
}

/// Txid of a base-chain transaction.
#[derive(
    Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Arbitrary, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub struct Txid(Buf32);

impl Txid {
    pub fn new(buf: Buf32) -> Self {
        Self(buf)
    }

    pub fn as_buf(&self) -> &Buf32 {
        &self.0
    }
}

impl std::fmt::Debug for Txid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Txid({})", self.0)
    }
}

impl From<Buf32> for Txid {
    fn from(buf: Buf32) -> Self {
        Self(buf)
    }
}

/// A `(height, hash)` pointer into the base chain, analogous to the
/// teacher's `L1BlockCommitment`.
#[derive(Copy, Clone, PartialEq, Eq, Hash, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct BlockCommitment {
    height: BlockHeight,
    hash: BlockHash,
}

impl BlockCommitment {
    pub fn new(height: BlockHeight, hash: BlockHash) -> Self {
        Self { height, hash }
    }

    pub fn height(&self) -> BlockHeight {
        self.height
    }

    pub fn hash(&self) -> &BlockHash {
        &self.hash
    }
}

impl std::fmt::Debug for BlockCommitment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BlockCommitment(height={}, hash={:?})", self.height, self.hash)
    }
}

/// Deterministic contract address, derived from `(deployer, salt,
/// bytecode_hash)`.
pub type ContractAddress = crate::buf::Buf20;

/// A 256-bit storage pointer / value, as used by the contract execution
/// host's pointer storage.
pub type Word256 = [u8; 32];
