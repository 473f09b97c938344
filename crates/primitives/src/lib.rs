//! Shared hash and identifier primitives for the indexing and consensus
//! engine. Kept deliberately small: this crate has no knowledge of blocks,
//! transactions, or epochs beyond the identifiers used to name them.

mod buf;
mod ids;

pub use buf::{sha256_concat, Buf20, Buf32, Buf64};
pub use ids::{
    BlockCommitment, BlockHash, BlockHeight, ContractAddress, EpochNumber, Txid, Word256,
};
