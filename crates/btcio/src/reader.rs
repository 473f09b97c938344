use ancora_primitives::{BlockHash, BlockHeight, Txid};
use async_trait::async_trait;

use crate::error::Result;
use crate::types::{BlockVerbosity, RawBlock, RawHeader, RawTransaction};

/// The base-chain RPC collaborator (spec.md §6). Every method can fail
/// transiently (timeout, node unreachable) or fatally (404, malformed
/// request); see [`crate::error::BtcioError::is_transient`]. The core never
/// talks to this trait directly — callers go through
/// [`crate::backoff::BackoffPolicy::retry`] so a flaky node degrades to
/// slower progress rather than spurious failures.
#[cfg_attr(any(test, feature = "test_utils"), mockall::automock)]
#[async_trait]
pub trait BaseChainReader: Send + Sync {
    async fn get_block_count(&self) -> Result<BlockHeight>;
    async fn get_block_hash(&self, height: BlockHeight) -> Result<BlockHash>;
    async fn get_block_header(&self, hash: BlockHash) -> Result<RawHeader>;
    async fn get_block(&self, hash: BlockHash, verbosity: BlockVerbosity) -> Result<RawBlock>;
    async fn get_raw_transaction(&self, txid: Txid) -> Result<RawTransaction>;
    async fn send_raw_transaction(&self, raw: RawTransaction) -> Result<Txid>;
}
