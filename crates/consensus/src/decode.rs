use ancora_btcio::{RawBlock, RawHeader};
use ancora_primitives::{BlockHash, Buf32};

use crate::error::Result;
use crate::input::PreparedTx;

/// Fields decoded from a raw header that the checksum pipeline doesn't
/// compute itself (spec.md §4.3, §4.5). `checksum_root`,
/// `previous_block_checksum`, and `checksum_proofs` are filled in later by
/// the checksum-generation phase, not by the decoder.
#[derive(Clone, Debug)]
pub struct DecodedHeaderFields {
    pub previous_block_hash: BlockHash,
    pub merkle_root: Buf32,
    pub state_root: Buf32,
    pub receipt_root: Buf32,
    pub median_time: u64,
}

/// Bridges the base-chain RPC collaborator's raw wire bytes
/// ([`ancora_btcio::RawHeader`]/[`ancora_btcio::RawBlock`]) to the decoded
/// shapes the block processor works with. Wire/protocol-envelope decoding
/// is out of scope for this codebase (spec.md §1 "Explicit non-goals"); this
/// trait is the seam an external decoder collaborator plugs into.
pub trait BlockDecoder: Send + Sync {
    fn decode_header(&self, raw: &RawHeader) -> Result<DecodedHeaderFields>;
    fn decode_transactions(&self, raw: &RawBlock) -> Result<Vec<PreparedTx>>;
}

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils {
    use super::*;

    /// A `BlockDecoder` for tests: every header decodes to all-zero state
    /// (besides `previous_block_hash`, which it reads back out of the raw
    /// bytes so continuity tests can thread a real chain), and every block
    /// decodes to no transactions.
    pub struct NullDecoder;

    impl BlockDecoder for NullDecoder {
        fn decode_header(&self, raw: &RawHeader) -> Result<DecodedHeaderFields> {
            let mut buf = [0u8; 32];
            let n = raw.0.len().min(32);
            buf[..n].copy_from_slice(&raw.0[..n]);
            Ok(DecodedHeaderFields {
                previous_block_hash: BlockHash::new(Buf32::new(buf)),
                merkle_root: Buf32::ZERO,
                state_root: Buf32::ZERO,
                receipt_root: Buf32::ZERO,
                median_time: 0,
            })
        }

        fn decode_transactions(&self, _raw: &RawBlock) -> Result<Vec<PreparedTx>> {
            Ok(Vec::new())
        }
    }
}
