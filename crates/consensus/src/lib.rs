//! Consensus engine: wires the reorg watchdog, bulk-sync controller, block
//! processor, and epoch manager into one indexing node (spec.md §2, §5).
//!
//! Every collaborator boundary named in spec.md §6 — the base-chain RPC
//! client, the storage backend, and the WASM execution runtime — is an
//! external implementor of the traits re-exported from their owning
//! crates ([`ancora_btcio::BaseChainReader`], [`ancora_storage::Storage`],
//! [`ancora_exec::ContractRuntime`]); this crate adds the one remaining
//! seam, [`decode::BlockDecoder`], for turning raw base-chain bytes into
//! the decoded shapes the rest of the pipeline understands.

mod decode;
mod engine;
mod epoch_driver;
mod error;
mod ibd_pipeline;
mod input;
mod processor;

pub use decode::{BlockDecoder, DecodedHeaderFields};
pub use engine::Engine;
pub use epoch_driver::EpochDriver;
pub use error::{ConsensusError, Result};
pub use ibd_pipeline::IbdPipeline;
pub use input::{BlockInput, ContractCall, EpochSubmissionPayload, PreparedTx};
pub use processor::{build_header, BlockProcessor, ProcessedBlock, Receipt, ReceiptStatus};

#[cfg(any(test, feature = "test_utils"))]
pub use decode::test_utils::NullDecoder;
