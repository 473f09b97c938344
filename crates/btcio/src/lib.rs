//! Base-chain RPC collaborator boundary (spec.md §6).
//!
//! Wire encoding, transport, and the node process itself are out of scope
//! (spec.md §1); this crate only defines the trait the rest of the engine
//! is written against, the error classification that drives retries, and
//! the shared back-off policy.

mod backoff;
mod error;
mod reader;
mod types;

pub use backoff::BackoffPolicy;
pub use error::{BtcioError, Result};
pub use reader::BaseChainReader;
pub use types::{BlockVerbosity, RawBlock, RawHeader, RawTransaction};

#[cfg(any(test, feature = "test_utils"))]
pub use reader::MockBaseChainReader;
