//! Storage collaborator boundary (spec.md §6).
//!
//! The rest of the engine is written against the [`Storage`] trait rather
//! than any concrete backend. [`InMemoryStorage`] is a reference
//! implementation for tests and local development; a deployment wires in a
//! real backend behind the same trait.

mod error;
mod memory;
mod traits;
mod types;

pub use error::{Result, StorageError};
pub use memory::InMemoryStorage;
pub use traits::Storage;
pub use types::{
    ContractRecord, EpochRecord, HeaderRecord, IbdCheckpoint, IbdPhase, PointerWrite,
    SubmissionRecord, TransactionRecord, TxInput, TxKind, TxOutput, WitnessRecord,
};

#[cfg(any(test, feature = "test_utils"))]
pub use traits::MockStorage;
