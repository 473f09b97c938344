//! Epoch manager (spec.md §4.7): target selection, PoW-style submission
//! validation, winner selection, attestation aggregation, and the
//! `OPEN -> CLOSING -> FROZEN -> PERSISTED` state machine.

mod aggregate;
mod error;
mod finalize;
mod state;
mod submission;

pub use aggregate::{aggregate_attestations, AggregatedLeaf};
pub use error::{EpochError, Result};
pub use finalize::{finalize_epoch, FinalizeInput, FinalizeOutput};
pub use state::{EpochPhase, EpochState};
pub use submission::{
    candidate_hash, select_winner, target_for_epoch, target_hash, validate_submission,
    SubmissionInput, ValidSubmission, Winner,
};
