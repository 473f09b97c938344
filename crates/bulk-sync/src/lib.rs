mod controller;
mod error;
mod pipeline;
mod worker;

pub use ancora_storage::{IbdCheckpoint, IbdPhase};
pub use controller::BulkSyncController;
pub use error::{BulkSyncError, Result};
pub use pipeline::SyncPipeline;
#[cfg(any(test, feature = "test_utils"))]
pub use pipeline::MockSyncPipeline;
pub use worker::{batches, fan_out};
