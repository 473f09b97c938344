use std::ops::RangeInclusive;

use ancora_primitives::BlockHeight;
use async_trait::async_trait;

/// The domain logic each bulk-sync phase drives (spec.md §4.2). Wire
/// decoding, checksum computation, transaction ordering and execution, and
/// epoch finalization are all owned elsewhere (`ancora-btcio`,
/// `ancora-checksum`, `ancora-txorder`, `ancora-exec`, `ancora-epoch`); this
/// crate only sequences, parallelizes, checkpoints, and resumes the phases
/// that drive them. A failure from any method is wrapped as
/// [`crate::error::BulkSyncError::Pipeline`].
#[cfg_attr(any(test, feature = "test_utils"), mockall::automock)]
#[async_trait]
pub trait SyncPipeline: Send + Sync {
    /// Fetches and persists headers for `range` (spec.md §4.2 phase 1).
    async fn download_headers(&self, range: RangeInclusive<BlockHeight>) -> Result<(), String>;

    /// Computes and persists the checksum tree for every block in `range`,
    /// called strictly in height order (spec.md §4.2 phase 2).
    async fn generate_checksums(&self, range: RangeInclusive<BlockHeight>) -> Result<(), String>;

    /// Downloads, classifies, orders, and persists transactions for `range`
    /// (spec.md §4.2 phase 3).
    async fn download_transactions(&self, range: RangeInclusive<BlockHeight>)
        -> Result<(), String>;

    /// Collects block-witness attestations over `range` (spec.md §4.2
    /// phase 4).
    async fn sync_witnesses(&self, range: RangeInclusive<BlockHeight>) -> Result<(), String>;

    /// Finalizes every epoch boundary crossed within `range` (spec.md §4.2
    /// phase 5).
    async fn finalize_epochs(&self, range: RangeInclusive<BlockHeight>) -> Result<(), String>;
}
