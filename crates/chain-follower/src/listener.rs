use ancora_primitives::{BlockHash, BlockHeight};

/// Notification delivered to subscribers on reorg recovery (spec.md §4.1):
/// rewind to `rewind_to + 1`, discarding state above `rewind_to`, with the
/// base chain's new best tip supplied for reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReorgEvent {
    pub rewind_to: BlockHeight,
    pub new_tip_height: BlockHeight,
    pub new_best_hash: BlockHash,
}
