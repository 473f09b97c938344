use std::ops::RangeInclusive;

use ancora_params::Shutdown;
use ancora_primitives::BlockHeight;
use futures::stream::{FuturesUnordered, StreamExt};

use crate::error::{BulkSyncError, Result};

/// Splits `[start, end]` into consecutive batches of at most `batch_size`
/// heights each.
pub fn batches(
    start: BlockHeight,
    end: BlockHeight,
    batch_size: usize,
) -> Vec<RangeInclusive<BlockHeight>> {
    if start > end || batch_size == 0 {
        return Vec::new();
    }
    let mut out = Vec::new();
    let mut from = start;
    while from <= end {
        let to = from.saturating_add(batch_size as u64 - 1).min(end);
        out.push(from..=to);
        from = to + 1;
    }
    out
}

/// Runs `op` over every batch in `[start, end]`, at most `worker_count`
/// batches in flight at once (spec.md §4.2 "fan out ranges to W parallel
/// workers"). `on_batch_done` is called, in completion order, with each
/// batch's range right after it succeeds, so the caller can checkpoint
/// progress without waiting for the whole phase to finish. Stops launching
/// new batches once `shutdown` is triggered and returns
/// [`BulkSyncError::Cancelled`] after draining in-flight work.
pub async fn fan_out<F, Fut>(
    start: BlockHeight,
    end: BlockHeight,
    batch_size: usize,
    worker_count: usize,
    shutdown: &Shutdown,
    op: F,
    mut on_batch_done: impl FnMut(RangeInclusive<BlockHeight>),
) -> Result<()>
where
    F: Fn(RangeInclusive<BlockHeight>) -> Fut,
    Fut: std::future::Future<Output = Result<RangeInclusive<BlockHeight>>>,
{
    let worker_count = worker_count.max(1);
    let mut remaining = batches(start, end, batch_size).into_iter();
    let mut in_flight = FuturesUnordered::new();
    let mut cancelled = false;

    for _ in 0..worker_count {
        match remaining.next() {
            Some(range) if !shutdown.is_triggered() => in_flight.push(op(range)),
            _ => {
                cancelled = shutdown.is_triggered();
                break;
            }
        }
    }

    while let Some(result) = in_flight.next().await {
        on_batch_done(result?);
        if shutdown.is_triggered() {
            cancelled = true;
            continue;
        }
        if let Some(range) = remaining.next() {
            in_flight.push(op(range));
        }
    }

    if cancelled {
        return Err(BulkSyncError::Cancelled);
    }
    Ok(())
}

/// Merges an unordered, possibly-overlapping set of completed ranges into a
/// sorted, non-overlapping, non-adjacent set — so a resumed phase can tell
/// exactly which heights are already done.
pub(crate) fn merge_ranges(
    ranges: &[(BlockHeight, BlockHeight)],
) -> Vec<(BlockHeight, BlockHeight)> {
    let mut sorted = ranges.to_vec();
    sorted.sort_by_key(|r| r.0);
    let mut out: Vec<(BlockHeight, BlockHeight)> = Vec::new();
    for (start, end) in sorted {
        if let Some(last) = out.last_mut() {
            if start <= last.1.saturating_add(1) {
                last.1 = last.1.max(end);
                continue;
            }
        }
        out.push((start, end));
    }
    out
}

/// The highest height such that every height in `(floor, height]` is covered
/// by `merged` (a sorted, non-overlapping range set). Returns `floor`
/// unchanged if the range starting right after `floor` hasn't completed yet.
pub(crate) fn contiguous_prefix(
    merged: &[(BlockHeight, BlockHeight)],
    floor: BlockHeight,
) -> BlockHeight {
    match merged.first() {
        Some((start, end)) if *start == floor + 1 => *end,
        _ => floor,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    #[test]
    fn batches_cover_the_range_without_gaps() {
        let b = batches(0, 9, 3);
        assert_eq!(b, vec![0..=2, 3..=5, 6..=8, 9..=9]);
    }

    #[test]
    fn empty_range_yields_no_batches() {
        assert!(batches(5, 4, 10).is_empty());
    }

    #[tokio::test]
    async fn fan_out_visits_every_batch_exactly_once() {
        let shutdown = Shutdown::new();
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let done = Arc::new(std::sync::Mutex::new(Vec::new()));
        let done2 = done.clone();
        fan_out(
            0,
            19,
            5,
            2,
            &shutdown,
            {
                let seen = seen.clone();
                move |range| {
                    let seen = seen.clone();
                    async move {
                        seen.lock().unwrap().push(range.clone());
                        Ok(range)
                    }
                }
            },
            move |range| done2.lock().unwrap().push(range),
        )
        .await
        .unwrap();
        let mut got = seen.lock().unwrap().clone();
        got.sort_by_key(|r| *r.start());
        assert_eq!(got, vec![0..=4, 5..=9, 10..=14, 15..=19]);
        assert_eq!(done.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn fan_out_stops_launching_after_shutdown() {
        let shutdown = Shutdown::new();
        let launched = Arc::new(AtomicUsize::new(0));
        let launched2 = launched.clone();
        let shutdown2 = shutdown.clone();
        let result = fan_out(
            0,
            99,
            10,
            1,
            &shutdown,
            move |range| {
                launched2.fetch_add(1, Ordering::SeqCst);
                shutdown2.trigger();
                async move { Ok(range) }
            },
            |_| {},
        )
        .await;
        assert!(matches!(result, Err(BulkSyncError::Cancelled)));
        assert!(launched.load(Ordering::SeqCst) < 10);
    }

    #[test]
    fn merge_ranges_joins_overlaps_and_adjacency() {
        let merged = merge_ranges(&[(10, 14), (0, 4), (5, 9), (20, 24)]);
        assert_eq!(merged, vec![(0, 14), (20, 24)]);
    }

    #[test]
    fn contiguous_prefix_stops_at_the_first_gap() {
        let merged = merge_ranges(&[(0, 4), (10, 14)]);
        assert_eq!(contiguous_prefix(&merged, 0), 4);
        assert_eq!(contiguous_prefix(&merged, 4), 4);
        assert_eq!(contiguous_prefix(&merged, 9), 9);
    }

    #[tokio::test]
    async fn fan_out_propagates_pipeline_errors() {
        let shutdown = Shutdown::new();
        let result = fan_out(
            0,
            9,
            5,
            2,
            &shutdown,
            |_range| async { Err(BulkSyncError::Pipeline("boom".into())) },
            |_| {},
        )
        .await;
        assert!(matches!(result, Err(BulkSyncError::Pipeline(_))));
    }
}
