use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use ancora_primitives::{Buf32, Txid};
use ancora_storage::{TransactionRecord, TxKind};

use crate::error::{Result, TxOrderError};

#[derive(Clone, Copy)]
enum VisitState {
    Unvisited,
    Visiting,
    Done,
}

/// Max-heap key: `(effective_priority, priority_fee, indexing_hash)`, with
/// a *smaller* indexing hash sorting as the greater element so it pops
/// first among exact ties (spec.md §4.4 scenario S3).
#[derive(Eq, PartialEq)]
struct HeapKey {
    effective_priority: u64,
    priority_fee: u64,
    indexing_hash: Buf32,
    index: usize,
}

impl Ord for HeapKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.effective_priority
            .cmp(&other.effective_priority)
            .then(self.priority_fee.cmp(&other.priority_fee))
            .then(other.indexing_hash.cmp(&self.indexing_hash))
    }
}

impl PartialOrd for HeapKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn effective_priority(
    i: usize,
    txs: &[TransactionRecord],
    children: &[Vec<usize>],
    state: &mut [VisitState],
    memo: &mut [u64],
) -> u64 {
    match state[i] {
        VisitState::Done => return memo[i],
        // A back-edge into a node still on the stack: treat it as its own
        // priority rather than recursing again (spec.md §4.4 "cycles are
        // broken by treating the back-edge tx as its own self-priority").
        VisitState::Visiting => return txs[i].priority_fee,
        VisitState::Unvisited => {}
    }
    state[i] = VisitState::Visiting;
    let mut best = txs[i].priority_fee;
    for &c in &children[i] {
        best = best.max(effective_priority(c, txs, children, state, memo));
    }
    state[i] = VisitState::Done;
    memo[i] = best;
    best
}

/// Orders a block's transactions per spec.md §4.4: coinbase-like first in
/// original order, then every other transaction after its in-block
/// parents, maximizing aggregate priority, ties broken by
/// `(effective_priority, priority_fee, indexing_hash)`.
///
/// Transactions must already carry their classified `kind` (spec.md §4.3
/// step 3 runs before this step).
pub fn order_transactions(mut txs: Vec<TransactionRecord>) -> Result<Vec<TransactionRecord>> {
    let n = txs.len();
    let index_of: HashMap<Txid, usize> =
        txs.iter().enumerate().map(|(i, t)| (t.txid, i)).collect();
    let is_coinbase: Vec<bool> = txs.iter().map(|t| t.kind == TxKind::CoinbaseLike).collect();

    // Parent/child edges, restricted to the non-coinbase subgraph: coinbase
    // parents never block anything since coinbase-like txs are always
    // emitted first regardless of priority.
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut in_degree: Vec<u32> = vec![0; n];
    for (i, t) in txs.iter().enumerate() {
        if is_coinbase[i] {
            continue;
        }
        for input in &t.inputs {
            let Some(spent) = input.spent_txid else { continue };
            let Some(&parent) = index_of.get(&spent) else { continue };
            if is_coinbase[parent] {
                continue;
            }
            children[parent].push(i);
            in_degree[i] += 1;
        }
    }

    let mut state = vec![VisitState::Unvisited; n];
    let mut memo = vec![0u64; n];
    for i in 0..n {
        if !is_coinbase[i] {
            effective_priority(i, &txs, &children, &mut state, &mut memo);
        }
    }

    let mut heap = BinaryHeap::new();
    for i in 0..n {
        if !is_coinbase[i] && in_degree[i] == 0 {
            heap.push(HeapKey {
                effective_priority: memo[i],
                priority_fee: txs[i].priority_fee,
                indexing_hash: txs[i].indexing_hash,
                index: i,
            });
        }
    }

    let mut emitted = Vec::with_capacity(n);
    let mut done = vec![false; n];
    while let Some(top) = heap.pop() {
        let i = top.index;
        emitted.push(i);
        done[i] = true;
        for &c in &children[i] {
            in_degree[c] -= 1;
            if in_degree[c] == 0 {
                heap.push(HeapKey {
                    effective_priority: memo[c],
                    priority_fee: txs[c].priority_fee,
                    indexing_hash: txs[c].indexing_hash,
                    index: c,
                });
            }
        }
    }

    // Malformed input with cycles: whatever never reached zero in-degree
    // is appended, sorted by the same key.
    let mut leftover: Vec<usize> =
        (0..n).filter(|&i| !is_coinbase[i] && !done[i]).collect();
    leftover.sort_by(|&a, &b| {
        let ka = HeapKey {
            effective_priority: memo[a],
            priority_fee: txs[a].priority_fee,
            indexing_hash: txs[a].indexing_hash,
            index: a,
        };
        let kb = HeapKey {
            effective_priority: memo[b],
            priority_fee: txs[b].priority_fee,
            indexing_hash: txs[b].indexing_hash,
            index: b,
        };
        kb.cmp(&ka)
    });

    let mut final_order: Vec<usize> = (0..n).filter(|&i| is_coinbase[i]).collect();
    final_order.extend(emitted);
    final_order.extend(leftover);

    if final_order.len() != n {
        return Err(TxOrderError::OrderingCountMismatch { input: n, produced: final_order.len() });
    }

    let mut slots: Vec<Option<TransactionRecord>> =
        txs.drain(..).map(Some).collect();
    let mut out = Vec::with_capacity(n);
    for (new_index, original_index) in final_order.into_iter().enumerate() {
        let mut tx = slots[original_index].take().expect("each original index consumed once");
        tx.index = Some(new_index as u32);
        out.push(tx);
    }

    Ok(out)
}
