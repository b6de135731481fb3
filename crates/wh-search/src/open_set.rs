//! Min-priority open set with decrease-key.
//!
//! # Why a lazy binary heap
//!
//! `std::collections::BinaryHeap` has no decrease-key.  Instead of an indexed
//! heap, a better key is simply pushed again and the node's *live* sequence
//! number is recorded in a side map.  When an entry is popped whose sequence
//! number is no longer the live one it is stale and skipped.
//!
//! Each decrease-key is one O(log n) push; each stale entry is popped and
//! discarded exactly once, so over a whole search the cost per operation is
//! amortized O(log n), the same bound an indexed heap or pairing heap gives,
//! with a smaller constant and no handle bookkeeping.
//!
//! # Ordering
//!
//! Lowest `f` first; ties go to the lower `h` (the entry closer to the goal),
//! then to the earlier insertion, so every search is deterministic.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::hash::Hash;

use ordered_float::OrderedFloat;
use rustc_hash::FxHashMap;

type Entry<N> = Reverse<(OrderedFloat<f64>, OrderedFloat<f64>, u64, N)>;

pub struct OpenSet<N> {
    heap: BinaryHeap<Entry<N>>,
    live: FxHashMap<N, u64>,
    seq:  u64,
}

impl<N: Copy + Eq + Hash + Ord> OpenSet<N> {
    pub fn new() -> Self {
        Self { heap: BinaryHeap::new(), live: FxHashMap::default(), seq: 0 }
    }

    /// Insert `node`, or lower its key if it is already queued.
    pub fn push(&mut self, node: N, f: f64, h: f64) {
        let seq = self.seq;
        self.seq += 1;
        self.live.insert(node, seq);
        self.heap.push(Reverse((OrderedFloat(f), OrderedFloat(h), seq, node)));
    }

    /// Remove and return the live entry with the lowest key, with its `f`.
    pub fn pop(&mut self) -> Option<(N, f64)> {
        while let Some(Reverse((f, _, seq, node))) = self.heap.pop() {
            if self.live.get(&node) == Some(&seq) {
                self.live.remove(&node);
                return Some((node, f.0));
            }
        }
        None
    }

    /// Lowest live `f`, dropping stale entries from the top on the way.
    pub fn peek_f(&mut self) -> Option<f64> {
        while let Some(&Reverse((f, _, seq, node))) = self.heap.peek() {
            if self.live.get(&node) == Some(&seq) {
                return Some(f.0);
            }
            self.heap.pop();
        }
        None
    }

    /// `true` if `node` has a live entry.
    #[inline]
    pub fn contains(&self, node: N) -> bool {
        self.live.contains_key(&node)
    }

    /// Number of live entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.live.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    pub fn clear(&mut self) {
        self.heap.clear();
        self.live.clear();
    }
}

impl<N: Copy + Eq + Hash + Ord> Default for OpenSet<N> {
    fn default() -> Self {
        Self::new()
    }
}
