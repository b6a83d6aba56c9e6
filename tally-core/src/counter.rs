//! Frequency counters and their top-K selection.
//!
//! Both counters rank entries the same way: count descending, then key ascending.  The
//! key's natural ordering is the tie-break, so the two strategies always agree on the
//! ranking even when counts collide.

use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap};
use std::hash::Hash;
use std::mem;

use crate::reduce::Merge;

/// A counter that can be merged and can select its own top-K.
pub trait Tally<K>: Merge + Default + Send {
    /// Adds `n` occurrences of `key`.  Adding zero is a no-op.
    fn add(&mut self, key: K, n: u64);

    /// Current count for `key`, zero when absent
    fn count(&self, key: &K) -> u64;

    /// Number of distinct keys
    fn len(&self) -> usize;

    /// Returns true if nothing has been counted
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Consumes the counter, returning at most `k` entries ordered by `rank_order`
    fn top_k(self, k: usize) -> Vec<(K, u64)>;
}

/// Ranking order shared by every counter: higher count first, smaller key on ties
pub fn rank_order<K: Ord>(a: &(K, u64), b: &(K, u64)) -> Ordering {
    b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0))
}

/// Plain mapping from key to count.  Top-K sorts the whole table.
pub type Counts<K> = HashMap<K, u64>;

impl <K: Hash + Eq> Merge for Counts<K> {
    fn merge(&mut self, mut other: Self) {
        // Fold the smaller table into the larger one
        if self.len() < other.len() {
            mem::swap(self, &mut other);
        }
        for (k, c) in other {
            *self.entry(k).or_insert(0) += c;
        }
    }
}

impl <K: Hash + Eq + Ord + Send> Tally<K> for Counts<K> {
    fn add(&mut self, key: K, n: u64) {
        if n > 0 {
            *self.entry(key).or_insert(0) += n;
        }
    }

    fn count(&self, key: &K) -> u64 {
        self.get(key).cloned().unwrap_or(0)
    }

    fn len(&self) -> usize {
        HashMap::len(self)
    }

    fn top_k(self, k: usize) -> Vec<(K, u64)> {
        let mut entries: Vec<_> = self.into_iter().collect();
        entries.sort_unstable_by(rank_order);
        entries.truncate(k);
        entries
    }
}

// Rebuild the heap once stale entries outnumber live keys by this factor
const COMPACT_FACTOR: usize = 8;
const COMPACT_MIN: usize = 1024;

/// Counter backed by a max-heap with lazy invalidation.
///
/// Every update pushes a fresh `(count, key)` entry and leaves the old one in place.  At
/// extraction time a popped entry is kept only if its count still matches the live count
/// for its key; stale entries are dropped without being re-inserted, since the entry for
/// the current count was already pushed when the count changed.
///
/// ```rust
/// use tally::counter::{HeapCounter, Tally};
///
/// let mut counter = HeapCounter::new();
/// counter.add("a", 1);
/// counter.add("b", 2);
/// counter.add("a", 2);
/// assert_eq!(counter.top_k(10), vec![("a", 3), ("b", 2)]);
/// ```
#[derive(Debug, Clone)]
pub struct HeapCounter<K: Hash + Eq + Ord> {
    counts: HashMap<K, u64>,
    heap: BinaryHeap<(u64, Reverse<K>)>
}

impl <K: Hash + Eq + Ord + Clone> HeapCounter<K> {

    /// Creates an empty counter
    pub fn new() -> Self {
        HeapCounter { counts: HashMap::new(), heap: BinaryHeap::new() }
    }

    /// Number of entries in the heap, live and stale
    pub fn heap_len(&self) -> usize {
        self.heap.len()
    }

    /// Drops every stale entry by rebuilding the heap from the live counts
    pub fn compact(&mut self) {
        trace!("Compacting heap: {} entries, {} keys", self.heap.len(), self.counts.len());
        self.heap = self.counts.iter()
            .map(|(k, c)| (*c, Reverse(k.clone())))
            .collect();
    }
}

impl <K: Hash + Eq + Ord + Clone> Default for HeapCounter<K> {
    fn default() -> Self {
        HeapCounter::new()
    }
}

impl <K: Hash + Eq + Ord + Clone + Send> Merge for HeapCounter<K> {
    fn merge(&mut self, mut other: Self) {
        if self.counts.len() < other.counts.len() {
            mem::swap(self, &mut other);
        }
        for (k, c) in other.counts {
            self.add(k, c);
        }
    }
}

impl <K: Hash + Eq + Ord + Clone + Send> Tally<K> for HeapCounter<K> {
    fn add(&mut self, key: K, n: u64) {
        if n == 0 {
            return;
        }
        let count = {
            let c = self.counts.entry(key.clone()).or_insert(0);
            *c += n;
            *c
        };
        self.heap.push((count, Reverse(key)));

        if self.heap.len() > COMPACT_MIN && self.heap.len() > COMPACT_FACTOR * self.counts.len() {
            self.compact();
        }
    }

    fn count(&self, key: &K) -> u64 {
        self.counts.get(key).cloned().unwrap_or(0)
    }

    fn len(&self) -> usize {
        self.counts.len()
    }

    fn top_k(mut self, k: usize) -> Vec<(K, u64)> {
        let mut top = Vec::with_capacity(k.min(self.counts.len()));
        while top.len() < k {
            let (count, Reverse(key)) = match self.heap.pop() {
                Some(entry) => entry,
                None => break
            };
            // Only the entry matching the live count is valid; taking the key out of the
            // table makes every older entry for it stale as well
            if self.counts.get(&key) == Some(&count) {
                self.counts.remove(&key);
                top.push((key, count));
            }
        }
        top
    }
}
