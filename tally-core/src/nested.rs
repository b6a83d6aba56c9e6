use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::hash::Hash;
use std::marker::PhantomData;

use crate::counter::Tally;
use crate::reduce::Merge;

/// One row of a two-level ranking
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestedRank<K, U> {
    /// Outer key
    pub key: K,
    /// Total count for the outer key
    pub count: u64,
    /// Highest ranked inner key and its count, if the outer key has any
    pub top: Option<(U, u64)>
}

/// Two-level frequency table: a total per outer key plus a sub-counter of inner keys.
///
/// `T` counts outer keys and `S` counts inner keys within one outer key.  Every `add`
/// updates both levels by the same amount, so an outer total always equals the sum of
/// its sub-counter.
pub struct Nested<K, U, T, S> {
    totals: T,
    groups: HashMap<K, S>,
    inner: PhantomData<fn() -> U>
}

impl <K, U, T, S> Nested<K, U, T, S>
where
    K: Hash + Eq + Clone,
    T: Tally<K>,
    S: Tally<U>
{
    /// Creates an empty table
    pub fn new() -> Self {
        Nested { totals: T::default(), groups: HashMap::new(), inner: PhantomData }
    }

    /// Adds `n` occurrences of `sub` under `key`
    pub fn add(&mut self, key: K, sub: U, n: u64) {
        if n == 0 {
            return;
        }
        self.totals.add(key.clone(), n);
        self.groups.entry(key).or_insert_with(S::default).add(sub, n);
    }

    /// Total count for `key`
    pub fn count(&self, key: &K) -> u64 {
        self.totals.count(key)
    }

    /// Sub-counter for `key`
    pub fn group(&self, key: &K) -> Option<&S> {
        self.groups.get(key)
    }

    /// Number of distinct outer keys
    pub fn len(&self) -> usize {
        self.totals.len()
    }

    /// Returns true if nothing has been counted
    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    /// Selects the top `k` outer keys, then the top inner key of each selected key only.
    pub fn top_k(self, k: usize) -> Vec<NestedRank<K, U>> {
        let Nested { totals, mut groups, .. } = self;
        totals.top_k(k).into_iter()
            .map(|(key, count)| {
                let top = groups.remove(&key)
                    .and_then(|g| g.top_k(1).into_iter().next());
                NestedRank { key, count, top }
            })
            .collect()
    }
}

impl <K, U, T, S> Default for Nested<K, U, T, S>
where
    K: Hash + Eq + Clone,
    T: Tally<K>,
    S: Tally<U>
{
    fn default() -> Self {
        Nested::new()
    }
}

impl <K, U, T, S> Merge for Nested<K, U, T, S>
where
    K: Hash + Eq,
    T: Merge,
    S: Merge
{
    fn merge(&mut self, other: Self) {
        self.totals.merge(other.totals);
        for (key, group) in other.groups {
            match self.groups.entry(key) {
                Entry::Occupied(mut e) => e.get_mut().merge(group),
                Entry::Vacant(e) => {
                    e.insert(group);
                }
            }
        }
    }
}
