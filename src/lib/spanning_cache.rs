//! Cross-partition fragment reconciliation.
//!
//! A fragment whose reads lie in more than one partition cannot be completed by a single
//! partition scan. The [`SpanningCache`] is shared by all workers:
//!
//! - A worker calls [`resolve`](SpanningCache::resolve) before scanning a partition and
//!   receives every cached fragment waiting for reads from it.
//! - After scanning, each fragment that is not complete and still expects reads from
//!   another partition is passed to [`register`](SpanningCache::register). If the cache
//!   already holds part of the same fragment the two are merged. A merge that completes
//!   the fragment, or leaves it expecting nothing from another partition, hands it back
//!   to the caller for emission.
//! - After all partitions, [`finalize`](SpanningCache::finalize) drains what is left.
//!
//! All state sits behind one mutex, so a fragment is held at most once and handed out
//! at most once.

use ahash::{AHashMap, AHashSet};
use parking_lot::Mutex;

use crate::fragment::Fragment;
use crate::partition::PartitionKey;

/// Counters describing cache traffic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpanningCacheCounters {
    /// Fragments stored by `register`.
    pub registered: u64,
    /// Fragments handed out by `resolve`.
    pub resolved: u64,
    /// Fragments completed or resolved by merging during `register`.
    pub merged: u64,
    /// Fragments drained by `finalize`.
    pub finalized: u64,
}

#[derive(Debug, Default)]
struct CacheState {
    fragments: AHashMap<String, Fragment>,
    waiting: AHashMap<PartitionKey, Vec<String>>,
    started: AHashSet<PartitionKey>,
    counters: SpanningCacheCounters,
}

impl CacheState {
    fn unindex(&mut self, fragment: &Fragment, partition_size: u32) {
        for key in fragment.remote_partitions(partition_size) {
            if let Some(ids) = self.waiting.get_mut(&key) {
                ids.retain(|id| id != fragment.id());
                if ids.is_empty() {
                    self.waiting.remove(&key);
                }
            }
        }
    }
}

/// Shared store of partially observed fragments.
#[derive(Debug)]
pub struct SpanningCache {
    partition_size: u32,
    state: Mutex<CacheState>,
}

impl SpanningCache {
    #[must_use]
    pub fn new(partition_size: u32) -> Self {
        Self { partition_size, state: Mutex::new(CacheState::default()) }
    }

    #[must_use]
    pub fn partition_size(&self) -> u32 {
        self.partition_size
    }

    /// Marks the partition started and removes every fragment waiting for it.
    pub fn resolve(&self, key: &PartitionKey) -> Vec<Fragment> {
        let mut state = self.state.lock();
        state.started.insert(key.clone());
        let Some(ids) = state.waiting.remove(key) else {
            return Vec::new();
        };

        let mut resolved = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(fragment) = state.fragments.remove(&id) {
                state.unindex(&fragment, self.partition_size);
                resolved.push(fragment);
            }
        }
        state.counters.resolved += resolved.len() as u64;
        resolved
    }

    /// Stores an incomplete fragment, merging it with any cached part of the same
    /// fragment. Returns the fragment if the merge completed it or left it expecting no
    /// reads from another partition.
    pub fn register(&self, fragment: Fragment) -> Option<Fragment> {
        let mut state = self.state.lock();

        let fragment = match state.fragments.remove(fragment.id()) {
            Some(mut cached) => {
                state.unindex(&cached, self.partition_size);
                cached.merge(fragment);
                if cached.is_complete() || cached.remote_partitions(self.partition_size).is_empty() {
                    state.counters.merged += 1;
                    return Some(cached);
                }
                cached
            }
            None => {
                if fragment.is_complete() {
                    return Some(fragment);
                }
                state.counters.registered += 1;
                fragment
            }
        };

        for key in fragment.remote_partitions(self.partition_size) {
            if !state.started.contains(&key) {
                state.waiting.entry(key).or_default().push(fragment.id().to_string());
            }
        }
        state.fragments.insert(fragment.id().to_string(), fragment);
        None
    }

    /// Number of cached fragments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().fragments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn counters(&self) -> SpanningCacheCounters {
        self.state.lock().counters
    }

    /// Drains every cached fragment. Fragments that were not provisionally resolved are
    /// marked incomplete. Output is ordered by fragment id.
    pub fn finalize(&self) -> Vec<Fragment> {
        let mut state = self.state.lock();
        state.waiting.clear();
        let mut fragments: Vec<Fragment> = state.fragments.drain().map(|(_, f)| f).collect();
        for fragment in &mut fragments {
            fragment.mark_incomplete();
        }
        fragments.sort_by(|a, b| a.id().cmp(b.id()));
        state.counters.finalized += fragments.len() as u64;
        fragments
    }
}
