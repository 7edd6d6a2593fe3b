//! Concurrency-safe seen-set
//!
//! Every record passes through `Deduplicator::try_mark` before it reaches the
//! buffer, so a resource is recorded at most once per run even when several
//! tasks discover it at the same moment.

use crate::url::DedupKey;
use dashmap::DashSet;

/// Set of dedup keys admitted so far in this run
#[derive(Debug, Default)]
pub struct Deduplicator {
    seen: DashSet<u64>,
}

impl Deduplicator {
    /// Creates an empty deduplicator
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the key if it is new
    ///
    /// # Returns
    ///
    /// * `true` - The key was absent and is now recorded; the caller owns it
    /// * `false` - The key was already present; nothing changed
    pub fn try_mark(&self, key: DedupKey) -> bool {
        // DashSet::insert checks and inserts under one shard lock
        self.seen.insert(key.value())
    }

    /// Returns true if the key has been admitted
    pub fn contains(&self, key: DedupKey) -> bool {
        self.seen.contains(&key.value())
    }

    /// Number of distinct keys admitted
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Returns true if no key has been admitted yet
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
