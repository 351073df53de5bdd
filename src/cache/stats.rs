//! Cache Statistics Module
//!
//! Tracks hits, misses, writes, deletes and expirations.

use serde::Serialize;

// == Store Stats ==
/// Counters since creation or the last `clear`, plus live snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    /// Successful reads
    pub hits: u64,
    /// Reads that found nothing or an expired entry
    pub misses: u64,
    /// Successful writes
    pub sets: u64,
    /// Deletes that removed an entry
    pub deletes: u64,
    /// Entries removed because their TTL elapsed
    pub expired: u64,
    /// Live entry count at snapshot time
    pub keys: usize,
    /// Estimated memory held by entries at snapshot time
    pub memory_bytes: usize,
}

impl StoreStats {
    // == Constructor ==
    /// Creates a new StoreStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no reads have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_set(&mut self) {
        self.sets += 1;
    }

    pub fn record_delete(&mut self) {
        self.deletes += 1;
    }

    pub fn record_expired(&mut self, count: usize) {
        self.expired += count as u64;
    }

    // == Snapshot ==
    /// Fills in the recomputed, non-cumulative fields.
    pub fn set_snapshot(&mut self, keys: usize, memory_bytes: usize) {
        self.keys = keys;
        self.memory_bytes = memory_bytes;
    }

    // == Reset ==
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
