//! Expiring Store Module
//!
//! Synchronous storage engine: a HashMap of encoded payloads with TTL
//! expiration, a hard key cap and statistics. Callers that share it across
//! tasks wrap it in a single lock (see `MemoryAdapter`).

use std::collections::HashMap;

use tokio::time::Instant;
use tracing::debug;

use crate::cache::{Entry, StoreStats};
use crate::error::{Result, StorageError};

// == Lookup ==
/// Outcome of a read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// Live entry, with its encoded payload
    Hit(String),
    /// No entry for the key
    Miss,
    /// Entry had expired and was just removed
    Expired,
}

// == Expiring Store ==
#[derive(Debug)]
pub struct ExpiringStore {
    /// Key-value storage
    entries: HashMap<String, Entry>,
    /// Cumulative counters
    stats: StoreStats,
    /// Maximum number of distinct keys
    max_keys: usize,
    /// TTL in milliseconds applied when `set` gets none (0 = never expire)
    default_ttl: u64,
}

impl ExpiringStore {
    // == Constructor ==
    /// Creates an empty store.
    ///
    /// # Arguments
    /// * `max_keys` - Hard cap on distinct keys
    /// * `default_ttl` - Default TTL in milliseconds, 0 for none
    pub fn new(max_keys: usize, default_ttl: u64) -> Self {
        Self {
            entries: HashMap::new(),
            stats: StoreStats::new(),
            max_keys,
            default_ttl,
        }
    }

    // == Set ==
    /// Stores an encoded value, overwriting any previous entry for the key.
    ///
    /// An explicit TTL wins over the default; an effective TTL of 0 means the
    /// entry never expires. Capacity is only checked for keys not already
    /// present, so updates always succeed.
    pub fn set(&mut self, key: &str, value: String, ttl_ms: Option<u64>) -> Result<()> {
        if !self.entries.contains_key(key) && self.entries.len() >= self.max_keys {
            debug!(key, max_keys = self.max_keys, "rejecting insert, store is full");
            return Err(StorageError::CapacityExceeded {
                key: key.to_string(),
                max_keys: self.max_keys,
            });
        }

        let ttl = ttl_ms.unwrap_or(self.default_ttl);
        self.entries.insert(key.to_string(), Entry::new(value, ttl));
        self.stats.record_set();
        Ok(())
    }

    // == Get ==
    /// Reads the encoded value for a key, evicting it if it has expired.
    pub fn get(&mut self, key: &str) -> Lookup {
        let lookup = self.probe(key);
        match lookup {
            Lookup::Hit(_) => self.stats.record_hit(),
            Lookup::Miss | Lookup::Expired => self.stats.record_miss(),
        }
        lookup
    }

    // == Exists ==
    /// Expiry-checks a key like `get` without touching hit/miss counters.
    pub fn exists(&mut self, key: &str) -> bool {
        matches!(self.probe(key), Lookup::Hit(_))
    }

    /// Expiry-checked lookup that leaves hit/miss counters alone.
    pub(crate) fn probe(&mut self, key: &str) -> Lookup {
        match self.entries.get(key) {
            None => return Lookup::Miss,
            Some(entry) if !entry.is_expired() => return Lookup::Hit(entry.value.clone()),
            Some(_) => {}
        }

        self.entries.remove(key);
        self.stats.record_expired(1);
        debug!(key, "lazily evicted expired entry");
        Lookup::Expired
    }

    // == Delete ==
    /// Removes an entry; returns whether one existed.
    pub fn delete(&mut self, key: &str) -> bool {
        let removed = self.entries.remove(key).is_some();
        if removed {
            self.stats.record_delete();
        }
        removed
    }

    // == Clear ==
    /// Drops every entry and resets all counters.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.stats.reset();
    }

    // == Cleanup Expired ==
    /// Removes every expired entry and returns the removed keys.
    pub fn cleanup(&mut self) -> Vec<String> {
        let now = Instant::now();
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.entries.remove(key);
        }
        self.stats.record_expired(expired.len());
        expired
    }

    // == Keys ==
    /// Sweeps first so no expired key is ever listed.
    pub fn keys(&mut self) -> (Vec<String>, Vec<String>) {
        let expired = self.cleanup();
        let live = self.entries.keys().cloned().collect();
        (live, expired)
    }

    // == Stats ==
    /// Returns the counters with a fresh key count and memory estimate.
    pub fn stats(&self) -> StoreStats {
        let mut stats = self.stats.clone();
        let memory = self
            .entries
            .iter()
            .map(|(key, entry)| entry.estimated_size(key))
            .sum();
        stats.set_snapshot(self.entries.len(), memory);
        stats
    }

    /// Remaining TTL of a live key, `Some(None)` when it never expires.
    pub fn ttl_remaining(&self, key: &str) -> Option<Option<std::time::Duration>> {
        self.entries
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(Entry::ttl_remaining)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.max_keys
    }

    /// Drops all entries without resetting counters; used on teardown.
    pub(crate) fn release(&mut self) {
        self.entries = HashMap::new();
    }
}
