//! Cache Entry Module
//!
//! Defines a stored payload together with its absolute expiry.

use std::time::Duration;

use tokio::time::Instant;

/// Fixed per-entry overhead used by the memory estimate
pub const ENTRY_OVERHEAD_BYTES: usize = 16;

// == Entry ==
/// A single encoded value and its optional deadline.
#[derive(Debug, Clone)]
pub struct Entry {
    /// Codec output, never inspected by the store
    pub value: String,
    /// Absolute expiry, None = never expires
    pub expires_at: Option<Instant>,
}

impl Entry {
    // == Constructor ==
    /// Creates an entry; a TTL of zero means no expiration.
    ///
    /// # Arguments
    /// * `value` - Encoded payload
    /// * `ttl_ms` - Effective TTL in milliseconds
    pub fn new(value: String, ttl_ms: u64) -> Self {
        let expires_at = (ttl_ms > 0).then(|| Instant::now() + Duration::from_millis(ttl_ms));
        Self { value, expires_at }
    }

    // == Is Expired ==
    /// An entry is expired once the current time reaches its deadline.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    /// Same as `is_expired` against a fixed instant, so a sweep uses one clock read.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(deadline) => now >= deadline,
            None => false,
        }
    }

    // == Time To Live ==
    /// Remaining lifetime, or None if the entry never expires.
    pub fn ttl_remaining(&self) -> Option<Duration> {
        self.expires_at
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    // == Memory Estimate ==
    /// Approximate footprint: two bytes per UTF-16 unit of key and value plus overhead.
    pub fn estimated_size(&self, key: &str) -> usize {
        (key.encode_utf16().count() + self.value.encode_utf16().count()) * 2 + ENTRY_OVERHEAD_BYTES
    }
}
