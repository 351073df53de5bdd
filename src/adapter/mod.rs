//! Storage Adapter Module
//!
//! The contract every backend implements. The facade and callers only see
//! `dyn StorageAdapter`, so an in-memory, networked or file-based backend
//! can be swapped in without changes elsewhere.

mod memory;

pub use memory::{MemoryAdapter, MemoryAdapterBuilder};

use async_trait::async_trait;
use serde_json::Map;

use crate::error::Result;
use crate::value::Value;

// == Storage Adapter ==
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    /// Backend identity, for introspection only
    fn name(&self) -> &str;

    /// Backend configuration, for introspection only
    fn config(&self) -> &Map<String, serde_json::Value>;

    /// Returns the value if present and not expired.
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Stores a value, overwriting any previous one.
    ///
    /// `ttl_ms` of `None` uses the backend default; `Some(0)` never expires.
    async fn set(&self, key: &str, value: Value, ttl_ms: Option<u64>) -> Result<()>;

    /// Returns true if an entry existed and was removed.
    async fn delete(&self, key: &str) -> Result<bool>;

    async fn exists(&self, key: &str) -> Result<bool>;

    async fn clear(&self) -> Result<()>;

    /// One result per key, in input order.
    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<Value>>> {
        let mut values = Vec::with_capacity(keys.len());
        for key in keys {
            values.push(self.get(key).await?);
        }
        Ok(values)
    }

    /// Sets entries in order. Stops at the first failure; earlier writes stay.
    async fn mset(&self, entries: Vec<(String, Value)>, ttl_ms: Option<u64>) -> Result<()> {
        for (key, value) in entries {
            self.set(&key, value, ttl_ms).await?;
        }
        Ok(())
    }

    /// Deletes every key; true if at least one was removed.
    async fn delete_many(&self, keys: &[String]) -> Result<bool> {
        let mut any_deleted = false;
        for key in keys {
            any_deleted |= self.delete(key).await?;
        }
        Ok(any_deleted)
    }

    /// Cheap liveness probe.
    async fn is_healthy(&self) -> bool;
}
