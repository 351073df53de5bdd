//! In-memory adapter
//!
//! Owns an `ExpiringStore` behind one exclusive lock, the codec used to
//! encode payloads, and the background sweep task.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Map;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::info;

use crate::adapter::StorageAdapter;
use crate::cache::{ExpiringStore, Lookup, StoreStats};
use crate::codec::{Codec, JsonCodec};
use crate::config::MemoryConfig;
use crate::error::{Result, StorageError};
use crate::storage::{EventBus, StorageEvent};
use crate::tasks::spawn_cleanup_task;
use crate::value::Value;

// == Builder ==
pub struct MemoryAdapterBuilder {
    name: String,
    config: MemoryConfig,
    codec: Arc<dyn Codec>,
    events: Option<EventBus>,
}

impl MemoryAdapterBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn config(mut self, config: MemoryConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the default type-preserving JSON codec.
    pub fn codec(mut self, codec: impl Codec + 'static) -> Self {
        self.codec = Arc::new(codec);
        self
    }

    /// Shares an event bus; expired keys are reported on it.
    pub fn events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    /// Builds the adapter, starting the sweep if an interval is configured.
    ///
    /// A non-zero cleanup interval needs a running tokio runtime.
    pub fn build(self) -> Result<MemoryAdapter> {
        let store = Arc::new(RwLock::new(ExpiringStore::new(
            self.config.max_keys,
            self.config.default_ttl,
        )));

        let sweeper = if self.config.cleanup_interval > 0 {
            tokio::runtime::Handle::try_current().map_err(|_| {
                StorageError::Config(
                    "cleanupInterval > 0 requires a running tokio runtime".to_string(),
                )
            })?;
            Some(spawn_cleanup_task(
                Arc::downgrade(&store),
                Duration::from_millis(self.config.cleanup_interval),
                self.events.clone(),
            ))
        } else {
            None
        };

        let mut introspect = match serde_json::to_value(&self.config) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => Map::new(),
        };
        introspect.insert("codec".to_string(), self.codec.name().into());

        Ok(MemoryAdapter {
            name: self.name,
            config: introspect,
            store,
            codec: self.codec,
            events: self.events,
            sweeper: Mutex::new(sweeper),
        })
    }
}

// == Memory Adapter ==
pub struct MemoryAdapter {
    name: String,
    config: Map<String, serde_json::Value>,
    store: Arc<RwLock<ExpiringStore>>,
    codec: Arc<dyn Codec>,
    events: Option<EventBus>,
    /// Sweep task; taken exactly once on teardown
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl MemoryAdapter {
    pub fn builder() -> MemoryAdapterBuilder {
        MemoryAdapterBuilder {
            name: "memory".to_string(),
            config: MemoryConfig::default(),
            codec: Arc::new(JsonCodec),
            events: None,
        }
    }

    /// Creates an adapter with the default codec.
    pub fn new(config: MemoryConfig) -> Result<Self> {
        Self::builder().config(config).build()
    }

    // == Active Sweep ==
    /// Removes every expired entry now; returns how many were removed.
    pub async fn cleanup(&self) -> usize {
        let removed = self.store.write().await.cleanup();
        let count = removed.len();
        self.report_expired(removed);
        count
    }

    // == Keys ==
    /// Live keys; sweeps first so expired keys never appear.
    pub async fn keys(&self) -> Vec<String> {
        let (live, expired) = self.store.write().await.keys();
        self.report_expired(expired);
        live
    }

    // == Stats ==
    pub async fn stats(&self) -> StoreStats {
        self.store.read().await.stats()
    }

    /// Remaining TTL of a live key; `Some(None)` if it never expires.
    pub async fn ttl(&self, key: &str) -> Option<Option<Duration>> {
        self.store.read().await.ttl_remaining(key)
    }

    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }

    /// True while the background sweep is running.
    pub fn is_sweeping(&self) -> bool {
        self.sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    // == Teardown ==
    /// Stops the sweep and releases all entries. Safe to call repeatedly.
    pub async fn destroy(&self) {
        self.stop_sweeper();
        self.store.write().await.release();
    }

    fn stop_sweeper(&self) {
        let handle = self
            .sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.abort();
            info!(adapter = %self.name, "TTL cleanup task stopped");
        }
    }

    fn report_expired(&self, keys: Vec<String>) {
        if let Some(bus) = &self.events {
            for key in keys {
                bus.emit(StorageEvent::Expired { key });
            }
        }
    }
}

impl Drop for MemoryAdapter {
    fn drop(&mut self) {
        self.stop_sweeper();
    }
}

impl fmt::Debug for MemoryAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryAdapter")
            .field("name", &self.name)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl StorageAdapter for MemoryAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn config(&self) -> &Map<String, serde_json::Value> {
        &self.config
    }

    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let lookup = self.store.write().await.get(key);
        match lookup {
            // The payload stays stored even if decoding fails
            Lookup::Hit(raw) => self.codec.deserialize(&raw).map(Some),
            Lookup::Expired => {
                self.report_expired(vec![key.to_string()]);
                Ok(None)
            }
            Lookup::Miss => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: Value, ttl_ms: Option<u64>) -> Result<()> {
        let raw = self.codec.serialize(&value)?;
        self.store.write().await.set(key, raw, ttl_ms)
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.store.write().await.delete(key))
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let lookup = self.store.write().await.probe(key);
        if lookup == Lookup::Expired {
            self.report_expired(vec![key.to_string()]);
        }
        Ok(matches!(lookup, Lookup::Hit(_)))
    }

    async fn clear(&self) -> Result<()> {
        self.store.write().await.clear();
        Ok(())
    }

    async fn is_healthy(&self) -> bool {
        true
    }
}
