//! Storage Facade
//!
//! Namespaces keys, applies a default TTL, validates input and wraps
//! adapter failures before delegating to any `StorageAdapter`. Holds no
//! storage state of its own.

mod events;

pub use events::{EventBus, EventKind, StorageEvent};

use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::adapter::{MemoryAdapter, StorageAdapter};
use crate::config::{MemoryConfig, StorageOptions};
use crate::error::{Result, StorageError};
use crate::value::Value;

// == Storage ==
pub struct Storage {
    adapter: Arc<dyn StorageAdapter>,
    options: StorageOptions,
    events: EventBus,
}

impl Storage {
    // == Constructors ==
    pub fn new(adapter: Arc<dyn StorageAdapter>, options: StorageOptions) -> Self {
        Self::with_events(adapter, options, EventBus::new())
    }

    /// Uses an existing bus, typically one the adapter also reports to.
    pub fn with_events(
        adapter: Arc<dyn StorageAdapter>,
        options: StorageOptions,
        events: EventBus,
    ) -> Self {
        Self {
            adapter,
            options,
            events,
        }
    }

    /// Facade over a fresh `MemoryAdapter`; its expirations are forwarded
    /// with the caller's key.
    pub fn in_memory(config: MemoryConfig, options: StorageOptions) -> Result<Self> {
        let adapter_events = EventBus::new();
        let adapter = MemoryAdapter::builder()
            .config(config)
            .events(adapter_events.clone())
            .build()?;
        let storage = Self::new(Arc::new(adapter), options);
        storage.forward_expired(&adapter_events);
        Ok(storage)
    }

    /// Re-emits `Expired` events from an adapter's bus on this facade's bus,
    /// with the namespace stripped. Keys outside the namespace are dropped.
    ///
    /// A facade built `with_events` on the adapter's own bus already sees the
    /// stored keys, so forwarding from that bus is a no-op.
    pub fn forward_expired(&self, source: &EventBus) {
        if source.same_bus(&self.events) {
            debug!("adapter shares the facade bus, not forwarding expirations");
            return;
        }
        let target = self.events.clone();
        let prefix = self.prefixed("");
        source.on(EventKind::Expired, move |event| {
            let StorageEvent::Expired { key } = event else {
                return;
            };
            if let Some(plain) = key.strip_prefix(prefix.as_str()) {
                target.emit(StorageEvent::Expired {
                    key: plain.to_string(),
                });
            }
        });
    }

    pub fn adapter(&self) -> &Arc<dyn StorageAdapter> {
        &self.adapter
    }

    pub fn namespace(&self) -> &str {
        &self.options.namespace
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Registers an event listener.
    pub fn on<F>(&self, kind: EventKind, listener: F)
    where
        F: Fn(&StorageEvent) + Send + Sync + 'static,
    {
        self.events.on(kind, listener);
    }

    // == Get ==
    pub async fn get(&self, key: &str) -> Result<Option<Value>> {
        validate_key("get", key)?;
        let full = self.prefixed(key);
        match self.adapter.get(&full).await {
            Ok(value) => {
                self.events.emit(StorageEvent::Get {
                    key: key.to_string(),
                    hit: value.is_some(),
                });
                Ok(value)
            }
            Err(err) => self.fail("get", &full, err, None),
        }
    }

    /// Reads a value and converts it into `T` through JSON.
    pub async fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key).await? {
            Some(value) => serde_json::from_value(value.into_json())
                .map(Some)
                .map_err(|e| StorageError::codec("deserialize", e)),
            None => Ok(None),
        }
    }

    // == Set ==
    /// Stores a value. `ttl_ms` of None uses the facade default, `Some(0)`
    /// stores without expiration.
    pub async fn set(&self, key: &str, value: impl Into<Value>, ttl_ms: Option<u64>) -> Result<()> {
        validate_key("set", key)?;
        let value = value.into();
        let ttl = self.effective_ttl(ttl_ms);
        let full = self.prefixed(key);
        match self.adapter.set(&full, value, ttl).await {
            Ok(()) => {
                self.events.emit(StorageEvent::Set {
                    key: key.to_string(),
                    ttl_ms: ttl,
                });
                Ok(())
            }
            Err(err) => self.fail("set", &full, err, ()),
        }
    }

    /// Stores any serializable value as its JSON form.
    pub async fn set_json<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl_ms: Option<u64>,
    ) -> Result<()> {
        let json = serde_json::to_value(value).map_err(|e| StorageError::codec("serialize", e))?;
        self.set(key, Value::from(json), ttl_ms).await
    }

    // == Delete ==
    pub async fn delete(&self, key: &str) -> Result<bool> {
        validate_key("delete", key)?;
        let full = self.prefixed(key);
        match self.adapter.delete(&full).await {
            Ok(deleted) => {
                self.events.emit(StorageEvent::Delete {
                    key: key.to_string(),
                    deleted,
                });
                Ok(deleted)
            }
            Err(err) => self.fail("delete", &full, err, false),
        }
    }

    // == Has ==
    pub async fn has(&self, key: &str) -> Result<bool> {
        validate_key("has", key)?;
        let full = self.prefixed(key);
        match self.adapter.exists(&full).await {
            Ok(present) => Ok(present),
            Err(err) => self.fail("has", &full, err, false),
        }
    }

    // == Clear ==
    /// Clears the whole adapter; the contract has no per-namespace clear.
    pub async fn clear(&self) -> Result<()> {
        match self.adapter.clear().await {
            Ok(()) => {
                self.events.emit(StorageEvent::Clear);
                Ok(())
            }
            Err(err) => self.fail("clear", &format!("{}*", self.prefixed("")), err, ()),
        }
    }

    // == Batch Operations ==
    /// One result per key, in input order.
    pub async fn mget<K: AsRef<str>>(&self, keys: &[K]) -> Result<Vec<Option<Value>>> {
        let full = self.prefixed_batch("mget", keys)?;
        match self.adapter.mget(&full).await {
            Ok(values) => {
                for (key, value) in keys.iter().zip(&values) {
                    self.events.emit(StorageEvent::Get {
                        key: key.as_ref().to_string(),
                        hit: value.is_some(),
                    });
                }
                Ok(values)
            }
            Err(err) => self.fail("mget", &full.join(","), err, vec![None; keys.len()]),
        }
    }

    /// Sets entries in order; all keys are validated before anything is written.
    ///
    /// `Set` events are only emitted once the whole batch succeeds. A batch
    /// that fails partway emits a single `Error` event, even though the
    /// entries ahead of the failure stay stored.
    pub async fn mset<K, V, I>(&self, entries: I, ttl_ms: Option<u64>) -> Result<()>
    where
        K: AsRef<str>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        let entries: Vec<(K, V)> = entries.into_iter().collect();
        for (key, _) in &entries {
            validate_key("mset", key.as_ref())?;
        }

        let ttl = self.effective_ttl(ttl_ms);
        let plain: Vec<String> = entries.iter().map(|(k, _)| k.as_ref().to_string()).collect();
        let prefixed: Vec<(String, Value)> = entries
            .into_iter()
            .map(|(k, v)| (self.prefixed(k.as_ref()), v.into()))
            .collect();
        let joined = prefixed
            .iter()
            .map(|(k, _)| k.as_str())
            .collect::<Vec<_>>()
            .join(",");

        match self.adapter.mset(prefixed, ttl).await {
            Ok(()) => {
                for key in plain {
                    self.events.emit(StorageEvent::Set { key, ttl_ms: ttl });
                }
                Ok(())
            }
            Err(err) => self.fail("mset", &joined, err, ()),
        }
    }

    /// True if at least one key was removed.
    pub async fn delete_many<K: AsRef<str>>(&self, keys: &[K]) -> Result<bool> {
        let full = self.prefixed_batch("deleteMany", keys)?;
        match self.adapter.delete_many(&full).await {
            Ok(deleted) => {
                self.events.emit(StorageEvent::Delete {
                    key: keys
                        .iter()
                        .map(|k| k.as_ref())
                        .collect::<Vec<_>>()
                        .join(","),
                    deleted,
                });
                Ok(deleted)
            }
            Err(err) => self.fail("deleteMany", &full.join(","), err, false),
        }
    }

    pub async fn is_healthy(&self) -> bool {
        self.adapter.is_healthy().await
    }

    // == Helpers ==
    fn prefixed(&self, key: &str) -> String {
        if self.options.namespace.is_empty() {
            key.to_string()
        } else {
            format!("{}:{}", self.options.namespace, key)
        }
    }

    fn prefixed_batch<K: AsRef<str>>(&self, operation: &'static str, keys: &[K]) -> Result<Vec<String>> {
        keys.iter()
            .map(|key| {
                validate_key(operation, key.as_ref())?;
                Ok(self.prefixed(key.as_ref()))
            })
            .collect()
    }

    fn effective_ttl(&self, ttl_ms: Option<u64>) -> Option<u64> {
        ttl_ms.or(self.options.default_ttl)
    }

    /// Wraps an adapter failure, reports it, then fails or falls back.
    fn fail<T>(&self, operation: &'static str, key: &str, err: StorageError, fallback: T) -> Result<T> {
        let err = StorageError::wrap(operation, key, err);
        self.events.emit(StorageEvent::Error {
            operation,
            key: key.to_string(),
            message: err.to_string(),
        });

        if self.options.throw_on_errors {
            Err(err)
        } else {
            warn!(operation, key, error = %err, "storage operation failed");
            Ok(fallback)
        }
    }
}

fn validate_key(operation: &'static str, key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(StorageError::validation(operation, "key must be a non-empty string"));
    }
    Ok(())
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn storage(options: StorageOptions) -> Storage {
        Storage::in_memory(MemoryConfig::default().with_cleanup_interval(0), options).unwrap()
    }

    #[tokio::test]
    async fn test_keys_are_namespaced() {
        let store = storage(StorageOptions::new("users"));
        store.set("42", "alice", None).await.unwrap();

        assert_eq!(
            store.adapter().get("users:42").await.unwrap(),
            Some(Value::from("alice"))
        );
        assert_eq!(store.get("42").await.unwrap(), Some(Value::from("alice")));
    }

    #[tokio::test]
    async fn test_empty_namespace_disables_prefix() {
        let store = storage(StorageOptions::new(""));
        store.set("raw", 1, None).await.unwrap();

        assert!(store.adapter().exists("raw").await.unwrap());
    }

    #[tokio::test]
    async fn test_empty_key_is_rejected_before_storage() {
        let store = storage(StorageOptions::default());

        let err = store.set("", "v", None).await.unwrap_err();
        assert!(matches!(err, StorageError::Validation { operation: "set", .. }));

        let batch = store.mset([("ok", 1), ("", 2)], None).await;
        assert!(batch.is_err());
        assert!(!store.has("ok").await.unwrap(), "nothing is written when validation fails");

        assert!(store.mget(&["a", ""]).await.is_err());
        assert!(store.delete_many(&[""]).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_facade_default_ttl() {
        let store = storage(StorageOptions::new("s").with_default_ttl(100));
        store.set("short", "v", None).await.unwrap();
        store.set("pinned", "v", Some(0)).await.unwrap();

        tokio::time::advance(std::time::Duration::from_millis(150)).await;

        assert_eq!(store.get("short").await.unwrap(), None);
        assert_eq!(store.get("pinned").await.unwrap(), Some(Value::from("v")));
    }

    #[tokio::test]
    async fn test_capacity_error_is_wrapped_with_context() {
        let store = Storage::in_memory(
            MemoryConfig::default().with_cleanup_interval(0).with_max_keys(1),
            StorageOptions::new("ns"),
        )
        .unwrap();
        store.set("a", 1, None).await.unwrap();

        let err = store.set("b", 2, None).await.unwrap_err();
        assert!(err.is_capacity());
        assert!(err.to_string().starts_with("set failed for key 'ns:b'"));
    }

    #[tokio::test]
    async fn test_emit_instead_of_throw() {
        let store = Storage::in_memory(
            MemoryConfig::default().with_cleanup_interval(0).with_max_keys(1),
            StorageOptions::new("ns").with_throw_on_errors(false),
        )
        .unwrap();
        let errors = Arc::new(Mutex::new(Vec::new()));
        let sink = errors.clone();
        store.on(EventKind::Error, move |event| sink.lock().unwrap().push(event.clone()));

        store.set("a", 1, None).await.unwrap();
        store.set("b", 2, None).await.unwrap();

        let errors = errors.lock().unwrap();
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            &errors[0],
            StorageEvent::Error { operation: "set", key, .. } if key == "ns:b"
        ));
    }

    #[tokio::test]
    async fn test_operation_events() {
        let store = storage(StorageOptions::new("ev"));
        let seen = Arc::new(Mutex::new(Vec::new()));
        for kind in [EventKind::Set, EventKind::Get, EventKind::Delete, EventKind::Clear] {
            let sink = seen.clone();
            store.on(kind, move |event| sink.lock().unwrap().push(event.clone()));
        }

        store.set("k", "v", Some(5_000)).await.unwrap();
        store.get("k").await.unwrap();
        store.delete("k").await.unwrap();
        store.get("k").await.unwrap();
        store.clear().await.unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                StorageEvent::Set { key: "k".into(), ttl_ms: Some(5_000) },
                StorageEvent::Get { key: "k".into(), hit: true },
                StorageEvent::Delete { key: "k".into(), deleted: true },
                StorageEvent::Get { key: "k".into(), hit: false },
                StorageEvent::Clear,
            ]
        );
    }

    #[tokio::test]
    async fn test_partial_mset_emits_error_without_set_events() {
        let store = Storage::in_memory(
            MemoryConfig::default().with_cleanup_interval(0).with_max_keys(2),
            StorageOptions::new("m").with_throw_on_errors(false),
        )
        .unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        for kind in [EventKind::Set, EventKind::Error] {
            let sink = seen.clone();
            store.on(kind, move |event| sink.lock().unwrap().push(event.kind()));
        }

        store.mset([("a", 1), ("b", 2), ("c", 3)], None).await.unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![EventKind::Error]);
        assert!(store.has("a").await.unwrap());
        assert!(store.has("b").await.unwrap());
        assert!(!store.has("c").await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_events_carry_caller_key() {
        let store = storage(StorageOptions::new("sess"));
        let expired = Arc::new(Mutex::new(Vec::new()));
        let sink = expired.clone();
        store.on(EventKind::Expired, move |event| sink.lock().unwrap().push(event.clone()));

        store.set("token", "t", Some(50)).await.unwrap();
        tokio::time::advance(std::time::Duration::from_millis(60)).await;
        assert!(!store.has("token").await.unwrap());

        assert_eq!(
            *expired.lock().unwrap(),
            vec![StorageEvent::Expired { key: "token".into() }]
        );
    }

    #[test]
    fn test_forward_expired_filters_by_namespace() {
        let adapter_bus = EventBus::new();
        let store = Storage::new(
            Arc::new(MemoryAdapter::new(MemoryConfig::default().with_cleanup_interval(0)).unwrap()),
            StorageOptions::new("a"),
        );
        store.forward_expired(&adapter_bus);
        let expired = Arc::new(Mutex::new(Vec::new()));
        let sink = expired.clone();
        store.on(EventKind::Expired, move |event| sink.lock().unwrap().push(event.clone()));

        adapter_bus.emit(StorageEvent::Expired { key: "a:one".into() });
        adapter_bus.emit(StorageEvent::Expired { key: "b:two".into() });

        assert_eq!(
            *expired.lock().unwrap(),
            vec![StorageEvent::Expired { key: "one".into() }]
        );
    }

    #[test]
    fn test_forward_expired_from_own_bus_is_noop() {
        let bus = EventBus::new();
        let store = Storage::with_events(
            Arc::new(MemoryAdapter::new(MemoryConfig::default().with_cleanup_interval(0)).unwrap()),
            StorageOptions::new(""),
            bus.clone(),
        );
        store.forward_expired(&bus);
        assert_eq!(bus.listener_count(EventKind::Expired), 0);
    }

    #[tokio::test]
    async fn test_typed_helpers() {
        #[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
        struct Profile {
            name: String,
            tags: Vec<String>,
            avatar: Vec<u8>,
        }

        let store = storage(StorageOptions::default());
        let profile = Profile {
            name: "bo".into(),
            tags: vec!["a".into(), ":b".into()],
            avatar: vec![1, 2, 3],
        };
        store.set_json("p", &profile, None).await.unwrap();

        assert_eq!(store.get_as::<Profile>("p").await.unwrap(), Some(profile));
        assert_eq!(store.get_as::<Profile>("missing").await.unwrap(), None);
        assert!(store.get_as::<u32>("p").await.is_err());
    }

    #[tokio::test]
    async fn test_batch_helpers() {
        let store = storage(StorageOptions::new("b"));
        store.mset(vec![("x", 1), ("y", 2)], None).await.unwrap();

        let values = store.mget(&["y", "nope", "x"]).await.unwrap();
        assert_eq!(values, vec![Some(Value::from(2)), None, Some(Value::from(1))]);

        assert!(store.delete_many(&["x", "nope"]).await.unwrap());
        assert!(!store.delete_many(&["x"]).await.unwrap());
        assert!(store.is_healthy().await);
    }
}
