//! Storage Events
//!
//! Optional observability side channel. Listeners are registered per event
//! kind; nothing in the storage path depends on whether any are present.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

// == Event Kind ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Set,
    Get,
    Delete,
    Clear,
    Error,
    Expired,
}

// == Storage Event ==
#[derive(Debug, Clone, PartialEq)]
pub enum StorageEvent {
    Set { key: String, ttl_ms: Option<u64> },
    Get { key: String, hit: bool },
    Delete { key: String, deleted: bool },
    Clear,
    Error {
        operation: &'static str,
        key: String,
        message: String,
    },
    Expired { key: String },
}

impl StorageEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            StorageEvent::Set { .. } => EventKind::Set,
            StorageEvent::Get { .. } => EventKind::Get,
            StorageEvent::Delete { .. } => EventKind::Delete,
            StorageEvent::Clear => EventKind::Clear,
            StorageEvent::Error { .. } => EventKind::Error,
            StorageEvent::Expired { .. } => EventKind::Expired,
        }
    }
}

type Listener = Arc<dyn Fn(&StorageEvent) + Send + Sync>;

// == Event Bus ==
/// Cloneable handle; clones share the same listener table.
#[derive(Clone, Default)]
pub struct EventBus {
    listeners: Arc<RwLock<HashMap<EventKind, Vec<Listener>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a callback for one kind of event.
    pub fn on<F>(&self, kind: EventKind, listener: F)
    where
        F: Fn(&StorageEvent) + Send + Sync + 'static,
    {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(kind)
            .or_default()
            .push(Arc::new(listener));
    }

    /// Removes every callback registered for `kind`.
    pub fn off(&self, kind: EventKind) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&kind);
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&kind)
            .map_or(0, Vec::len)
    }

    /// True if both handles share one listener table.
    pub fn same_bus(&self, other: &EventBus) -> bool {
        Arc::ptr_eq(&self.listeners, &other.listeners)
    }

    /// Delivers an event to its listeners.
    ///
    /// Callbacks run outside the table lock so they may register others.
    pub fn emit(&self, event: StorageEvent) {
        let targets: Vec<Listener> = match self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&event.kind())
        {
            Some(list) => list.clone(),
            None => return,
        };
        for listener in targets {
            listener(&event);
        }
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kinds = self
            .listeners
            .read()
            .map(|table| table.len())
            .unwrap_or_default();
        f.debug_struct("EventBus").field("kinds", &kinds).finish()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_listeners_receive_only_their_kind() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = seen.clone();
        bus.on(EventKind::Expired, move |event| sink.lock().unwrap().push(event.clone()));

        bus.emit(StorageEvent::Clear);
        bus.emit(StorageEvent::Expired { key: "a".into() });

        assert_eq!(
            *seen.lock().unwrap(),
            vec![StorageEvent::Expired { key: "a".into() }]
        );
    }

    #[test]
    fn test_clones_share_listeners() {
        let bus = EventBus::new();
        let clone = bus.clone();
        clone.on(EventKind::Set, |_| {});

        assert_eq!(bus.listener_count(EventKind::Set), 1);
        assert!(bus.same_bus(&clone));
        assert!(!bus.same_bus(&EventBus::new()));
        bus.off(EventKind::Set);
        assert_eq!(clone.listener_count(EventKind::Set), 0);
    }

    #[test]
    fn test_emit_without_listeners_is_noop() {
        EventBus::new().emit(StorageEvent::Get {
            key: "k".into(),
            hit: false,
        });
    }
}
