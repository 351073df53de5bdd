//! Mini KV - An async key-value storage abstraction
//!
//! Provides a pluggable adapter contract, an in-memory engine with TTL
//! expiration, capacity limits and statistics, type-preserving codecs and a
//! namespacing facade.

pub mod adapter;
pub mod cache;
pub mod codec;
pub mod config;
pub mod error;
pub mod storage;
pub mod tasks;
pub mod value;

pub use adapter::{MemoryAdapter, StorageAdapter};
pub use cache::StoreStats;
pub use codec::{Codec, JsonCodec};
pub use config::{MemoryConfig, StorageOptions};
pub use error::{Result, StorageError};
pub use storage::{EventBus, EventKind, Storage, StorageEvent};
pub use value::Value;
