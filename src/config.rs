//! Configuration Module
//!
//! Settings for the in-memory engine and the namespacing facade, with
//! environment variable loading.

use std::env;
use std::str::FromStr;

use serde::Serialize;

// == Memory Config ==
/// Settings for `MemoryAdapter`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryConfig {
    /// TTL in milliseconds applied when `set` gets none (0 = never expire)
    #[serde(rename = "defaultTTL")]
    pub default_ttl: u64,
    /// Maximum number of distinct keys
    pub max_keys: usize,
    /// Milliseconds between active sweeps (0 = lazy eviction only)
    pub cleanup_interval: u64,
}

impl MemoryConfig {
    /// Loads settings from environment variables.
    ///
    /// # Environment Variables
    /// - `MINI_KV_DEFAULT_TTL` - Default TTL in ms (default: 0)
    /// - `MINI_KV_MAX_KEYS` - Maximum keys (default: 10000)
    /// - `MINI_KV_CLEANUP_INTERVAL` - Sweep period in ms (default: 60000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            default_ttl: env_or("MINI_KV_DEFAULT_TTL", defaults.default_ttl),
            max_keys: env_or("MINI_KV_MAX_KEYS", defaults.max_keys),
            cleanup_interval: env_or("MINI_KV_CLEANUP_INTERVAL", defaults.cleanup_interval),
        }
    }

    pub fn with_default_ttl(mut self, ttl_ms: u64) -> Self {
        self.default_ttl = ttl_ms;
        self
    }

    pub fn with_max_keys(mut self, max_keys: usize) -> Self {
        self.max_keys = max_keys;
        self
    }

    pub fn with_cleanup_interval(mut self, interval_ms: u64) -> Self {
        self.cleanup_interval = interval_ms;
        self
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            default_ttl: 0,
            max_keys: 10_000,
            cleanup_interval: 60_000,
        }
    }
}

// == Storage Options ==
/// Settings for the `Storage` facade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageOptions {
    /// Prefix applied as `"{namespace}:{key}"`; empty disables prefixing
    pub namespace: String,
    /// TTL in ms used when a call omits one; None defers to the adapter
    pub default_ttl: Option<u64>,
    /// When false, adapter failures become `Error` events instead of errors
    pub throw_on_errors: bool,
}

impl StorageOptions {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            ..Self::default()
        }
    }

    /// Loads settings from environment variables.
    ///
    /// # Environment Variables
    /// - `MINI_KV_NAMESPACE` - Key prefix (default: "app")
    /// - `MINI_KV_NAMESPACE_TTL` - Facade default TTL in ms (default: unset)
    pub fn from_env() -> Self {
        Self {
            namespace: env::var("MINI_KV_NAMESPACE").unwrap_or_else(|_| "app".to_string()),
            default_ttl: env::var("MINI_KV_NAMESPACE_TTL")
                .ok()
                .and_then(|v| v.parse().ok()),
            throw_on_errors: true,
        }
    }

    pub fn with_default_ttl(mut self, ttl_ms: u64) -> Self {
        self.default_ttl = Some(ttl_ms);
        self
    }

    pub fn with_throw_on_errors(mut self, throw_on_errors: bool) -> Self {
        self.throw_on_errors = throw_on_errors;
        self
    }
}

impl Default for StorageOptions {
    fn default() -> Self {
        Self {
            namespace: "app".to_string(),
            default_ttl: None,
            throw_on_errors: true,
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_config_default() {
        let config = MemoryConfig::default();
        assert_eq!(config.default_ttl, 0);
        assert_eq!(config.max_keys, 10_000);
        assert_eq!(config.cleanup_interval, 60_000);
    }

    #[test]
    fn test_memory_config_from_env() {
        env::set_var("MINI_KV_MAX_KEYS", "42");
        env::set_var("MINI_KV_DEFAULT_TTL", "not-a-number");
        env::remove_var("MINI_KV_CLEANUP_INTERVAL");

        let config = MemoryConfig::from_env();
        assert_eq!(config.max_keys, 42);
        assert_eq!(config.default_ttl, 0);
        assert_eq!(config.cleanup_interval, 60_000);

        env::remove_var("MINI_KV_MAX_KEYS");
        env::remove_var("MINI_KV_DEFAULT_TTL");
    }

    #[test]
    fn test_memory_config_serializes_introspection_names() {
        let json = serde_json::to_value(MemoryConfig::default().with_default_ttl(5)).unwrap();
        assert_eq!(json["defaultTTL"], 5);
        assert_eq!(json["maxKeys"], 10_000);
        assert_eq!(json["cleanupInterval"], 60_000);
    }

    #[test]
    fn test_storage_options_builders() {
        let options = StorageOptions::new("users")
            .with_default_ttl(1_000)
            .with_throw_on_errors(false);
        assert_eq!(options.namespace, "users");
        assert_eq!(options.default_ttl, Some(1_000));
        assert!(!options.throw_on_errors);
    }
}
