//! Error types for the storage layer
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Storage Error Enum ==
/// Unified error type for every adapter, codec and facade operation.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Caller supplied input that can never succeed (empty key, bad batch)
    #[error("Invalid {operation} request: {message}")]
    Validation {
        operation: &'static str,
        message: String,
    },

    /// A new key was rejected because the store is full
    #[error("Capacity exceeded: cannot insert '{key}', store holds the maximum of {max_keys} keys")]
    CapacityExceeded { key: String, max_keys: usize },

    /// Serialization or deserialization failed
    #[error("Codec {operation} failed: {message}")]
    Codec {
        operation: &'static str,
        message: String,
    },

    /// Failure reported by a non-memory backend
    #[error("Backend error: {0}")]
    Backend(String),

    /// Invalid adapter or facade configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Adapter failure wrapped by the facade with its call context
    #[error("{operation} failed for key '{key}': {source}")]
    Operation {
        operation: &'static str,
        key: String,
        #[source]
        source: Box<StorageError>,
    },
}

impl StorageError {
    /// Builds a validation error for the given operation.
    pub fn validation(operation: &'static str, message: impl Into<String>) -> Self {
        StorageError::Validation {
            operation,
            message: message.into(),
        }
    }

    /// Builds a codec error, keeping the underlying message.
    pub fn codec(operation: &'static str, message: impl ToString) -> Self {
        StorageError::Codec {
            operation,
            message: message.to_string(),
        }
    }

    /// Wraps an adapter error with the facade operation and key.
    pub fn wrap(operation: &'static str, key: impl Into<String>, source: StorageError) -> Self {
        StorageError::Operation {
            operation,
            key: key.into(),
            source: Box::new(source),
        }
    }

    /// Returns the innermost error, skipping facade wrapping.
    pub fn root(&self) -> &StorageError {
        match self {
            StorageError::Operation { source, .. } => source.root(),
            other => other,
        }
    }

    /// True when the failure was a capacity rejection.
    pub fn is_capacity(&self) -> bool {
        matches!(self.root(), StorageError::CapacityExceeded { .. })
    }
}

// == Result Type Alias ==
/// Convenience Result type for the storage layer.
pub type Result<T> = std::result::Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrapped_message_carries_context() {
        let inner = StorageError::CapacityExceeded {
            key: "app:k".to_string(),
            max_keys: 2,
        };
        let err = StorageError::wrap("set", "app:k", inner);

        let message = err.to_string();
        assert!(message.starts_with("set failed for key 'app:k'"));
        assert!(message.contains("maximum of 2 keys"));
        assert!(err.is_capacity());
    }

    #[test]
    fn test_root_unwraps_nested_operations() {
        let err = StorageError::wrap(
            "mset",
            "a",
            StorageError::wrap("set", "a", StorageError::Backend("down".into())),
        );
        assert!(matches!(err.root(), StorageError::Backend(msg) if msg == "down"));
        assert!(!err.is_capacity());
    }
}
