//! Codec Module
//!
//! Converts values to and from the string payloads held by the store.
//! The store only ever sees `Arc<dyn Codec>`, so any pair below is
//! swappable without touching store logic.

mod json;
mod plain;

pub use json::{JsonCodec, BASE64_MARKER, MARKER};
pub use plain::{FnCodec, IdentityCodec, PlainJsonCodec};

use crate::error::{Result, StorageError};
use crate::value::Value;

/// Deepest array/object nesting the JSON codecs accept, kept under the
/// recursion limit serde_json enforces when parsing.
pub const MAX_NESTING_DEPTH: usize = 120;

// == Codec Trait ==
/// A serialize/deserialize pair.
pub trait Codec: Send + Sync {
    /// Short identifier shown in adapter configuration
    fn name(&self) -> &str;

    /// Encodes a value into its stored string form.
    fn serialize(&self, value: &Value) -> Result<String>;

    /// Decodes a stored string back into a value.
    fn deserialize(&self, raw: &str) -> Result<Value>;
}

/// Rejects values the JSON codecs could write but never parse back.
pub(crate) fn check_depth(value: &Value) -> Result<()> {
    let depth = value.depth();
    if depth > MAX_NESTING_DEPTH {
        return Err(StorageError::codec(
            "serialize",
            format!("nesting depth {} exceeds the maximum of {}", depth, MAX_NESTING_DEPTH),
        ));
    }
    Ok(())
}
