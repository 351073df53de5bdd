//! Codecs without type preservation
//!
//! - `PlainJsonCodec`: plain JSON; bytes degrade to a base64 string
//! - `IdentityCodec`: strings stored as-is, anything else rejected
//! - `FnCodec`: a caller-supplied pair of functions

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::codec::{check_depth, Codec};
use crate::error::{Result, StorageError};
use crate::value::{timestamp_to_plain, Value};

// == Plain Json Codec ==
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainJsonCodec;

impl Codec for PlainJsonCodec {
    fn name(&self) -> &str {
        "plain-json"
    }

    fn serialize(&self, value: &Value) -> Result<String> {
        check_depth(value)?;
        serde_json::to_string(&to_plain(value)).map_err(|e| StorageError::codec("serialize", e))
    }

    fn deserialize(&self, raw: &str) -> Result<Value> {
        serde_json::from_str::<serde_json::Value>(raw)
            .map(Value::from)
            .map_err(|e| StorageError::codec("deserialize", e))
    }
}

fn to_plain(value: &Value) -> serde_json::Value {
    match value {
        Value::Bytes(b) => serde_json::Value::String(STANDARD.encode(b)),
        Value::Timestamp(t) => serde_json::Value::String(timestamp_to_plain(t)),
        Value::Array(items) => serde_json::Value::Array(items.iter().map(to_plain).collect()),
        Value::Object(map) => serde_json::Value::Object(
            map.iter().map(|(k, v)| (k.clone(), to_plain(v))).collect(),
        ),
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Number(n) => serde_json::Value::Number(n.clone()),
        Value::String(s) => serde_json::Value::String(s.clone()),
    }
}

// == Identity Codec ==
/// Pass-through codec for string-only workloads.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityCodec;

impl Codec for IdentityCodec {
    fn name(&self) -> &str {
        "identity"
    }

    fn serialize(&self, value: &Value) -> Result<String> {
        match value {
            Value::String(s) => Ok(s.clone()),
            other => Err(StorageError::codec(
                "serialize",
                format!("identity codec only stores strings, got {}", kind_of(other)),
            )),
        }
    }

    fn deserialize(&self, raw: &str) -> Result<Value> {
        Ok(Value::String(raw.to_string()))
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Bytes(_) => "bytes",
        Value::Timestamp(_) => "timestamp",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// == Fn Codec ==
type SerializeFn = Box<dyn Fn(&Value) -> Result<String> + Send + Sync>;
type DeserializeFn = Box<dyn Fn(&str) -> Result<Value> + Send + Sync>;

/// Codec built from two closures.
pub struct FnCodec {
    name: String,
    serialize: SerializeFn,
    deserialize: DeserializeFn,
}

impl FnCodec {
    pub fn new<S, D>(name: impl Into<String>, serialize: S, deserialize: D) -> Self
    where
        S: Fn(&Value) -> Result<String> + Send + Sync + 'static,
        D: Fn(&str) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            serialize: Box::new(serialize),
            deserialize: Box::new(deserialize),
        }
    }
}

impl fmt::Debug for FnCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnCodec").field("name", &self.name).finish()
    }
}

impl Codec for FnCodec {
    fn name(&self) -> &str {
        &self.name
    }

    fn serialize(&self, value: &Value) -> Result<String> {
        (self.serialize)(value)
    }

    fn deserialize(&self, raw: &str) -> Result<Value> {
        (self.deserialize)(raw)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_json_loses_byte_type() {
        let raw = PlainJsonCodec.serialize(&Value::from(vec![0u8, 1, 255, 254])).unwrap();
        assert_eq!(raw, r#""AAH//g==""#);
        assert_eq!(PlainJsonCodec.deserialize(&raw).unwrap(), Value::from("AAH//g=="));
    }

    #[test]
    fn test_plain_json_does_not_escape_marker() {
        let raw = PlainJsonCodec.serialize(&Value::from(":x")).unwrap();
        assert_eq!(raw, r#"":x""#);
        let value = Value::from(json!({"a": [1, 2]}));
        assert_eq!(
            PlainJsonCodec.deserialize(&PlainJsonCodec.serialize(&value).unwrap()).unwrap(),
            value
        );
    }

    #[test]
    fn test_identity_passes_strings_through() {
        assert_eq!(IdentityCodec.serialize(&Value::from("{raw}")).unwrap(), "{raw}");
        assert_eq!(IdentityCodec.deserialize("{raw}").unwrap(), Value::from("{raw}"));
    }

    #[test]
    fn test_identity_rejects_non_strings() {
        let err = IdentityCodec.serialize(&Value::from(5)).unwrap_err();
        assert!(err.to_string().contains("got number"));
    }

    #[test]
    fn test_fn_codec_uses_closures() {
        let codec = FnCodec::new(
            "upper",
            |v: &Value| Ok(v.as_str().unwrap_or_default().to_uppercase()),
            |raw: &str| Ok(Value::from(raw.to_lowercase())),
        );
        assert_eq!(codec.name(), "upper");
        assert_eq!(codec.serialize(&Value::from("abc")).unwrap(), "ABC");
        assert_eq!(codec.deserialize("ABC").unwrap(), Value::from("abc"));
    }
}
