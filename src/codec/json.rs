//! Type-preserving JSON codec
//!
//! Bytes are stored as `":base64:<data>"` strings. Any string that already
//! starts with `:` gets one more `:` in front so it cannot be mistaken for a
//! marker; decoding strips exactly one.

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::codec::{check_depth, Codec, MAX_NESTING_DEPTH};
use crate::error::{Result, StorageError};
use crate::value::{timestamp_to_plain, Value};

/// Reserved leading character for tagged strings
pub const MARKER: char = ':';

/// Prefix of encoded binary payloads
pub const BASE64_MARKER: &str = ":base64:";

// == Json Codec ==
/// Default codec; round-trips every `Value` shape except timestamps,
/// which are stored as their plain RFC 3339 string.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl JsonCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Codec for JsonCodec {
    fn name(&self) -> &str {
        "json"
    }

    fn serialize(&self, value: &Value) -> Result<String> {
        check_depth(value)?;
        serde_json::to_string(&encode(value)).map_err(|e| StorageError::codec("serialize", e))
    }

    fn deserialize(&self, raw: &str) -> Result<Value> {
        let json: serde_json::Value =
            serde_json::from_str(raw).map_err(|e| StorageError::codec("deserialize", e))?;
        decode(json)
    }
}

fn encode(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Number(n) => serde_json::Value::Number(n.clone()),
        Value::String(s) => serde_json::Value::String(escape(s)),
        Value::Bytes(b) => serde_json::Value::String(format!("{}{}", BASE64_MARKER, STANDARD.encode(b))),
        Value::Timestamp(t) => serde_json::Value::String(escape(&timestamp_to_plain(t))),
        Value::Array(items) => serde_json::Value::Array(items.iter().map(encode).collect()),
        Value::Object(map) => serde_json::Value::Object(
            map.iter().map(|(k, v)| (k.clone(), encode(v))).collect(),
        ),
    }
}

fn decode(json: serde_json::Value) -> Result<Value> {
    Ok(match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => Value::Number(n),
        serde_json::Value::String(s) => decode_string(s)?,
        serde_json::Value::Array(items) => {
            Value::Array(items.into_iter().map(decode).collect::<Result<_>>()?)
        }
        serde_json::Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| decode(v).map(|v| (k, v)))
                .collect::<Result<_>>()?,
        ),
    })
}

fn escape(s: &str) -> String {
    if s.starts_with(MARKER) {
        format!("{}{}", MARKER, s)
    } else {
        s.to_string()
    }
}

fn decode_string(s: String) -> Result<Value> {
    if let Some(data) = s.strip_prefix(BASE64_MARKER) {
        let bytes = STANDARD
            .decode(data)
            .map_err(|e| StorageError::codec("deserialize", format!("invalid base64 payload: {}", e)))?;
        return Ok(Value::Bytes(bytes));
    }
    match s.strip_prefix(MARKER) {
        Some(rest) => Ok(Value::String(rest.to_string())),
        None => Ok(Value::String(s)),
    }
}
