//! Serialization layer. Defaults to JSON via serde_json.
//!
//! Implement [`Serializer`] if you need a different whole-document format
//! (RON, MessagePack, etc.). It must round-trip nested values exactly.

use crate::error::{Error, Result};
use crate::Mapping;
use serde_json::Value;

/// Converts mapping snapshots to/from bytes for persistence.
pub trait Serializer {
    /// Encode a mapping to bytes.
    fn serialize(&self, data: &Mapping) -> Result<Vec<u8>>;

    /// Decode bytes back into a mapping.
    fn deserialize(&self, bytes: &[u8]) -> Result<Mapping>;
}

/// JSON serializer with optional pretty-printing.
#[derive(Debug, Clone, Default)]
pub struct JsonSerializer {
    pretty: bool,
}

impl JsonSerializer {
    /// Compact JSON (single line, no extra whitespace).
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretty-printed JSON with indentation. Handy when the stash gets edited by hand.
    pub fn pretty() -> Self {
        Self { pretty: true }
    }

    /// `true` when output is indented.
    pub fn is_pretty(&self) -> bool {
        self.pretty
    }
}

impl Serializer for JsonSerializer {
    fn serialize(&self, data: &Mapping) -> Result<Vec<u8>> {
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(data)
        } else {
            serde_json::to_vec(data)
        };
        bytes.map_err(|e| Error::Serialize(e.to_string()))
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<Mapping> {
        match serde_json::from_slice::<Value>(bytes)? {
            Value::Object(map) => Ok(map),
            other => Err(Error::Deserialize(format!(
                "expected a JSON object at the top level, found {}",
                kind(&other)
            ))),
        }
    }
}

fn kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Mapping {
        let mut m = Mapping::new();
        m.insert("zeta".into(), json!({"user": "bob", "port": 3306}));
        m.insert("alpha".into(), json!([1, 2.5, "three", null, true]));
        m
    }

    #[test]
    fn nested_values_survive() {
        let ser = JsonSerializer::new();
        let bytes = ser.serialize(&sample()).unwrap();
        assert_eq!(ser.deserialize(&bytes).unwrap(), sample());
    }

    #[test]
    fn insertion_order_kept_on_disk() {
        let bytes = JsonSerializer::new().serialize(&sample()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.find("zeta").unwrap() < text.find("alpha").unwrap());
    }

    #[test]
    fn pretty_output_is_indented() {
        let ser = JsonSerializer::pretty();
        assert!(ser.is_pretty());
        let text = String::from_utf8(ser.serialize(&sample()).unwrap()).unwrap();
        assert!(text.contains('\n'));
        assert!(text.contains("  "));
    }

    #[test]
    fn non_object_document_rejected() {
        let err = JsonSerializer::new().deserialize(b"[1, 2]").unwrap_err();
        match err {
            Error::Deserialize(msg) => assert!(msg.contains("an array")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn garbage_rejected() {
        let err = JsonSerializer::new().deserialize(b"\x00\x01not json").unwrap_err();
        assert!(matches!(err, Error::Deserialize(_)));
    }
}
