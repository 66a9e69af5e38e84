//! Helpers for the wire quirks of the warehouse REST API.

use serde::{Deserialize, Deserializer, Serializer};
use serde_json::Value as JsonValue;

/// Parse an integer that may arrive either as a JSON number or as a decimal
/// string (the REST API encodes 64-bit counters as strings).
pub fn parse_u64(value: &JsonValue) -> Option<u64> {
    match value {
        JsonValue::Number(n) => n.as_u64(),
        JsonValue::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
}

/// Same as [`parse_u64`] but signed, used for `COUNT(*)` style cells.
pub fn parse_i64(value: &JsonValue) -> Option<i64> {
    match value {
        JsonValue::Number(n) => n.as_i64(),
        JsonValue::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// `#[serde(with = "u64_string")]` for `Option<u64>` fields sent as strings.
pub(crate) mod u64_string {
    use super::*;

    pub fn serialize<S>(value: &Option<u64>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(v) => serializer.serialize_str(&v.to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<JsonValue>::deserialize(deserializer)?;
        match raw {
            None | Some(JsonValue::Null) => Ok(None),
            Some(value) => parse_u64(&value)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid row count: {}", value))),
        }
    }
}
