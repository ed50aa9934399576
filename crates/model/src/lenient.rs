//! Field deserializers that never fail.
//!
//! Visualization documents come out of a natural-language pipeline, so any
//! field may carry the wrong JSON type. These helpers read the raw value and
//! fall back to `None` instead of rejecting the whole document.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

pub(crate) fn f64_opt<'de, D>(de: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(de)? {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        _ => None,
    })
}

pub(crate) fn string_opt<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(de)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

/// Identifiers may arrive as strings or numbers.
pub(crate) fn id_opt<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(de)? {
        Value::String(s) if !s.is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Titles are rendered as text, so scalars are stringified.
pub(crate) fn text_opt<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(de)? {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

/// A non-object `data` value is kept under a single `data` row so it still
/// renders instead of disappearing.
pub(crate) fn data_opt<'de, D>(de: D) -> Result<Option<Map<String, Value>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(de)? {
        Value::Null => None,
        Value::Object(map) => Some(map),
        other => {
            let mut map = Map::new();
            map.insert("data".to_string(), other);
            Some(map)
        }
    })
}

pub(crate) fn bool_or_true<'de, D>(de: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(!matches!(Value::deserialize(de)?, Value::Bool(false)))
}

pub(crate) fn or_default<'de, D, T>(de: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let raw = Value::deserialize(de)?;
    Ok(serde_json::from_value(raw).unwrap_or_default())
}

pub(crate) fn parsed_opt<'de, D, T>(de: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Value::deserialize(de)?;
    Ok(serde_json::from_value(raw).ok())
}
