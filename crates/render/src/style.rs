use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// A basemap style document (MapLibre style spec, version 8).
///
/// Only the layer and source identifiers are interpreted; the rest is
/// forwarded to the renderer as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StyleDocument(Value);

impl StyleDocument {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Empty style with no sources or layers.
    pub fn blank() -> Self {
        Self(json!({ "version": 8, "sources": {}, "layers": [] }))
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    pub fn version(&self) -> Option<u64> {
        self.0.get("version").and_then(Value::as_u64)
    }

    /// Source ids in document order.
    pub fn source_ids(&self) -> Vec<String> {
        self.0
            .get("sources")
            .and_then(Value::as_object)
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// `(layer id, source id)` pairs in draw order.
    pub fn layers(&self) -> Vec<(String, Option<String>)> {
        self.0
            .get("layers")
            .and_then(Value::as_array)
            .map(|layers| {
                layers
                    .iter()
                    .filter_map(|l| {
                        let id = l.get("id")?.as_str()?.to_string();
                        let source = l.get("source").and_then(Value::as_str).map(str::to_string);
                        Some((id, source))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}
