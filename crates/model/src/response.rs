use serde::Deserialize;
use serde_json::Value;

use crate::visualization::Visualization;

/// Envelope returned by the chat backend.
///
/// Older backends answer with `text` + a bare `geojson` collection, newer ones
/// with `message` + a `visualization` that may itself be wrapped as
/// `{ "type": "map", "data": { ... } }`.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    visualization: Option<Value>,
    #[serde(default)]
    geojson: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ChatResponse {
    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref().or(self.text.as_deref())
    }

    /// The visualization carried by this response, if any.
    pub fn visualization(&self) -> Option<Visualization> {
        if let Some(v) = self.visualization.as_ref().filter(|v| v.is_object()) {
            let body = match v.get("data") {
                Some(data) if data.get("features").is_some() => data,
                _ => v,
            };
            return serde_json::from_value(body.clone()).ok();
        }
        self.geojson
            .as_ref()
            .filter(|g| g.get("features").is_some())
            .map(Visualization::from_feature_collection)
    }
}
