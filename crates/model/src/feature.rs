use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::geometry::Geometry;
use crate::lenient;

/// Recognized style options. Every field is optional; absent or malformed
/// values fall back to renderer defaults.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureStyle {
    #[serde(default, deserialize_with = "lenient::string_opt", skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, deserialize_with = "lenient::string_opt", skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<String>,
    #[serde(default, deserialize_with = "lenient::f64_opt", skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(default, deserialize_with = "lenient::f64_opt", skip_serializing_if = "Option::is_none")]
    pub fill_opacity: Option<f64>,
    #[serde(default, deserialize_with = "lenient::f64_opt", skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, deserialize_with = "lenient::f64_opt", skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    #[serde(default, deserialize_with = "lenient::string_opt", skip_serializing_if = "Option::is_none")]
    pub stroke_color: Option<String>,
    #[serde(default, deserialize_with = "lenient::f64_opt", skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
}

impl FeatureStyle {
    /// `color`, falling back to the `strokeColor` alias.
    pub fn stroke(&self) -> Option<&str> {
        self.color.as_deref().or(self.stroke_color.as_deref())
    }

    /// `weight`, falling back to the `strokeWidth` alias.
    pub fn stroke_weight(&self) -> Option<f64> {
        self.weight.or(self.stroke_width)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureProperties {
    #[serde(default, deserialize_with = "lenient::id_opt", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient::text_opt", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient::data_opt", skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub style: FeatureStyle,
    /// Everything else, forwarded to the renderer untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FeatureProperties {
    /// `label: value` rows in document order.
    pub fn rows(&self) -> Vec<(String, String)> {
        self.data
            .iter()
            .flatten()
            .map(|(k, v)| (k.clone(), display_value(v)))
            .collect()
    }

    pub fn is_interactive(&self) -> bool {
        self.title.is_some() || self.data.is_some()
    }
}

/// Scalars render bare; nested values render as compact JSON.
pub fn display_value(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

/// One drawable unit of a visualization.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(default, deserialize_with = "lenient::id_opt")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient::parsed_opt")]
    pub geometry: Option<Geometry>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub properties: FeatureProperties,
}

impl Feature {
    pub fn new(id: impl Into<String>, geometry: Geometry) -> Self {
        Self {
            id: Some(id.into()),
            geometry: Some(geometry),
            properties: FeatureProperties::default(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.properties.title = Some(title.into());
        self
    }

    pub fn with_data(mut self, label: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties
            .data
            .get_or_insert_with(Map::new)
            .insert(label.into(), value.into());
        self
    }

    pub fn with_style(mut self, style: FeatureStyle) -> Self {
        self.properties.style = style;
        self
    }

    /// Identifier used in diagnostics and event correlation.
    pub fn identity(&self) -> &str {
        self.id
            .as_deref()
            .or(self.properties.id.as_deref())
            .unwrap_or("")
    }

    pub fn title(&self) -> Option<&str> {
        self.properties.title.as_deref()
    }

    pub fn style(&self) -> &FeatureStyle {
        &self.properties.style
    }

    /// GeoJSON form of this feature with `coordinates` substituted for the
    /// raw geometry coordinates.
    pub fn to_geojson(&self, coordinates: &Value) -> Value {
        let kind = self
            .geometry
            .as_ref()
            .map(|g| g.kind.as_str().to_string())
            .unwrap_or_default();
        let properties = serde_json::to_value(&self.properties).unwrap_or(Value::Null);
        json!({
            "type": "Feature",
            "id": self.identity(),
            "geometry": { "type": kind, "coordinates": coordinates },
            "properties": properties,
        })
    }
}
