use foundation::{Corners, LngLat};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::feature::{Feature, display_value};
use crate::lenient;

/// Camera hints attached to a visualization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapConfig {
    #[serde(default = "default_fit_bounds", deserialize_with = "lenient::bool_or_true")]
    pub fit_bounds: bool,
    #[serde(default, deserialize_with = "lenient::parsed_opt", skip_serializing_if = "Option::is_none")]
    pub center: Option<LngLat>,
    #[serde(default, deserialize_with = "lenient::f64_opt", skip_serializing_if = "Option::is_none")]
    pub zoom: Option<f64>,
    /// Explicit box; wins over the box computed from features.
    #[serde(default, deserialize_with = "lenient::parsed_opt", skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Corners>,
}

fn default_fit_bounds() -> bool {
    true
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            fit_bounds: true,
            center: None,
            zoom: None,
            bounds: None,
        }
    }
}

/// Everything that should be drawn, replaced wholesale on every update.
///
/// Feature order is z-order: later features draw on top.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawVisualization")]
pub struct Visualization {
    pub features: Vec<Feature>,
    pub config: MapConfig,
}

#[derive(Deserialize)]
struct RawVisualization {
    #[serde(default, deserialize_with = "lenient::or_default")]
    features: Vec<Value>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    config: MapConfig,
}

impl From<RawVisualization> for Visualization {
    fn from(raw: RawVisualization) -> Self {
        let features = raw
            .features
            .into_iter()
            .map(|v| serde_json::from_value(v).unwrap_or_default())
            .collect();
        Visualization::new(features, raw.config)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum VisualizationError {
    #[error("visualization is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl Visualization {
    /// Builds a visualization, assigning `feature-<index>` to features that
    /// carry no identifier.
    pub fn new(mut features: Vec<Feature>, config: MapConfig) -> Self {
        for (index, f) in features.iter_mut().enumerate() {
            if f.identity().is_empty() {
                f.id = Some(format!("feature-{index}"));
            }
        }
        Self { features, config }
    }

    pub fn from_json_str(s: &str) -> Result<Self, VisualizationError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Adapts a raw GeoJSON `FeatureCollection` of ZIP-code areas.
    ///
    /// `ZIP` becomes the id and the `ZIP <code>` title; the remaining scalar
    /// properties become popup rows with readable labels.
    pub fn from_feature_collection(collection: &Value) -> Self {
        let features = collection
            .get("features")
            .and_then(Value::as_array)
            .map(|items| items.iter().map(zip_feature).collect())
            .unwrap_or_default();
        Visualization::new(features, MapConfig::default())
    }
}

fn zip_feature(raw: &Value) -> Feature {
    let mut feature: Feature = serde_json::from_value(raw.clone()).unwrap_or_default();
    let extra = std::mem::take(&mut feature.properties.extra);

    let zip = extra.get("ZIP").map(display_value);
    let mut data = Map::new();
    for (key, value) in &extra {
        if key == "ZIP" || value.is_object() || value.is_array() {
            continue;
        }
        data.insert(zip_label(key).to_string(), value.clone());
    }

    if feature.properties.title.is_none() {
        feature.properties.title = zip.as_ref().map(|z| format!("ZIP {z}"));
    }
    if feature.identity().is_empty() {
        feature.id = zip;
    }
    if feature.properties.data.is_none() && !data.is_empty() {
        feature.properties.data = Some(data);
    }
    feature.properties.extra = extra;
    feature
}

fn zip_label(key: &str) -> &str {
    match key {
        "population" => "Population",
        "ev_poi_count" => "EV stations",
        "evs_per_capita" => "EV stations per capita",
        other => other,
    }
}
