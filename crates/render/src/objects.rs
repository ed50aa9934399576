use serde_json::{Value, json};

/// Renderer source holding raw GeoJSON.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSpec {
    pub data: Value,
}

impl SourceSpec {
    pub fn geojson(data: Value) -> Self {
        Self { data }
    }

    /// Geometry type tags of the features held by this source.
    pub fn geometry_types(&self) -> Vec<&str> {
        let single = std::slice::from_ref(&self.data);
        let features = self
            .data
            .get("features")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(single);
        features
            .iter()
            .filter_map(|f| f.get("geometry")?.get("type")?.as_str())
            .collect()
    }

    pub fn to_json(&self) -> Value {
        json!({ "type": "geojson", "data": self.data })
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum LayerKind {
    Circle,
    Line,
    Fill,
}

impl LayerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayerKind::Circle => "circle",
            LayerKind::Line => "line",
            LayerKind::Fill => "fill",
        }
    }
}

/// Paint properties for the three layer kinds the engine installs.
#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    Circle {
        radius: f64,
        color: String,
        opacity: f64,
    },
    Line {
        color: String,
        width: f64,
        opacity: f64,
    },
    Fill {
        color: String,
        opacity: f64,
    },
}

impl Paint {
    pub fn kind(&self) -> LayerKind {
        match self {
            Paint::Circle { .. } => LayerKind::Circle,
            Paint::Line { .. } => LayerKind::Line,
            Paint::Fill { .. } => LayerKind::Fill,
        }
    }

    /// MapLibre style-spec paint object.
    pub fn to_json(&self) -> Value {
        match self {
            Paint::Circle {
                radius,
                color,
                opacity,
            } => json!({
                "circle-radius": radius,
                "circle-color": color,
                "circle-opacity": opacity,
            }),
            Paint::Line {
                color,
                width,
                opacity,
            } => json!({
                "line-color": color,
                "line-width": width,
                "line-opacity": opacity,
            }),
            Paint::Fill { color, opacity } => json!({
                "fill-color": color,
                "fill-opacity": opacity,
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayerSpec {
    pub id: String,
    pub source: String,
    pub paint: Paint,
}

impl LayerSpec {
    pub fn new(id: impl Into<String>, source: impl Into<String>, paint: Paint) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            paint,
        }
    }

    pub fn kind(&self) -> LayerKind {
        self.paint.kind()
    }

    pub fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "type": self.kind().as_str(),
            "source": self.source,
            "paint": self.paint.to_json(),
        })
    }
}
