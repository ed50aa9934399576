use std::fmt;

use foundation::LngLat;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Geometry tag as it appears in the GeoJSON `type` member.
///
/// Anything other than the three drawable kinds is kept verbatim in
/// [`GeometryKind::Other`] so it can still be handed to the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GeometryKind {
    Point,
    LineString,
    Polygon,
    Other(String),
}

impl GeometryKind {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "Point" => GeometryKind::Point,
            "LineString" => GeometryKind::LineString,
            "Polygon" => GeometryKind::Polygon,
            other => GeometryKind::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            GeometryKind::Point => "Point",
            GeometryKind::LineString => "LineString",
            GeometryKind::Polygon => "Polygon",
            GeometryKind::Other(tag) => tag,
        }
    }

    /// Array nesting depth of a position leaf, if the kind is drawable.
    pub fn coordinate_depth(&self) -> Option<usize> {
        match self {
            GeometryKind::Point => Some(1),
            GeometryKind::LineString => Some(2),
            GeometryKind::Polygon => Some(3),
            GeometryKind::Other(_) => None,
        }
    }
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for GeometryKind {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for GeometryKind {
    fn deserialize<D: Deserializer<'de>>(de: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(de)?;
        Ok(GeometryKind::from_tag(&tag))
    }
}

/// Untrusted geometry exactly as received.
///
/// `coordinates` stays a raw JSON value until [`crate::validate`] has
/// repaired it; `Value::Null` means the member was absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    #[serde(rename = "type")]
    pub kind: GeometryKind,
    #[serde(default)]
    pub coordinates: Value,
}

impl Geometry {
    pub fn new(kind: GeometryKind, coordinates: Value) -> Self {
        Self { kind, coordinates }
    }

    pub fn point(lng: f64, lat: f64) -> Self {
        Self::new(GeometryKind::Point, serde_json::json!([lng, lat]))
    }
}

/// Typed view of validated coordinates.
///
/// Polygons keep only their outer ring; holes travel to the renderer inside
/// the raw coordinates and are never inspected.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Point(LngLat),
    LineString(Vec<LngLat>),
    Polygon { outer: Vec<LngLat>, holes: usize },
    Other(String),
}

impl Shape {
    pub fn kind(&self) -> GeometryKind {
        match self {
            Shape::Point(_) => GeometryKind::Point,
            Shape::LineString(_) => GeometryKind::LineString,
            Shape::Polygon { .. } => GeometryKind::Polygon,
            Shape::Other(tag) => GeometryKind::Other(tag.clone()),
        }
    }

    /// Positions that count towards a bounding box.
    pub fn extent_positions(&self) -> &[LngLat] {
        match self {
            Shape::Point(p) => std::slice::from_ref(p),
            Shape::LineString(vertices) => vertices,
            Shape::Polygon { outer, .. } => outer,
            Shape::Other(_) => &[],
        }
    }
}

/// Why a geometry cannot be drawn.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeometryIssue {
    #[error("feature has no geometry")]
    MissingGeometry,
    #[error("{kind} geometry has no coordinates")]
    MissingCoordinates { kind: String },
    #[error("{kind} coordinates are not an array")]
    NotAnArray { kind: String },
    #[error("{kind} coordinates are empty")]
    Empty { kind: String },
    #[error("{kind} position {index} is malformed")]
    MalformedPosition { kind: String, index: usize },
    #[error("{kind} needs at least {needed} positions, found {found}")]
    TooFewPositions {
        kind: String,
        needed: usize,
        found: usize,
    },
}

const MIN_LINE_POSITIONS: usize = 2;
const MIN_RING_POSITIONS: usize = 3;

impl Shape {
    /// Reads a typed shape out of coordinates that already went through
    /// [`crate::validate`].
    pub fn from_coordinates(kind: &GeometryKind, coordinates: &Value) -> Result<Self, GeometryIssue> {
        let tag = kind.as_str().to_string();
        if coordinates.is_null() {
            return Err(GeometryIssue::MissingCoordinates { kind: tag });
        }
        match kind {
            GeometryKind::Point => {
                let Value::Array(items) = coordinates else {
                    return Err(GeometryIssue::NotAnArray { kind: tag });
                };
                if items.is_empty() {
                    return Err(GeometryIssue::Empty { kind: tag });
                }
                position(coordinates)
                    .map(Shape::Point)
                    .ok_or(GeometryIssue::MalformedPosition {
                        kind: tag,
                        index: 0,
                    })
            }
            GeometryKind::LineString => {
                positions(coordinates, &tag, MIN_LINE_POSITIONS).map(Shape::LineString)
            }
            GeometryKind::Polygon => {
                let Value::Array(rings) = coordinates else {
                    return Err(GeometryIssue::NotAnArray { kind: tag });
                };
                let Some(first) = rings.first() else {
                    return Err(GeometryIssue::Empty { kind: tag });
                };
                let outer = positions(first, &tag, MIN_RING_POSITIONS)?;
                Ok(Shape::Polygon {
                    outer,
                    holes: rings.len() - 1,
                })
            }
            GeometryKind::Other(tag) => Ok(Shape::Other(tag.clone())),
        }
    }
}

fn positions(value: &Value, kind: &str, needed: usize) -> Result<Vec<LngLat>, GeometryIssue> {
    let Value::Array(items) = value else {
        return Err(GeometryIssue::NotAnArray {
            kind: kind.to_string(),
        });
    };
    if items.is_empty() {
        return Err(GeometryIssue::Empty {
            kind: kind.to_string(),
        });
    }
    let mut out = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let p = position(item).ok_or_else(|| GeometryIssue::MalformedPosition {
            kind: kind.to_string(),
            index,
        })?;
        out.push(p);
    }
    if out.len() < needed {
        return Err(GeometryIssue::TooFewPositions {
            kind: kind.to_string(),
            needed,
            found: out.len(),
        });
    }
    Ok(out)
}

/// `[lon, lat, ...]`; extra members such as altitude are ignored.
fn position(value: &Value) -> Option<LngLat> {
    let Value::Array(items) = value else {
        return None;
    };
    let lng = items.first()?.as_f64()?;
    let lat = items.get(1)?.as_f64()?;
    let p = LngLat::new(lng, lat);
    p.is_finite().then_some(p)
}
