//! Geometry validation.
//!
//! Coordinates are repaired rather than rejected: every leaf that sits at
//! position depth and is not a finite number becomes `0`. The nesting itself
//! is never changed, so a structurally broken geometry survives repair and is
//! caught by [`Shape::from_coordinates`] instead.

use serde_json::Value;

use crate::geometry::{Geometry, GeometryIssue, GeometryKind, Shape};

/// Repairs `coordinates` for a geometry of type `kind`. Never fails.
///
/// Unknown kinds are returned unchanged.
pub fn validate(coordinates: &Value, kind: &GeometryKind) -> Value {
    match kind.coordinate_depth() {
        Some(depth) => coerce(coordinates, depth),
        None => coordinates.clone(),
    }
}

fn coerce(value: &Value, depth: usize) -> Value {
    if depth == 0 {
        return coerce_scalar(value);
    }
    match value {
        Value::Array(items) => Value::Array(items.iter().map(|v| coerce(v, depth - 1)).collect()),
        other => other.clone(),
    }
}

fn coerce_scalar(value: &Value) -> Value {
    match value {
        Value::Number(n) if n.as_f64().is_some_and(f64::is_finite) => value.clone(),
        _ => Value::from(0),
    }
}

/// A geometry that passed repair and structural checks.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidGeometry {
    pub kind: GeometryKind,
    /// Repaired coordinates, holes included, ready for the renderer.
    pub coordinates: Value,
    pub shape: Shape,
}

/// Repairs and checks a feature's geometry in one step.
pub fn prepare(geometry: Option<&Geometry>) -> Result<ValidGeometry, GeometryIssue> {
    let geometry = geometry.ok_or(GeometryIssue::MissingGeometry)?;
    let coordinates = validate(&geometry.coordinates, &geometry.kind);
    let shape = Shape::from_coordinates(&geometry.kind, &coordinates)?;
    Ok(ValidGeometry {
        kind: geometry.kind.clone(),
        coordinates,
        shape,
    })
}
