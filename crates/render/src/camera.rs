use foundation::LngLat;
use serde::{Deserialize, Serialize};

/// Where the camera is.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub center: LngLat,
    pub zoom: f64,
}

impl Camera {
    pub const fn new(center: LngLat, zoom: f64) -> Self {
        Self { center, zoom }
    }
}

/// Instant camera change; absent fields keep their current value.
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub center: Option<LngLat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zoom: Option<f64>,
}

impl CameraOptions {
    pub fn is_empty(&self) -> bool {
        self.center.is_none() && self.zoom.is_none()
    }

    pub fn apply_to(&self, camera: &mut Camera) {
        if let Some(center) = self.center {
            camera.center = center;
        }
        if let Some(zoom) = self.zoom {
            camera.zoom = zoom;
        }
    }
}

impl From<Camera> for CameraOptions {
    fn from(c: Camera) -> Self {
        Self {
            center: Some(c.center),
            zoom: Some(c.zoom),
        }
    }
}

/// Animated fit-to-box parameters.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FitOptions {
    /// Inset margin in pixels on every side.
    pub padding: f64,
    pub duration_ms: u32,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            padding: 50.0,
            duration_ms: 1000,
        }
    }
}
