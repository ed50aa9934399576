//! Session configuration read from the environment.
//!
//! Every field has a default, so an empty environment yields a usable config
//! (apart from the style API key, which only the HTTP provider requires).

use std::env;

use foundation::LngLat;
use layers::{EngineConfig, Trigger};
use render::{CameraOptions, FitOptions};

pub const DEFAULT_STYLE_BASE_URL: &str = "https://api.tomtom.com/maps/orbis";
pub const DEFAULT_CENTER: LngLat = LngLat::new(-99.3832, 31.2504);
pub const DEFAULT_ZOOM: f64 = 6.0;

#[derive(Debug, Clone, PartialEq)]
pub struct StyleConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    /// `0.*` picks the newest `0.x.y`; anything without `*` must match exactly.
    pub version_pattern: String,
    pub map: String,
    pub hillshade: String,
    pub traffic_flow: String,
    pub traffic_incidents: String,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_STYLE_BASE_URL.to_string(),
            version_pattern: "0.*".to_string(),
            map: "basic_street-light".to_string(),
            hillshade: "hillshade_light".to_string(),
            traffic_flow: "flow_relative-light".to_string(),
            traffic_incidents: "incidents_light".to_string(),
        }
    }
}

impl StyleConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`StyleConfig::from_env`] over an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            api_key: non_empty("TOMTOM_API_KEY").or_else(|| non_empty("NEXT_PUBLIC_TOMTOM_API_KEY")),
            base_url: non_empty("CIRCLE30_STYLE_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            version_pattern: non_empty("CIRCLE30_STYLE_VERSION").unwrap_or(defaults.version_pattern),
            map: non_empty("CIRCLE30_STYLE_MAP").unwrap_or(defaults.map),
            hillshade: non_empty("CIRCLE30_STYLE_HILLSHADE").unwrap_or(defaults.hillshade),
            traffic_flow: non_empty("CIRCLE30_STYLE_TRAFFIC_FLOW").unwrap_or(defaults.traffic_flow),
            traffic_incidents: non_empty("CIRCLE30_STYLE_TRAFFIC_INCIDENTS")
                .unwrap_or(defaults.traffic_incidents),
        }
    }

    /// Endpoint listing the published style versions.
    pub fn versions_url(&self, api_key: &str) -> String {
        format!("{}/assets/styles?key={api_key}&apiVersion=1", self.base_url)
    }

    pub fn style_url(&self, version: &str, api_key: &str) -> String {
        format!(
            "{}/assets/styles/{version}/style.json?key={api_key}&apiVersion=1&map={}&hillshade={}&trafficFlow={}&trafficIncidents={}",
            self.base_url, self.map, self.hillshade, self.traffic_flow, self.traffic_incidents
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub style: StyleConfig,
    pub engine: EngineConfig,
    /// Applied once the style is in, before any visualization.
    pub initial_camera: CameraOptions,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            style: StyleConfig::default(),
            engine: EngineConfig::default(),
            initial_camera: CameraOptions {
                center: Some(DEFAULT_CENTER),
                zoom: Some(DEFAULT_ZOOM),
            },
        }
    }
}

impl SessionConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let fit_defaults = FitOptions::default();
        let engine = EngineConfig {
            prefix: lookup("CIRCLE30_PREFIX")
                .filter(|p| !p.trim().is_empty())
                .unwrap_or(defaults.engine.prefix),
            point_trigger: parse_or(&lookup, "CIRCLE30_POINT_TRIGGER", Trigger::default()),
            fit: FitOptions {
                padding: parse_or(&lookup, "CIRCLE30_FIT_PADDING", fit_defaults.padding),
                duration_ms: parse_or(&lookup, "CIRCLE30_FIT_DURATION_MS", fit_defaults.duration_ms),
            },
        };
        let initial_camera = CameraOptions {
            center: Some(LngLat::new(
                parse_or(&lookup, "CIRCLE30_CENTER_LNG", DEFAULT_CENTER.lng),
                parse_or(&lookup, "CIRCLE30_CENTER_LAT", DEFAULT_CENTER.lat),
            )),
            zoom: Some(parse_or(&lookup, "CIRCLE30_ZOOM", DEFAULT_ZOOM)),
        };
        Self {
            style: StyleConfig::from_lookup(&lookup),
            engine,
            initial_camera,
        }
    }
}

fn parse_or<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
