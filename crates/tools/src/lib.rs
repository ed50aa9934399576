//! Headless replay of visualization documents.

use std::collections::BTreeMap;

use model::{GeometryKind, Visualization, prepare};
use render::{Camera, MapRenderer, MemoryRenderer, StyleDocument};
use serde::Serialize;
use serde_json::Value;
use session::{MapSession, Readiness, SessionConfig, StaticStyleProvider};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct ReplayOptions {
    /// Basemap to load first; a blank style when absent.
    pub style: Option<StyleDocument>,
    /// Apply the document a second time and compare object sets.
    pub twice: bool,
    pub config: SessionConfig,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self {
            style: None,
            twice: false,
            config: SessionConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Warning {
    pub feature_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayOutput {
    pub readiness: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner: Option<String>,
    pub base_layers: usize,
    pub sources: Vec<Value>,
    pub layers: Vec<Value>,
    pub warnings: Vec<Warning>,
    pub camera: Camera,
    pub counters: BTreeMap<String, u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stable_on_second_pass: Option<bool>,
}

/// Runs `visualization` through a full session on the headless renderer.
pub fn replay(visualization: Visualization, options: &ReplayOptions) -> ReplayOutput {
    let style = options
        .style
        .clone()
        .unwrap_or_else(StyleDocument::blank)
        .into_value();
    let provider = StaticStyleProvider::new("0.0.0", style);
    let mut session = pollster::block_on(MapSession::open(
        MemoryRenderer::new(),
        &provider,
        &options.config,
    ));

    let mut stable = None;
    if let Err(err) = session.reconcile(visualization.clone()) {
        debug!(%err, "replay pass failed");
    } else if options.twice {
        let first = session.renderer().objects();
        if let Err(err) = session.reconcile(visualization) {
            debug!(%err, "second replay pass failed");
        }
        stable = Some(session.renderer().objects() == first);
    }

    let renderer = session.renderer();
    let objects = renderer.objects();
    let base_layers = renderer
        .style_objects()
        .layers
        .len()
        .saturating_sub(objects.layers.len());
    ReplayOutput {
        readiness: match session.readiness() {
            Readiness::Pending => "pending".to_string(),
            Readiness::Ready => "ready".to_string(),
            Readiness::Error(message) => format!("error: {message}"),
        },
        banner: session.banner().map(str::to_string),
        base_layers,
        sources: objects
            .sources
            .iter()
            .map(|(id, spec)| serde_json::json!({ "id": id, "source": spec.to_json() }))
            .collect(),
        layers: objects.layers.iter().map(|l| l.to_json()).collect(),
        warnings: session
            .skipped()
            .iter()
            .map(|s| Warning {
                feature_id: s.feature_id.clone(),
                reason: s.reason.to_string(),
            })
            .collect(),
        camera: renderer.camera(),
        counters: session
            .diagnostics()
            .snapshot()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect(),
        stable_on_second_pass: stable,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureCheck {
    pub index: usize,
    pub feature_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Repaired coordinates, when the geometry passed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Value>,
}

/// Validation result for every feature, in document order.
pub fn check_features(visualization: &Visualization) -> Vec<FeatureCheck> {
    visualization
        .features
        .iter()
        .enumerate()
        .map(|(index, feature)| {
            let kind = feature
                .geometry
                .as_ref()
                .map(|g| g.kind.as_str().to_string());
            match prepare(feature.geometry.as_ref()) {
                Ok(valid) => FeatureCheck {
                    index,
                    feature_id: feature.identity().to_string(),
                    kind,
                    ok: true,
                    reason: matches!(valid.kind, GeometryKind::Other(_))
                        .then(|| "unsupported kind; installed without layers".to_string()),
                    coordinates: Some(valid.coordinates),
                },
                Err(issue) => FeatureCheck {
                    index,
                    feature_id: feature.identity().to_string(),
                    kind,
                    ok: false,
                    reason: Some(issue.to_string()),
                    coordinates: None,
                },
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{ReplayOptions, check_features, replay};
    use model::Visualization;
    use pretty_assertions::assert_eq;
    use render::StyleDocument;
    use serde_json::json;

    fn sample() -> Visualization {
        serde_json::from_value(json!({
            "features": [
                {
                    "id": "zip-78701",
                    "geometry": { "type": "Polygon", "coordinates": [[[-98, 30], [-97, 30], [-97, 31], [-98, 31]]] },
                    "properties": { "title": "ZIP 78701", "data": { "Population": 9000 } }
                },
                { "id": "lost", "properties": { "title": "no geometry" } },
                { "id": "station", "geometry": { "type": "Point", "coordinates": ["-97.74", 30.27] } }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn replay_reports_objects_and_warnings() {
        let options = ReplayOptions {
            style: Some(StyleDocument::new(json!({
                "version": 8,
                "sources": {},
                "layers": [{ "id": "background", "type": "background" }]
            }))),
            twice: true,
            ..ReplayOptions::default()
        };
        let out = replay(sample(), &options);

        assert_eq!(out.readiness, "ready");
        assert_eq!(out.base_layers, 1);
        assert_eq!(out.sources.len(), 2);
        assert_eq!(
            out.layers.iter().map(|l| l["id"].as_str().unwrap()).collect::<Vec<_>>(),
            vec!["custom-layer-0-fill", "custom-layer-0-outline", "custom-layer-2"]
        );
        assert_eq!(out.warnings.len(), 1);
        assert_eq!(out.warnings[0].feature_id, "lost");
        assert_eq!(out.stable_on_second_pass, Some(true));
        assert_eq!(out.counters["passes"], 2);
    }

    #[test]
    fn checks_repair_and_flag_features() {
        let checks = check_features(&sample());

        assert!(checks[0].ok);
        assert!(!checks[1].ok);
        assert_eq!(checks[1].reason.as_deref(), Some("feature has no geometry"));
        assert_eq!(checks[2].coordinates, Some(json!([0, 30.27])));
    }
}
