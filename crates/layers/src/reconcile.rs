//! Reconciliation of a [`Visualization`] onto a renderer.
//!
//! A pass tears down every object carrying the engine prefix, then installs
//! one source plus its layers per feature, in feature order. Problems confined
//! to one feature are recorded and the pass moves on; only a failed teardown
//! aborts, because the object namespace can no longer be trusted.

use foundation::{Corners, LngLatBounds};
use model::{Feature, FeatureStyle, GeometryIssue, GeometryKind, Shape, ValidGeometry, Visualization, prepare};
use render::{CameraOptions, LayerSpec, MapRenderer, RendererError, SourceSpec};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::interaction;
use crate::naming::ObjectNames;
use crate::symbology::PaintDefaults;
use crate::viewport;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SkipReason {
    #[error("invalid geometry: {0}")]
    Geometry(#[from] GeometryIssue),
    #[error("renderer rejected install: {0}")]
    Renderer(#[from] RendererError),
}

/// A feature left out of a pass.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedFeature {
    pub index: usize,
    pub feature_id: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InstalledFeature {
    pub index: usize,
    pub feature_id: String,
    pub kind: GeometryKind,
    pub source_id: String,
    /// Layers over `source_id`, bottom to top. Empty for inert kinds.
    pub layer_ids: Vec<String>,
    /// Layer carrying pointer handlers, when the feature has a title or data.
    pub interactive_layer: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CameraChange {
    Unchanged,
    Fitted(Corners),
    Jumped(CameraOptions),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileReport {
    pub removed_layers: usize,
    pub removed_sources: usize,
    pub installed: Vec<InstalledFeature>,
    pub skipped: Vec<SkippedFeature>,
    pub camera: CameraChange,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("teardown failed while removing `{id}`: {source}")]
pub struct TeardownError {
    pub id: String,
    #[source]
    pub source: RendererError,
}

/// Outcome of installing a single feature.
struct Installed {
    source_id: String,
    layer_ids: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Reconciler {
    config: EngineConfig,
    names: ObjectNames,
    paints: PaintDefaults,
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Reconciler {
    pub fn new(config: EngineConfig) -> Self {
        let names = ObjectNames::new(config.prefix.clone());
        Self {
            config,
            names,
            paints: PaintDefaults::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn names(&self) -> &ObjectNames {
        &self.names
    }

    /// Removes every owned layer, then every owned source.
    ///
    /// Layers go top-down so no source is removed while a layer still uses
    /// it. Returns `(layers, sources)` removed.
    pub fn teardown<R>(&self, renderer: &mut R) -> Result<(usize, usize), TeardownError>
    where
        R: MapRenderer + ?Sized,
    {
        let objects = renderer.style_objects();
        let mut layers = 0;
        for id in objects.layers.iter().rev().filter(|id| self.names.owns(id)) {
            renderer
                .remove_layer(id)
                .map_err(|source| TeardownError {
                    id: id.clone(),
                    source,
                })?;
            layers += 1;
        }
        let mut sources = 0;
        for id in objects.sources.iter().filter(|id| self.names.owns(id)) {
            renderer
                .remove_source(id)
                .map_err(|source| TeardownError {
                    id: id.clone(),
                    source,
                })?;
            sources += 1;
        }
        Ok((layers, sources))
    }

    /// Applies `visualization` as a full replacement of the owned objects.
    pub fn reconcile<R>(
        &self,
        renderer: &mut R,
        visualization: &Visualization,
    ) -> Result<ReconcileReport, TeardownError>
    where
        R: MapRenderer + ?Sized,
    {
        let (removed_layers, removed_sources) = self.teardown(renderer)?;
        debug!(removed_layers, removed_sources, "owned objects removed");

        let mut installed = Vec::new();
        let mut skipped = Vec::new();
        let mut shapes = Vec::new();

        for (index, feature) in visualization.features.iter().enumerate() {
            let outcome = prepare(feature.geometry.as_ref())
                .map_err(SkipReason::from)
                .and_then(|valid| {
                    self.install(renderer, index, feature, &valid)
                        .map(|done| (valid, done))
                        .map_err(SkipReason::from)
                });
            match outcome {
                Ok((valid, done)) => {
                    installed.push(InstalledFeature {
                        index,
                        feature_id: feature.identity().to_string(),
                        kind: valid.kind,
                        source_id: done.source_id,
                        layer_ids: done.layer_ids,
                        interactive_layer: None,
                    });
                    shapes.push(valid.shape);
                }
                Err(reason) => {
                    warn!(index, feature = feature.identity(), %reason, "feature skipped");
                    skipped.push(SkippedFeature {
                        index,
                        feature_id: feature.identity().to_string(),
                        reason,
                    });
                }
            }
        }

        for (entry, shape) in installed.iter_mut().zip(&shapes) {
            let feature = &visualization.features[entry.index];
            if !feature.properties.is_interactive() {
                continue;
            }
            // Polygons put their fill first, which is the clickable surface.
            let Some(layer_id) = entry.layer_ids.first() else {
                continue;
            };
            match interaction::bind(
                renderer,
                layer_id,
                feature,
                shape,
                self.config.point_trigger,
            ) {
                Ok(()) => entry.interactive_layer = Some(layer_id.clone()),
                Err(err) => warn!(layer = %layer_id, %err, "interaction binding failed"),
            }
        }

        let camera = self.place_camera(renderer, visualization, &shapes);

        info!(
            installed = installed.len(),
            skipped = skipped.len(),
            "reconciliation pass complete"
        );
        Ok(ReconcileReport {
            removed_layers,
            removed_sources,
            installed,
            skipped,
            camera,
        })
    }

    fn install<R>(
        &self,
        renderer: &mut R,
        index: usize,
        feature: &Feature,
        valid: &ValidGeometry,
    ) -> Result<Installed, RendererError>
    where
        R: MapRenderer + ?Sized,
    {
        let source_id = self.names.source(index);
        let data = json!({
            "type": "FeatureCollection",
            "features": [feature.to_geojson(&valid.coordinates)],
        });
        renderer.add_source(&source_id, SourceSpec::geojson(data))?;

        let mut layer_ids = Vec::new();
        for layer in self.plan_layers(index, &source_id, &valid.kind, feature.style()) {
            let id = layer.id.clone();
            if let Err(err) = renderer.add_layer(layer) {
                self.roll_back(renderer, &source_id, &layer_ids);
                return Err(err);
            }
            layer_ids.push(id);
        }

        Ok(Installed {
            source_id,
            layer_ids,
        })
    }

    /// Best-effort removal of a half-installed feature. Anything left behind
    /// still carries the prefix and goes at the next teardown.
    fn roll_back<R>(&self, renderer: &mut R, source_id: &str, layer_ids: &[String])
    where
        R: MapRenderer + ?Sized,
    {
        for id in layer_ids.iter().rev() {
            if let Err(err) = renderer.remove_layer(id) {
                debug!(layer = %id, %err, "rollback left layer behind");
            }
        }
        if let Err(err) = renderer.remove_source(source_id) {
            debug!(source = %source_id, %err, "rollback left source behind");
        }
    }

    /// Layers for one feature, chosen by geometry kind. Unknown kinds get
    /// none and their source stays inert.
    pub fn plan_layers(
        &self,
        index: usize,
        source_id: &str,
        kind: &GeometryKind,
        style: &FeatureStyle,
    ) -> Vec<LayerSpec> {
        match kind {
            GeometryKind::Point => vec![LayerSpec::new(
                self.names.layer(index),
                source_id,
                self.paints.circle(style),
            )],
            GeometryKind::LineString => vec![LayerSpec::new(
                self.names.layer(index),
                source_id,
                self.paints.line(style),
            )],
            GeometryKind::Polygon => vec![
                LayerSpec::new(self.names.fill(index), source_id, self.paints.fill(style)),
                LayerSpec::new(
                    self.names.outline(index),
                    source_id,
                    self.paints.outline(style),
                ),
            ],
            GeometryKind::Other(_) => Vec::new(),
        }
    }

    fn place_camera<R>(
        &self,
        renderer: &mut R,
        visualization: &Visualization,
        shapes: &[Shape],
    ) -> CameraChange
    where
        R: MapRenderer + ?Sized,
    {
        let config = &visualization.config;
        if config.fit_bounds {
            let bounds = match config.bounds {
                Some(explicit) => LngLatBounds::from(explicit),
                None => viewport::bounds_of_shapes(shapes),
            };
            if let Some(corners) = viewport::fit(renderer, &bounds, self.config.fit) {
                return CameraChange::Fitted(corners);
            }
            if !visualization.is_empty() {
                return CameraChange::Unchanged;
            }
        }

        let options = CameraOptions {
            center: config.center,
            zoom: config.zoom,
        };
        if options.is_empty() {
            return CameraChange::Unchanged;
        }
        renderer.jump_to(options);
        CameraChange::Jumped(options)
    }
}

#[cfg(test)]
mod tests {
    use super::{CameraChange, Reconciler, SkipReason};
    use crate::config::{EngineConfig, Trigger};
    use foundation::{Corners, LngLat};
    use model::{GeometryIssue, Visualization};
    use pretty_assertions::assert_eq;
    use render::memory::CameraMove;
    use render::{
        CameraOptions, Cursor, MapRenderer, MemoryRenderer, Paint, PointerEventKind, RendererError,
        StyleDocument,
    };
    use serde_json::json;

    fn vis(value: serde_json::Value) -> Visualization {
        serde_json::from_value(value).unwrap()
    }

    fn basemap() -> MemoryRenderer {
        let mut renderer = MemoryRenderer::new();
        renderer
            .set_style(&StyleDocument::new(json!({
                "version": 8,
                "sources": { "streets": { "type": "vector" } },
                "layers": [
                    { "id": "background", "type": "background" },
                    { "id": "roads", "type": "line", "source": "streets" }
                ]
            })))
            .unwrap();
        renderer
    }

    fn point(id: &str, lng: f64, lat: f64) -> serde_json::Value {
        json!({
            "id": id,
            "geometry": { "type": "Point", "coordinates": [lng, lat] },
            "properties": { "title": id }
        })
    }

    #[test]
    fn same_input_twice_yields_same_objects() {
        let input = vis(json!({
            "features": [
                point("a", -97.7, 30.2),
                {
                    "geometry": { "type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]]] },
                    "properties": { "data": { "population": 1200 } }
                }
            ]
        }));
        let reconciler = Reconciler::default();
        let mut renderer = basemap();

        reconciler.reconcile(&mut renderer, &input).unwrap();
        let first = renderer.objects();
        let second_report = reconciler.reconcile(&mut renderer, &input).unwrap();

        assert_eq!(renderer.objects(), first);
        assert_eq!(second_report.removed_layers, 3);
        assert_eq!(second_report.removed_sources, 2);
        assert_eq!(renderer.handler_count("custom-layer-0"), 3);
        assert_eq!(renderer.handler_count("custom-layer-1-fill"), 3);
    }

    #[test]
    fn invalid_feature_is_skipped_and_the_rest_installed() {
        let input = vis(json!({
            "features": [
                point("good", 10.0, 20.0),
                { "id": "bad", "geometry": { "type": "Point" } }
            ]
        }));
        let mut renderer = basemap();
        let report = Reconciler::default().reconcile(&mut renderer, &input).unwrap();

        assert_eq!(report.installed.len(), 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].feature_id, "bad");
        assert_eq!(
            report.skipped[0].reason,
            SkipReason::Geometry(GeometryIssue::MissingCoordinates {
                kind: "Point".to_string()
            })
        );
        let objects = renderer.objects();
        assert_eq!(objects.sources.len(), 1);
        assert_eq!(objects.layers.len(), 1);
    }

    #[test]
    fn missing_geometry_is_skipped() {
        let input = vis(json!({ "features": [ { "properties": { "title": "nowhere" } } ] }));
        let mut renderer = basemap();
        let report = Reconciler::default().reconcile(&mut renderer, &input).unwrap();

        assert!(report.installed.is_empty());
        assert_eq!(
            report.skipped[0].reason,
            SkipReason::Geometry(GeometryIssue::MissingGeometry)
        );
        assert_eq!(report.skipped[0].feature_id, "feature-0");
    }

    #[test]
    fn feature_without_geometry_leaves_its_neighbour_alone() {
        let input = vis(json!({
            "features": [
                { "id": "nowhere", "properties": { "title": "nowhere" } },
                point("charger", -97.74, 30.27)
            ]
        }));
        let mut renderer = basemap();
        let report = Reconciler::default().reconcile(&mut renderer, &input).unwrap();

        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].feature_id, "nowhere");
        assert_eq!(
            report.skipped[0].reason,
            SkipReason::Geometry(GeometryIssue::MissingGeometry)
        );
        assert_eq!(report.installed.len(), 1);
        assert_eq!(report.installed[0].feature_id, "charger");
        let objects = renderer.objects();
        assert_eq!(
            objects.sources.iter().map(|(id, _)| id.as_str()).collect::<Vec<_>>(),
            vec!["custom-source-1"]
        );
        assert_eq!(objects.layers.len(), 1);
        assert_eq!(objects.layers[0].id, "custom-layer-1");
    }

    #[test]
    fn previous_objects_are_gone_before_new_ones_land() {
        let reconciler = Reconciler::default();
        let mut renderer = basemap();
        let three = vis(json!({
            "features": [point("a", 0.0, 0.0), point("b", 1.0, 1.0), point("c", 2.0, 2.0)]
        }));
        reconciler.reconcile(&mut renderer, &three).unwrap();
        assert_eq!(renderer.objects().layers.len(), 3);

        let one = vis(json!({ "features": [point("z", 5.0, 5.0)] }));
        let report = reconciler.reconcile(&mut renderer, &one).unwrap();

        assert_eq!(report.removed_layers, 3);
        assert_eq!(report.removed_sources, 3);
        let objects = renderer.objects();
        assert_eq!(
            objects.sources.iter().map(|(id, _)| id.as_str()).collect::<Vec<_>>(),
            vec!["custom-source-0"]
        );
        assert_eq!(objects.layers.len(), 1);
        assert_eq!(renderer.handler_count("custom-layer-1"), 0);
        assert_eq!(renderer.handler_count("custom-layer-2"), 0);
    }

    #[test]
    fn geometry_kind_selects_layers_and_paint() {
        let input = vis(json!({
            "features": [
                {
                    "geometry": { "type": "LineString", "coordinates": [[0, 0], [1, 1]] },
                    "properties": { "style": { "weight": 4 } }
                },
                {
                    "geometry": { "type": "Polygon", "coordinates": [[[0, 0], [2, 0], [2, 2], [0, 0]]] }
                }
            ]
        }));
        let mut renderer = basemap();
        let report = Reconciler::default().reconcile(&mut renderer, &input).unwrap();

        assert_eq!(report.installed[0].layer_ids, vec!["custom-layer-0"]);
        assert_eq!(
            renderer.layer("custom-layer-0").unwrap().paint,
            Paint::Line {
                color: "#4F46E5".to_string(),
                width: 4.0,
                opacity: 1.0
            }
        );
        assert_eq!(
            report.installed[1].layer_ids,
            vec!["custom-layer-1-fill", "custom-layer-1-outline"]
        );
        assert_eq!(
            renderer.layer("custom-layer-1-fill").unwrap().paint,
            Paint::Fill {
                color: "#4F46E5".to_string(),
                opacity: 0.3
            }
        );
        assert_eq!(
            renderer.layer("custom-layer-1-outline").unwrap().paint,
            Paint::Line {
                color: "#4F46E5".to_string(),
                width: 2.0,
                opacity: 1.0
            }
        );
    }

    #[test]
    fn basemap_objects_survive_every_pass() {
        let mut renderer = basemap();
        let reconciler = Reconciler::default();
        reconciler
            .reconcile(&mut renderer, &vis(json!({ "features": [point("a", 1.0, 1.0)] })))
            .unwrap();
        reconciler
            .reconcile(&mut renderer, &vis(json!({ "features": [] })))
            .unwrap();

        let objects = renderer.style_objects();
        assert_eq!(objects.layers, vec!["background", "roads"]);
        assert_eq!(objects.sources, vec!["streets"]);
    }

    #[test]
    fn failed_teardown_aborts_the_pass() {
        let reconciler = Reconciler::default();
        let mut renderer = basemap();
        reconciler
            .reconcile(&mut renderer, &vis(json!({ "features": [point("a", 1.0, 1.0)] })))
            .unwrap();
        renderer.fail_removals(true);

        let err = reconciler
            .reconcile(&mut renderer, &vis(json!({ "features": [point("b", 2.0, 2.0)] })))
            .unwrap_err();

        assert_eq!(err.id, "custom-layer-0");
        assert!(matches!(err.source, RendererError::Rejected { .. }));
        assert_eq!(renderer.objects().layers.len(), 1);
    }

    #[test]
    fn renderer_rejection_skips_only_that_feature() {
        let mut renderer = basemap();
        renderer.reject_id("custom-layer-1-outline");
        let input = vis(json!({
            "features": [
                point("a", 0.0, 0.0),
                { "id": "poly", "geometry": { "type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]]] } },
                point("c", 3.0, 3.0)
            ]
        }));
        let report = Reconciler::default().reconcile(&mut renderer, &input).unwrap();

        assert_eq!(
            report.installed.iter().map(|f| f.index).collect::<Vec<_>>(),
            vec![0, 2]
        );
        assert!(matches!(report.skipped[0].reason, SkipReason::Renderer(_)));
        assert!(renderer.source("custom-source-1").is_none());
        assert!(renderer.layer("custom-layer-1-fill").is_none());
        assert!(renderer.layer("custom-layer-2").is_some());
    }

    #[test]
    fn partial_binding_is_undone_and_the_feature_stays() {
        let input = vis(json!({ "features": [point("a", 0.0, 0.0), point("b", 1.0, 1.0)] }));
        let mut renderer = basemap();
        renderer.fail_handlers_after(4);
        let report = Reconciler::default().reconcile(&mut renderer, &input).unwrap();

        assert_eq!(report.installed.len(), 2);
        assert_eq!(
            report.installed[0].interactive_layer.as_deref(),
            Some("custom-layer-0")
        );
        assert_eq!(report.installed[1].interactive_layer, None);
        assert_eq!(renderer.handler_count("custom-layer-0"), 3);
        assert_eq!(renderer.handler_count("custom-layer-1"), 0);
        assert!(renderer.layer("custom-layer-1").is_some());
    }

    #[test]
    fn unknown_kind_installs_an_inert_source() {
        let input = vis(json!({
            "features": [
                { "geometry": { "type": "MultiPoint", "coordinates": [[0, 0], [1, 1]] }, "properties": { "title": "x" } }
            ]
        }));
        let mut renderer = basemap();
        let report = Reconciler::default().reconcile(&mut renderer, &input).unwrap();

        assert!(report.installed[0].layer_ids.is_empty());
        assert_eq!(report.installed[0].interactive_layer, None);
        assert!(renderer.source("custom-source-0").is_some());
        assert!(renderer.objects().layers.is_empty());
        assert_eq!(report.camera, CameraChange::Unchanged);
    }

    #[test]
    fn camera_fits_the_installed_features() {
        let input = vis(json!({
            "features": [point("a", -97.7, 30.2), point("b", -95.3, 29.7)]
        }));
        let mut renderer = basemap();
        let report = Reconciler::default().reconcile(&mut renderer, &input).unwrap();

        let expected = Corners {
            south_west: LngLat::new(-97.7, 29.7),
            north_east: LngLat::new(-95.3, 30.2),
        };
        assert_eq!(report.camera, CameraChange::Fitted(expected));
        assert!(matches!(
            renderer.camera_moves(),
            [CameraMove::FitBounds(c, o)] if *c == expected && o.padding == 50.0 && o.duration_ms == 1000
        ));
    }

    #[test]
    fn explicit_bounds_win_over_computed_ones() {
        let input = vis(json!({
            "features": [point("a", 1.0, 1.0)],
            "config": { "bounds": { "southWest": [-10, -10], "northEast": [10, 10] } }
        }));
        let mut renderer = basemap();
        let report = Reconciler::default().reconcile(&mut renderer, &input).unwrap();

        assert_eq!(
            report.camera,
            CameraChange::Fitted(Corners {
                south_west: LngLat::new(-10.0, -10.0),
                north_east: LngLat::new(10.0, 10.0),
            })
        );
    }

    #[test]
    fn without_fit_the_configured_center_is_used() {
        let input = vis(json!({
            "features": [point("a", 1.0, 1.0)],
            "config": { "fitBounds": false, "center": [-99.0, 31.0], "zoom": 7 }
        }));
        let mut renderer = basemap();
        let report = Reconciler::default().reconcile(&mut renderer, &input).unwrap();

        let options = CameraOptions {
            center: Some(LngLat::new(-99.0, 31.0)),
            zoom: Some(7.0),
        };
        assert_eq!(report.camera, CameraChange::Jumped(options));
        assert_eq!(renderer.camera_moves(), &[CameraMove::JumpTo(options)]);
        assert_eq!(renderer.camera().zoom, 7.0);
    }

    #[test]
    fn empty_update_clears_without_moving_the_camera() {
        let mut renderer = basemap();
        let report = Reconciler::default()
            .reconcile(&mut renderer, &vis(json!({ "features": [] })))
            .unwrap();

        assert_eq!(report.camera, CameraChange::Unchanged);
        assert!(renderer.camera_moves().is_empty());
    }

    #[test]
    fn click_opens_popup_and_hover_sets_cursor() {
        let input = vis(json!({
            "features": [{
                "geometry": { "type": "Polygon", "coordinates": [[[0, 0], [4, 0], [4, 4], [0, 0]]] },
                "properties": { "title": "ZIP 78701", "data": { "Population": 1000 } }
            }]
        }));
        let mut renderer = basemap();
        let report = Reconciler::default().reconcile(&mut renderer, &input).unwrap();
        assert_eq!(
            report.installed[0].interactive_layer.as_deref(),
            Some("custom-layer-0-fill")
        );

        renderer.dispatch(PointerEventKind::Enter, "custom-layer-0-fill", LngLat::new(1.0, 1.0));
        assert_eq!(renderer.cursor(), Cursor::Pointer);
        renderer.dispatch(PointerEventKind::Click, "custom-layer-0-fill", LngLat::new(1.0, 2.0));
        let popup = renderer.popup().unwrap();
        assert_eq!(popup.anchor, LngLat::new(1.0, 2.0));
        assert_eq!(popup.content.title.as_deref(), Some("ZIP 78701"));
        renderer.dispatch(PointerEventKind::Leave, "custom-layer-0-fill", LngLat::new(9.0, 9.0));
        assert_eq!(renderer.cursor(), Cursor::Default);
    }

    #[test]
    fn hover_trigger_opens_point_popups_on_enter() {
        let reconciler = Reconciler::new(EngineConfig {
            point_trigger: Trigger::Hover,
            ..EngineConfig::default()
        });
        let mut renderer = basemap();
        reconciler
            .reconcile(&mut renderer, &vis(json!({ "features": [point("a", 3.0, 4.0)] })))
            .unwrap();

        renderer.dispatch(PointerEventKind::Enter, "custom-layer-0", LngLat::new(3.1, 4.1));
        assert_eq!(renderer.popup().unwrap().anchor, LngLat::new(3.0, 4.0));
        renderer.dispatch(PointerEventKind::Leave, "custom-layer-0", LngLat::new(9.0, 9.0));
        assert!(renderer.popup().is_none());
    }

    #[test]
    fn custom_prefix_leaves_other_prefixes_alone() {
        let mut renderer = basemap();
        Reconciler::default()
            .reconcile(&mut renderer, &vis(json!({ "features": [point("a", 1.0, 1.0)] })))
            .unwrap();
        let other = Reconciler::new(EngineConfig {
            prefix: "overlay".to_string(),
            ..EngineConfig::default()
        });
        let report = other
            .reconcile(&mut renderer, &vis(json!({ "features": [point("b", 2.0, 2.0)] })))
            .unwrap();

        assert_eq!(report.removed_layers, 0);
        assert!(renderer.layer("custom-layer-0").is_some());
        assert!(renderer.layer("overlay-layer-0").is_some());
    }
}
