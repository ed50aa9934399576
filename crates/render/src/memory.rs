//! Headless renderer.
//!
//! Keeps the style object graph, camera, cursor and popup in memory and
//! applies the same rules a browser map library does. Used by tests, the
//! replay tool and any host without a real map.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use foundation::{Corners, LngLat};
use serde_json::Value;
use tracing::debug;

use crate::adapter::{MapRenderer, RendererError, StyleObjects};
use crate::camera::{Camera, CameraOptions, FitOptions};
use crate::interaction::{Cursor, Handler, PointerEvent, PointerEventKind, Popup, Reaction};
use crate::objects::{LayerSpec, SourceSpec};
use crate::style::StyleDocument;

#[derive(Debug, Clone, PartialEq)]
enum RenderedLayer {
    Base { id: String, source: Option<String> },
    Custom(LayerSpec),
}

impl RenderedLayer {
    fn id(&self) -> &str {
        match self {
            RenderedLayer::Base { id, .. } => id,
            RenderedLayer::Custom(spec) => &spec.id,
        }
    }

    fn source(&self) -> Option<&str> {
        match self {
            RenderedLayer::Base { source, .. } => source.as_deref(),
            RenderedLayer::Custom(spec) => Some(&spec.source),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum RenderedSource {
    Base(Value),
    Custom(SourceSpec),
}

/// Camera requests in the order they were made.
#[derive(Debug, Clone, PartialEq)]
pub enum CameraMove {
    JumpTo(CameraOptions),
    FitBounds(Corners, FitOptions),
}

/// Snapshot of the objects added through `add_source` / `add_layer`.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RenderedObjects {
    pub sources: Vec<(String, SourceSpec)>,
    pub layers: Vec<LayerSpec>,
}

pub struct MemoryRenderer {
    layers: Vec<RenderedLayer>,
    sources: Vec<(String, RenderedSource)>,
    handlers: BTreeMap<String, Vec<(PointerEventKind, Handler)>>,
    camera: Camera,
    camera_moves: Vec<CameraMove>,
    cursor: Cursor,
    popup: Option<Popup>,
    destroyed: bool,
    rejected_ids: BTreeSet<String>,
    rejected_geometries: BTreeSet<String>,
    fail_removals: bool,
    handler_budget: Option<usize>,
}

impl fmt::Debug for MemoryRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryRenderer")
            .field("layers", &self.layers.len())
            .field("sources", &self.sources.len())
            .field("handlers", &self.handler_total())
            .field("camera", &self.camera)
            .field("cursor", &self.cursor)
            .field("destroyed", &self.destroyed)
            .finish()
    }
}

impl Default for MemoryRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRenderer {
    pub fn new() -> Self {
        Self {
            layers: Vec::new(),
            sources: Vec::new(),
            handlers: BTreeMap::new(),
            camera: Camera::new(LngLat::new(0.0, 0.0), 0.0),
            camera_moves: Vec::new(),
            cursor: Cursor::Default,
            popup: None,
            destroyed: false,
            rejected_ids: BTreeSet::new(),
            rejected_geometries: BTreeSet::new(),
            fail_removals: false,
            handler_budget: None,
        }
    }

    /// Makes `add_source` / `add_layer` fail for this id.
    pub fn reject_id(&mut self, id: impl Into<String>) {
        self.rejected_ids.insert(id.into());
    }

    /// Makes `add_source` fail for sources holding this geometry type.
    pub fn reject_geometry(&mut self, tag: impl Into<String>) {
        self.rejected_geometries.insert(tag.into());
    }

    /// Makes every removal fail.
    pub fn fail_removals(&mut self, fail: bool) {
        self.fail_removals = fail;
    }

    /// Lets `on` succeed `count` more times, then fail.
    pub fn fail_handlers_after(&mut self, count: usize) {
        self.handler_budget = Some(count);
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn camera(&self) -> Camera {
        self.camera
    }

    pub fn camera_moves(&self) -> &[CameraMove] {
        &self.camera_moves
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn popup(&self) -> Option<&Popup> {
        self.popup.as_ref()
    }

    pub fn layer(&self, id: &str) -> Option<&LayerSpec> {
        self.layers.iter().find_map(|l| match l {
            RenderedLayer::Custom(spec) if spec.id == id => Some(spec),
            _ => None,
        })
    }

    pub fn source(&self, id: &str) -> Option<&SourceSpec> {
        self.sources.iter().find_map(|(sid, s)| match s {
            RenderedSource::Custom(spec) if sid == id => Some(spec),
            _ => None,
        })
    }

    pub fn handler_count(&self, layer_id: &str) -> usize {
        self.handlers.get(layer_id).map_or(0, Vec::len)
    }

    fn handler_total(&self) -> usize {
        self.handlers.values().map(Vec::len).sum()
    }

    pub fn objects(&self) -> RenderedObjects {
        RenderedObjects {
            sources: self
                .sources
                .iter()
                .filter_map(|(id, s)| match s {
                    RenderedSource::Custom(spec) => Some((id.clone(), spec.clone())),
                    RenderedSource::Base(_) => None,
                })
                .collect(),
            layers: self
                .layers
                .iter()
                .filter_map(|l| match l {
                    RenderedLayer::Custom(spec) => Some(spec.clone()),
                    RenderedLayer::Base { .. } => None,
                })
                .collect(),
        }
    }

    /// Delivers a pointer event to the handlers bound on `layer_id` and
    /// applies their reactions. Returns how many handlers ran.
    pub fn dispatch(&mut self, kind: PointerEventKind, layer_id: &str, lng_lat: LngLat) -> usize {
        if self.destroyed {
            return 0;
        }
        let event = PointerEvent {
            kind,
            layer_id: layer_id.to_string(),
            lng_lat,
        };
        let mut ran = 0;
        let mut reactions = Vec::new();
        for (bound, handler) in self.handlers.get(layer_id).into_iter().flatten() {
            if *bound != kind {
                continue;
            }
            ran += 1;
            reactions.extend(handler(&event));
        }
        for reaction in reactions {
            match reaction {
                Reaction::SetCursor(cursor) => self.cursor = cursor,
                // A new popup replaces the open one.
                Reaction::ShowPopup(popup) => self.popup = Some(popup),
                Reaction::ClosePopup => self.popup = None,
            }
        }
        ran
    }

    pub fn close_popup(&mut self) {
        self.popup = None;
    }

    fn check_alive(&self) -> Result<(), RendererError> {
        if self.destroyed {
            return Err(RendererError::Destroyed);
        }
        Ok(())
    }

    fn has_source(&self, id: &str) -> bool {
        self.sources.iter().any(|(sid, _)| sid == id)
    }

    fn has_layer(&self, id: &str) -> bool {
        self.layers.iter().any(|l| l.id() == id)
    }
}

impl MapRenderer for MemoryRenderer {
    fn style_objects(&self) -> StyleObjects {
        StyleObjects {
            layers: self.layers.iter().map(|l| l.id().to_string()).collect(),
            sources: self.sources.iter().map(|(id, _)| id.clone()).collect(),
        }
    }

    fn set_style(&mut self, style: &StyleDocument) -> Result<(), RendererError> {
        self.check_alive()?;
        self.handlers.clear();
        self.sources = style
            .source_ids()
            .into_iter()
            .map(|id| {
                let body = style.as_value()["sources"][id.as_str()].clone();
                (id, RenderedSource::Base(body))
            })
            .collect();
        self.layers = style
            .layers()
            .into_iter()
            .map(|(id, source)| RenderedLayer::Base { id, source })
            .collect();
        debug!(
            layers = self.layers.len(),
            sources = self.sources.len(),
            "style applied"
        );
        Ok(())
    }

    fn add_source(&mut self, id: &str, source: SourceSpec) -> Result<(), RendererError> {
        self.check_alive()?;
        if self.rejected_ids.contains(id) {
            return Err(RendererError::Rejected {
                id: id.to_string(),
                reason: "rejected by renderer".to_string(),
            });
        }
        if let Some(tag) = source
            .geometry_types()
            .into_iter()
            .find(|t| self.rejected_geometries.contains(*t))
        {
            return Err(RendererError::Rejected {
                id: id.to_string(),
                reason: format!("unsupported geometry type `{tag}`"),
            });
        }
        if self.has_source(id) {
            return Err(RendererError::DuplicateSource(id.to_string()));
        }
        self.sources
            .push((id.to_string(), RenderedSource::Custom(source)));
        Ok(())
    }

    fn add_layer(&mut self, layer: LayerSpec) -> Result<(), RendererError> {
        self.check_alive()?;
        if self.rejected_ids.contains(&layer.id) {
            return Err(RendererError::Rejected {
                id: layer.id.clone(),
                reason: "rejected by renderer".to_string(),
            });
        }
        if self.has_layer(&layer.id) {
            return Err(RendererError::DuplicateLayer(layer.id));
        }
        if !self.has_source(&layer.source) {
            return Err(RendererError::MissingSource(layer.source));
        }
        self.layers.push(RenderedLayer::Custom(layer));
        Ok(())
    }

    fn remove_layer(&mut self, id: &str) -> Result<(), RendererError> {
        self.check_alive()?;
        if self.fail_removals {
            return Err(RendererError::Rejected {
                id: id.to_string(),
                reason: "removal failed".to_string(),
            });
        }
        let Some(pos) = self.layers.iter().position(|l| l.id() == id) else {
            return Err(RendererError::MissingLayer(id.to_string()));
        };
        self.layers.remove(pos);
        self.handlers.remove(id);
        Ok(())
    }

    fn remove_source(&mut self, id: &str) -> Result<(), RendererError> {
        self.check_alive()?;
        if self.fail_removals {
            return Err(RendererError::Rejected {
                id: id.to_string(),
                reason: "removal failed".to_string(),
            });
        }
        if let Some(layer) = self.layers.iter().find(|l| l.source() == Some(id)) {
            return Err(RendererError::SourceInUse {
                source_id: id.to_string(),
                layer_id: layer.id().to_string(),
            });
        }
        let Some(pos) = self.sources.iter().position(|(sid, _)| sid == id) else {
            return Err(RendererError::MissingSource(id.to_string()));
        };
        self.sources.remove(pos);
        Ok(())
    }

    fn on(
        &mut self,
        kind: PointerEventKind,
        layer_id: &str,
        handler: Handler,
    ) -> Result<(), RendererError> {
        self.check_alive()?;
        if !self.has_layer(layer_id) {
            return Err(RendererError::MissingLayer(layer_id.to_string()));
        }
        match &mut self.handler_budget {
            Some(0) => {
                return Err(RendererError::Rejected {
                    id: layer_id.to_string(),
                    reason: "handler refused".to_string(),
                });
            }
            Some(left) => *left -= 1,
            None => {}
        }
        self.handlers
            .entry(layer_id.to_string())
            .or_default()
            .push((kind, handler));
        Ok(())
    }

    fn off(&mut self, layer_id: &str) {
        self.handlers.remove(layer_id);
    }

    fn fit_bounds(&mut self, bounds: Corners, options: FitOptions) {
        if self.destroyed {
            return;
        }
        let sw = bounds.south_west;
        let ne = bounds.north_east;
        self.camera.center = LngLat::new((sw.lng + ne.lng) * 0.5, (sw.lat + ne.lat) * 0.5);
        self.camera_moves.push(CameraMove::FitBounds(bounds, options));
    }

    fn jump_to(&mut self, camera: CameraOptions) {
        if self.destroyed {
            return;
        }
        camera.apply_to(&mut self.camera);
        self.camera_moves.push(CameraMove::JumpTo(camera));
    }

    fn destroy(&mut self) {
        self.layers.clear();
        self.sources.clear();
        self.handlers.clear();
        self.popup = None;
        self.cursor = Cursor::Default;
        self.destroyed = true;
    }
}
