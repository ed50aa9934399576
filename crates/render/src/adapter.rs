//! The renderer seam.
//!
//! Everything the engine does to a live map goes through [`MapRenderer`], so
//! renderer API churn stays inside the adapter implementations.

use foundation::Corners;

use crate::camera::{CameraOptions, FitOptions};
use crate::interaction::{Handler, PointerEventKind};
use crate::objects::{LayerSpec, SourceSpec};
use crate::style::StyleDocument;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RendererError {
    #[error("source `{0}` already exists")]
    DuplicateSource(String),
    #[error("layer `{0}` already exists")]
    DuplicateLayer(String),
    #[error("source `{0}` does not exist")]
    MissingSource(String),
    #[error("layer `{0}` does not exist")]
    MissingLayer(String),
    #[error("source `{source_id}` is still used by layer `{layer_id}`")]
    SourceInUse { source_id: String, layer_id: String },
    #[error("renderer rejected `{id}`: {reason}")]
    Rejected { id: String, reason: String },
    #[error("renderer has been destroyed")]
    Destroyed,
}

/// Current style object graph, in renderer order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StyleObjects {
    /// Layer ids, bottom to top.
    pub layers: Vec<String>,
    pub sources: Vec<String>,
}

/// Typed surface of a stateful map renderer.
///
/// Implementations must enforce the usual style rules: ids are unique, a
/// layer's source must exist, and a source cannot be removed while a layer
/// still references it. `remove_layer` must also drop every handler bound to
/// that layer.
pub trait MapRenderer {
    fn style_objects(&self) -> StyleObjects;

    /// Replaces the basemap style. Called once, when the style document has
    /// been acquired.
    fn set_style(&mut self, style: &StyleDocument) -> Result<(), RendererError>;

    fn add_source(&mut self, id: &str, source: SourceSpec) -> Result<(), RendererError>;

    fn add_layer(&mut self, layer: LayerSpec) -> Result<(), RendererError>;

    fn remove_layer(&mut self, id: &str) -> Result<(), RendererError>;

    fn remove_source(&mut self, id: &str) -> Result<(), RendererError>;

    fn on(
        &mut self,
        kind: PointerEventKind,
        layer_id: &str,
        handler: Handler,
    ) -> Result<(), RendererError>;

    /// Drops every handler bound to `layer_id`, leaving the layer in place.
    fn off(&mut self, layer_id: &str);

    /// Smooth camera transition so `bounds` fills the viewport.
    fn fit_bounds(&mut self, bounds: Corners, options: FitOptions);

    fn jump_to(&mut self, camera: CameraOptions);

    /// Releases every renderer resource. Further calls fail or no-op.
    fn destroy(&mut self);
}
