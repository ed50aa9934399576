//! Pointer behaviour for installed layers.
//!
//! Handlers capture a snapshot of the feature they were bound for and live
//! exactly as long as their layer: the renderer drops them in `remove_layer`,
//! which the next reconciliation pass always calls before binding again.

use foundation::LngLat;
use model::{Feature, Shape};
use render::{
    Cursor, MapRenderer, PointerEventKind, Popup, PopupContent, Reaction, RendererError,
};

use crate::config::Trigger;

/// Where a feature's popup is pinned.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Anchor {
    /// A point's own position.
    Fixed(LngLat),
    /// Wherever the pointer is; lines and polygons have no canonical anchor.
    Pointer,
}

impl Anchor {
    pub fn for_shape(shape: &Shape) -> Self {
        match shape {
            Shape::Point(p) => Anchor::Fixed(*p),
            _ => Anchor::Pointer,
        }
    }

    pub fn resolve(&self, pointer: LngLat) -> LngLat {
        match self {
            Anchor::Fixed(p) => *p,
            Anchor::Pointer => pointer,
        }
    }
}

/// Title heading followed by every `data` row.
pub fn popup_content(feature: &Feature) -> PopupContent {
    PopupContent {
        title: feature.title().map(str::to_string),
        rows: feature.properties.rows(),
    }
}

/// Wires cursor and popup behaviour onto `layer_id` for `feature`.
///
/// Points open their popup on `point_trigger`; every other shape opens it on
/// click. Binding is all or nothing: on failure the layer is left with no
/// handlers.
pub fn bind<R>(
    renderer: &mut R,
    layer_id: &str,
    feature: &Feature,
    shape: &Shape,
    point_trigger: Trigger,
) -> Result<(), RendererError>
where
    R: MapRenderer + ?Sized,
{
    let bound = bind_handlers(renderer, layer_id, feature, shape, point_trigger);
    if bound.is_err() {
        renderer.off(layer_id);
    }
    bound
}

fn bind_handlers<R>(
    renderer: &mut R,
    layer_id: &str,
    feature: &Feature,
    shape: &Shape,
    point_trigger: Trigger,
) -> Result<(), RendererError>
where
    R: MapRenderer + ?Sized,
{
    let hover = matches!(shape, Shape::Point(_)) && point_trigger == Trigger::Hover;
    let content = popup_content(feature);
    let anchor = Anchor::for_shape(shape);

    renderer.on(
        PointerEventKind::Enter,
        layer_id,
        Box::new(|_| Some(Reaction::SetCursor(Cursor::Pointer))),
    )?;
    renderer.on(
        PointerEventKind::Leave,
        layer_id,
        Box::new(|_| Some(Reaction::SetCursor(Cursor::Default))),
    )?;
    if hover {
        renderer.on(
            PointerEventKind::Leave,
            layer_id,
            Box::new(|_| Some(Reaction::ClosePopup)),
        )?;
    }

    let open_on = if hover {
        PointerEventKind::Enter
    } else {
        PointerEventKind::Click
    };
    renderer.on(
        open_on,
        layer_id,
        Box::new(move |event| {
            Some(Reaction::ShowPopup(Popup {
                anchor: anchor.resolve(event.lng_lat),
                content: content.clone(),
            }))
        }),
    )
}
