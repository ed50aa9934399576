//! `MapRenderer` over a live `maplibregl.Map`.
//!
//! MapLibre reports most refusals (duplicate ids, bad paint, missing source)
//! as `error` events instead of exceptions, so every mutating call goes
//! through `circle30_guarded`, which turns an error event raised during the
//! call into a thrown exception.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use foundation::{Corners, LngLat};
use render::{
    CameraOptions, Cursor, FitOptions, Handler, LayerSpec, MapRenderer, PointerEvent,
    PointerEventKind, Reaction, RendererError, SourceSpec, StyleDocument, StyleObjects,
};
use serde_json::{Value, json};
use tracing::{debug, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

#[wasm_bindgen(inline_js = "
export function circle30_guarded(map, method, args) {
    let failure = null;
    const onError = (e) => { failure = (e && e.error) || e; };
    map.on('error', onError);
    try {
        map[method](...args);
    } finally {
        map.off('error', onError);
    }
    if (failure) throw failure;
}

export function circle30_load_style(map, style) {
    return new Promise((resolve, reject) => {
        const onLoad = () => { map.off('error', onError); resolve(); };
        const onError = (e) => { map.off('style.load', onLoad); reject((e && e.error) || e); };
        map.once('style.load', onLoad);
        map.once('error', onError);
        map.setStyle(style, { diff: false });
    });
}
")]
extern "C" {
    #[wasm_bindgen(catch)]
    fn circle30_guarded(map: &MapLibreMap, method: &str, args: &js_sys::Array) -> Result<(), JsValue>;

    fn circle30_load_style(map: &MapLibreMap, style: &JsValue) -> js_sys::Promise;
}

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = maplibregl, js_name = Map)]
    #[derive(Debug, Clone)]
    pub type MapLibreMap;

    #[wasm_bindgen(constructor, catch, js_namespace = maplibregl, js_class = "Map")]
    fn new(options: &JsValue) -> Result<MapLibreMap, JsValue>;

    #[wasm_bindgen(method, js_name = getStyle)]
    fn get_style(this: &MapLibreMap) -> JsValue;

    #[wasm_bindgen(method, js_name = setStyle)]
    fn set_style(this: &MapLibreMap, style: &JsValue, options: &JsValue);

    #[wasm_bindgen(method, js_name = getLayer)]
    fn get_layer(this: &MapLibreMap, id: &str) -> JsValue;

    #[wasm_bindgen(method, js_name = on)]
    fn on_layer(this: &MapLibreMap, event: &str, layer_id: &str, listener: &js_sys::Function);

    #[wasm_bindgen(method, js_name = off)]
    fn off_layer(this: &MapLibreMap, event: &str, layer_id: &str, listener: &js_sys::Function);

    #[wasm_bindgen(method, js_name = on)]
    pub fn on_event(this: &MapLibreMap, event: &str, listener: &js_sys::Function);

    #[wasm_bindgen(method, js_name = fitBounds)]
    fn fit_bounds(this: &MapLibreMap, bounds: &JsValue, options: &JsValue);

    #[wasm_bindgen(method, js_name = jumpTo)]
    fn jump_to(this: &MapLibreMap, options: &JsValue);

    #[wasm_bindgen(method, js_name = getCanvas)]
    fn get_canvas(this: &MapLibreMap) -> web_sys::HtmlCanvasElement;

    #[wasm_bindgen(method)]
    fn remove(this: &MapLibreMap);

    #[wasm_bindgen(js_namespace = maplibregl, js_name = Popup)]
    #[derive(Debug, Clone)]
    type MapLibrePopup;

    #[wasm_bindgen(constructor, js_namespace = maplibregl, js_class = "Popup")]
    fn new(options: &JsValue) -> MapLibrePopup;

    #[wasm_bindgen(method, js_name = setLngLat)]
    fn set_lng_lat(this: &MapLibrePopup, lng_lat: &JsValue);

    #[wasm_bindgen(method, js_name = setHTML)]
    fn set_html(this: &MapLibrePopup, html: &str);

    #[wasm_bindgen(method, js_name = addTo)]
    fn add_to(this: &MapLibrePopup, map: &MapLibreMap);

    #[wasm_bindgen(method, js_name = remove)]
    fn remove_popup(this: &MapLibrePopup);
}

/// Cursor and popup state shared with the event closures.
#[derive(Debug)]
struct Overlay {
    map: MapLibreMap,
    popup: RefCell<Option<MapLibrePopup>>,
}

impl Overlay {
    fn apply(&self, reaction: Reaction) {
        match reaction {
            Reaction::SetCursor(cursor) => self.set_cursor(cursor),
            Reaction::ShowPopup(popup) => {
                self.close_popup();
                let shown = MapLibrePopup::new(&to_js(&json!({ "closeButton": true, "maxWidth": "320px" })));
                shown.set_lng_lat(&to_js(&json!([popup.anchor.lng, popup.anchor.lat])));
                shown.set_html(&popup.content.to_html());
                shown.add_to(&self.map);
                *self.popup.borrow_mut() = Some(shown);
            }
            Reaction::ClosePopup => self.close_popup(),
        }
    }

    fn set_cursor(&self, cursor: Cursor) {
        if let Err(err) = self.map.get_canvas().style().set_property("cursor", cursor.css()) {
            debug!(error = %describe(&err), "cursor not updated");
        }
    }

    fn close_popup(&self) {
        if let Some(open) = self.popup.borrow_mut().take() {
            open.remove_popup();
        }
    }
}

type Listener = Closure<dyn FnMut(JsValue)>;

#[derive(Debug)]
pub struct MapLibreRenderer {
    map: MapLibreMap,
    overlay: Rc<Overlay>,
    handlers: BTreeMap<String, Vec<(PointerEventKind, Listener)>>,
    destroyed: bool,
}

impl MapLibreRenderer {
    /// Mounts a map in `container_id` with an empty style.
    pub fn new(container_id: &str, camera: &CameraOptions) -> Result<Self, JsValue> {
        let mut options = camera_json(camera);
        if let Value::Object(map) = &mut options {
            map.insert("container".to_string(), json!(container_id));
            map.insert("style".to_string(), StyleDocument::blank().into_value());
        }
        let map = MapLibreMap::new(&to_js(&options))?;
        Ok(Self {
            overlay: Rc::new(Overlay {
                map: map.clone(),
                popup: RefCell::new(None),
            }),
            map,
            handlers: BTreeMap::new(),
            destroyed: false,
        })
    }

    pub fn map(&self) -> &MapLibreMap {
        &self.map
    }

    fn check_alive(&self) -> Result<(), RendererError> {
        if self.destroyed {
            return Err(RendererError::Destroyed);
        }
        Ok(())
    }

    fn guarded(&self, id: &str, method: &str, args: &[JsValue]) -> Result<(), RendererError> {
        let args: js_sys::Array = args.iter().collect();
        circle30_guarded(&self.map, method, &args).map_err(|err| RendererError::Rejected {
            id: id.to_string(),
            reason: describe(&err),
        })
    }

    fn unbind(&mut self, layer_id: &str) {
        for (kind, listener) in self.handlers.remove(layer_id).into_iter().flatten() {
            self.map
                .off_layer(kind.as_str(), layer_id, listener.as_ref().unchecked_ref());
        }
    }
}

/// Applies `style` and resolves once the map has finished loading it.
pub async fn load_style(map: &MapLibreMap, style: &StyleDocument) -> Result<(), JsValue> {
    let promise = circle30_load_style(map, &to_js(style.as_value()));
    wasm_bindgen_futures::JsFuture::from(promise).await.map(|_| ())
}

impl MapRenderer for MapLibreRenderer {
    fn style_objects(&self) -> StyleObjects {
        if self.destroyed {
            return StyleObjects::default();
        }
        let style = self.map.get_style();
        let layers = js_sys::Reflect::get(&style, &JsValue::from_str("layers"))
            .ok()
            .filter(js_sys::Array::is_array)
            .map(|layers| {
                js_sys::Array::from(&layers)
                    .iter()
                    .filter_map(|layer| {
                        js_sys::Reflect::get(&layer, &JsValue::from_str("id"))
                            .ok()?
                            .as_string()
                    })
                    .collect()
            })
            .unwrap_or_default();
        let sources = js_sys::Reflect::get(&style, &JsValue::from_str("sources"))
            .ok()
            .filter(JsValue::is_object)
            .map(|sources| {
                let sources: &js_sys::Object = sources.unchecked_ref();
                js_sys::Object::keys(sources)
                    .iter()
                    .filter_map(|key| key.as_string())
                    .collect()
            })
            .unwrap_or_default();
        StyleObjects { layers, sources }
    }

    /// Diffs against the current style; a style already applied through
    /// [`load_style`] costs nothing.
    fn set_style(&mut self, style: &StyleDocument) -> Result<(), RendererError> {
        self.check_alive()?;
        for layer_id in self.handlers.keys().cloned().collect::<Vec<_>>() {
            self.unbind(&layer_id);
        }
        self.map
            .set_style(&to_js(style.as_value()), &to_js(&json!({ "diff": true })));
        Ok(())
    }

    fn add_source(&mut self, id: &str, source: SourceSpec) -> Result<(), RendererError> {
        self.check_alive()?;
        self.guarded(id, "addSource", &[JsValue::from_str(id), to_js(&source.to_json())])
    }

    fn add_layer(&mut self, layer: LayerSpec) -> Result<(), RendererError> {
        self.check_alive()?;
        self.guarded(&layer.id, "addLayer", &[to_js(&layer.to_json())])
    }

    fn remove_layer(&mut self, id: &str) -> Result<(), RendererError> {
        self.check_alive()?;
        if self.map.get_layer(id).is_undefined() {
            return Err(RendererError::MissingLayer(id.to_string()));
        }
        self.unbind(id);
        self.guarded(id, "removeLayer", &[JsValue::from_str(id)])
    }

    fn remove_source(&mut self, id: &str) -> Result<(), RendererError> {
        self.check_alive()?;
        self.guarded(id, "removeSource", &[JsValue::from_str(id)])
    }

    fn on(
        &mut self,
        kind: PointerEventKind,
        layer_id: &str,
        handler: Handler,
    ) -> Result<(), RendererError> {
        self.check_alive()?;
        if self.map.get_layer(layer_id).is_undefined() {
            return Err(RendererError::MissingLayer(layer_id.to_string()));
        }
        let overlay = Rc::clone(&self.overlay);
        let bound_layer = layer_id.to_string();
        let listener = Closure::<dyn FnMut(JsValue)>::new(move |event: JsValue| {
            let Some(lng_lat) = event_lng_lat(&event) else {
                warn!(layer = %bound_layer, "pointer event without coordinates");
                return;
            };
            let pointer = PointerEvent {
                kind,
                layer_id: bound_layer.clone(),
                lng_lat,
            };
            if let Some(reaction) = handler(&pointer) {
                overlay.apply(reaction);
            }
        });
        self.map
            .on_layer(kind.as_str(), layer_id, listener.as_ref().unchecked_ref());
        self.handlers
            .entry(layer_id.to_string())
            .or_default()
            .push((kind, listener));
        Ok(())
    }

    fn off(&mut self, layer_id: &str) {
        self.unbind(layer_id);
    }

    fn fit_bounds(&mut self, bounds: Corners, options: FitOptions) {
        if self.destroyed {
            return;
        }
        let (bounds, options) = fit_json(bounds, options);
        self.map.fit_bounds(&to_js(&bounds), &to_js(&options));
    }

    fn jump_to(&mut self, camera: CameraOptions) {
        if self.destroyed {
            return;
        }
        self.map.jump_to(&to_js(&camera_json(&camera)));
    }

    fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        for layer_id in self.handlers.keys().cloned().collect::<Vec<_>>() {
            self.unbind(&layer_id);
        }
        self.overlay.close_popup();
        self.map.remove();
        self.destroyed = true;
    }
}

fn event_lng_lat(event: &JsValue) -> Option<LngLat> {
    let lng_lat = js_sys::Reflect::get(event, &JsValue::from_str("lngLat")).ok()?;
    let lng = js_sys::Reflect::get(&lng_lat, &JsValue::from_str("lng")).ok()?.as_f64()?;
    let lat = js_sys::Reflect::get(&lng_lat, &JsValue::from_str("lat")).ok()?.as_f64()?;
    Some(LngLat::new(lng, lat))
}

/// `jumpTo` options; absent fields are left out.
pub fn camera_json(camera: &CameraOptions) -> Value {
    let mut out = serde_json::Map::new();
    if let Some(center) = camera.center {
        out.insert("center".to_string(), json!([center.lng, center.lat]));
    }
    if let Some(zoom) = camera.zoom {
        out.insert("zoom".to_string(), json!(zoom));
    }
    Value::Object(out)
}

/// `fitBounds` arguments: the `[[w, s], [e, n]]` box and its options.
pub fn fit_json(bounds: Corners, options: FitOptions) -> (Value, Value) {
    let sw = bounds.south_west;
    let ne = bounds.north_east;
    (
        json!([[sw.lng, sw.lat], [ne.lng, ne.lat]]),
        json!({ "padding": options.padding, "duration": options.duration_ms }),
    )
}

pub(crate) fn to_js(value: &Value) -> JsValue {
    js_sys::JSON::parse(&value.to_string()).unwrap_or(JsValue::NULL)
}

pub(crate) fn describe(err: &JsValue) -> String {
    if let Some(err) = err.dyn_ref::<js_sys::Error>() {
        return String::from(err.message());
    }
    err.as_string().unwrap_or_else(|| format!("{err:?}"))
}

#[cfg(test)]
mod tests {
    use super::{camera_json, fit_json};
    use foundation::{Corners, LngLat};
    use pretty_assertions::assert_eq;
    use render::{CameraOptions, FitOptions};
    use serde_json::json;

    #[test]
    fn jump_options_skip_missing_fields() {
        let camera = CameraOptions {
            center: None,
            zoom: Some(9.0),
        };
        assert_eq!(camera_json(&camera), json!({ "zoom": 9.0 }));
    }

    #[test]
    fn fit_arguments_use_maplibre_names() {
        let (bounds, options) = fit_json(
            Corners {
                south_west: LngLat::new(-98.0, 30.0),
                north_east: LngLat::new(-97.0, 31.0),
            },
            FitOptions::default(),
        );
        assert_eq!(bounds, json!([[-98.0, 30.0], [-97.0, 31.0]]));
        assert_eq!(options, json!({ "padding": 50.0, "duration": 1000 }));
    }
}
