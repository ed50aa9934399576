//! Browser host: a MapLibre map driven by a map session.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use model::{ChatResponse, Visualization};
use session::{MapSession, Readiness, SessionConfig, StyleConfig, Submission, acquire_style};
use tracing::{error, info, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

mod maplibre;
mod provider;

pub use maplibre::{MapLibreMap, MapLibreRenderer, camera_json, fit_json, load_style};
pub use provider::{GlooStyleProvider, build_env};

use maplibre::describe;

type SharedSession = Rc<RefCell<MapSession<MapLibreRenderer>>>;

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if tracing_wasm::try_set_as_global_default().is_err() {
        return;
    }
    info!("circle30 map host loaded");
}

fn console_warn(message: &str) {
    web_sys::console::warn_1(&JsValue::from_str(message));
}

fn readiness_label(readiness: &Readiness) -> &'static str {
    match readiness {
        Readiness::Pending => "pending",
        Readiness::Ready => "ready",
        Readiness::Error(_) => "error",
    }
}

/// A map mounted in a page element, updated from visualization documents.
#[wasm_bindgen]
pub struct MapView {
    session: SharedSession,
    listeners: Vec<Closure<dyn FnMut(JsValue)>>,
}

#[wasm_bindgen]
impl MapView {
    #[wasm_bindgen(constructor)]
    pub fn new(container_id: &str) -> Result<MapView, JsValue> {
        let config = SessionConfig::from_lookup(build_env);
        let renderer = MapLibreRenderer::new(container_id, &config.initial_camera)?;
        let map = renderer.map().clone();
        let session = Rc::new(RefCell::new(MapSession::create(renderer, &config)));

        let on_error = Closure::<dyn FnMut(JsValue)>::new(|event: JsValue| {
            let err = js_sys::Reflect::get(&event, &JsValue::from_str("error"))
                .ok()
                .filter(|e| !e.is_undefined())
                .unwrap_or(event);
            console_warn(&format!("map error: {}", describe(&err)));
        });
        map.on_event("error", on_error.as_ref().unchecked_ref());

        let weak = Rc::downgrade(&session);
        let on_context_lost = Closure::<dyn FnMut(JsValue)>::new(move |_event: JsValue| {
            let Some(session) = weak.upgrade() else {
                return;
            };
            match session.try_borrow_mut() {
                Ok(mut session) => session.renderer_fault("WebGL context lost"),
                Err(_) => warn!("WebGL context lost during a reconciliation pass"),
            };
        });
        map.on_event("webglcontextlost", on_context_lost.as_ref().unchecked_ref());

        spawn_local(acquire(Rc::downgrade(&session), map, config.style));

        Ok(MapView {
            session,
            listeners: vec![on_error, on_context_lost],
        })
    }

    /// Applies a visualization document, or queues it until the style is in.
    #[wasm_bindgen(js_name = setVisualization)]
    pub fn set_visualization(&self, json: &str) -> Result<(), JsValue> {
        let visualization =
            Visualization::from_json_str(json).map_err(|e| JsValue::from_str(&e.to_string()))?;
        self.submit(visualization)
    }

    /// Applies the visualization carried by a chat reply and returns its text.
    #[wasm_bindgen(js_name = setChatResponse)]
    pub fn set_chat_response(&self, json: &str) -> Result<Option<String>, JsValue> {
        let response =
            ChatResponse::from_json_str(json).map_err(|e| JsValue::from_str(&e.to_string()))?;
        if let Some(err) = &response.error {
            return Err(JsValue::from_str(err));
        }
        if let Some(visualization) = response.visualization() {
            self.submit(visualization)?;
        }
        Ok(response.message().map(str::to_string))
    }

    /// `pending`, `ready` or `error`.
    pub fn readiness(&self) -> String {
        readiness_label(&self.session.borrow().readiness()).to_string()
    }

    /// Calls `callback` with the readiness label on every settle.
    #[wasm_bindgen(js_name = onReadiness)]
    pub fn on_readiness(&self, callback: js_sys::Function) {
        self.session.borrow_mut().on_readiness(move |readiness| {
            // Deferred so the callback may call back into this view.
            let callback = callback.clone();
            let label = JsValue::from_str(readiness_label(readiness));
            spawn_local(async move {
                if let Err(err) = callback.call1(&JsValue::NULL, &label) {
                    console_warn(&format!("readiness callback failed: {}", describe(&err)));
                }
            });
        });
    }

    /// Persistent message for a failed session.
    pub fn banner(&self) -> Option<String> {
        self.session.borrow().banner().map(str::to_string)
    }

    /// `feature id: reason` for every feature left out of the last pass.
    pub fn warnings(&self) -> Vec<String> {
        self.session
            .borrow()
            .skipped()
            .iter()
            .map(|s| format!("{}: {}", s.feature_id, s.reason))
            .collect()
    }

    /// Hands over the buffered diagnostic events as `[pass] kind: message`.
    #[wasm_bindgen(js_name = drainEvents)]
    pub fn drain_events(&self) -> Vec<String> {
        self.session
            .borrow_mut()
            .diagnostics_mut()
            .drain()
            .into_iter()
            .map(|e| format!("[{}] {}: {}", e.pass, e.kind, e.message))
            .collect()
    }

    pub fn dispose(&mut self) {
        self.session.borrow_mut().dispose();
        self.listeners.clear();
    }
}

impl MapView {
    fn submit(&self, visualization: Visualization) -> Result<(), JsValue> {
        let mut session = self
            .session
            .try_borrow_mut()
            .map_err(|_| JsValue::from_str("map session is busy"))?;
        match session.reconcile(visualization) {
            Ok(Submission::Applied(report)) => {
                for skipped in &report.skipped {
                    console_warn(&format!("feature {} skipped: {}", skipped.feature_id, skipped.reason));
                }
                Ok(())
            }
            Ok(Submission::Queued | Submission::Ignored) => Ok(()),
            Err(err) => Err(JsValue::from_str(&err.to_string())),
        }
    }
}

/// Fetches the style, waits for the map to load it, then readies the session.
async fn acquire(session: Weak<RefCell<MapSession<MapLibreRenderer>>>, map: MapLibreMap, config: StyleConfig) {
    let style = match GlooStyleProvider::new(config.clone()) {
        Ok(provider) => acquire_style(&provider, &config.version_pattern).await,
        Err(err) => Err(err),
    };

    if let Ok(document) = &style {
        if session.upgrade().is_none_or(|s| s.borrow().is_disposed()) {
            return;
        }
        if let Err(err) = load_style(&map, document).await {
            if let Some(session) = session.upgrade() {
                session
                    .borrow_mut()
                    .renderer_fault(format!("style rejected: {}", describe(&err)));
            }
            return;
        }
    }

    let Some(session) = session.upgrade() else {
        return;
    };
    let mut session = session.borrow_mut();
    if session.is_disposed() {
        return;
    }
    if let Err(err) = session.complete_style_load(style) {
        error!(%err, "map session failed to start");
    }
}
