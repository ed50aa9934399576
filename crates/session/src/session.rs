//! Map session lifecycle.
//!
//! ```text
//! create ──► LoadingStyle ──style ok──► Ready ◄──► Reconciling
//!                 │                       │             │
//!                 └──style err──► Error ◄─┴── teardown ─┘
//! any state ──dispose──► Disposed
//! ```
//!
//! Updates submitted before `Ready`, or while a pass runs, wait in a single
//! pending slot; a newer update replaces an older one.

use std::fmt;

use layers::{ReconcileReport, Reconciler, SkippedFeature, TeardownError};
use model::Visualization;
use render::{CameraOptions, MapRenderer, RendererError, StyleDocument};
use tracing::{debug, error, info, warn};

use crate::config::SessionConfig;
use crate::diagnostics::Diagnostics;
use crate::style::{StyleError, StyleProvider, acquire_style};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SessionState {
    LoadingStyle,
    Ready,
    Reconciling,
    Error,
    Disposed,
}

/// The signal hosts wait on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    Pending,
    Ready,
    Error(String),
}

/// Session-fatal conditions. The session must be recreated after any of them.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    #[error("map style could not be loaded: {0}")]
    Style(#[from] StyleError),
    #[error("map style was refused by the renderer: {0}")]
    StyleRejected(#[source] RendererError),
    #[error("map objects could not be cleared: {0}")]
    Teardown(#[from] TeardownError),
    #[error("map renderer failed: {0}")]
    Renderer(String),
}

/// What happened to a submitted visualization.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    /// Applied now; the report is for the last pass run.
    Applied(ReconcileReport),
    /// Held until the session is ready.
    Queued,
    /// Dropped because the session is failed or disposed.
    Ignored,
}

type ReadinessListener = Box<dyn FnMut(&Readiness)>;

/// Owns a renderer and applies visualizations to it.
pub struct MapSession<R> {
    renderer: R,
    state: SessionState,
    reconciler: Reconciler,
    initial_camera: CameraOptions,
    pending: Option<Visualization>,
    last_applied: Option<Visualization>,
    last_report: Option<ReconcileReport>,
    error: Option<String>,
    diagnostics: Diagnostics,
    listeners: Vec<ReadinessListener>,
}

impl<R: fmt::Debug> fmt::Debug for MapSession<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapSession")
            .field("state", &self.state)
            .field("renderer", &self.renderer)
            .field("pending", &self.pending.is_some())
            .field("error", &self.error)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl<R: MapRenderer> MapSession<R> {
    /// Starts a session whose style is still being acquired.
    pub fn create(renderer: R, config: &SessionConfig) -> Self {
        info!(prefix = %config.engine.prefix, "map session created");
        Self {
            renderer,
            state: SessionState::LoadingStyle,
            reconciler: Reconciler::new(config.engine.clone()),
            initial_camera: config.initial_camera,
            pending: None,
            last_applied: None,
            last_report: None,
            error: None,
            diagnostics: Diagnostics::new(),
            listeners: Vec::new(),
        }
    }

    /// Creates a session and drives style acquisition to completion.
    ///
    /// The returned session is settled: `Ready`, or `Error` with the
    /// failure available from [`MapSession::readiness`].
    pub async fn open<P>(renderer: R, provider: &P, config: &SessionConfig) -> Self
    where
        P: StyleProvider + ?Sized,
    {
        let mut session = Self::create(renderer, config);
        let style = acquire_style(provider, &config.style.version_pattern).await;
        if let Err(err) = session.complete_style_load(style) {
            debug!(%err, "session opened in error state");
        }
        session
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn readiness(&self) -> Readiness {
        match self.state {
            SessionState::LoadingStyle => Readiness::Pending,
            SessionState::Ready | SessionState::Reconciling => Readiness::Ready,
            SessionState::Error => Readiness::Error(
                self.error
                    .clone()
                    .unwrap_or_else(|| "map session failed".to_string()),
            ),
            SessionState::Disposed => Readiness::Error("map session disposed".to_string()),
        }
    }

    /// Registers `listener` for every later `Ready`/`Error` transition. A
    /// session that has already settled reports its state right away.
    pub fn on_readiness(&mut self, mut listener: impl FnMut(&Readiness) + 'static) {
        if self.state == SessionState::Disposed {
            warn!("readiness listener on disposed session ignored");
            return;
        }
        let current = self.readiness();
        if current != Readiness::Pending {
            listener(&current);
        }
        self.listeners.push(Box::new(listener));
    }

    /// Finishes style acquisition, then replays any pending update.
    pub fn complete_style_load(
        &mut self,
        style: Result<StyleDocument, StyleError>,
    ) -> Result<(), SessionError> {
        match self.state {
            SessionState::LoadingStyle => {}
            SessionState::Disposed => {
                warn!("style arrived after dispose; ignored");
                return Ok(());
            }
            state => {
                warn!(?state, "style load completed twice; ignored");
                return Ok(());
            }
        }

        let style = style.map_err(|e| self.fail(e.into()))?;
        self.renderer
            .set_style(&style)
            .map_err(|e| self.fail(SessionError::StyleRejected(e)))?;
        if !self.initial_camera.is_empty() {
            self.renderer.jump_to(self.initial_camera);
        }

        self.state = SessionState::Ready;
        info!("map session ready");
        self.notify(&Readiness::Ready);
        self.drain().map(|_| ())
    }

    /// Applies `visualization`, or queues it until the session is ready.
    pub fn reconcile(&mut self, visualization: Visualization) -> Result<Submission, SessionError> {
        match self.state {
            SessionState::Disposed => {
                warn!("reconcile on disposed session ignored");
                Ok(Submission::Ignored)
            }
            SessionState::Error => {
                warn!("reconcile on failed session ignored");
                Ok(Submission::Ignored)
            }
            SessionState::LoadingStyle | SessionState::Reconciling => {
                if self.pending.replace(visualization).is_some() {
                    debug!("pending update replaced by a newer one");
                }
                Ok(Submission::Queued)
            }
            SessionState::Ready => {
                self.pending = Some(visualization);
                Ok(match self.drain()? {
                    Some(report) => Submission::Applied(report),
                    None => Submission::Queued,
                })
            }
        }
    }

    /// Runs passes until the pending slot is empty.
    fn drain(&mut self) -> Result<Option<ReconcileReport>, SessionError> {
        let mut last = None;
        while let Some(visualization) = self.pending.take() {
            self.state = SessionState::Reconciling;
            let report = self
                .reconciler
                .reconcile(&mut self.renderer, &visualization)
                .map_err(|e| self.fail(e.into()))?;
            self.diagnostics.record_pass(&report);
            self.last_applied = Some(visualization);
            self.last_report = Some(report.clone());
            self.state = SessionState::Ready;
            last = Some(report);
        }
        Ok(last)
    }

    /// Reports an error raised by the renderer outside any engine call.
    pub fn renderer_fault(&mut self, message: impl Into<String>) {
        match self.state {
            SessionState::Disposed => warn!("renderer fault on disposed session ignored"),
            SessionState::Error => debug!("renderer fault on failed session ignored"),
            _ => {
                self.fail(SessionError::Renderer(message.into()));
            }
        }
    }

    /// Releases every renderer resource. Later calls are logged no-ops.
    pub fn dispose(&mut self) {
        if self.state == SessionState::Disposed {
            warn!("map session disposed twice");
            return;
        }
        self.renderer.destroy();
        self.state = SessionState::Disposed;
        self.pending = None;
        self.listeners.clear();
        info!("map session disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.state == SessionState::Disposed
    }

    /// Visualization applied by the last successful pass.
    pub fn last_applied(&self) -> Option<&Visualization> {
        self.last_applied.as_ref()
    }

    pub fn last_report(&self) -> Option<&ReconcileReport> {
        self.last_report.as_ref()
    }

    /// Features left out of the last pass.
    pub fn skipped(&self) -> &[SkippedFeature] {
        self.last_report
            .as_ref()
            .map(|report| report.skipped.as_slice())
            .unwrap_or_default()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn banner(&self) -> Option<&str> {
        self.diagnostics.banner()
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn diagnostics_mut(&mut self) -> &mut Diagnostics {
        &mut self.diagnostics
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// For hosts that deliver input events straight to the renderer.
    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    fn fail(&mut self, err: SessionError) -> SessionError {
        error!(%err, "map session failed");
        let message = err.to_string();
        self.state = SessionState::Error;
        self.pending = None;
        self.error = Some(message.clone());
        self.diagnostics.set_banner(message.clone());
        self.notify(&Readiness::Error(message));
        err
    }

    fn notify(&mut self, readiness: &Readiness) {
        for listener in &mut self.listeners {
            listener(readiness);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{MapSession, Readiness, SessionError, SessionState, Submission};
    use crate::config::SessionConfig;
    use crate::diagnostics::{MAX_EVENTS, PASSES};
    use crate::style::{StaticStyleProvider, StyleError};
    use foundation::LngLat;
    use model::Visualization;
    use pretty_assertions::assert_eq;
    use render::memory::CameraMove;
    use render::{MapRenderer, MemoryRenderer, StyleDocument};
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn style() -> StyleDocument {
        StyleDocument::new(json!({
            "version": 8,
            "sources": { "streets": { "type": "vector" } },
            "layers": [{ "id": "roads", "type": "line", "source": "streets" }]
        }))
    }

    fn points(ids: &[&str]) -> Visualization {
        let features: Vec<_> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| {
                json!({
                    "id": id,
                    "geometry": { "type": "Point", "coordinates": [i as f64, i as f64] },
                    "properties": { "title": id }
                })
            })
            .collect();
        serde_json::from_value(json!({ "features": features })).unwrap()
    }

    fn loading() -> MapSession<MemoryRenderer> {
        MapSession::create(MemoryRenderer::new(), &SessionConfig::default())
    }

    fn ready() -> MapSession<MemoryRenderer> {
        let mut session = loading();
        session.complete_style_load(Ok(style())).unwrap();
        session
    }

    fn recorder(session: &mut MapSession<MemoryRenderer>) -> Rc<RefCell<Vec<Readiness>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        session.on_readiness(move |r| sink.borrow_mut().push(r.clone()));
        seen
    }

    #[test]
    fn updates_before_ready_are_last_writer_wins() {
        let mut session = loading();
        assert_eq!(session.readiness(), Readiness::Pending);
        assert_eq!(session.reconcile(points(&["a", "b", "c"])).unwrap(), Submission::Queued);
        assert_eq!(session.reconcile(points(&["z"])).unwrap(), Submission::Queued);
        assert!(session.renderer().objects().layers.is_empty());

        session.complete_style_load(Ok(style())).unwrap();

        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(session.last_applied(), Some(&points(&["z"])));
        assert_eq!(session.renderer().objects().layers.len(), 1);
        assert_eq!(session.diagnostics().counter(PASSES), 1);
        assert!(!session.has_pending());
    }

    #[test]
    fn ready_applies_default_camera_before_features() {
        let session = ready();
        let moves = session.renderer().camera_moves();
        assert!(matches!(
            moves,
            [CameraMove::JumpTo(c)] if c.center == Some(LngLat::new(-99.3832, 31.2504)) && c.zoom == Some(6.0)
        ));
    }

    #[test]
    fn style_failure_is_fatal_and_reported() {
        let mut session = loading();
        let seen = recorder(&mut session);
        session.reconcile(points(&["a"])).unwrap();

        let err = session
            .complete_style_load(Err(StyleError::Status {
                url: "https://example.test/style.json".to_string(),
                status: 403,
            }))
            .unwrap_err();

        assert!(matches!(err, SessionError::Style(_)));
        assert_eq!(session.state(), SessionState::Error);
        let message = "map style could not be loaded: https://example.test/style.json answered HTTP 403";
        assert_eq!(session.banner(), Some(message));
        assert_eq!(*seen.borrow(), vec![Readiness::Error(message.to_string())]);
        assert_eq!(session.reconcile(points(&["b"])).unwrap(), Submission::Ignored);
        assert!(session.renderer().objects().sources.is_empty());
    }

    #[test]
    fn listeners_hear_ready_and_late_listeners_hear_it_at_once() {
        let mut session = loading();
        let early = recorder(&mut session);
        session.complete_style_load(Ok(style())).unwrap();
        let late = recorder(&mut session);

        assert_eq!(*early.borrow(), vec![Readiness::Ready]);
        assert_eq!(*late.borrow(), vec![Readiness::Ready]);
    }

    #[test]
    fn same_visualization_twice_is_stable() {
        let mut session = ready();
        let Submission::Applied(first) = session.reconcile(points(&["a", "b"])).unwrap() else {
            panic!("expected an applied pass");
        };
        let objects = session.renderer().objects();
        let Submission::Applied(second) = session.reconcile(points(&["a", "b"])).unwrap() else {
            panic!("expected an applied pass");
        };

        assert_eq!(session.renderer().objects(), objects);
        assert_eq!(first.installed, second.installed);
        assert_eq!(second.removed_layers, 2);
        assert_eq!(session.diagnostics().counter(PASSES), 2);
    }

    #[test]
    fn skipped_features_are_exposed() {
        let mut session = ready();
        let vis: Visualization = serde_json::from_value(json!({
            "features": [
                { "id": "broken", "geometry": { "type": "LineString", "coordinates": [[1, 1]] } },
                { "id": "ok", "geometry": { "type": "Point", "coordinates": [1, 1] } }
            ]
        }))
        .unwrap();
        session.reconcile(vis).unwrap();

        assert_eq!(session.skipped().len(), 1);
        assert_eq!(session.skipped()[0].feature_id, "broken");
        assert_eq!(session.diagnostics().events()[0].kind, "feature.skipped");
    }

    #[test]
    fn long_sessions_keep_a_bounded_event_log() {
        let mut session = ready();
        let vis: Visualization = serde_json::from_value(json!({
            "features": [
                { "id": "broken" },
                { "id": "ok", "geometry": { "type": "Point", "coordinates": [1, 1] } }
            ]
        }))
        .unwrap();
        for _ in 0..10_000 {
            session.reconcile(vis.clone()).unwrap();
        }

        assert_eq!(session.diagnostics().counter(PASSES), 10_000);
        assert!(session.diagnostics().events().len() <= MAX_EVENTS);
        assert_eq!(session.renderer().objects().layers.len(), 1);
    }

    #[test]
    fn teardown_failure_moves_session_to_error() {
        let mut session = ready();
        session.reconcile(points(&["a"])).unwrap();
        session.renderer_mut().fail_removals(true);

        let err = session.reconcile(points(&["b"])).unwrap_err();

        assert!(matches!(err, SessionError::Teardown(_)));
        assert!(matches!(session.readiness(), Readiness::Error(_)));
        assert!(session.banner().is_some());
        assert_eq!(session.reconcile(points(&["c"])).unwrap(), Submission::Ignored);
    }

    #[test]
    fn renderer_fault_is_fatal() {
        let mut session = ready();
        session.renderer_fault("WebGL context lost");
        assert_eq!(
            session.readiness(),
            Readiness::Error("map renderer failed: WebGL context lost".to_string())
        );
    }

    #[test]
    fn disposed_session_ignores_everything() {
        let mut session = ready();
        session.reconcile(points(&["a"])).unwrap();
        session.dispose();

        assert!(session.renderer().is_destroyed());
        assert!(session.renderer().style_objects().layers.is_empty());
        assert_eq!(session.reconcile(points(&["b"])).unwrap(), Submission::Ignored);
        session.complete_style_load(Ok(style())).unwrap();
        session.renderer_fault("late");
        session.dispose();
        assert_eq!(session.state(), SessionState::Disposed);
    }

    #[test]
    fn open_settles_the_session() {
        let provider = StaticStyleProvider::new("0.4.2", style().into_value()).with_versions(["0.4.2"]);
        let session = pollster::block_on(MapSession::open(
            MemoryRenderer::new(),
            &provider,
            &SessionConfig::default(),
        ));
        assert_eq!(session.readiness(), Readiness::Ready);
        assert_eq!(session.renderer().style_objects().layers, vec!["roads"]);

        let failing = StaticStyleProvider::failing(StyleError::Parse("eof".to_string()));
        let session = pollster::block_on(MapSession::open(
            MemoryRenderer::new(),
            &failing,
            &SessionConfig::default(),
        ));
        assert!(matches!(session.readiness(), Readiness::Error(_)));
    }
}
