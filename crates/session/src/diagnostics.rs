use std::collections::{BTreeMap, VecDeque};

use layers::ReconcileReport;

pub const PASSES: &str = "passes";
pub const FEATURES_INSTALLED: &str = "features.installed";
pub const FEATURES_SKIPPED: &str = "features.skipped";
pub const OBJECTS_REMOVED: &str = "objects.removed";
pub const EVENTS_DROPPED: &str = "events.dropped";

/// Events kept before the oldest are evicted.
pub const MAX_EVENTS: usize = 256;

/// One diagnostic record, tagged with the pass it belongs to.
///
/// Pass 0 covers everything before the first reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub pass: u64,
    pub kind: &'static str,
    pub message: String,
}

/// Per-session diagnostics: event log, counters and the fatal-error banner.
///
/// Counters live in a sorted map so snapshots come out in a stable order.
/// The event log holds at most [`MAX_EVENTS`]; evictions are counted under
/// [`EVENTS_DROPPED`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Diagnostics {
    events: VecDeque<Event>,
    counters: BTreeMap<&'static str, u64>,
    banner: Option<String>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, kind: &'static str, message: impl Into<String>) {
        if self.events.len() == MAX_EVENTS {
            self.events.pop_front();
            self.inc_counter(EVENTS_DROPPED, 1);
        }
        self.events.push_back(Event {
            pass: self.counter(PASSES),
            kind,
            message: message.into(),
        });
    }

    pub fn events(&self) -> &VecDeque<Event> {
        &self.events
    }

    pub fn drain(&mut self) -> Vec<Event> {
        self.events.drain(..).collect()
    }

    pub fn counter(&self, name: &str) -> u64 {
        self.counters.get(name).copied().unwrap_or(0)
    }

    pub fn inc_counter(&mut self, name: &'static str, by: u64) {
        *self.counters.entry(name).or_insert(0) += by;
    }

    pub fn snapshot(&self) -> Vec<(&'static str, u64)> {
        self.counters.iter().map(|(k, v)| (*k, *v)).collect()
    }

    /// Folds one finished pass into the counters and logs its warnings.
    pub fn record_pass(&mut self, report: &ReconcileReport) {
        self.inc_counter(PASSES, 1);
        self.inc_counter(FEATURES_INSTALLED, report.installed.len() as u64);
        self.inc_counter(FEATURES_SKIPPED, report.skipped.len() as u64);
        self.inc_counter(
            OBJECTS_REMOVED,
            (report.removed_layers + report.removed_sources) as u64,
        );
        for skipped in &report.skipped {
            self.emit(
                "feature.skipped",
                format!("{}: {}", skipped.feature_id, skipped.reason),
            );
        }
        self.emit(
            "pass.complete",
            format!(
                "{} installed, {} skipped",
                report.installed.len(),
                report.skipped.len()
            ),
        );
    }

    /// Persistent message for a session-fatal error.
    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    pub fn set_banner(&mut self, message: impl Into<String>) {
        let message = message.into();
        self.emit("session.error", message.clone());
        self.banner = Some(message);
    }
}

#[cfg(test)]
mod tests {
    use super::{
        Diagnostics, EVENTS_DROPPED, FEATURES_INSTALLED, FEATURES_SKIPPED, MAX_EVENTS,
        OBJECTS_REMOVED, PASSES,
    };
    use layers::{CameraChange, ReconcileReport, SkipReason, SkippedFeature};
    use model::GeometryIssue;
    use pretty_assertions::assert_eq;

    fn report() -> ReconcileReport {
        ReconcileReport {
            removed_layers: 2,
            removed_sources: 1,
            installed: Vec::new(),
            skipped: vec![SkippedFeature {
                index: 0,
                feature_id: "zip-78701".to_string(),
                reason: SkipReason::Geometry(GeometryIssue::MissingGeometry),
            }],
            camera: CameraChange::Unchanged,
        }
    }

    #[test]
    fn pass_updates_counters_and_events() {
        let mut d = Diagnostics::new();
        d.record_pass(&report());

        assert_eq!(
            d.snapshot(),
            vec![
                (FEATURES_INSTALLED, 0),
                (FEATURES_SKIPPED, 1),
                (OBJECTS_REMOVED, 3),
                (PASSES, 1),
            ]
        );
        assert_eq!(d.events()[0].kind, "feature.skipped");
        assert_eq!(d.events()[0].message, "zip-78701: invalid geometry: feature has no geometry");
        assert_eq!(d.events()[0].pass, 1);
    }

    #[test]
    fn drain_keeps_counters_and_banner() {
        let mut d = Diagnostics::new();
        d.set_banner("style acquisition failed");
        assert_eq!(d.events()[0].pass, 0);
        let drained = d.drain();
        assert_eq!(drained.len(), 1);
        assert!(d.events().is_empty());
        assert_eq!(d.banner(), Some("style acquisition failed"));
    }

    #[test]
    fn event_log_keeps_only_the_newest() {
        let mut d = Diagnostics::new();
        for _ in 0..1_000 {
            d.record_pass(&report());
        }

        assert_eq!(d.events().len(), MAX_EVENTS);
        assert_eq!(d.counter(EVENTS_DROPPED), 2_000 - MAX_EVENTS as u64);
        assert_eq!(d.counter(PASSES), 1_000);
        assert_eq!(d.events().back().map(|e| e.pass), Some(1_000));
        assert_eq!(d.drain().len(), MAX_EVENTS);
        assert!(d.events().is_empty());
    }
}
