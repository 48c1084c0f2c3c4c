//! Event sink trait and implementations.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// An observability event emitted by the executor or the finalizer chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunEvent {
    /// The event kind (e.g., `stage.started`, `stage.failed`).
    pub kind: String,
    /// The stage the event refers to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    /// Structured event payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    /// When the event was emitted (ISO 8601).
    pub at: String,
}

impl RunEvent {
    /// Creates an event for a stage.
    #[must_use]
    pub fn stage(kind: impl Into<String>, stage: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            stage: Some(stage.into()),
            data: None,
            at: crate::utils::iso_timestamp(),
        }
    }

    /// Creates a run-level event.
    #[must_use]
    pub fn run(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            stage: None,
            data: None,
            at: crate::utils::iso_timestamp(),
        }
    }

    /// Attaches a structured payload.
    #[must_use]
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Trait for event sinks.
///
/// Emission must never fail or block the executor; sinks swallow their own
/// errors.
pub trait EventSink: Send + Sync {
    /// Receives one event.
    fn emit(&self, event: RunEvent);
}

/// A no-op sink that discards all events.
///
/// Used as the default when no sink is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpSink;

impl EventSink for NoOpSink {
    fn emit(&self, _event: RunEvent) {}
}

/// A sink that logs events through the tracing framework.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingSink;

impl EventSink for LoggingSink {
    fn emit(&self, event: RunEvent) {
        match event.kind.as_str() {
            "stage.failed" | "finalizer.failed" | "run.cancel_requested" | "run.cancelled" => {
                warn!(
                    kind = %event.kind,
                    stage = ?event.stage,
                    data = ?event.data,
                    "pipeline event"
                );
            }
            _ => {
                info!(
                    kind = %event.kind,
                    stage = ?event.stage,
                    data = ?event.data,
                    "pipeline event"
                );
            }
        }
    }
}

/// A collecting sink for tests and post-run inspection.
#[derive(Debug, Default)]
pub struct CollectingSink {
    events: parking_lot::RwLock<Vec<RunEvent>>,
}

impl CollectingSink {
    /// Creates an empty collecting sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything collected so far.
    #[must_use]
    pub fn events(&self) -> Vec<RunEvent> {
        self.events.read().clone()
    }

    /// Returns the kinds of collected events, in order.
    #[must_use]
    pub fn kinds(&self) -> Vec<String> {
        self.events.read().iter().map(|e| e.kind.clone()).collect()
    }

    /// Returns events of a given kind.
    #[must_use]
    pub fn of_kind(&self, kind: &str) -> Vec<RunEvent> {
        self.events
            .read()
            .iter()
            .filter(|e| e.kind == kind)
            .cloned()
            .collect()
    }
}

impl EventSink for CollectingSink {
    fn emit(&self, event: RunEvent) {
        self.events.write().push(event);
    }
}
