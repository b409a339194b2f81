//! Telemetry sink for errors and leveled messages.
//!
//! The data service and the dashboard's error boundaries report through this
//! trait; end users never see the raw errors.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::sync::Mutex;

use tracing::{debug, error, info, warn};

/// Severity of a telemetry message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Severity {
    /// Diagnostic detail.
    Debug,
    /// Informational.
    #[default]
    Info,
    /// Something degraded but recovered.
    Warning,
    /// An operation failed.
    Error,
}

impl Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A sink for `(error, context)` pairs and leveled messages.
pub trait TelemetrySink: Send + Sync {
    /// Record an error together with its context mapping.
    fn capture_error(&self, error: &dyn Display, context: &BTreeMap<String, String>);

    /// Record a standalone message at the given severity.
    fn capture_message(&self, message: &str, level: Severity);
}

/// Telemetry sink that routes everything to the tracing subscriber.
///
/// Whether development builds emit anything is decided by the subscriber's
/// filter, not here.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingTelemetry;

impl TracingTelemetry {
    /// Create a new tracing-backed sink.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl TelemetrySink for TracingTelemetry {
    fn capture_error(&self, err: &dyn Display, context: &BTreeMap<String, String>) {
        error!(%err, ?context, "captured error");
    }

    fn capture_message(&self, message: &str, level: Severity) {
        match level {
            Severity::Debug => debug!("{message}"),
            Severity::Info => info!("{message}"),
            Severity::Warning => warn!("{message}"),
            Severity::Error => error!("{message}"),
        }
    }
}

/// A single recorded telemetry event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryEvent {
    /// Rendered error or message text.
    pub message: String,
    /// Context mapping attached to the event, empty for plain messages.
    pub context: BTreeMap<String, String>,
    /// Severity; errors are recorded as [`Severity::Error`].
    pub level: Severity,
}

/// Telemetry sink that records events in memory, for tests.
#[derive(Debug, Default)]
pub struct RecordingTelemetry {
    events: Mutex<Vec<TelemetryEvent>>,
}

impl RecordingTelemetry {
    /// Create an empty recording sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All events recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<TelemetryEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.lock().map(|e| e.len()).unwrap_or_default()
    }

    /// Whether nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TelemetrySink for RecordingTelemetry {
    fn capture_error(&self, error: &dyn Display, context: &BTreeMap<String, String>) {
        if let Ok(mut events) = self.events.lock() {
            events.push(TelemetryEvent {
                message: error.to_string(),
                context: context.clone(),
                level: Severity::Error,
            });
        }
    }

    fn capture_message(&self, message: &str, level: Severity) {
        if let Ok(mut events) = self.events.lock() {
            events.push(TelemetryEvent {
                message: message.to_string(),
                context: BTreeMap::new(),
                level,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_display() {
        assert_eq!(Severity::Debug.to_string(), "debug");
        assert_eq!(Severity::Warning.to_string(), "warning");
    }

    #[test]
    fn test_severity_default() {
        assert_eq!(Severity::default(), Severity::Info);
    }

    #[test]
    fn test_recording_captures_error_with_context() {
        let sink = RecordingTelemetry::new();
        let mut context = BTreeMap::new();
        context.insert("service".to_string(), "googleSheets".to_string());
        context.insert("method".to_string(), "getCaseSchimb".to_string());

        sink.capture_error(&"fetch failed", &context);

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].message, "fetch failed");
        assert_eq!(events[0].level, Severity::Error);
        assert_eq!(
            events[0].context.get("method"),
            Some(&"getCaseSchimb".to_string())
        );
    }

    #[test]
    fn test_recording_captures_message() {
        let sink = RecordingTelemetry::new();
        sink.capture_message("cache invalidated", Severity::Info);
        sink.capture_message("stale data", Severity::Warning);

        assert_eq!(sink.len(), 2);
        assert_eq!(sink.events()[1].level, Severity::Warning);
    }

    #[test]
    fn test_recording_starts_empty() {
        assert!(RecordingTelemetry::new().is_empty());
    }

    #[test]
    fn test_tracing_sink_does_not_panic() {
        let sink = TracingTelemetry::new();
        sink.capture_error(&"boom", &BTreeMap::new());
        sink.capture_message("hello", Severity::Debug);
    }
}
