//! Port for the structured resolution audit trail.
//!
//! Defines the [`ResolutionEventLogger`] trait for recording workflow events
//! (strategies generated, compliance results, task transitions, barrier
//! outcomes) to a structured log.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostic messages, while this port captures a
//! machine-readable record (JSONL) for reporting tooling.

use serde_json::Value;

/// Event type emitted after strategy generation.
pub const STRATEGIES_GENERATED: &str = "strategies_generated";
/// Event type emitted after every compliance validation.
pub const COMPLIANCE_VALIDATED: &str = "compliance_validated";
/// Event type emitted on every task status change.
pub const TASK_STATUS_CHANGED: &str = "task_status_changed";
/// Event type emitted when a barrier triggers or times out.
pub const BARRIER_RESOLVED: &str = "barrier_resolved";
/// Event type emitted after session cleanup.
pub const SESSION_CLEANED_UP: &str = "session_cleaned_up";
/// Event type emitted after a rollback run.
pub const ROLLBACK_EXECUTED: &str = "rollback_executed";

/// A structured resolution event.
pub struct ResolutionEvent {
    /// Event type identifier (one of the constants in this module).
    pub event_type: &'static str,
    /// JSON payload with event-specific data.
    pub payload: Value,
}

impl ResolutionEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }
}

/// Port for logging resolution events.
///
/// `log` is synchronous and non-fallible; logging failures must never
/// disturb the resolution flow.
pub trait ResolutionEventLogger: Send + Sync {
    fn log(&self, event: ResolutionEvent);
}

/// No-op implementation for tests and when logging is disabled.
pub struct NoEventLogger;

impl ResolutionEventLogger for NoEventLogger {
    fn log(&self, _event: ResolutionEvent) {}
}
