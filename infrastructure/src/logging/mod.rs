//! Logging infrastructure: the structured resolution audit trail.
//!
//! Provides [`JsonlEventLogger`], a JSONL file writer that implements
//! the [`ResolutionEventLogger`](resolver_application::ResolutionEventLogger) port.

mod jsonl_event_logger;

pub use jsonl_event_logger::JsonlEventLogger;
