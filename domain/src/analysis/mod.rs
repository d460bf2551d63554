//! Lightweight text analysis used when no external engine is configured.

pub mod intent;

pub use intent::{Intent, classify_intent_fallback};
