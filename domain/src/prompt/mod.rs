//! Prompt rendering for external strategy-text backends.

pub mod strategy;

pub use strategy::StrategyPromptTemplate;
