//! Application-level configuration.
//!
//! This module provides configuration types that control how use cases behave:
//!
//! - [`GenerationParams`]: archetype selection and output size
//! - [`ValidationThresholds`]: quality gates and benchmark targets
//! - [`CoordinationParams`]: barrier polling, concurrency, worktree root
//! - [`ComplianceParams`]: rule registry and history size
//! - [`ResolverConfig`]: container for all of the above

pub mod params;
pub mod resolver_config;

pub use params::{ComplianceParams, CoordinationParams, GenerationParams, ValidationThresholds};
pub use resolver_config::ResolverConfig;
