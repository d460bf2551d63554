//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod category_repository;
pub mod event_logger;
pub mod progress;
pub mod strategy_backend;
pub mod strategy_source;
pub mod task_executor;
pub mod worktree_backend;
