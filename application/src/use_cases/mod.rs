//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod builtin_rules;
pub mod compliance_engine;
pub mod generate_strategies;
pub mod parallel_coordinator;
pub mod resolve_conflict;
pub mod rollback;
pub mod task_graph;
pub mod validation;
pub mod worktree_allocator;
