//! Resolution tasks and the dependency graph between them.

pub mod entities;
pub mod graph;

pub use entities::{ResolutionTask, TaskPriority, TaskStatus};
pub use graph::{
    BlockedTask, DependencyGraph, DependencyInfo, DependencyRef, DependencyValidation,
};
