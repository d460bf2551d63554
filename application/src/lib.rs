//! Application layer for conflict-resolver
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod context;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::{
    ComplianceParams, CoordinationParams, GenerationParams, ResolverConfig, ValidationThresholds,
};
pub use context::{ResolutionContext, ResolutionContextBuilder};
pub use ports::{
    category_repository::{CategoryError, CategoryRepository, InMemoryCategoryRepository},
    event_logger::{NoEventLogger, ResolutionEvent, ResolutionEventLogger},
    progress::{CoordinationProgressNotifier, NoProgress},
    strategy_backend::{StrategyBackendError, StrategyTextBackend},
    strategy_source::{StrategySource, StrategySourceError},
    task_executor::{DryRunExecutor, FnTaskExecutor, RollbackExecutor, TaskExecutor},
    worktree_backend::{WorktreeBackend, WorktreeError},
};
pub use use_cases::compliance_engine::{ComplianceEngine, ComplianceError, RuleRegistration};
pub use use_cases::generate_strategies::{
    DroppedStrategy, GenerateStrategiesUseCase, GeneratedStrategies, RuleBasedStrategySource,
    TextBackendStrategySource,
};
pub use use_cases::parallel_coordinator::{CoordinationError, ParallelCoordinator, SessionCleanup};
pub use use_cases::resolve_conflict::{
    ResolutionPlan, ResolveConflictError, ResolveConflictUseCase, ScoredStrategy,
};
pub use use_cases::rollback::{RollbackFailure, RollbackReport, RollbackUseCase};
pub use use_cases::task_graph::{StatusUpdate, TaskFilter, TaskGraphError, TaskGraphManager};
pub use use_cases::validation::ValidationPipeline;
pub use use_cases::worktree_allocator::{CleanupSummary, WorktreeAllocator};
