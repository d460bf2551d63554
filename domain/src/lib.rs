//! Domain layer for conflict-resolver
//!
//! This crate contains the data model and pure algorithms of the resolution
//! workflow. It has no dependencies on infrastructure or presentation
//! concerns and performs no I/O.
//!
//! # Core Concepts
//!
//! - **Conflict**: a closed sum type over merge, dependency, architecture,
//!   semantic and resource conflicts
//! - **Strategy**: a ranked, multi-phase proposal with risk factors and
//!   execution checkpoints
//! - **Compliance**: rules, violations and the `[0, 1]` compliance score
//! - **Task graph**: resolution tasks, their lifecycle and the dependency
//!   graph used for cycle detection
//! - **Coordination**: sessions, barriers, worktrees and resource budgets

pub mod analysis;
pub mod category;
pub mod compliance;
pub mod config;
pub mod conflict;
pub mod coordination;
pub mod core;
pub mod prompt;
pub mod strategy;
pub mod task;
pub mod validation;

// Re-export commonly used types
pub use analysis::{Intent, classify_intent_fallback};
pub use category::Category;
pub use compliance::{
    ComplianceLevel, ComplianceResult, ComplianceScope, ComplianceStatistics, ComplianceTrend,
    ConstitutionalRule, RuleSeverity, TrendDirection, Violation,
};
pub use config::{ConfigIssue, ConfigIssueCode, OutputFormat, Severity};
pub use conflict::{
    ArchitectureViolation, Conflict, ConflictKind, ConflictSeverity, DependencyConflict,
    MergeConflict, ResourceConflict, SemanticConflict,
};
pub use coordination::{
    BarrierResult, BarrierStatus, CoordinationBarrier, CoordinationSession, CoordinationStrategy,
    ExecutionReport, IsolationLevel, ResourceAllocation, ResourceRequest, ResourceType,
    SessionStatus, TaskOutcome, TaskRunStatus, TriggerCondition, WorktreeEnvironment,
    WorktreeStatus, completed_ratio, sanitize_path_component, worktree_branch_name,
};
pub use core::{
    error::DomainError,
    ids::{BarrierId, SessionId, StrategyId, TaskId},
};
pub use prompt::StrategyPromptTemplate;
pub use strategy::{
    EnhancementPreservation, ExecutionCheckpoint, ExecutionPhase, GenerationContext,
    GenerationTimings, MultiPhaseStrategy, ResolutionStrategy, RiskCategory, RiskFactor,
    RiskLevel, RiskTolerance, StrategyType, TeamExperience, Urgency, aggregate_residual_risk,
    is_validation_step, parse_strategy_response, rank_strategies, ranking_score,
};
pub use task::{
    BlockedTask, DependencyGraph, DependencyInfo, DependencyRef, DependencyValidation,
    ResolutionTask, TaskPriority, TaskStatus,
};
pub use validation::{
    ComprehensiveValidationResult, DeploymentReadiness, QualityGate, QuickValidationResult,
    ResolutionReadiness, StandardValidationResult, ValidationCheck, ValidationLevel,
    ValidationOutcome,
};
