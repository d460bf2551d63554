//! Strategy domain: archetypes, risks, checkpoints, ranking and parsing.

pub mod checkpoint;
pub mod context;
pub mod entities;
pub mod parser;
pub mod ranking;
pub mod risk;

pub use checkpoint::{ExecutionCheckpoint, ExecutionPhase, is_validation_step};
pub use context::{GenerationContext, RiskTolerance, TeamExperience, Urgency};
pub use entities::{
    EnhancementPreservation, GenerationTimings, MultiPhaseStrategy, ResolutionStrategy,
    StrategyType,
};
pub use parser::{parse_strategy_json, parse_strategy_response};
pub use ranking::{rank_strategies, ranking_score};
pub use risk::{RiskCategory, RiskFactor, RiskLevel, aggregate_residual_risk};
