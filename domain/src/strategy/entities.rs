//! Strategy entities.

use super::checkpoint::{ExecutionCheckpoint, is_validation_step};
use super::risk::{RiskFactor, RiskLevel, aggregate_residual_risk};
use crate::core::ids::StrategyId;
use serde::{Deserialize, Serialize};

/// Archetype a strategy was generated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StrategyType {
    ConservativeMerge,
    FeaturePreservation,
    ArchitecturalRefactor,
    FastTrack,
    SafeMode,
    Hybrid,
    ManualFallback,
    /// Strategy supplied verbatim by an external text backend.
    Custom,
}

impl StrategyType {
    pub fn as_str(&self) -> &str {
        match self {
            StrategyType::ConservativeMerge => "CONSERVATIVE_MERGE",
            StrategyType::FeaturePreservation => "FEATURE_PRESERVATION",
            StrategyType::ArchitecturalRefactor => "ARCHITECTURAL_REFACTOR",
            StrategyType::FastTrack => "FAST_TRACK",
            StrategyType::SafeMode => "SAFE_MODE",
            StrategyType::Hybrid => "HYBRID",
            StrategyType::ManualFallback => "MANUAL_FALLBACK",
            StrategyType::Custom => "CUSTOM",
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            StrategyType::ConservativeMerge => "Conservative Merge",
            StrategyType::FeaturePreservation => "Feature Preservation",
            StrategyType::ArchitecturalRefactor => "Architectural Refactor",
            StrategyType::FastTrack => "Fast Track",
            StrategyType::SafeMode => "Safe Mode",
            StrategyType::Hybrid => "Hybrid",
            StrategyType::ManualFallback => "Manual Resolution",
            StrategyType::Custom => "Custom",
        }
    }
}

impl std::fmt::Display for StrategyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// A structured proposal for resolving a conflict.
///
/// Field names follow the text-backend JSON contract so a backend response
/// deserializes straight into this type. `estimated_time` is in minutes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionStrategy {
    pub id: StrategyId,
    pub name: String,
    pub strategy_type: StrategyType,
    pub approach: String,
    pub steps: Vec<String>,
    pub pros: Vec<String>,
    pub cons: Vec<String>,
    pub confidence: f64,
    /// Estimated time in minutes.
    pub estimated_time: u32,
    pub risk_level: RiskLevel,
    pub requires_approval: bool,
    pub success_criteria: Vec<String>,
    pub rollback_strategy: String,
    pub validation_approach: String,
}

impl ResolutionStrategy {
    pub fn new(name: impl Into<String>, strategy_type: StrategyType) -> Self {
        Self {
            id: StrategyId::generate(),
            name: name.into(),
            strategy_type,
            approach: String::new(),
            steps: Vec::new(),
            pros: Vec::new(),
            cons: Vec::new(),
            confidence: 0.5,
            estimated_time: 0,
            risk_level: RiskLevel::Medium,
            requires_approval: false,
            success_criteria: Vec::new(),
            rollback_strategy: String::new(),
            validation_approach: String::new(),
        }
    }

    pub fn estimated_hours(&self) -> f64 {
        self.estimated_time as f64 / 60.0
    }

    pub fn has_rollback(&self) -> bool {
        !self.rollback_strategy.trim().is_empty()
    }

    /// Steps that describe a verification activity.
    pub fn validation_steps(&self) -> Vec<&String> {
        self.steps.iter().filter(|s| is_validation_step(s)).collect()
    }
}

/// How a named feature affected by the conflict is kept intact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnhancementPreservation {
    pub feature_name: String,
    pub preservation_method: String,
    pub validation_steps: Vec<String>,
    pub rollback_plan: String,
    pub critical: bool,
}

impl EnhancementPreservation {
    pub fn new(feature_name: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            feature_name: feature_name.into(),
            preservation_method: method.into(),
            validation_steps: Vec::new(),
            rollback_plan: String::new(),
            critical: false,
        }
    }

    /// A record is complete when it names a method, at least one validation
    /// step and a rollback plan.
    pub fn is_complete(&self) -> bool {
        !self.preservation_method.trim().is_empty()
            && !self.validation_steps.is_empty()
            && !self.rollback_plan.trim().is_empty()
    }
}

/// Wall-clock cost of producing a strategy, recorded by the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GenerationTimings {
    /// Drafting the strategy text (name, approach, steps, criteria).
    pub specification_ms: u64,
    /// Drafting plus enrichment into the multi-phase form.
    pub strategy_ms: u64,
}

/// A strategy enriched with preservation records, risks and checkpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiPhaseStrategy {
    #[serde(flatten)]
    pub strategy: ResolutionStrategy,
    pub enhancement_preservation: Vec<EnhancementPreservation>,
    pub risk_factors: Vec<RiskFactor>,
    pub execution_checkpoints: Vec<ExecutionCheckpoint>,
    pub parallel_executable: bool,
    pub constitutional_compliant: bool,
    /// Absent for strategies built outside the generator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_timings: Option<GenerationTimings>,
}

impl MultiPhaseStrategy {
    pub fn new(strategy: ResolutionStrategy) -> Self {
        Self {
            strategy,
            enhancement_preservation: Vec::new(),
            risk_factors: Vec::new(),
            execution_checkpoints: Vec::new(),
            parallel_executable: false,
            constitutional_compliant: false,
            generation_timings: None,
        }
    }

    pub fn id(&self) -> &StrategyId {
        &self.strategy.id
    }

    pub fn name(&self) -> &str {
        &self.strategy.name
    }

    pub fn strategy_type(&self) -> StrategyType {
        self.strategy.strategy_type
    }

    pub fn confidence(&self) -> f64 {
        self.strategy.confidence
    }

    pub fn aggregate_residual_risk(&self) -> f64 {
        aggregate_residual_risk(&self.risk_factors)
    }

    /// Sum of checkpoint durations in minutes.
    pub fn checkpoint_minutes(&self) -> u32 {
        self.execution_checkpoints
            .iter()
            .map(|c| c.estimated_duration_minutes)
            .sum()
    }

    pub fn rollback_points(&self) -> usize {
        self.execution_checkpoints
            .iter()
            .filter(|c| c.rollback_point)
            .count()
    }

    /// Serialized form handed to the compliance engine.
    pub fn compliance_content(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| self.strategy.approach.clone())
    }
}
