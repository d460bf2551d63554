//! Deterministic archetype selection and confidence scoring.

use crate::config::GenerationParams;
use resolver_domain::{
    Conflict, ConflictSeverity, GenerationContext, RiskFactor, RiskTolerance, StrategyType,
    aggregate_residual_risk,
};

/// Complexity at or above which an architectural refactor is offered.
const ARCHITECTURAL_COMPLEXITY: f64 = 7.0;
/// Similarity at or above which merge-friendly archetypes gain confidence.
const HIGH_SIMILARITY: f64 = 0.7;
const SIMILAR_CONFLICTS_FOR_BONUS: u32 = 3;

/// Archetypes to generate, in generation order.
pub fn select_archetypes(
    conflict: &Conflict,
    context: &GenerationContext,
    complexity: f64,
    params: &GenerationParams,
) -> Vec<StrategyType> {
    let mut selected = vec![StrategyType::ConservativeMerge];

    let merge_like = matches!(
        conflict,
        Conflict::MergeConflict(_) | Conflict::SemanticConflict(_)
    );
    if !context.affected_features.is_empty() || merge_like {
        selected.push(StrategyType::FeaturePreservation);
    }

    let structural = match conflict {
        Conflict::ArchitectureViolation(_) => true,
        Conflict::DependencyConflict(c) => !c.cycle_path.is_empty(),
        _ => false,
    };
    if structural || complexity >= ARCHITECTURAL_COMPLEXITY {
        selected.push(StrategyType::ArchitecturalRefactor);
    }

    if context.urgency.is_high()
        && complexity <= params.fast_track_max_complexity
        && context.risk_tolerance != RiskTolerance::VeryLow
    {
        selected.push(StrategyType::FastTrack);
    }

    if context.risk_tolerance == RiskTolerance::VeryLow
        || conflict.severity() == ConflictSeverity::Critical
    {
        selected.push(StrategyType::SafeMode);
    }

    selected
}

pub fn base_confidence(archetype: StrategyType) -> f64 {
    match archetype {
        StrategyType::ConservativeMerge => 0.85,
        StrategyType::FeaturePreservation => 0.8,
        StrategyType::ArchitecturalRefactor => 0.7,
        StrategyType::FastTrack => 0.65,
        StrategyType::SafeMode => 0.9,
        StrategyType::Custom => 0.6,
        StrategyType::Hybrid => 0.6,
        StrategyType::ManualFallback => 0.3,
    }
}

/// Base confidence reduced by half the mean residual risk, then adjusted by
/// context bonuses, clamped to `[0.1, 0.99]`.
pub fn compute_confidence(
    archetype: StrategyType,
    risk_factors: &[RiskFactor],
    conflict: &Conflict,
    context: &GenerationContext,
) -> f64 {
    let mut confidence = base_confidence(archetype) - aggregate_residual_risk(risk_factors) * 0.5;

    if context.similar_conflicts_resolved >= SIMILAR_CONFLICTS_FOR_BONUS {
        confidence += 0.05;
    }
    confidence += context.team_experience.confidence_adjustment();

    if let Conflict::MergeConflict(merge) = conflict
        && merge.similarity_score >= HIGH_SIMILARITY
        && matches!(
            archetype,
            StrategyType::ConservativeMerge | StrategyType::FeaturePreservation
        )
    {
        confidence += 0.05;
    }

    confidence.clamp(0.1, 0.99)
}
