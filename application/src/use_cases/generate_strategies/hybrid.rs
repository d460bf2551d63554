//! Hybrid and manual-fallback strategies.

use super::templates::checkpoints_for;
use resolver_domain::{
    Conflict, EnhancementPreservation, ExecutionCheckpoint, GenerationContext, MultiPhaseStrategy,
    ResolutionStrategy, RiskFactor, RiskLevel, StrategyType,
};

const HYBRID_CONFIDENCE_FACTOR: f64 = 0.9;
const HYBRID_TIME_FACTOR: f64 = 1.1;
const FALLBACK_CONFIDENCE: f64 = 0.3;

fn push_unique(target: &mut Vec<String>, items: &[String]) {
    for item in items {
        if !target.contains(item) {
            target.push(item.clone());
        }
    }
}

/// Merge two or more strategies into one HYBRID strategy.
///
/// Confidence is the mean of the inputs × 0.9 and time the maximum × 1.1.
/// Returns `None` for fewer than two inputs.
pub fn build_hybrid(inputs: &[MultiPhaseStrategy]) -> Option<MultiPhaseStrategy> {
    if inputs.len() < 2 {
        return None;
    }

    let names: Vec<&str> = inputs.iter().map(|s| s.name()).collect();
    let mut strategy = ResolutionStrategy::new("Hybrid Resolution", StrategyType::Hybrid);
    strategy.approach = format!("Combine the strengths of: {}.", names.join(", "));

    let mut risk_factors: Vec<RiskFactor> = Vec::new();
    let mut checkpoints: Vec<ExecutionCheckpoint> = Vec::new();
    let mut preservation: Vec<EnhancementPreservation> = Vec::new();
    let mut risk_level = RiskLevel::Low;
    let mut max_time = 0u32;

    for input in inputs {
        let s = &input.strategy;
        push_unique(&mut strategy.steps, &s.steps);
        push_unique(&mut strategy.pros, &s.pros);
        push_unique(&mut strategy.cons, &s.cons);
        push_unique(&mut strategy.success_criteria, &s.success_criteria);
        risk_level = risk_level.max(s.risk_level);
        max_time = max_time.max(s.estimated_time);
        strategy.requires_approval |= s.requires_approval;

        for factor in &input.risk_factors {
            match risk_factors
                .iter_mut()
                .find(|f| f.category == factor.category && f.description == factor.description)
            {
                Some(existing) if existing.residual_risk < factor.residual_risk => {
                    *existing = factor.clone()
                }
                Some(_) => {}
                None => risk_factors.push(factor.clone()),
            }
        }

        for cp in &input.execution_checkpoints {
            if !checkpoints.iter().any(|c| c.name == cp.name) {
                let mut cp = cp.clone();
                cp.id = format!("hybrid-cp{}", checkpoints.len() + 1);
                checkpoints.push(cp);
            }
        }

        for record in &input.enhancement_preservation {
            if !preservation.iter().any(|p| p.feature_name == record.feature_name) {
                preservation.push(record.clone());
            }
        }
    }

    let mean_confidence =
        inputs.iter().map(|s| s.confidence()).sum::<f64>() / inputs.len() as f64;
    strategy.confidence = (mean_confidence * HYBRID_CONFIDENCE_FACTOR).clamp(0.0, 1.0);
    strategy.estimated_time = (max_time as f64 * HYBRID_TIME_FACTOR).round() as u32;
    strategy.risk_level = risk_level;
    strategy.rollback_strategy = inputs
        .iter()
        .map(|s| s.strategy.rollback_strategy.as_str())
        .find(|r| !r.trim().is_empty())
        .unwrap_or_default()
        .to_string();
    strategy.validation_approach = inputs
        .iter()
        .map(|s| s.strategy.validation_approach.as_str())
        .filter(|v| !v.trim().is_empty())
        .collect::<Vec<_>>()
        .join("; ");

    let parallel = checkpoints.iter().any(|c| c.parallel_executable);
    let mut hybrid = MultiPhaseStrategy::new(strategy);
    hybrid.risk_factors = risk_factors;
    hybrid.execution_checkpoints = checkpoints;
    hybrid.enhancement_preservation = preservation;
    hybrid.parallel_executable = parallel;
    Some(hybrid)
}

/// Low-confidence strategy returned when every archetype failed.
pub fn manual_fallback(
    conflict: &Conflict,
    context: &GenerationContext,
    complexity: f64,
) -> MultiPhaseStrategy {
    let mut strategy = ResolutionStrategy::new("Manual Resolution", StrategyType::ManualFallback);
    strategy.approach = format!(
        "Automatic strategy generation failed; resolve manually: {}",
        conflict.summary()
    );
    strategy.steps = vec![
        "Review the conflict with both change owners".into(),
        "Apply the agreed resolution by hand".into(),
        "Verify both changes behave as intended".into(),
    ];
    strategy.cons = vec!["No automated plan available".into()];
    strategy.confidence = FALLBACK_CONFIDENCE;
    strategy.risk_level = RiskLevel::High;
    strategy.requires_approval = true;
    strategy.rollback_strategy = "Revert the resolution commit".into();
    strategy.validation_approach = "Manual verification by both change owners".into();
    strategy.success_criteria = vec!["Both change owners confirm the outcome".into()];

    let checkpoints = checkpoints_for(StrategyType::ManualFallback, complexity);
    strategy.estimated_time = checkpoints.iter().map(|c| c.estimated_duration_minutes).sum();

    let mut fallback = MultiPhaseStrategy::new(strategy);
    fallback.execution_checkpoints = checkpoints;
    fallback.enhancement_preservation = context
        .affected_features
        .iter()
        .map(|f| EnhancementPreservation::new(f.clone(), "Manual verification"))
        .collect();
    fallback
}

#[cfg(test)]
mod tests {
    use super::*;
    use resolver_domain::{MergeConflict, RiskCategory};

    fn strategy(name: &str, confidence: f64, minutes: u32, risk: RiskLevel) -> MultiPhaseStrategy {
        let mut s = ResolutionStrategy::new(name, StrategyType::ConservativeMerge);
        s.confidence = confidence;
        s.estimated_time = minutes;
        s.risk_level = risk;
        s.steps = vec![format!("{name} step"), "shared step".into()];
        s.rollback_strategy = "revert".into();
        let mut m = MultiPhaseStrategy::new(s);
        m.risk_factors = vec![RiskFactor::new(RiskCategory::Technical, "regression", 0.5, 0.5, "")];
        m
    }

    #[test]
    fn test_hybrid_formula() {
        let inputs = vec![
            strategy("A", 0.8, 100, RiskLevel::Low),
            strategy("B", 0.6, 200, RiskLevel::High),
        ];
        let hybrid = build_hybrid(&inputs).unwrap();
        assert!((hybrid.confidence() - 0.63).abs() < 1e-9);
        assert_eq!(hybrid.strategy.estimated_time, 220);
        assert_eq!(hybrid.strategy.risk_level, RiskLevel::High);
        assert_eq!(hybrid.strategy.steps.len(), 3);
        assert_eq!(hybrid.risk_factors.len(), 1);
    }

    #[test]
    fn test_hybrid_needs_two_inputs() {
        assert!(build_hybrid(&[strategy("A", 0.8, 10, RiskLevel::Low)]).is_none());
    }

    #[test]
    fn test_manual_fallback() {
        let conflict = Conflict::MergeConflict(MergeConflict::default());
        let fallback = manual_fallback(&conflict, &GenerationContext::default(), 0.0);
        assert_eq!(fallback.strategy_type(), StrategyType::ManualFallback);
        assert_eq!(fallback.confidence(), 0.3);
        assert!(fallback.strategy.requires_approval);
        assert_eq!(fallback.strategy.estimated_time, 120);
    }
}
