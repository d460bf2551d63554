//! Quick validation: four structural checks on a single strategy.

use resolver_domain::validation::QUICK_PASS_THRESHOLD;
use resolver_domain::{
    ExecutionPhase, MultiPhaseStrategy, QuickValidationResult, ResolutionReadiness,
    ValidationCheck, is_validation_step,
};
use std::time::Instant;

/// A check below this score contributes an issue.
pub(crate) const CHECK_PASS_SCORE: f64 = 0.7;

fn check(name: &str, weight: f64, score: f64, issue: String) -> ValidationCheck {
    let check = ValidationCheck::new(name, weight, score, CHECK_PASS_SCORE);
    if check.passed { check } else { check.with_issue(issue) }
}

fn conflict_identification(strategy: &MultiPhaseStrategy) -> ValidationCheck {
    let s = &strategy.strategy;
    let mut score = 0.0;
    if !s.approach.trim().is_empty() {
        score += 0.4;
    }
    if !s.steps.is_empty() {
        score += 0.3;
    }
    let analysed = strategy
        .execution_checkpoints
        .iter()
        .any(|c| c.phase == ExecutionPhase::Analysis)
        || s.steps.iter().any(|step| {
            let lower = step.to_lowercase();
            lower.contains("identify") || lower.contains("analy") || lower.contains("triage")
        });
    if analysed {
        score += 0.3;
    }
    check(
        "conflict_identification",
        0.3,
        score,
        "Strategy does not clearly identify the conflict".to_string(),
    )
}

fn plan_existence(strategy: &MultiPhaseStrategy) -> ValidationCheck {
    let steps = (strategy.strategy.steps.len() as f64 / 3.0).min(1.0);
    let checkpoints = if strategy.execution_checkpoints.is_empty() { 0.0 } else { 0.4 };
    check(
        "resolution_plan",
        0.25,
        steps * 0.6 + checkpoints,
        format!(
            "Resolution plan is thin: {} steps, {} checkpoints",
            strategy.strategy.steps.len(),
            strategy.execution_checkpoints.len()
        ),
    )
}

/// Share of checkpoints carrying a validation criterion, plus credit for a
/// stated validation approach.
fn validation_coverage(strategy: &MultiPhaseStrategy) -> ValidationCheck {
    let checkpoints = &strategy.execution_checkpoints;
    let ratio = if checkpoints.is_empty() {
        if strategy.strategy.validation_steps().is_empty() { 0.0 } else { 1.0 }
    } else {
        let covered = checkpoints
            .iter()
            .filter(|c| c.validation_criteria().next().is_some())
            .count();
        covered as f64 / checkpoints.len() as f64
    };
    let approach = if strategy.strategy.validation_approach.trim().is_empty() {
        0.0
    } else {
        0.2
    };
    check(
        "validation_coverage",
        0.25,
        ratio * 0.8 + approach,
        format!("Only {:.0}% of checkpoints carry a validation step", ratio * 100.0),
    )
}

fn rollback_feasibility(strategy: &MultiPhaseStrategy) -> ValidationCheck {
    let mut score = 0.0;
    if strategy.strategy.has_rollback() {
        score += 0.6;
    }
    if strategy.rollback_points() > 0 {
        score += 0.2;
    }
    if strategy
        .execution_checkpoints
        .iter()
        .any(|c| !c.failure_procedures.is_empty())
    {
        score += 0.2;
    }
    check(
        "rollback_feasibility",
        0.2,
        score,
        "Rollback path is missing or incomplete".to_string(),
    )
}

/// Whether any step, criterion or the validation approach describes testing.
pub(crate) fn mentions_validation(strategy: &MultiPhaseStrategy) -> bool {
    let s = &strategy.strategy;
    is_validation_step(&s.validation_approach)
        || s.steps.iter().any(|t| is_validation_step(t))
        || s.success_criteria.iter().any(|t| is_validation_step(t))
}

pub fn validate_quick(strategy: &MultiPhaseStrategy) -> QuickValidationResult {
    let started = Instant::now();
    let checks = vec![
        conflict_identification(strategy),
        plan_existence(strategy),
        validation_coverage(strategy),
        rollback_feasibility(strategy),
    ];
    let overall_score: f64 = checks.iter().map(ValidationCheck::weighted).sum();
    let issues: Vec<String> = checks.iter().flat_map(|c| c.issues.iter().cloned()).collect();

    QuickValidationResult {
        strategy_id: strategy.id().clone(),
        overall_score,
        resolution_readiness: ResolutionReadiness::from_score_and_issues(
            overall_score,
            issues.len(),
        ),
        passed: overall_score >= QUICK_PASS_THRESHOLD,
        checks,
        issues,
        duration_ms: started.elapsed().as_millis() as u64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resolver_domain::{ExecutionCheckpoint, ResolutionStrategy, StrategyType};

    fn complete_strategy() -> MultiPhaseStrategy {
        let mut s = ResolutionStrategy::new("Conservative", StrategyType::ConservativeMerge);
        s.approach = "Merge both sides with minimal change".into();
        s.steps = vec![
            "Identify overlapping hunks".into(),
            "Merge compatible hunks".into(),
            "Run the regression tests".into(),
        ];
        s.rollback_strategy = "Revert the merge commit".into();
        s.validation_approach = "Full test suite".into();
        let mut strategy = MultiPhaseStrategy::new(s);
        strategy.execution_checkpoints = vec![
            ExecutionCheckpoint::new("cp1", "Analyze", ExecutionPhase::Analysis)
                .with_criterion("Review confirms the hunk map")
                .with_failure_procedure("Escalate")
                .rollback_point(),
            ExecutionCheckpoint::new("cp2", "Validate", ExecutionPhase::Validation)
                .with_criterion("Tests pass"),
        ];
        strategy
    }

    #[test]
    fn test_complete_strategy_is_ready() {
        let result = validate_quick(&complete_strategy());
        assert!((result.overall_score - 1.0).abs() < 1e-9);
        assert!(result.issues.is_empty());
        assert_eq!(result.resolution_readiness, ResolutionReadiness::Ready);
        assert!(result.passed);
        assert_eq!(result.checks.len(), 4);
    }

    #[test]
    fn test_missing_rollback_costs_its_weight() {
        let mut strategy = complete_strategy();
        strategy.strategy.rollback_strategy.clear();
        let result = validate_quick(&strategy);
        // rollback check drops to 0.4 -> loses 0.6 * 0.2
        assert!((result.overall_score - 0.88).abs() < 1e-9);
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.resolution_readiness, ResolutionReadiness::Ready);
    }

    #[test]
    fn test_empty_strategy_needs_major_review() {
        let strategy = MultiPhaseStrategy::new(ResolutionStrategy::new("Empty", StrategyType::Custom));
        let result = validate_quick(&strategy);
        assert_eq!(result.overall_score, 0.0);
        assert_eq!(result.issues.len(), 4);
        assert_eq!(result.resolution_readiness, ResolutionReadiness::NeedsMajorReview);
        assert!(!result.passed);
    }

    #[test]
    fn test_partial_validation_coverage() {
        let mut strategy = complete_strategy();
        strategy.execution_checkpoints[1].success_criteria = vec!["Merged".into()];
        let result = validate_quick(&strategy);
        let coverage = result
            .checks
            .iter()
            .find(|c| c.name == "validation_coverage")
            .unwrap();
        assert!((coverage.score - 0.6).abs() < 1e-9);
        assert!(!coverage.passed);
    }
}
