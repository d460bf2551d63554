//! Comprehensive validation: standard validation plus workflow checks,
//! timed benchmarks, quality metrics and a weighted risk assessment.

use super::quick::CHECK_PASS_SCORE;
use super::standard::validate_standard;
use crate::config::ValidationThresholds;
use crate::use_cases::compliance_engine::ComplianceEngine;
use resolver_domain::core::score::{clamp_unit, mean, weighted_sum};
use resolver_domain::validation::{
    BenchmarkStep, PerformanceBenchmark, QualityMetrics, RiskAssessment, WorkflowValidation,
};
use resolver_domain::{
    ComprehensiveValidationResult, DeploymentReadiness, ExecutionPhase, MultiPhaseStrategy,
    RiskCategory, RiskLevel, StandardValidationResult, ValidationCheck,
};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::debug;

const REQUIRED_PHASES: [ExecutionPhase; 3] = [
    ExecutionPhase::Analysis,
    ExecutionPhase::Implementation,
    ExecutionPhase::Validation,
];

fn workflow_check(name: &str, score: f64, issue: &str) -> ValidationCheck {
    let check = ValidationCheck::new(name, 0.2, score, CHECK_PASS_SCORE);
    if check.passed { check } else { check.with_issue(issue) }
}

pub fn validate_workflow(
    strategy: &MultiPhaseStrategy,
    standard: &StandardValidationResult,
) -> WorkflowValidation {
    let s = &strategy.strategy;
    let checkpoints = &strategy.execution_checkpoints;

    let specification = (if s.approach.trim().is_empty() { 0.0 } else { 0.4 })
        + (if s.success_criteria.is_empty() { 0.0 } else { 0.3 })
        + (if s.steps.is_empty() { 0.0 } else { 0.3 });

    let phases_present = REQUIRED_PHASES
        .iter()
        .filter(|phase| checkpoints.iter().any(|c| c.phase == **phase))
        .count();
    let coverage = phases_present as f64 / REQUIRED_PHASES.len() as f64;

    let parallel = if strategy.parallel_executable { 1.0 } else { 0.5 };

    let implementation_guarded = checkpoints
        .iter()
        .filter(|c| c.phase == ExecutionPhase::Implementation)
        .all(|c| !c.failure_procedures.is_empty());
    let rollback = (if s.has_rollback() { 0.5 } else { 0.0 })
        + (if strategy.rollback_points() > 0 { 0.3 } else { 0.0 })
        + (if !checkpoints.is_empty() && implementation_guarded { 0.2 } else { 0.0 });

    let gates = if standard.quality_gates.is_empty() {
        0.0
    } else {
        standard.gates_passed() as f64 / standard.quality_gates.len() as f64
    };

    let checks = vec![
        workflow_check(
            "specification_integration",
            specification,
            "Strategy is not fully specified",
        ),
        workflow_check(
            "checkpoint_coverage",
            coverage,
            "Checkpoints do not cover analysis, implementation and validation",
        ),
        workflow_check(
            "parallel_execution",
            parallel,
            "Strategy has no parallel-executable checkpoint",
        ),
        workflow_check("rollback_workflow", rollback, "Rollback workflow is incomplete"),
        workflow_check("quality_gate_wiring", gates, "Not every quality gate passes"),
    ];
    WorkflowValidation {
        score: checks.iter().map(ValidationCheck::weighted).sum(),
        checks,
    }
}

fn target_ms(target: Duration) -> u64 {
    target.as_millis() as u64
}

/// A generation step scored from the timings the generator recorded.
fn recorded_step(name: &str, target: Duration, recorded: Option<u64>) -> BenchmarkStep {
    match recorded {
        Some(elapsed) => BenchmarkStep::measured(name, target_ms(target), elapsed),
        None => BenchmarkStep::failed(
            name,
            target_ms(target),
            "strategy was not timed during generation",
        ),
    }
}

/// Score specification, strategy and validation generation against targets.
///
/// The first two use the timings recorded when the strategy was drafted and
/// enriched; standard validation is timed here. A step without a
/// measurement scores 0 instead of aborting the benchmark.
fn benchmark(
    engine: &ComplianceEngine,
    thresholds: &ValidationThresholds,
    strategy: &MultiPhaseStrategy,
) -> (PerformanceBenchmark, StandardValidationResult) {
    let timings = strategy.generation_timings;
    let mut steps = vec![
        recorded_step(
            "specification_generation",
            thresholds.specification_target,
            timings.map(|t| t.specification_ms),
        ),
        recorded_step(
            "strategy_generation",
            thresholds.strategy_target,
            timings.map(|t| t.strategy_ms),
        ),
    ];

    let started = Instant::now();
    let standard = validate_standard(engine, thresholds, strategy);
    steps.push(BenchmarkStep::measured(
        "validation_generation",
        target_ms(thresholds.validation_target),
        started.elapsed().as_millis() as u64,
    ));

    (PerformanceBenchmark::from_steps(steps), standard)
}

pub fn quality_metrics(
    strategy: &MultiPhaseStrategy,
    standard: &StandardValidationResult,
    performance: &PerformanceBenchmark,
) -> QualityMetrics {
    let s = &strategy.strategy;
    let size = (s.steps.len() + strategy.execution_checkpoints.len()) as f64;
    let testability = standard
        .quick
        .checks
        .iter()
        .find(|c| c.name == "validation_coverage")
        .map(|c| c.score)
        .unwrap_or(0.0);
    let documentation = if strategy
        .execution_checkpoints
        .iter()
        .any(|c| c.phase == ExecutionPhase::Documentation)
    {
        1.0
    } else if !s.success_criteria.is_empty() {
        0.5
    } else {
        0.0
    };

    QualityMetrics {
        complexity: clamp_unit(1.0 - size / 30.0),
        maintainability: standard.preservation.score,
        testability,
        security: standard.constitutional_score,
        reliability: clamp_unit(1.0 - strategy.aggregate_residual_risk()),
        performance: performance.score,
        documentation,
    }
}

/// Worst exposure per category, reduced by the mean mitigation effectiveness.
pub fn assess_risk(strategy: &MultiPhaseStrategy) -> RiskAssessment {
    let mut category_risks = BTreeMap::new();
    for category in RiskCategory::ALL {
        let exposure = strategy
            .risk_factors
            .iter()
            .filter(|f| f.category == category)
            .map(|f| f.exposure())
            .fold(0.0, f64::max);
        category_risks.insert(category.as_str().to_string(), exposure);
    }
    let effectiveness: Vec<f64> = strategy
        .risk_factors
        .iter()
        .map(|f| f.mitigation_effectiveness)
        .collect();
    RiskAssessment::new(category_risks, mean(&effectiveness))
}

pub fn validate_comprehensive(
    engine: &ComplianceEngine,
    thresholds: &ValidationThresholds,
    strategy: &MultiPhaseStrategy,
) -> ComprehensiveValidationResult {
    let (performance, standard) = benchmark(engine, thresholds, strategy);
    let workflow = validate_workflow(strategy, &standard);
    let quality_metrics = quality_metrics(strategy, &standard, &performance);
    let risk_assessment = assess_risk(strategy);

    let overall_score = weighted_sum(&[
        (0.3, standard.overall_score),
        (0.25, workflow.score),
        (0.2, performance.score),
        (0.15, risk_assessment.safety_score()),
        (0.1, standard.constitutional_score),
    ]);

    let mut critical_issues: Vec<String> = standard
        .critical_violations()
        .map(|v| format!("Critical violation {} at {}", v.rule_id, v.location))
        .collect();
    critical_issues.extend(
        strategy
            .risk_factors
            .iter()
            .filter(|f| RiskLevel::from_residual(f.residual_risk) == RiskLevel::Critical)
            .map(|f| format!("Critical residual risk ({}): {}", f.category, f.description)),
    );

    let mut issues = standard.issues.clone();
    issues.extend(workflow.checks.iter().flat_map(|c| c.issues.iter().cloned()));
    issues.extend(
        performance
            .steps
            .iter()
            .filter_map(|s| s.error.as_ref().map(|e| format!("Benchmark {} failed: {}", s.name, e))),
    );

    let deployment_readiness =
        DeploymentReadiness::assess(performance.score, overall_score, critical_issues.len());
    let passed = standard.passed && overall_score >= thresholds.overall && critical_issues.is_empty();
    debug!(
        "Comprehensive validation of {}: {:.2} ({})",
        strategy.name(),
        overall_score,
        deployment_readiness
    );

    ComprehensiveValidationResult {
        standard,
        workflow,
        performance,
        quality_metrics,
        risk_assessment,
        overall_score,
        critical_issues,
        issues,
        deployment_readiness,
        passed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::builtin_rules::builtin_rules;
    use crate::use_cases::generate_strategies::GenerateStrategiesUseCase;
    use resolver_domain::{
        ConstitutionalRule, Conflict, GenerationContext, GenerationTimings, MergeConflict,
        RiskFactor, RuleSeverity,
    };

    async fn generated() -> MultiPhaseStrategy {
        let conflict = Conflict::MergeConflict(MergeConflict {
            pr1_id: "1".into(),
            pr2_id: "2".into(),
            file_path: "src/lib.rs".into(),
            similarity_score: 0.8,
            ..Default::default()
        });
        let context = GenerationContext::default().with_feature("search");
        let generated = GenerateStrategiesUseCase::rule_based()
            .execute(&conflict, &context)
            .await;
        generated
            .strategies
            .into_iter()
            .find(|s| s.strategy_type() == resolver_domain::StrategyType::ConservativeMerge)
            .unwrap()
    }

    fn engine() -> ComplianceEngine {
        let engine = ComplianceEngine::default();
        engine.register_rules(builtin_rules());
        engine
    }

    #[tokio::test]
    async fn test_overall_formula() {
        let strategy = generated().await;
        let result = validate_comprehensive(&engine(), &ValidationThresholds::default(), &strategy);
        let expected = 0.3 * result.standard.overall_score
            + 0.25 * result.workflow.score
            + 0.2 * result.performance.score
            + 0.15 * result.risk_assessment.safety_score()
            + 0.1 * result.standard.constitutional_score;
        assert!((result.overall_score - expected).abs() < 1e-9);
        assert_eq!(result.performance.steps.len(), 3);
        assert_eq!(result.workflow.checks.len(), 5);
    }

    #[tokio::test]
    async fn test_pass_implies_standard_gates_pass() {
        let strategy = generated().await;
        let result = validate_comprehensive(&engine(), &ValidationThresholds::default(), &strategy);
        if result.passed {
            assert!(result.standard.all_gates_pass());
        }
    }

    #[tokio::test]
    async fn test_critical_violation_forces_not_ready() {
        let mut strategy = generated().await;
        strategy.strategy.steps.push("rm -rf / on the build host".into());
        let result = validate_comprehensive(&engine(), &ValidationThresholds::default(), &strategy);
        assert!(!result.critical_issues.is_empty());
        assert_eq!(result.deployment_readiness, DeploymentReadiness::NotReady);
        assert!(!result.passed);
    }

    #[test]
    fn test_risk_assessment_uses_worst_exposure() {
        let mut strategy = MultiPhaseStrategy::new(resolver_domain::ResolutionStrategy::new(
            "x",
            resolver_domain::StrategyType::Custom,
        ));
        strategy.risk_factors = vec![
            RiskFactor::new(RiskCategory::Technical, "a", 0.5, 0.5, "m"),
            RiskFactor::new(RiskCategory::Technical, "b", 0.8, 0.5, "m"),
        ];
        let assessment = assess_risk(&strategy);
        assert!((assessment.category_risks["technical"] - 0.4).abs() < 1e-9);
        assert!((assessment.weighted_risk - 0.12).abs() < 1e-9);
        assert!((assessment.mitigation_effectiveness - 0.5).abs() < 1e-9);
        assert!((assessment.residual_risk - 0.06).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_critical_issues_come_from_critical_violations() {
        let mut strategy = generated().await;
        strategy.strategy.steps.push("rm -rf / on the build host".into());
        let result = validate_comprehensive(&engine(), &ValidationThresholds::default(), &strategy);
        assert!(result.standard.critical_violations().count() >= 1);
        assert!(
            result
                .critical_issues
                .iter()
                .any(|i| i.starts_with("Critical violation SAFE-001"))
        );
    }

    #[tokio::test]
    async fn test_major_violation_is_not_critical() {
        let engine = ComplianceEngine::default();
        engine.register_rules(vec![ConstitutionalRule::new(
            "DOC-900",
            "documentation",
            RuleSeverity::Major,
            r"(?i)conservative",
        )]);
        let strategy = generated().await;
        let result = validate_comprehensive(&engine, &ValidationThresholds::default(), &strategy);
        assert!(!result.standard.violations.is_empty());
        assert_eq!(result.standard.critical_violations().count(), 0);
        assert!(
            !result
                .critical_issues
                .iter()
                .any(|i| i.starts_with("Critical violation"))
        );
    }

    // ===== Benchmark =====

    #[tokio::test]
    async fn test_generated_strategy_uses_recorded_timings() {
        let strategy = generated().await;
        let timings = strategy.generation_timings.unwrap();
        let result = validate_comprehensive(&engine(), &ValidationThresholds::default(), &strategy);
        let steps = &result.performance.steps;
        assert_eq!(steps[0].name, "specification_generation");
        assert_eq!(steps[0].elapsed_ms, timings.specification_ms);
        assert_eq!(steps[1].name, "strategy_generation");
        assert_eq!(steps[1].elapsed_ms, timings.strategy_ms);
        assert!(steps.iter().all(|s| s.error.is_none()));
    }

    #[tokio::test]
    async fn test_slow_generation_scores_below_target() {
        let mut strategy = generated().await;
        let thresholds = ValidationThresholds::default();
        strategy.generation_timings = Some(GenerationTimings {
            specification_ms: 1_000,
            strategy_ms: 2 * thresholds.strategy_target.as_millis() as u64,
        });
        let result = validate_comprehensive(&engine(), &thresholds, &strategy);

        assert_eq!(result.performance.steps[0].score, 1.0);
        assert!((result.performance.steps[1].score - 0.5).abs() < 1e-9);
        assert!(result.performance.score < 1.0);
        assert_ne!(result.deployment_readiness, DeploymentReadiness::ProductionReady);
    }

    #[tokio::test]
    async fn test_untimed_strategy_fails_generation_steps() {
        let mut strategy = generated().await;
        strategy.generation_timings = None;
        let result = validate_comprehensive(&engine(), &ValidationThresholds::default(), &strategy);

        assert_eq!(result.performance.steps[0].score, 0.0);
        assert_eq!(result.performance.steps[1].score, 0.0);
        assert!(
            result
                .issues
                .iter()
                .any(|i| i.starts_with("Benchmark strategy_generation failed"))
        );
        assert!(result.critical_issues.iter().all(|i| !i.contains("Benchmark")));
    }
}
