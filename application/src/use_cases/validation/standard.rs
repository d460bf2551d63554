//! Standard validation: quick checks plus constitutional compliance and
//! feature-preservation analysis behind three quality gates.

use super::quick::{CHECK_PASS_SCORE, mentions_validation, validate_quick};
use crate::config::ValidationThresholds;
use crate::use_cases::compliance_engine::ComplianceEngine;
use resolver_domain::core::score::mean;
use resolver_domain::validation::{PreservationAnalysis, QUICK_PASS_THRESHOLD};
use resolver_domain::{
    ComplianceResult, ComplianceScope, MultiPhaseStrategy, QualityGate, ResolutionReadiness,
    StandardValidationResult, ValidationCheck,
};
use serde_json::Value;
use std::collections::BTreeMap;

const ROLLBACK_WORDS: [&str; 6] = ["revert", "restore", "rollback", "roll back", "undo", "reset"];
const PRESERVATION_WORDS: [&str; 3] = ["preserv", "regression", "feature"];

fn contains_any(text: &str, words: &[&str]) -> bool {
    let lower = text.to_lowercase();
    words.iter().any(|w| lower.contains(w))
}

/// Presence and quality of preservation records, preservation-aware
/// validation wording, rollback wording and strategy confidence.
pub fn analyze_preservation(strategy: &MultiPhaseStrategy) -> PreservationAnalysis {
    let s = &strategy.strategy;
    let records = &strategy.enhancement_preservation;
    let features_total = records.len();
    let features_preserved = records.iter().filter(|r| r.is_complete()).count();

    let records_score = if features_total == 0 {
        1.0
    } else {
        features_preserved as f64 / features_total as f64
    };
    let mut records_check = ValidationCheck::new(
        "preservation_records",
        0.3,
        records_score,
        CHECK_PASS_SCORE,
    );
    for record in records.iter().filter(|r| !r.is_complete()) {
        records_check = records_check.with_issue(format!(
            "Preservation record for '{}' is incomplete",
            record.feature_name
        ));
    }

    let preservation_aware = s
        .steps
        .iter()
        .chain(s.success_criteria.iter())
        .chain(std::iter::once(&s.validation_approach))
        .any(|t| contains_any(t, &PRESERVATION_WORDS))
        || records.iter().any(|r| !r.validation_steps.is_empty());
    let wording_score = (if mentions_validation(strategy) { 0.5 } else { 0.0 })
        + (if preservation_aware { 0.5 } else { 0.0 });
    let mut wording_check =
        ValidationCheck::new("preservation_validation", 0.3, wording_score, CHECK_PASS_SCORE);
    if !wording_check.passed {
        wording_check =
            wording_check.with_issue("Validation steps do not cover feature preservation");
    }

    let rollback_score = if contains_any(&s.rollback_strategy, &ROLLBACK_WORDS) {
        1.0
    } else if s.has_rollback() {
        0.5
    } else {
        0.0
    };
    let mut rollback_check =
        ValidationCheck::new("rollback_wording", 0.2, rollback_score, CHECK_PASS_SCORE);
    if !rollback_check.passed {
        rollback_check = rollback_check.with_issue("Rollback strategy does not describe a revert");
    }

    let mut confidence_check =
        ValidationCheck::new("strategy_confidence", 0.2, s.confidence, CHECK_PASS_SCORE);
    if !confidence_check.passed {
        confidence_check = confidence_check
            .with_issue(format!("Strategy confidence {:.2} is low", s.confidence));
    }

    let checks = vec![records_check, wording_check, rollback_check, confidence_check];
    let score = checks.iter().map(ValidationCheck::weighted).sum();
    let issues = checks.iter().flat_map(|c| c.issues.iter().cloned()).collect();
    PreservationAnalysis {
        score,
        features_total,
        features_preserved,
        checks,
        issues,
    }
}

/// Run the compliance engine over the serialized strategy.
pub fn constitutional_compliance(
    engine: &ComplianceEngine,
    strategy: &MultiPhaseStrategy,
) -> ComplianceResult {
    let mut context = BTreeMap::new();
    context.insert(
        "strategy_id".to_string(),
        Value::String(strategy.id().as_str().to_string()),
    );
    context.insert(
        "strategy_type".to_string(),
        Value::String(strategy.strategy_type().as_str().to_string()),
    );
    engine.validate(&strategy.compliance_content(), &ComplianceScope::all(), context)
}

pub fn validate_standard(
    engine: &ComplianceEngine,
    thresholds: &ValidationThresholds,
    strategy: &MultiPhaseStrategy,
) -> StandardValidationResult {
    let quick = validate_quick(strategy);
    let compliance = constitutional_compliance(engine, strategy);
    let preservation = analyze_preservation(strategy);

    let overall_score = mean(&[quick.overall_score, compliance.overall_score, preservation.score]);
    let quality_gates = vec![
        QualityGate::new(
            "constitutional_compliance",
            thresholds.constitutional,
            compliance.overall_score,
        ),
        QualityGate::new("feature_preservation", thresholds.preservation, preservation.score),
        QualityGate::new("overall_score", thresholds.overall, overall_score),
    ];
    let gates_passed = quality_gates.iter().filter(|g| g.passed).count();

    let mut issues = quick.issues.clone();
    issues.extend(compliance.violations.iter().map(|v| {
        format!("{} violation {} at {}", v.severity, v.rule_id, v.location)
    }));
    issues.extend(preservation.issues.iter().cloned());
    issues.extend(quality_gates.iter().filter(|g| !g.passed).map(|g| {
        format!(
            "Quality gate '{}' failed: {:.2} < {:.2}",
            g.name, g.actual, g.threshold
        )
    }));

    let passed = gates_passed == quality_gates.len() && quick.overall_score >= QUICK_PASS_THRESHOLD;
    StandardValidationResult {
        constitutional_score: compliance.overall_score,
        compliance_level: compliance.level,
        violations: compliance.violations,
        overall_score,
        resolution_readiness: ResolutionReadiness::from_gates(gates_passed, quality_gates.len()),
        passed,
        quick,
        preservation,
        quality_gates,
        issues,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::builtin_rules::builtin_rules;
    use resolver_domain::{
        ComplianceLevel, EnhancementPreservation, ExecutionCheckpoint, ExecutionPhase,
        ResolutionStrategy, StrategyType,
    };

    fn strategy() -> MultiPhaseStrategy {
        let mut s = ResolutionStrategy::new("Feature", StrategyType::FeaturePreservation);
        s.approach = "Integrate both changes behind preserved interfaces".into();
        s.steps = vec![
            "Identify affected features".into(),
            "Integrate the changes".into(),
            "Verify each feature with its regression tests".into(),
        ];
        s.confidence = 0.85;
        s.rollback_strategy = "Revert the integration commit".into();
        s.validation_approach = "Feature regression tests".into();
        let mut strategy = MultiPhaseStrategy::new(s);
        strategy.execution_checkpoints = vec![
            ExecutionCheckpoint::new("cp1", "Inventory", ExecutionPhase::Analysis)
                .with_criterion("Owners confirm the inventory")
                .with_failure_procedure("Escalate")
                .rollback_point(),
        ];
        let mut record = EnhancementPreservation::new("search", "Keep the interface");
        record.validation_steps = vec!["Run search tests".into()];
        record.rollback_plan = "Restore search".into();
        strategy.enhancement_preservation = vec![record];
        strategy
    }

    fn engine() -> ComplianceEngine {
        let engine = ComplianceEngine::default();
        engine.register_rules(builtin_rules());
        engine
    }

    #[test]
    fn test_clean_strategy_passes_all_gates() {
        let result = validate_standard(&engine(), &ValidationThresholds::default(), &strategy());
        assert_eq!(result.compliance_level, ComplianceLevel::Compliant);
        assert_eq!(result.gates_passed(), 3);
        assert!(result.passed);
        assert_eq!(result.resolution_readiness, ResolutionReadiness::Ready);
        assert!(result.quick.overall_score >= QUICK_PASS_THRESHOLD);
    }

    #[test]
    fn test_overall_is_mean_of_three_scores() {
        let result = validate_standard(&engine(), &ValidationThresholds::default(), &strategy());
        let expected =
            (result.quick.overall_score + result.constitutional_score + result.preservation.score)
                / 3.0;
        assert!((result.overall_score - expected).abs() < 1e-9);
    }

    #[test]
    fn test_critical_rule_lowers_constitutional_score() {
        let mut risky = strategy();
        risky.strategy.steps.push("Force push the merged branch".into());
        let result = validate_standard(&engine(), &ValidationThresholds::default(), &risky);
        assert_eq!(result.compliance_level, ComplianceLevel::Critical);
        assert!(result.constitutional_score < 1.0);
        assert!(result.issues.iter().any(|i| i.contains("SAFE-001")));
    }

    #[test]
    fn test_incomplete_preservation_record() {
        let mut weak = strategy();
        weak.enhancement_preservation[0].rollback_plan.clear();
        let analysis = analyze_preservation(&weak);
        assert_eq!(analysis.features_total, 1);
        assert_eq!(analysis.features_preserved, 0);
        assert!(analysis.issues.iter().any(|i| i.contains("search")));

        let result = validate_standard(&engine(), &ValidationThresholds::default(), &weak);
        assert!(!result.passed);
        assert!(!result.all_gates_pass());
    }

    #[test]
    fn test_no_features_scores_records_full() {
        let mut plain = strategy();
        plain.enhancement_preservation.clear();
        let analysis = analyze_preservation(&plain);
        assert_eq!(analysis.checks[0].score, 1.0);
    }
}
