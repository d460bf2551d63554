//! Result records produced by the three validators.

use super::readiness::{
    DeploymentReadiness, QualityGate, ResolutionReadiness, ValidationCheck, ValidationLevel,
};
use crate::compliance::{ComplianceLevel, RuleSeverity, Violation};
use crate::core::ids::StrategyId;
use crate::core::score::{clamp_unit, mean};
use crate::strategy::RiskCategory;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuickValidationResult {
    pub strategy_id: StrategyId,
    pub overall_score: f64,
    pub checks: Vec<ValidationCheck>,
    pub issues: Vec<String>,
    pub resolution_readiness: ResolutionReadiness,
    pub passed: bool,
    pub duration_ms: u64,
}

/// Presence and quality of feature-preservation planning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreservationAnalysis {
    pub score: f64,
    pub features_total: usize,
    pub features_preserved: usize,
    pub checks: Vec<ValidationCheck>,
    pub issues: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardValidationResult {
    pub quick: QuickValidationResult,
    pub constitutional_score: f64,
    pub compliance_level: ComplianceLevel,
    /// Rule violations found in the serialized strategy.
    #[serde(default)]
    pub violations: Vec<Violation>,
    pub preservation: PreservationAnalysis,
    pub overall_score: f64,
    pub quality_gates: Vec<QualityGate>,
    pub issues: Vec<String>,
    pub resolution_readiness: ResolutionReadiness,
    pub passed: bool,
}

impl StandardValidationResult {
    pub fn gates_passed(&self) -> usize {
        self.quality_gates.iter().filter(|g| g.passed).count()
    }

    pub fn all_gates_pass(&self) -> bool {
        self.quality_gates.iter().all(|g| g.passed)
    }

    pub fn critical_violations(&self) -> impl Iterator<Item = &Violation> {
        self.violations
            .iter()
            .filter(|v| v.severity == RuleSeverity::Critical)
    }
}

/// End-to-end workflow capability checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowValidation {
    pub score: f64,
    pub checks: Vec<ValidationCheck>,
}

/// One timed generation step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkStep {
    pub name: String,
    pub target_ms: u64,
    pub elapsed_ms: u64,
    pub score: f64,
    pub error: Option<String>,
}

impl BenchmarkStep {
    /// Full marks within target, `target / elapsed` beyond it.
    pub fn measured(name: impl Into<String>, target_ms: u64, elapsed_ms: u64) -> Self {
        let score = if elapsed_ms <= target_ms {
            1.0
        } else {
            clamp_unit(target_ms as f64 / elapsed_ms as f64)
        };
        Self {
            name: name.into(),
            target_ms,
            elapsed_ms,
            score,
            error: None,
        }
    }

    pub fn failed(name: impl Into<String>, target_ms: u64, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target_ms,
            elapsed_ms: 0,
            score: 0.0,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceBenchmark {
    pub score: f64,
    pub steps: Vec<BenchmarkStep>,
}

impl PerformanceBenchmark {
    pub fn from_steps(steps: Vec<BenchmarkStep>) -> Self {
        let scores: Vec<f64> = steps.iter().map(|s| s.score).collect();
        Self {
            score: mean(&scores),
            steps,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QualityMetrics {
    pub complexity: f64,
    pub maintainability: f64,
    pub testability: f64,
    pub security: f64,
    pub reliability: f64,
    pub performance: f64,
    pub documentation: f64,
}

impl QualityMetrics {
    pub fn overall(&self) -> f64 {
        mean(&[
            self.complexity,
            self.maintainability,
            self.testability,
            self.security,
            self.reliability,
            self.performance,
            self.documentation,
        ])
    }
}

/// Category weight in the comprehensive risk assessment.
pub fn risk_category_weight(category: RiskCategory) -> f64 {
    match category {
        RiskCategory::Technical => 0.3,
        RiskCategory::Business => 0.25,
        RiskCategory::Resource => 0.2,
        RiskCategory::Timeline => 0.15,
        RiskCategory::Quality => 0.1,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Raw exposure per category, keyed by category name.
    pub category_risks: BTreeMap<String, f64>,
    pub weighted_risk: f64,
    pub mitigation_effectiveness: f64,
    pub residual_risk: f64,
}

impl RiskAssessment {
    pub fn new(category_risks: BTreeMap<String, f64>, mitigation_effectiveness: f64) -> Self {
        let weighted_risk = clamp_unit(
            RiskCategory::ALL
                .iter()
                .map(|c| risk_category_weight(*c) * category_risks.get(c.as_str()).copied().unwrap_or(0.0))
                .sum(),
        );
        let mitigation_effectiveness = clamp_unit(mitigation_effectiveness);
        Self {
            category_risks,
            weighted_risk,
            mitigation_effectiveness,
            residual_risk: clamp_unit(weighted_risk * (1.0 - mitigation_effectiveness)),
        }
    }

    pub fn safety_score(&self) -> f64 {
        1.0 - self.residual_risk
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComprehensiveValidationResult {
    pub standard: StandardValidationResult,
    pub workflow: WorkflowValidation,
    pub performance: PerformanceBenchmark,
    pub quality_metrics: QualityMetrics,
    pub risk_assessment: RiskAssessment,
    pub overall_score: f64,
    pub critical_issues: Vec<String>,
    pub issues: Vec<String>,
    pub deployment_readiness: DeploymentReadiness,
    pub passed: bool,
}

/// Result of any validator, tagged with its level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "level", rename_all = "snake_case")]
pub enum ValidationOutcome {
    Quick(QuickValidationResult),
    Standard(StandardValidationResult),
    Comprehensive(Box<ComprehensiveValidationResult>),
}

impl ValidationOutcome {
    pub fn level(&self) -> ValidationLevel {
        match self {
            ValidationOutcome::Quick(_) => ValidationLevel::Quick,
            ValidationOutcome::Standard(_) => ValidationLevel::Standard,
            ValidationOutcome::Comprehensive(_) => ValidationLevel::Comprehensive,
        }
    }

    pub fn overall_score(&self) -> f64 {
        match self {
            ValidationOutcome::Quick(r) => r.overall_score,
            ValidationOutcome::Standard(r) => r.overall_score,
            ValidationOutcome::Comprehensive(r) => r.overall_score,
        }
    }

    pub fn passed(&self) -> bool {
        match self {
            ValidationOutcome::Quick(r) => r.passed,
            ValidationOutcome::Standard(r) => r.passed,
            ValidationOutcome::Comprehensive(r) => r.passed,
        }
    }

    /// Human-readable readiness label for the level.
    pub fn readiness_label(&self) -> &str {
        match self {
            ValidationOutcome::Quick(r) => r.resolution_readiness.as_str(),
            ValidationOutcome::Standard(r) => r.resolution_readiness.as_str(),
            ValidationOutcome::Comprehensive(r) => r.deployment_readiness.as_str(),
        }
    }

    pub fn issues(&self) -> &[String] {
        match self {
            ValidationOutcome::Quick(r) => &r.issues,
            ValidationOutcome::Standard(r) => &r.issues,
            ValidationOutcome::Comprehensive(r) => &r.issues,
        }
    }
}
