//! Compliance results and scoring.

use super::rule::RuleSeverity;
use crate::core::score::clamp_unit;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Overall compliance level, derived from the worst violation present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComplianceLevel {
    Critical,
    Major,
    Minor,
    /// No CRITICAL, MAJOR or MINOR violation.
    Compliant,
}

impl ComplianceLevel {
    pub fn as_str(&self) -> &str {
        match self {
            ComplianceLevel::Critical => "CRITICAL",
            ComplianceLevel::Major => "MAJOR",
            ComplianceLevel::Minor => "MINOR",
            ComplianceLevel::Compliant => "COMPLIANT",
        }
    }

    /// Worst level among the given violations. WARNING and INFO
    /// violations never lower the level below COMPLIANT.
    pub fn from_violations(violations: &[Violation]) -> Self {
        let worst = violations.iter().map(|v| v.severity.rank()).max();
        match worst {
            Some(r) if r >= RuleSeverity::Critical.rank() => ComplianceLevel::Critical,
            Some(r) if r >= RuleSeverity::Major.rank() => ComplianceLevel::Major,
            Some(r) if r >= RuleSeverity::Minor.rank() => ComplianceLevel::Minor,
            _ => ComplianceLevel::Compliant,
        }
    }
}

impl std::fmt::Display for ComplianceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single rule violation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub rule_id: String,
    pub severity: RuleSeverity,
    /// `min(1, matches / 5)`.
    pub confidence: f64,
    /// Byte offset and excerpt of the first match.
    pub location: String,
    pub remediation: String,
    /// Present when the rule is auto-fixable.
    pub suggested_fix: Option<String>,
    /// Weight of the violated rule, kept so the score can be recomputed.
    pub severity_weight: f64,
}

impl Violation {
    /// Confidence for a given number of pattern matches.
    pub fn confidence_for_matches(matches: usize) -> f64 {
        (matches as f64 / 5.0).min(1.0)
    }

    pub fn penalty(&self) -> f64 {
        self.severity_weight * self.confidence
    }
}

/// Result of validating one piece of content against the rule registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceResult {
    pub overall_score: f64,
    pub level: ComplianceLevel,
    pub violations: Vec<Violation>,
    pub passed_rules: Vec<String>,
    pub failed_rules: Vec<String>,
    pub timestamp: DateTime<Utc>,
    pub context: BTreeMap<String, serde_json::Value>,
}

impl ComplianceResult {
    /// Assemble a result, deriving score and level from the violations.
    pub fn from_parts(
        violations: Vec<Violation>,
        passed_rules: Vec<String>,
        failed_rules: Vec<String>,
        rule_count: usize,
        context: BTreeMap<String, serde_json::Value>,
    ) -> Self {
        let overall_score = compliance_score(&violations, rule_count);
        let level = ComplianceLevel::from_violations(&violations);
        Self {
            overall_score,
            level,
            violations,
            passed_rules,
            failed_rules,
            timestamp: Utc::now(),
            context,
        }
    }

    pub fn has_critical(&self) -> bool {
        self.level == ComplianceLevel::Critical
    }

    pub fn violations_of(&self, severity: RuleSeverity) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(move |v| v.severity == severity)
    }
}

/// Score `max(0, 1 − Σ(weight × confidence) / rule_count)`.
///
/// An empty registry (`rule_count == 0`) scores 1.0.
pub fn compliance_score(violations: &[Violation], rule_count: usize) -> f64 {
    if rule_count == 0 {
        return 1.0;
    }
    let penalty: f64 = violations.iter().map(Violation::penalty).sum();
    clamp_unit(1.0 - penalty / rule_count as f64)
}
