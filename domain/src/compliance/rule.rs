//! Constitutional rules.
//!
//! A rule describes an anti-pattern: its `pattern` is a regular expression
//! that, when it matches the validated content, produces a violation.
//! Rules are immutable once registered.

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// Severity of a rule violation, ordered from most to least serious.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleSeverity {
    Critical,
    Major,
    Minor,
    Warning,
    Info,
}

impl RuleSeverity {
    pub fn as_str(&self) -> &str {
        match self {
            RuleSeverity::Critical => "CRITICAL",
            RuleSeverity::Major => "MAJOR",
            RuleSeverity::Minor => "MINOR",
            RuleSeverity::Warning => "WARNING",
            RuleSeverity::Info => "INFO",
        }
    }

    /// Default severity weight used when a rule file omits one.
    pub fn default_weight(&self) -> f64 {
        match self {
            RuleSeverity::Critical => 1.0,
            RuleSeverity::Major => 0.7,
            RuleSeverity::Minor => 0.4,
            RuleSeverity::Warning => 0.2,
            RuleSeverity::Info => 0.05,
        }
    }

    /// Rank where a higher value is more severe.
    pub fn rank(&self) -> u8 {
        match self {
            RuleSeverity::Critical => 4,
            RuleSeverity::Major => 3,
            RuleSeverity::Minor => 2,
            RuleSeverity::Warning => 1,
            RuleSeverity::Info => 0,
        }
    }
}

impl std::fmt::Display for RuleSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for RuleSeverity {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "CRITICAL" => Ok(RuleSeverity::Critical),
            "MAJOR" => Ok(RuleSeverity::Major),
            "MINOR" => Ok(RuleSeverity::Minor),
            "WARNING" => Ok(RuleSeverity::Warning),
            "INFO" => Ok(RuleSeverity::Info),
            other => Err(DomainError::unknown("rule severity", other)),
        }
    }
}

/// A registered compliance rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstitutionalRule {
    pub id: String,
    pub category: String,
    #[serde(default)]
    pub description: String,
    pub severity: RuleSeverity,
    /// Regular expression matched against the serialized content.
    pub pattern: String,
    /// Weight in `[0, 1]` applied to the violation confidence.
    pub severity_weight: f64,
    #[serde(default)]
    pub auto_fixable: bool,
    #[serde(default)]
    pub remediation: String,
    /// Phase tags this rule applies to; empty or `"all"` means every phase.
    #[serde(default)]
    pub applicable_phases: Vec<String>,
}

impl ConstitutionalRule {
    pub fn new(
        id: impl Into<String>,
        category: impl Into<String>,
        severity: RuleSeverity,
        pattern: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            category: category.into(),
            description: String::new(),
            severity,
            pattern: pattern.into(),
            severity_weight: severity.default_weight(),
            auto_fixable: false,
            remediation: String::new(),
            applicable_phases: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.severity_weight = crate::core::score::clamp_unit(weight);
        self
    }

    pub fn with_remediation(mut self, remediation: impl Into<String>) -> Self {
        self.remediation = remediation.into();
        self
    }

    pub fn auto_fixable(mut self) -> Self {
        self.auto_fixable = true;
        self
    }

    pub fn for_phases<I, S>(mut self, phases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.applicable_phases = phases.into_iter().map(Into::into).collect();
        self
    }

    /// Whether this rule applies to the given scope.
    pub fn applies_to(&self, scope: &ComplianceScope) -> bool {
        let phase_ok = match &scope.phase {
            None => true,
            Some(phase) => {
                self.applicable_phases.is_empty()
                    || self
                        .applicable_phases
                        .iter()
                        .any(|p| p.eq_ignore_ascii_case("all") || p.eq_ignore_ascii_case(phase))
            }
        };
        let category_ok = scope.categories.is_empty()
            || scope
                .categories
                .iter()
                .any(|c| c.eq_ignore_ascii_case(&self.category));
        phase_ok && category_ok
    }
}

/// Restricts which registered rules a validation call applies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplianceScope {
    /// Phase tag (e.g. `"implementation"`); `None` applies all rules.
    pub phase: Option<String>,
    /// Rule categories to include; empty includes all categories.
    pub categories: Vec<String>,
}

impl ComplianceScope {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn phase(phase: impl Into<String>) -> Self {
        Self {
            phase: Some(phase.into()),
            categories: Vec::new(),
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.categories.push(category.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule() -> ConstitutionalRule {
        ConstitutionalRule::new("SAFE-001", "safety", RuleSeverity::Critical, r"(?i)force[- ]push")
            .for_phases(["implementation", "validation"])
    }

    #[test]
    fn test_default_weights_follow_severity() {
        assert_eq!(rule().severity_weight, 1.0);
        let info = ConstitutionalRule::new("I", "docs", RuleSeverity::Info, "x");
        assert_eq!(info.severity_weight, 0.05);
    }

    #[test]
    fn test_applies_to_phase() {
        let r = rule();
        assert!(r.applies_to(&ComplianceScope::all()));
        assert!(r.applies_to(&ComplianceScope::phase("Implementation")));
        assert!(!r.applies_to(&ComplianceScope::phase("documentation")));

        let everywhere = ConstitutionalRule::new("A", "x", RuleSeverity::Minor, "y").for_phases(["all"]);
        assert!(everywhere.applies_to(&ComplianceScope::phase("documentation")));
    }

    #[test]
    fn test_applies_to_category() {
        let r = rule();
        assert!(r.applies_to(&ComplianceScope::all().with_category("SAFETY")));
        assert!(!r.applies_to(&ComplianceScope::all().with_category("naming")));
    }

    #[test]
    fn test_severity_parse_and_rank() {
        assert_eq!("major".parse::<RuleSeverity>().unwrap(), RuleSeverity::Major);
        assert!(RuleSeverity::Critical.rank() > RuleSeverity::Major.rank());
        assert!("fatal".parse::<RuleSeverity>().is_err());
    }

    #[test]
    fn test_rule_deserializes_with_defaults() {
        let json = r#"{"id":"R1","category":"naming","severity":"MINOR","pattern":"TODO","severity_weight":0.3}"#;
        let r: ConstitutionalRule = serde_json::from_str(json).unwrap();
        assert!(r.applicable_phases.is_empty());
        assert!(!r.auto_fixable);
        assert_eq!(r.severity, RuleSeverity::Minor);
    }
}
