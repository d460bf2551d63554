//! Risk levels and risk factors.

use crate::core::error::DomainError;
use crate::core::score::clamp_unit;
use serde::{Deserialize, Serialize};

/// Coarse risk level of a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }

    /// Numeric value used by the ranking formula.
    pub fn numeric(&self) -> f64 {
        match self {
            RiskLevel::Low => 0.25,
            RiskLevel::Medium => 0.5,
            RiskLevel::High => 0.75,
            RiskLevel::Critical => 1.0,
        }
    }

    /// Bucket an aggregated residual risk into a level.
    pub fn from_residual(residual: f64) -> Self {
        match residual {
            r if r >= 0.5 => RiskLevel::Critical,
            r if r >= 0.3 => RiskLevel::High,
            r if r >= 0.15 => RiskLevel::Medium,
            _ => RiskLevel::Low,
        }
    }

    pub fn requires_approval(&self) -> bool {
        matches!(self, RiskLevel::High | RiskLevel::Critical)
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for RiskLevel {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(RiskLevel::Low),
            "medium" | "moderate" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            "critical" | "very_high" => Ok(RiskLevel::Critical),
            other => Err(DomainError::unknown("risk level", other)),
        }
    }
}

/// Category a risk factor belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskCategory {
    Technical,
    Business,
    Resource,
    Quality,
    Timeline,
}

impl RiskCategory {
    pub const ALL: [RiskCategory; 5] = [
        RiskCategory::Technical,
        RiskCategory::Business,
        RiskCategory::Resource,
        RiskCategory::Quality,
        RiskCategory::Timeline,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            RiskCategory::Technical => "technical",
            RiskCategory::Business => "business",
            RiskCategory::Resource => "resource",
            RiskCategory::Quality => "quality",
            RiskCategory::Timeline => "timeline",
        }
    }
}

impl std::fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single identified risk with its mitigation.
///
/// `residual_risk` is derived: `probability × impact × (1 − mitigation_effectiveness)`.
/// Use [`RiskFactor::new`] or [`RiskFactor::recompute`] rather than setting it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    pub category: RiskCategory,
    pub description: String,
    pub probability: f64,
    pub impact: f64,
    pub mitigation: String,
    pub mitigation_effectiveness: f64,
    pub residual_risk: f64,
    pub owner: String,
    pub monitoring_required: bool,
}

impl RiskFactor {
    pub fn new(
        category: RiskCategory,
        description: impl Into<String>,
        probability: f64,
        impact: f64,
        mitigation: impl Into<String>,
    ) -> Self {
        let mitigation = mitigation.into();
        let effectiveness = if mitigation.trim().is_empty() { 0.0 } else { 0.5 };
        let mut factor = Self {
            category,
            description: description.into(),
            probability: clamp_unit(probability),
            impact: clamp_unit(impact),
            mitigation,
            mitigation_effectiveness: effectiveness,
            residual_risk: 0.0,
            owner: "resolution-team".to_string(),
            monitoring_required: false,
        };
        factor.recompute();
        factor
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = owner.into();
        self
    }

    pub fn with_mitigation_effectiveness(mut self, effectiveness: f64) -> Self {
        self.mitigation_effectiveness = clamp_unit(effectiveness);
        self.recompute();
        self
    }

    /// Recompute the derived residual risk and monitoring flag.
    pub fn recompute(&mut self) {
        self.residual_risk =
            clamp_unit(self.probability * self.impact * (1.0 - self.mitigation_effectiveness));
        self.monitoring_required = self.monitoring_required || self.residual_risk >= 0.2;
    }

    /// Inherent exposure before mitigation.
    pub fn exposure(&self) -> f64 {
        self.probability * self.impact
    }
}

/// Mean residual risk of a list of factors, `0.0` when empty.
pub fn aggregate_residual_risk(factors: &[RiskFactor]) -> f64 {
    let values: Vec<f64> = factors.iter().map(|f| f.residual_risk).collect();
    crate::core::score::mean(&values)
}
