//! Generation context supplied by the caller.

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// How much risk the caller is willing to accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RiskTolerance {
    VeryLow,
    Low,
    #[default]
    Medium,
    High,
}

impl RiskTolerance {
    pub fn as_str(&self) -> &str {
        match self {
            RiskTolerance::VeryLow => "very_low",
            RiskTolerance::Low => "low",
            RiskTolerance::Medium => "medium",
            RiskTolerance::High => "high",
        }
    }

    /// Multiplier applied to risk probabilities: cautious callers assume
    /// risks are more likely to materialize.
    pub fn probability_factor(&self) -> f64 {
        match self {
            RiskTolerance::VeryLow => 1.2,
            RiskTolerance::Low => 1.1,
            RiskTolerance::Medium => 1.0,
            RiskTolerance::High => 0.9,
        }
    }
}

impl std::str::FromStr for RiskTolerance {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "very_low" => Ok(RiskTolerance::VeryLow),
            "low" => Ok(RiskTolerance::Low),
            "medium" => Ok(RiskTolerance::Medium),
            "high" => Ok(RiskTolerance::High),
            other => Err(DomainError::unknown("risk tolerance", other)),
        }
    }
}

impl std::fmt::Display for RiskTolerance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Time pressure on the resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Urgency {
    pub fn as_str(&self) -> &str {
        match self {
            Urgency::Low => "low",
            Urgency::Medium => "medium",
            Urgency::High => "high",
            Urgency::Critical => "critical",
        }
    }

    pub fn is_high(&self) -> bool {
        matches!(self, Urgency::High | Urgency::Critical)
    }
}

impl std::str::FromStr for Urgency {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Urgency::Low),
            "medium" | "normal" => Ok(Urgency::Medium),
            "high" => Ok(Urgency::High),
            "critical" | "urgent" => Ok(Urgency::Critical),
            other => Err(DomainError::unknown("urgency", other)),
        }
    }
}

/// Experience of the team carrying out the resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TeamExperience {
    Junior,
    #[default]
    Intermediate,
    Senior,
}

impl TeamExperience {
    pub fn confidence_adjustment(&self) -> f64 {
        match self {
            TeamExperience::Junior => -0.05,
            TeamExperience::Intermediate => 0.0,
            TeamExperience::Senior => 0.05,
        }
    }
}

impl std::str::FromStr for TeamExperience {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "junior" => Ok(TeamExperience::Junior),
            "intermediate" | "mid" => Ok(TeamExperience::Intermediate),
            "senior" | "expert" => Ok(TeamExperience::Senior),
            other => Err(DomainError::unknown("team experience", other)),
        }
    }
}

/// Caller-supplied context steering strategy generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationContext {
    pub risk_tolerance: RiskTolerance,
    /// Time pressure (the "time constraint" of the request).
    pub urgency: Urgency,
    /// Complexity on a 0–10 scale. `None` derives it from the conflict.
    pub complexity_score: Option<f64>,
    /// Named features the resolution must preserve.
    pub affected_features: Vec<String>,
    /// Count of previously resolved conflicts of the same kind.
    pub similar_conflicts_resolved: u32,
    pub team_experience: TeamExperience,
}

impl Default for GenerationContext {
    fn default() -> Self {
        Self {
            risk_tolerance: RiskTolerance::Medium,
            urgency: Urgency::Medium,
            complexity_score: None,
            affected_features: Vec::new(),
            similar_conflicts_resolved: 0,
            team_experience: TeamExperience::Intermediate,
        }
    }
}

impl GenerationContext {
    pub fn with_risk_tolerance(mut self, tolerance: RiskTolerance) -> Self {
        self.risk_tolerance = tolerance;
        self
    }

    pub fn with_urgency(mut self, urgency: Urgency) -> Self {
        self.urgency = urgency;
        self
    }

    pub fn with_complexity(mut self, complexity: f64) -> Self {
        self.complexity_score = Some(complexity.clamp(0.0, 10.0));
        self
    }

    pub fn with_feature(mut self, feature: impl Into<String>) -> Self {
        self.affected_features.push(feature.into());
        self
    }

    pub fn with_team_experience(mut self, experience: TeamExperience) -> Self {
        self.team_experience = experience;
        self
    }

    pub fn with_similar_conflicts(mut self, count: u32) -> Self {
        self.similar_conflicts_resolved = count;
        self
    }
}
