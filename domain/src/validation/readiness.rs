//! Validation levels, checks, gates and readiness labels.

use crate::core::error::DomainError;
use crate::core::score::clamp_unit;
use serde::{Deserialize, Serialize};

/// Minimum quick score a Standard or Comprehensive pass requires.
pub const QUICK_PASS_THRESHOLD: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationLevel {
    Quick,
    #[default]
    Standard,
    Comprehensive,
}

impl ValidationLevel {
    pub fn as_str(&self) -> &str {
        match self {
            ValidationLevel::Quick => "quick",
            ValidationLevel::Standard => "standard",
            ValidationLevel::Comprehensive => "comprehensive",
        }
    }
}

impl std::fmt::Display for ValidationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ValidationLevel {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "quick" => Ok(ValidationLevel::Quick),
            "standard" => Ok(ValidationLevel::Standard),
            "comprehensive" | "full" => Ok(ValidationLevel::Comprehensive),
            other => Err(DomainError::unknown("validation level", other)),
        }
    }
}

/// One weighted check inside a validator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationCheck {
    pub name: String,
    pub weight: f64,
    pub score: f64,
    pub passed: bool,
    pub issues: Vec<String>,
}

impl ValidationCheck {
    /// A check passes when its score reaches `pass_threshold`.
    pub fn new(name: impl Into<String>, weight: f64, score: f64, pass_threshold: f64) -> Self {
        let score = clamp_unit(score);
        Self {
            name: name.into(),
            weight,
            score,
            passed: score >= pass_threshold,
            issues: Vec::new(),
        }
    }

    pub fn with_issue(mut self, issue: impl Into<String>) -> Self {
        self.issues.push(issue.into());
        self
    }

    pub fn weighted(&self) -> f64 {
        self.weight * self.score
    }
}

/// Coarse fitness label for proceeding to the next stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionReadiness {
    Ready,
    NeedsMinorFixes,
    NeedsMajorReview,
}

impl ResolutionReadiness {
    pub fn as_str(&self) -> &str {
        match self {
            ResolutionReadiness::Ready => "ready",
            ResolutionReadiness::NeedsMinorFixes => "needs_minor_fixes",
            ResolutionReadiness::NeedsMajorReview => "needs_major_review",
        }
    }

    /// `ready` at score ≥ 0.8 with at most one issue, `needs_minor_fixes`
    /// at score ≥ 0.6 with at most three, otherwise `needs_major_review`.
    pub fn from_score_and_issues(score: f64, issue_count: usize) -> Self {
        if score >= 0.8 && issue_count <= 1 {
            ResolutionReadiness::Ready
        } else if score >= 0.6 && issue_count <= 3 {
            ResolutionReadiness::NeedsMinorFixes
        } else {
            ResolutionReadiness::NeedsMajorReview
        }
    }

    /// Label from the number of passing quality gates out of `total`.
    pub fn from_gates(passed: usize, total: usize) -> Self {
        if passed >= total {
            ResolutionReadiness::Ready
        } else if passed + 1 >= total {
            ResolutionReadiness::NeedsMinorFixes
        } else {
            ResolutionReadiness::NeedsMajorReview
        }
    }
}

impl std::fmt::Display for ResolutionReadiness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A named threshold over one score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityGate {
    pub name: String,
    pub threshold: f64,
    pub actual: f64,
    pub passed: bool,
}

impl QualityGate {
    pub fn new(name: impl Into<String>, threshold: f64, actual: f64) -> Self {
        Self {
            name: name.into(),
            threshold,
            actual,
            passed: actual >= threshold,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentReadiness {
    ProductionReady,
    StagingReady,
    DevelopmentReady,
    NotReady,
}

impl DeploymentReadiness {
    pub fn as_str(&self) -> &str {
        match self {
            DeploymentReadiness::ProductionReady => "production_ready",
            DeploymentReadiness::StagingReady => "staging_ready",
            DeploymentReadiness::DevelopmentReady => "development_ready",
            DeploymentReadiness::NotReady => "not_ready",
        }
    }

    /// Any unresolved critical issue forces `not_ready`.
    pub fn assess(performance_score: f64, overall_score: f64, critical_issues: usize) -> Self {
        if critical_issues > 0 {
            DeploymentReadiness::NotReady
        } else if performance_score >= 0.9 && overall_score >= 0.95 {
            DeploymentReadiness::ProductionReady
        } else if overall_score >= 0.85 {
            DeploymentReadiness::StagingReady
        } else if overall_score >= 0.7 {
            DeploymentReadiness::DevelopmentReady
        } else {
            DeploymentReadiness::NotReady
        }
    }
}

impl std::fmt::Display for DeploymentReadiness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
