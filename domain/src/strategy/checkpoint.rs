//! Execution checkpoints: phase boundaries inside a strategy.

use serde::{Deserialize, Serialize};

/// Workflow phase a checkpoint (and the task materialized from it) belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionPhase {
    #[default]
    Analysis,
    Planning,
    Implementation,
    Validation,
    Documentation,
}

impl ExecutionPhase {
    pub const ALL: [ExecutionPhase; 5] = [
        ExecutionPhase::Analysis,
        ExecutionPhase::Planning,
        ExecutionPhase::Implementation,
        ExecutionPhase::Validation,
        ExecutionPhase::Documentation,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            ExecutionPhase::Analysis => "ANALYSIS",
            ExecutionPhase::Planning => "PLANNING",
            ExecutionPhase::Implementation => "IMPLEMENTATION",
            ExecutionPhase::Validation => "VALIDATION",
            ExecutionPhase::Documentation => "DOCUMENTATION",
        }
    }

    /// Lowercase tag used to match rule `applicable_phases`.
    pub fn tag(&self) -> &str {
        match self {
            ExecutionPhase::Analysis => "analysis",
            ExecutionPhase::Planning => "planning",
            ExecutionPhase::Implementation => "implementation",
            ExecutionPhase::Validation => "validation",
            ExecutionPhase::Documentation => "documentation",
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            ExecutionPhase::Analysis => "Analysis",
            ExecutionPhase::Planning => "Planning",
            ExecutionPhase::Implementation => "Implementation",
            ExecutionPhase::Validation => "Validation",
            ExecutionPhase::Documentation => "Documentation",
        }
    }
}

impl std::fmt::Display for ExecutionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// A named phase boundary with explicit success and failure handling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionCheckpoint {
    pub id: String,
    pub name: String,
    pub phase: ExecutionPhase,
    pub required_outputs: Vec<String>,
    pub success_criteria: Vec<String>,
    pub failure_procedures: Vec<String>,
    pub estimated_duration_minutes: u32,
    pub critical_path: bool,
    pub parallel_executable: bool,
    pub rollback_point: bool,
}

impl ExecutionCheckpoint {
    pub fn new(id: impl Into<String>, name: impl Into<String>, phase: ExecutionPhase) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            phase,
            required_outputs: Vec::new(),
            success_criteria: Vec::new(),
            failure_procedures: Vec::new(),
            estimated_duration_minutes: 0,
            critical_path: true,
            parallel_executable: false,
            rollback_point: false,
        }
    }

    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.required_outputs.push(output.into());
        self
    }

    pub fn with_criterion(mut self, criterion: impl Into<String>) -> Self {
        self.success_criteria.push(criterion.into());
        self
    }

    pub fn with_failure_procedure(mut self, procedure: impl Into<String>) -> Self {
        self.failure_procedures.push(procedure.into());
        self
    }

    pub fn with_duration(mut self, minutes: u32) -> Self {
        self.estimated_duration_minutes = minutes;
        self
    }

    pub fn parallel(mut self) -> Self {
        self.parallel_executable = true;
        self.critical_path = false;
        self
    }

    pub fn rollback_point(mut self) -> Self {
        self.rollback_point = true;
        self
    }

    /// Success criteria that describe a verification activity.
    pub fn validation_criteria(&self) -> impl Iterator<Item = &String> {
        self.success_criteria.iter().filter(|c| is_validation_step(c))
    }
}

/// Whether a free-text step describes a verification activity.
pub fn is_validation_step(text: &str) -> bool {
    const KEYWORDS: [&str; 8] = [
        "test", "verify", "validate", "check", "review", "confirm", "assert", "lint",
    ];
    let lower = text.to_lowercase();
    KEYWORDS.iter().any(|k| lower.contains(k))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_wire_format() {
        assert_eq!(
            serde_json::to_string(&ExecutionPhase::Implementation).unwrap(),
            "\"IMPLEMENTATION\""
        );
        assert_eq!(ExecutionPhase::Validation.tag(), "validation");
    }

    #[test]
    fn test_parallel_checkpoint_leaves_critical_path() {
        let cp = ExecutionCheckpoint::new("cp-1", "Docs", ExecutionPhase::Documentation).parallel();
        assert!(cp.parallel_executable);
        assert!(!cp.critical_path);
    }

    #[test]
    fn test_validation_criteria_filter() {
        let cp = ExecutionCheckpoint::new("cp", "Impl", ExecutionPhase::Implementation)
            .with_criterion("All unit tests pass")
            .with_criterion("Changes merged")
            .with_criterion("Reviewer confirms behaviour");
        assert_eq!(cp.validation_criteria().count(), 2);
    }
}
