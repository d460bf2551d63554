//! Conflict input model.
//!
//! A [`Conflict`] is a closed, internally tagged sum type: the JSON
//! discriminant lives in the `conflict_type` field, and every consumer
//! dispatches with an exhaustive `match`.
//!
//! ```
//! use resolver_domain::conflict::{Conflict, ConflictKind};
//!
//! let json = r#"{
//!     "conflict_type": "merge_conflict",
//!     "pr1_id": "101",
//!     "pr2_id": "102",
//!     "file_path": "src/auth.rs",
//!     "similarity_score": 0.8
//! }"#;
//! let conflict: Conflict = serde_json::from_str(json).unwrap();
//! assert_eq!(conflict.kind(), ConflictKind::Merge);
//! ```

mod variants;

pub use variants::{
    ArchitectureViolation, DependencyConflict, MergeConflict, ResourceConflict, SemanticConflict,
};

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// Severity attached to (or derived for) a conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConflictSeverity {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl ConflictSeverity {
    pub fn as_str(&self) -> &str {
        match self {
            ConflictSeverity::Low => "low",
            ConflictSeverity::Medium => "medium",
            ConflictSeverity::High => "high",
            ConflictSeverity::Critical => "critical",
        }
    }

    /// Numeric weight in `[0, 1]` used by risk estimation.
    pub fn weight(&self) -> f64 {
        match self {
            ConflictSeverity::Low => 0.25,
            ConflictSeverity::Medium => 0.5,
            ConflictSeverity::High => 0.75,
            ConflictSeverity::Critical => 1.0,
        }
    }
}

impl std::fmt::Display for ConflictSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ConflictSeverity {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(ConflictSeverity::Low),
            "medium" => Ok(ConflictSeverity::Medium),
            "high" => Ok(ConflictSeverity::High),
            "critical" => Ok(ConflictSeverity::Critical),
            other => Err(DomainError::unknown("conflict severity", other)),
        }
    }
}

/// Discriminant of a [`Conflict`] without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    Merge,
    Dependency,
    Architecture,
    Semantic,
    Resource,
}

impl ConflictKind {
    pub fn as_str(&self) -> &str {
        match self {
            ConflictKind::Merge => "merge_conflict",
            ConflictKind::Dependency => "dependency_conflict",
            ConflictKind::Architecture => "architecture_violation",
            ConflictKind::Semantic => "semantic_conflict",
            ConflictKind::Resource => "resource_conflict",
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            ConflictKind::Merge => "Merge Conflict",
            ConflictKind::Dependency => "Dependency Conflict",
            ConflictKind::Architecture => "Architecture Violation",
            ConflictKind::Semantic => "Semantic Conflict",
            ConflictKind::Resource => "Resource Conflict",
        }
    }
}

impl std::fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// A structured conflict submitted for resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "conflict_type", rename_all = "snake_case")]
pub enum Conflict {
    MergeConflict(MergeConflict),
    DependencyConflict(DependencyConflict),
    ArchitectureViolation(ArchitectureViolation),
    SemanticConflict(SemanticConflict),
    ResourceConflict(ResourceConflict),
}

impl Conflict {
    pub fn kind(&self) -> ConflictKind {
        match self {
            Conflict::MergeConflict(_) => ConflictKind::Merge,
            Conflict::DependencyConflict(_) => ConflictKind::Dependency,
            Conflict::ArchitectureViolation(_) => ConflictKind::Architecture,
            Conflict::SemanticConflict(_) => ConflictKind::Semantic,
            Conflict::ResourceConflict(_) => ConflictKind::Resource,
        }
    }

    /// Declared severity where the variant carries one, otherwise a
    /// severity derived from the variant's scores.
    pub fn severity(&self) -> ConflictSeverity {
        match self {
            Conflict::MergeConflict(c) => c.derived_severity(),
            Conflict::DependencyConflict(c) => c.severity,
            Conflict::ArchitectureViolation(c) => c.severity,
            Conflict::SemanticConflict(c) => c.derived_severity(),
            Conflict::ResourceConflict(c) => c.derived_severity(),
        }
    }

    /// Identifiers of the PRs, nodes or components involved.
    pub fn affected_ids(&self) -> Vec<String> {
        match self {
            Conflict::MergeConflict(c) => vec![c.pr1_id.clone(), c.pr2_id.clone()],
            Conflict::DependencyConflict(c) => c.affected_nodes.clone(),
            Conflict::ArchitectureViolation(c) => {
                let mut ids = c.violating_ids.clone();
                ids.extend(c.affected_components.iter().cloned());
                ids
            }
            Conflict::SemanticConflict(c) => vec![c.pr1_id.clone(), c.pr2_id.clone()],
            Conflict::ResourceConflict(c) => c.contending_ids.clone(),
        }
    }

    /// One-line human readable description.
    pub fn summary(&self) -> String {
        match self {
            Conflict::MergeConflict(c) => format!(
                "PR {} and PR {} both modify {} (similarity {:.2})",
                c.pr1_id, c.pr2_id, c.file_path, c.similarity_score
            ),
            Conflict::DependencyConflict(c) => {
                if c.cycle_path.is_empty() {
                    format!(
                        "{} nodes affected, {} version conflicts",
                        c.affected_nodes.len(),
                        c.version_conflicts.len()
                    )
                } else {
                    format!("Dependency cycle: {}", c.cycle_path.join(" -> "))
                }
            }
            Conflict::ArchitectureViolation(c) => format!(
                "Pattern '{}' violated by {} item(s) across {} component(s)",
                c.pattern_name,
                c.violating_ids.len(),
                c.affected_components.len()
            ),
            Conflict::SemanticConflict(c) => format!(
                "PR {} and PR {} conflict semantically (confidence {:.2})",
                c.pr1_id, c.pr2_id, c.confidence
            ),
            Conflict::ResourceConflict(c) => format!(
                "{} contenders for {} '{}' (contention {:.2})",
                c.contending_ids.len(),
                c.resource_type,
                c.resource_id,
                c.contention_level
            ),
        }
    }

    /// Heuristic complexity on a 0–10 scale, used when the caller does not
    /// supply one.
    pub fn complexity_hint(&self) -> f64 {
        let raw = match self {
            Conflict::MergeConflict(c) => {
                let changed_lines = c.pr1_content.lines().count() + c.pr2_content.lines().count();
                2.0 + (1.0 - c.similarity_score) * 6.0 + (changed_lines as f64 / 200.0).min(2.0)
            }
            Conflict::DependencyConflict(c) => {
                let cycle = if c.cycle_path.is_empty() { 0.0 } else { 2.0 };
                3.0 + c.affected_nodes.len() as f64 * 0.5
                    + c.version_conflicts.len() as f64 * 0.5
                    + cycle
            }
            Conflict::ArchitectureViolation(c) => {
                4.0 + c.affected_components.len() as f64 * 0.5 + c.layer_violations.len() as f64
            }
            Conflict::SemanticConflict(c) => 3.0 + c.evidence.len() as f64 * 0.5 + c.confidence * 2.0,
            Conflict::ResourceConflict(c) => {
                2.0 + c.contending_ids.len() as f64 * 0.5 + c.contention_level * 3.0
            }
        };
        raw.clamp(0.0, 10.0)
    }

    /// Reject structurally invalid input before it enters the workflow.
    pub fn validate(&self) -> Result<(), DomainError> {
        match self {
            Conflict::MergeConflict(c) => {
                crate::core::score::ensure_unit("similarity_score", c.similarity_score)?;
                if c.pr1_id.is_empty() || c.pr2_id.is_empty() {
                    return Err(DomainError::InvalidConflict(
                        "merge conflict requires both PR ids".to_string(),
                    ));
                }
                Ok(())
            }
            Conflict::DependencyConflict(c) => {
                if c.affected_nodes.is_empty() && c.cycle_path.is_empty() {
                    return Err(DomainError::InvalidConflict(
                        "dependency conflict lists no affected nodes".to_string(),
                    ));
                }
                Ok(())
            }
            Conflict::ArchitectureViolation(c) => {
                if c.pattern_name.trim().is_empty() {
                    return Err(DomainError::InvalidConflict(
                        "architecture violation requires a pattern name".to_string(),
                    ));
                }
                Ok(())
            }
            Conflict::SemanticConflict(c) => {
                crate::core::score::ensure_unit("confidence", c.confidence)?;
                Ok(())
            }
            Conflict::ResourceConflict(c) => {
                crate::core::score::ensure_unit("contention_level", c.contention_level)?;
                if c.contending_ids.is_empty() {
                    return Err(DomainError::InvalidConflict(
                        "resource conflict requires at least one contender".to_string(),
                    ));
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn merge(similarity: f64) -> Conflict {
        Conflict::MergeConflict(MergeConflict {
            pr1_id: "1".into(),
            pr2_id: "2".into(),
            file_path: "src/lib.rs".into(),
            similarity_score: similarity,
            ..Default::default()
        })
    }

    #[test]
    fn test_merge_conflict_round_trips_with_tag() {
        let conflict = merge(0.8);
        let value = serde_json::to_value(&conflict).unwrap();
        assert_eq!(value["conflict_type"], "merge_conflict");
        assert_eq!(value["pr1_id"], "1");
        let back: Conflict = serde_json::from_value(value).unwrap();
        assert_eq!(back, conflict);
    }

    #[test]
    fn test_dependency_conflict_deserializes_with_defaults() {
        let json = r#"{"conflict_type":"dependency_conflict","affected_nodes":["a","b"],"severity":"high"}"#;
        let conflict: Conflict = serde_json::from_str(json).unwrap();
        assert_eq!(conflict.kind(), ConflictKind::Dependency);
        assert_eq!(conflict.severity(), ConflictSeverity::High);
        assert_eq!(conflict.affected_ids(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_unknown_tag_is_rejected() {
        let json = r#"{"conflict_type":"email_conflict"}"#;
        assert!(serde_json::from_str::<Conflict>(json).is_err());
    }

    #[test]
    fn test_merge_severity_tracks_similarity() {
        assert_eq!(merge(0.8).severity(), ConflictSeverity::Low);
        assert_eq!(merge(0.5).severity(), ConflictSeverity::Medium);
        assert_eq!(merge(0.1).severity(), ConflictSeverity::High);
    }

    #[test]
    fn test_complexity_hint_is_bounded() {
        let conflict = Conflict::ArchitectureViolation(ArchitectureViolation {
            pattern_name: "layered".into(),
            affected_components: (0..30).map(|i| format!("c{i}")).collect(),
            layer_violations: (0..30).map(|i| format!("v{i}")).collect(),
            ..Default::default()
        });
        assert_eq!(conflict.complexity_hint(), 10.0);
        assert!(merge(0.8).complexity_hint() < 5.0);
    }

    #[test]
    fn test_validate_rejects_out_of_range_similarity() {
        assert!(merge(1.4).validate().is_err());
        assert!(merge(0.4).validate().is_ok());
    }

    #[test]
    fn test_resource_conflict_requires_contenders() {
        let conflict = Conflict::ResourceConflict(ResourceConflict {
            resource_type: "database".into(),
            resource_id: "primary".into(),
            contending_ids: vec![],
            contention_level: 0.5,
        });
        assert!(matches!(
            conflict.validate(),
            Err(DomainError::InvalidConflict(_))
        ));
    }

    #[test]
    fn test_severity_parse() {
        assert_eq!(
            "Critical".parse::<ConflictSeverity>().unwrap(),
            ConflictSeverity::Critical
        );
        assert!("extreme".parse::<ConflictSeverity>().is_err());
    }
}
