//! Payloads of the individual conflict variants.

use super::ConflictSeverity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Two PRs modifying the same file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergeConflict {
    pub pr1_id: String,
    pub pr2_id: String,
    pub file_path: String,
    #[serde(default)]
    pub base_content: String,
    #[serde(default)]
    pub pr1_content: String,
    #[serde(default)]
    pub pr2_content: String,
    /// Similarity of the two changes in `[0, 1]`; higher is easier to merge.
    pub similarity_score: f64,
}

impl MergeConflict {
    pub fn derived_severity(&self) -> ConflictSeverity {
        if self.similarity_score >= 0.7 {
            ConflictSeverity::Low
        } else if self.similarity_score >= 0.4 {
            ConflictSeverity::Medium
        } else {
            ConflictSeverity::High
        }
    }
}

/// Incompatible or circular dependencies between nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DependencyConflict {
    #[serde(default)]
    pub affected_nodes: Vec<String>,
    /// Nodes forming a cycle, in order. Empty when there is no cycle.
    #[serde(default)]
    pub cycle_path: Vec<String>,
    /// Package name → versions requested by the conflicting parties.
    #[serde(default)]
    pub version_conflicts: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub severity: ConflictSeverity,
}

/// A change that breaks an architectural pattern.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArchitectureViolation {
    pub pattern_name: String,
    #[serde(default)]
    pub violating_ids: Vec<String>,
    #[serde(default)]
    pub affected_components: Vec<String>,
    #[serde(default)]
    pub layer_violations: Vec<String>,
    #[serde(default)]
    pub severity: ConflictSeverity,
}

/// Two PRs that merge cleanly but disagree in behaviour.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SemanticConflict {
    pub pr1_id: String,
    pub pr2_id: String,
    pub confidence: f64,
    #[serde(default)]
    pub evidence: Vec<String>,
}

impl SemanticConflict {
    pub fn derived_severity(&self) -> ConflictSeverity {
        if self.confidence >= 0.8 {
            ConflictSeverity::High
        } else if self.confidence >= 0.5 {
            ConflictSeverity::Medium
        } else {
            ConflictSeverity::Low
        }
    }
}

/// Several parties contending for one shared resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceConflict {
    pub resource_type: String,
    pub resource_id: String,
    #[serde(default)]
    pub contending_ids: Vec<String>,
    pub contention_level: f64,
}

impl ResourceConflict {
    pub fn derived_severity(&self) -> ConflictSeverity {
        match self.contention_level {
            l if l >= 0.8 => ConflictSeverity::Critical,
            l if l >= 0.6 => ConflictSeverity::High,
            l if l >= 0.3 => ConflictSeverity::Medium,
            _ => ConflictSeverity::Low,
        }
    }
}
