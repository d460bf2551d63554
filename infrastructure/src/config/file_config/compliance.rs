//! Compliance configuration from TOML (`[compliance]` section)

use resolver_application::ComplianceParams;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw compliance configuration from TOML
///
/// # Example
///
/// ```toml
/// [compliance]
/// rules_file = "rules/team.toml"
/// history_capacity = 500
/// include_builtin_rules = true
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileComplianceConfig {
    /// Extra rules loaded at startup (TOML or JSON)
    pub rules_file: Option<PathBuf>,
    /// Validation results kept for statistics and trends
    pub history_capacity: usize,
    /// Register the built-in safety/preservation/documentation rules
    pub include_builtin_rules: bool,
}

impl Default for FileComplianceConfig {
    fn default() -> Self {
        let params = ComplianceParams::default();
        Self {
            rules_file: None,
            history_capacity: params.history_capacity,
            include_builtin_rules: params.include_builtin_rules,
        }
    }
}

impl FileComplianceConfig {
    pub fn to_params(&self) -> ComplianceParams {
        ComplianceParams {
            history_capacity: self.history_capacity.max(1),
            include_builtin_rules: self.include_builtin_rules,
        }
    }
}
