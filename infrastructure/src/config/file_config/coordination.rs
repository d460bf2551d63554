//! Coordinator configuration from TOML (`[coordination]` section)

use resolver_application::CoordinationParams;
use resolver_domain::ResourceRequest;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Raw coordination configuration from TOML
///
/// # Example
///
/// ```toml
/// [coordination]
/// poll_interval_ms = 250
/// barrier_timeout_secs = 120
/// max_concurrency = 8
/// worktree_root = ".worktrees/resolution"
/// base_branch = "main"
///
/// [[coordination.resources]]
/// resource_type = "cpu"
/// capacity = 2.0
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCoordinationConfig {
    pub poll_interval_ms: u64,
    pub barrier_timeout_secs: u64,
    pub max_concurrency: usize,
    pub worktree_root: PathBuf,
    /// Branch new worktrees start from; `None` uses the current HEAD
    pub base_branch: Option<String>,
    /// Default per-task budgets
    pub resources: Vec<ResourceRequest>,
}

impl Default for FileCoordinationConfig {
    fn default() -> Self {
        let params = CoordinationParams::default();
        Self {
            poll_interval_ms: params.poll_interval.as_millis() as u64,
            barrier_timeout_secs: params.barrier_timeout.as_secs(),
            max_concurrency: params.max_concurrency,
            worktree_root: params.worktree_root,
            base_branch: None,
            resources: params.resources,
        }
    }
}

impl FileCoordinationConfig {
    pub fn to_params(&self) -> CoordinationParams {
        CoordinationParams {
            poll_interval: Duration::from_millis(self.poll_interval_ms.max(1)),
            barrier_timeout: Duration::from_secs(self.barrier_timeout_secs),
            max_concurrency: self.max_concurrency.max(1),
            worktree_root: self.worktree_root.clone(),
            resources: self.resources.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resolver_domain::{IsolationLevel, ResourceType};

    #[test]
    fn test_resources_from_toml() {
        let toml_str = r#"
max_concurrency = 2

[[resources]]
resource_type = "cpu"
capacity = 2.0

[[resources]]
resource_type = "api_quota"
capacity = 100.0
isolation_level = "shared"
"#;
        let config: FileCoordinationConfig = toml::from_str(toml_str).unwrap();
        let params = config.to_params();
        assert_eq!(params.max_concurrency, 2);
        assert_eq!(params.resources.len(), 2);
        assert_eq!(params.resources[0].resource_type, ResourceType::Cpu);
        assert_eq!(params.resources[0].isolation_level, IsolationLevel::Isolated);
        assert_eq!(params.resources[1].isolation_level, IsolationLevel::Shared);
    }

    #[test]
    fn test_no_resources_by_default() {
        assert!(FileCoordinationConfig::default().to_params().resources.is_empty());
    }
}
