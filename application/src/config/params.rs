//! Parameter groups controlling the orchestration use cases.
//!
//! These are application-layer concerns built from the file configuration
//! by the binary; defaults match an unconfigured run.

use resolver_domain::ResourceRequest;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Strategy generator knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    /// FAST_TRACK is only offered at or below this complexity.
    pub fast_track_max_complexity: f64,
    /// Cap on the ranked output.
    pub max_strategies: usize,
    /// Add a HYBRID strategy when at least two candidates survive.
    pub enable_hybrid: bool,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            fast_track_max_complexity: 5.0,
            max_strategies: 6,
            enable_hybrid: true,
        }
    }
}

impl GenerationParams {
    pub fn with_max_strategies(mut self, max: usize) -> Self {
        self.max_strategies = max;
        self
    }

    pub fn without_hybrid(mut self) -> Self {
        self.enable_hybrid = false;
        self
    }
}

/// Quality-gate thresholds and benchmark targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationThresholds {
    pub constitutional: f64,
    pub preservation: f64,
    pub overall: f64,
    pub specification_target: Duration,
    pub strategy_target: Duration,
    pub validation_target: Duration,
}

impl Default for ValidationThresholds {
    fn default() -> Self {
        Self {
            constitutional: 0.7,
            preservation: 0.8,
            overall: 0.75,
            specification_target: Duration::from_secs(5),
            strategy_target: Duration::from_secs(10),
            validation_target: Duration::from_secs(3),
        }
    }
}

/// Coordinator knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinationParams {
    pub poll_interval: Duration,
    pub barrier_timeout: Duration,
    pub max_concurrency: usize,
    pub worktree_root: PathBuf,
    /// Budgets recorded for tasks that declare none of their own.
    pub resources: Vec<ResourceRequest>,
}

impl Default for CoordinationParams {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            barrier_timeout: Duration::from_secs(300),
            max_concurrency: 4,
            worktree_root: PathBuf::from(".worktrees/resolution"),
            resources: Vec::new(),
        }
    }
}

impl CoordinationParams {
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_barrier_timeout(mut self, timeout: Duration) -> Self {
        self.barrier_timeout = timeout;
        self
    }

    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max;
        self
    }

    pub fn with_worktree_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.worktree_root = root.into();
        self
    }

    pub fn with_resources(mut self, resources: Vec<ResourceRequest>) -> Self {
        self.resources = resources;
        self
    }
}

/// Compliance engine knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceParams {
    /// Oldest results are evicted beyond this many.
    pub history_capacity: usize,
    pub include_builtin_rules: bool,
}

impl Default for ComplianceParams {
    fn default() -> Self {
        Self {
            history_capacity: 1000,
            include_builtin_rules: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let validation = ValidationThresholds::default();
        assert_eq!(validation.constitutional, 0.7);
        assert_eq!(validation.preservation, 0.8);
        assert_eq!(validation.overall, 0.75);

        let coordination = CoordinationParams::default();
        assert_eq!(coordination.poll_interval, Duration::from_millis(500));
        assert_eq!(coordination.max_concurrency, 4);

        assert_eq!(ComplianceParams::default().history_capacity, 1000);
        assert_eq!(GenerationParams::default().max_strategies, 6);
    }

    #[test]
    fn test_builder() {
        let params = CoordinationParams::default()
            .with_poll_interval(Duration::from_millis(10))
            .with_max_concurrency(2)
            .with_worktree_root("/tmp/wt");
        assert_eq!(params.poll_interval, Duration::from_millis(10));
        assert_eq!(params.max_concurrency, 2);
        assert_eq!(params.worktree_root, PathBuf::from("/tmp/wt"));
    }
}
