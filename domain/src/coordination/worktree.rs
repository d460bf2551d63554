//! Isolated execution environments and resource budgets per task.

use crate::core::ids::TaskId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorktreeStatus {
    /// Reserved while the backend creates it.
    Provisioning,
    #[default]
    Active,
    Removed,
    Failed,
}

impl WorktreeStatus {
    pub fn as_str(&self) -> &str {
        match self {
            WorktreeStatus::Provisioning => "provisioning",
            WorktreeStatus::Active => "active",
            WorktreeStatus::Removed => "removed",
            WorktreeStatus::Failed => "failed",
        }
    }
}

/// A worktree bound to exactly one task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorktreeEnvironment {
    pub task_id: TaskId,
    pub path: PathBuf,
    pub branch_name: String,
    pub isolated: bool,
    pub cleanup_on_complete: bool,
    pub status: WorktreeStatus,
    pub created_at: DateTime<Utc>,
}

impl WorktreeEnvironment {
    pub fn new(task_id: TaskId, path: PathBuf, branch_name: impl Into<String>) -> Self {
        Self {
            task_id,
            path,
            branch_name: branch_name.into(),
            isolated: true,
            cleanup_on_complete: true,
            status: WorktreeStatus::Active,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Cpu,
    Memory,
    Disk,
    Network,
    ApiQuota,
}

impl ResourceType {
    pub fn as_str(&self) -> &str {
        match self {
            ResourceType::Cpu => "cpu",
            ResourceType::Memory => "memory",
            ResourceType::Disk => "disk",
            ResourceType::Network => "network",
            ResourceType::ApiQuota => "api_quota",
        }
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IsolationLevel {
    None,
    Shared,
    #[default]
    Isolated,
}

/// What a task asks the allocator for.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceRequest {
    pub resource_type: ResourceType,
    pub capacity: f64,
    #[serde(default)]
    pub isolation_level: IsolationLevel,
}

impl ResourceRequest {
    pub fn new(resource_type: ResourceType, capacity: f64) -> Self {
        Self {
            resource_type,
            capacity,
            isolation_level: IsolationLevel::default(),
        }
    }

    pub fn shared(mut self) -> Self {
        self.isolation_level = IsolationLevel::Shared;
        self
    }
}

/// A granted resource budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceAllocation {
    pub task_id: TaskId,
    pub resource_type: ResourceType,
    pub capacity: f64,
    pub current_usage: f64,
    pub isolation_level: IsolationLevel,
}

impl ResourceAllocation {
    pub fn from_request(task_id: TaskId, request: &ResourceRequest) -> Self {
        Self {
            task_id,
            resource_type: request.resource_type,
            capacity: request.capacity.max(0.0),
            current_usage: 0.0,
            isolation_level: request.isolation_level,
        }
    }

    /// Usage as a fraction of capacity; zero capacity reports 0.
    pub fn utilization(&self) -> f64 {
        if self.capacity <= 0.0 {
            0.0
        } else {
            (self.current_usage / self.capacity).clamp(0.0, 1.0)
        }
    }
}

/// Lower-case a string into something git accepts as a branch component.
pub fn sanitize_branch_component(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect::<String>()
        .to_lowercase()
}

/// Make a string safe as a single path component.
pub fn sanitize_path_component(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Branch name `resolution/{group}/{task}` for a task worktree.
pub fn worktree_branch_name(group: &str, task_id: &TaskId) -> String {
    format!(
        "resolution/{}/{}",
        sanitize_branch_component(group),
        sanitize_branch_component(task_id.as_str())
    )
}
