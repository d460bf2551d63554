//! Coordination sessions and execution reports.

use super::barrier::BarrierResult;
use crate::core::error::DomainError;
use crate::core::ids::{SessionId, TaskId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a session dispatches its tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinationStrategy {
    #[default]
    Parallel,
    Sequential,
}

impl CoordinationStrategy {
    pub fn as_str(&self) -> &str {
        match self {
            CoordinationStrategy::Parallel => "parallel",
            CoordinationStrategy::Sequential => "sequential",
        }
    }
}

impl std::fmt::Display for CoordinationStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for CoordinationStrategy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "parallel" => Ok(CoordinationStrategy::Parallel),
            "sequential" => Ok(CoordinationStrategy::Sequential),
            other => Err(DomainError::unknown("coordination strategy", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Initialized,
    Running,
    Completed,
    Failed,
    Cancelled,
    CleanedUp,
}

impl SessionStatus {
    pub fn as_str(&self) -> &str {
        match self {
            SessionStatus::Initialized => "initialized",
            SessionStatus::Running => "running",
            SessionStatus::Completed => "completed",
            SessionStatus::Failed => "failed",
            SessionStatus::Cancelled => "cancelled",
            SessionStatus::CleanedUp => "cleaned_up",
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A group of tasks executed together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinationSession {
    pub id: SessionId,
    pub group: String,
    pub task_ids: Vec<TaskId>,
    pub strategy: CoordinationStrategy,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl CoordinationSession {
    pub fn new(group: impl Into<String>, task_ids: Vec<TaskId>, strategy: CoordinationStrategy) -> Self {
        Self {
            id: SessionId::generate(),
            group: group.into(),
            task_ids,
            strategy,
            status: SessionStatus::Initialized,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn contains(&self, task_id: &TaskId) -> bool {
        self.task_ids.contains(task_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskRunStatus {
    Succeeded,
    Failed,
    /// Not started because an in-session dependency did not finish.
    Skipped,
}

impl TaskRunStatus {
    pub fn as_str(&self) -> &str {
        match self {
            TaskRunStatus::Succeeded => "succeeded",
            TaskRunStatus::Failed => "failed",
            TaskRunStatus::Skipped => "skipped",
        }
    }
}

/// Result of running one task inside a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskOutcome {
    pub task_id: TaskId,
    pub status: TaskRunStatus,
    pub message: Option<String>,
    pub duration_ms: u64,
}

impl TaskOutcome {
    pub fn succeeded(task_id: TaskId, message: Option<String>, duration_ms: u64) -> Self {
        Self {
            task_id,
            status: TaskRunStatus::Succeeded,
            message,
            duration_ms,
        }
    }

    pub fn failed(task_id: TaskId, error: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            task_id,
            status: TaskRunStatus::Failed,
            message: Some(error.into()),
            duration_ms,
        }
    }

    pub fn skipped(task_id: TaskId, reason: impl Into<String>) -> Self {
        Self {
            task_id,
            status: TaskRunStatus::Skipped,
            message: Some(reason.into()),
            duration_ms: 0,
        }
    }
}

/// Everything a session run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub session_id: SessionId,
    pub status: SessionStatus,
    pub outcomes: Vec<TaskOutcome>,
    pub barrier_results: Vec<BarrierResult>,
    pub elapsed_ms: u64,
}

impl ExecutionReport {
    pub fn count(&self, status: TaskRunStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }

    pub fn all_succeeded(&self) -> bool {
        self.outcomes
            .iter()
            .all(|o| o.status == TaskRunStatus::Succeeded)
    }

    pub fn outcome(&self, task_id: &TaskId) -> Option<&TaskOutcome> {
        self.outcomes.iter().find(|o| &o.task_id == task_id)
    }
}
