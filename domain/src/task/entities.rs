//! Resolution task entities and their lifecycle state machine.

use crate::core::error::DomainError;
use crate::coordination::ResourceRequest;
use crate::core::ids::TaskId;
use crate::strategy::ExecutionPhase;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Lifecycle status of a [`ResolutionTask`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Done,
    Blocked,
    Deferred,
    Cancelled,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 6] = [
        TaskStatus::Pending,
        TaskStatus::InProgress,
        TaskStatus::Done,
        TaskStatus::Blocked,
        TaskStatus::Deferred,
        TaskStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Done => "DONE",
            TaskStatus::Blocked => "BLOCKED",
            TaskStatus::Deferred => "DEFERRED",
            TaskStatus::Cancelled => "CANCELLED",
        }
    }

    /// DONE and CANCELLED cannot be left.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Done | TaskStatus::Cancelled)
    }

    /// Whether `self -> next` is a legal transition.
    ///
    /// Re-applying the current status is allowed for non-terminal statuses
    /// so callers can attach notes without changing state.
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        use TaskStatus::*;
        if *self == next {
            return !self.is_terminal();
        }
        match self {
            Pending => matches!(next, InProgress | Blocked | Deferred | Cancelled | Done),
            InProgress => matches!(next, Done | Blocked | Cancelled | Deferred),
            Blocked => matches!(next, Pending | InProgress | Cancelled | Deferred),
            Deferred => matches!(next, Pending | Cancelled),
            Done | Cancelled => false,
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase().replace(['-', ' '], "_");
        TaskStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| DomainError::unknown("task status", s))
    }
}

/// Scheduling priority of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskPriority {
    Critical,
    High,
    #[default]
    Medium,
    Low,
}

impl TaskPriority {
    pub fn as_str(&self) -> &str {
        match self {
            TaskPriority::Critical => "CRITICAL",
            TaskPriority::High => "HIGH",
            TaskPriority::Medium => "MEDIUM",
            TaskPriority::Low => "LOW",
        }
    }
}

impl std::fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TaskPriority {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "critical" => Ok(TaskPriority::Critical),
            "high" => Ok(TaskPriority::High),
            "medium" => Ok(TaskPriority::Medium),
            "low" => Ok(TaskPriority::Low),
            other => Err(DomainError::unknown("task priority", other)),
        }
    }
}

/// A unit of resolution work tracked by the task graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionTask {
    pub id: TaskId,
    pub title: String,
    pub phase: ExecutionPhase,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub dependencies: BTreeSet<TaskId>,
    pub parallel_group: Option<String>,
    pub worktree_path: Option<PathBuf>,
    pub constitutional_score: Option<f64>,
    pub completion_criteria: Vec<String>,
    pub validation_steps: Vec<String>,
    pub rollback_procedure: Option<String>,
    /// Budgets recorded by the allocator when the task is dispatched.
    #[serde(default)]
    pub resources: Vec<ResourceRequest>,
    pub estimated_duration_minutes: u32,
    pub actual_duration_minutes: Option<f64>,
    pub notes: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl ResolutionTask {
    pub fn new(id: impl Into<TaskId>, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            title: title.into(),
            phase: ExecutionPhase::default(),
            status: TaskStatus::Pending,
            priority: TaskPriority::default(),
            dependencies: BTreeSet::new(),
            parallel_group: None,
            worktree_path: None,
            constitutional_score: None,
            completion_criteria: Vec::new(),
            validation_steps: Vec::new(),
            rollback_procedure: None,
            resources: Vec::new(),
            estimated_duration_minutes: 0,
            actual_duration_minutes: None,
            notes: Vec::new(),
            created_at: now,
            updated_at: now,
            started_at: None,
            completed_at: None,
        }
    }

    pub fn with_phase(mut self, phase: ExecutionPhase) -> Self {
        self.phase = phase;
        self
    }

    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_dependency(mut self, task_id: impl Into<TaskId>) -> Self {
        self.dependencies.insert(task_id.into());
        self
    }

    pub fn with_parallel_group(mut self, group: impl Into<String>) -> Self {
        self.parallel_group = Some(group.into());
        self
    }

    pub fn with_completion_criterion(mut self, criterion: impl Into<String>) -> Self {
        self.completion_criteria.push(criterion.into());
        self
    }

    pub fn with_validation_step(mut self, step: impl Into<String>) -> Self {
        self.validation_steps.push(step.into());
        self
    }

    pub fn with_rollback(mut self, procedure: impl Into<String>) -> Self {
        self.rollback_procedure = Some(procedure.into());
        self
    }

    pub fn with_resource(mut self, request: ResourceRequest) -> Self {
        self.resources.push(request);
        self
    }

    pub fn with_estimated_duration(mut self, minutes: u32) -> Self {
        self.estimated_duration_minutes = minutes;
        self
    }

    pub fn in_group(&self, group: &str) -> bool {
        self.parallel_group.as_deref() == Some(group)
    }

    /// Apply a status change, updating timestamps and durations.
    ///
    /// Entering IN_PROGRESS stamps `started_at`; entering DONE stamps
    /// `completed_at` and records the actual duration when a start time exists.
    pub fn transition(&mut self, next: TaskStatus, note: Option<&str>) -> Result<(), DomainError> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::InvalidTransition {
                task: self.id.to_string(),
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }

        let now = Utc::now();
        if next == TaskStatus::InProgress && self.started_at.is_none() {
            self.started_at = Some(now);
        }
        if next == TaskStatus::Done {
            self.completed_at = Some(now);
            if let Some(started) = self.started_at {
                let elapsed = (now - started).num_milliseconds().max(0) as f64;
                self.actual_duration_minutes = Some(elapsed / 60_000.0);
            }
        }

        self.status = next;
        self.updated_at = now;
        if let Some(note) = note.filter(|n| !n.trim().is_empty()) {
            self.notes.push(note.to_string());
        }
        Ok(())
    }

    /// Force the task into CANCELLED as a compensating action, bypassing
    /// the regular state machine. Used after a successful rollback.
    pub fn mark_rolled_back(&mut self, note: impl Into<String>) {
        self.status = TaskStatus::Cancelled;
        self.updated_at = Utc::now();
        self.notes.push(note.into());
    }

    /// Textual representation scored by the compliance engine.
    pub fn compliance_content(&self) -> String {
        let mut parts = vec![
            format!("title: {}", self.title),
            format!("phase: {}", self.phase.tag()),
            format!("status: {}", self.status),
        ];
        parts.extend(self.completion_criteria.iter().map(|c| format!("criterion: {c}")));
        parts.extend(self.validation_steps.iter().map(|s| format!("validation: {s}")));
        if let Some(rollback) = &self.rollback_procedure {
            parts.push(format!("rollback: {rollback}"));
        }
        parts.extend(self.notes.iter().map(|n| format!("note: {n}")));
        parts.join("\n")
    }
}
