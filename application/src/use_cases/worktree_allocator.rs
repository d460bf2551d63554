//! Worktree Allocator
//!
//! Provisions one isolated worktree per task and records resource budgets.
//! Allocation is idempotent: asking again for a task that already has an
//! active worktree returns the existing one.

use crate::ports::worktree_backend::{WorktreeBackend, WorktreeError};
use resolver_domain::{
    ResourceAllocation, ResourceRequest, TaskId, WorktreeEnvironment, WorktreeStatus,
    sanitize_path_component, worktree_branch_name,
};
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// What a cleanup pass released.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CleanupSummary {
    pub worktrees_removed: usize,
    pub allocations_released: usize,
    pub errors: Vec<String>,
}

#[derive(Default)]
struct AllocatorState {
    worktrees: HashMap<TaskId, WorktreeEnvironment>,
    allocations: HashMap<TaskId, Vec<ResourceAllocation>>,
}

pub struct WorktreeAllocator {
    backend: Arc<dyn WorktreeBackend>,
    root: PathBuf,
    state: Mutex<AllocatorState>,
}

impl WorktreeAllocator {
    pub fn new(backend: Arc<dyn WorktreeBackend>, root: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            root: root.into(),
            state: Mutex::new(AllocatorState::default()),
        }
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    fn path_for(&self, group: &str, task_id: &TaskId) -> PathBuf {
        self.root
            .join(sanitize_path_component(group))
            .join(sanitize_path_component(task_id.as_str()))
    }

    /// Provision (or reuse) the worktree of `task_id`.
    ///
    /// The task is reserved under the lock; the backend runs without it so
    /// concurrent tasks provision in parallel.
    pub async fn allocate(
        &self,
        task_id: &TaskId,
        group: &str,
    ) -> Result<WorktreeEnvironment, WorktreeError> {
        let path = self.path_for(group, task_id);
        let branch = worktree_branch_name(group, task_id);
        {
            let mut state = self.state.lock().await;
            match state.worktrees.get(task_id).map(|e| e.status) {
                Some(WorktreeStatus::Active) => {
                    let existing = state.worktrees[task_id].clone();
                    debug!("Reusing worktree {} for {}", existing.path.display(), task_id);
                    return Ok(existing);
                }
                Some(WorktreeStatus::Provisioning) => {
                    return Err(WorktreeError::Busy(task_id.to_string()));
                }
                _ => {
                    let mut reserved =
                        WorktreeEnvironment::new(task_id.clone(), path.clone(), branch.clone());
                    reserved.status = WorktreeStatus::Provisioning;
                    state.worktrees.insert(task_id.clone(), reserved);
                }
            }
        }

        let created = self.backend.create_worktree(&path, &branch).await;

        let mut state = self.state.lock().await;
        match created {
            Ok(created) => {
                let environment = WorktreeEnvironment::new(task_id.clone(), created, branch);
                state.worktrees.insert(task_id.clone(), environment.clone());
                debug!("Created worktree {} for {}", environment.path.display(), task_id);
                Ok(environment)
            }
            Err(e) => {
                warn!("Worktree for {} failed: {}", task_id, e);
                let mut failed = WorktreeEnvironment::new(task_id.clone(), path, branch);
                failed.status = WorktreeStatus::Failed;
                state.worktrees.insert(task_id.clone(), failed);
                Err(e)
            }
        }
    }

    pub async fn worktree(&self, task_id: &TaskId) -> Option<WorktreeEnvironment> {
        self.state.lock().await.worktrees.get(task_id).cloned()
    }

    /// Record one allocation per requested resource type, replacing any
    /// earlier allocation of the same type.
    pub async fn request_resources(
        &self,
        task_id: &TaskId,
        requests: &[ResourceRequest],
    ) -> Vec<ResourceAllocation> {
        let mut state = self.state.lock().await;
        let entry = state.allocations.entry(task_id.clone()).or_default();
        for request in requests {
            entry.retain(|a| a.resource_type != request.resource_type);
            entry.push(ResourceAllocation::from_request(task_id.clone(), request));
        }
        entry.clone()
    }

    pub async fn allocations(&self, task_id: &TaskId) -> Vec<ResourceAllocation> {
        self.state
            .lock()
            .await
            .allocations
            .get(task_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Remove the worktrees and release the allocations of `task_ids`.
    /// Backend failures are collected, never propagated. Worktrees still
    /// being provisioned are left in place and reported as errors.
    pub async fn cleanup(&self, task_ids: &[TaskId]) -> CleanupSummary {
        let mut summary = CleanupSummary::default();
        let mut to_remove = Vec::new();
        {
            let mut state = self.state.lock().await;
            for task_id in task_ids {
                if let Some(released) = state.allocations.remove(task_id) {
                    summary.allocations_released += released.len();
                }
                match state.worktrees.get(task_id).map(|e| e.status) {
                    None => {}
                    Some(WorktreeStatus::Provisioning) => {
                        summary
                            .errors
                            .push(WorktreeError::Busy(task_id.to_string()).to_string());
                    }
                    Some(WorktreeStatus::Active) => {
                        if let Some(environment) = state.worktrees.remove(task_id) {
                            to_remove.push(environment);
                        }
                    }
                    Some(_) => {
                        state.worktrees.remove(task_id);
                    }
                }
            }
        }

        let removals = to_remove.iter().map(|environment| async move {
            (
                environment,
                self.backend.remove_worktree(&environment.path).await,
            )
        });
        for (environment, result) in futures::future::join_all(removals).await {
            match result {
                Ok(()) => summary.worktrees_removed += 1,
                Err(e) => {
                    warn!("Cleanup of {} failed: {}", environment.path.display(), e);
                    summary.errors.push(e.to_string());
                }
            }
        }
        summary
    }
}
