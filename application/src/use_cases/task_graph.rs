//! Task Graph Manager
//!
//! Owns the task registry behind a single async mutex. A DONE transition and
//! the unblock scan of its dependents happen under the same lock, so
//! concurrent completions never leave a dependent erroneously BLOCKED.

use crate::ports::event_logger::{
    NoEventLogger, ResolutionEvent, ResolutionEventLogger, TASK_STATUS_CHANGED,
};
use crate::use_cases::compliance_engine::ComplianceEngine;
use resolver_domain::{
    BlockedTask, ComplianceResult, ComplianceScope, DependencyGraph, DependencyInfo,
    DependencyRef, DependencyValidation, DomainError, MultiPhaseStrategy, ResolutionTask,
    TaskId, TaskPriority, TaskStatus,
};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TaskGraphError {
    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),

    #[error("Task already exists: {0}")]
    DuplicateTask(TaskId),

    #[error("Task {task} depends on unknown task {dependency}")]
    UnknownDependency { task: TaskId, dependency: TaskId },

    #[error(transparent)]
    InvalidTransition(#[from] DomainError),
}

/// Selects tasks by status and/or parallel group.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub parallel_group: Option<String>,
}

impl TaskFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.parallel_group = Some(group.into());
        self
    }

    fn matches(&self, task: &ResolutionTask) -> bool {
        self.status.is_none_or(|s| task.status == s)
            && self
                .parallel_group
                .as_deref()
                .is_none_or(|g| task.in_group(g))
    }
}

/// Result of a status update.
#[derive(Debug, Clone)]
pub struct StatusUpdate {
    pub task: ResolutionTask,
    pub previous: TaskStatus,
    /// Dependents moved BLOCKED → PENDING by this update.
    pub unblocked: Vec<TaskId>,
    pub compliance: Option<ComplianceResult>,
}

#[derive(Default)]
struct TaskRegistry {
    tasks: HashMap<TaskId, ResolutionTask>,
    order: Vec<TaskId>,
}

impl TaskRegistry {
    fn get(&self, id: &TaskId) -> Result<&ResolutionTask, TaskGraphError> {
        self.tasks
            .get(id)
            .ok_or_else(|| TaskGraphError::TaskNotFound(id.clone()))
    }

    fn get_mut(&mut self, id: &TaskId) -> Result<&mut ResolutionTask, TaskGraphError> {
        self.tasks
            .get_mut(id)
            .ok_or_else(|| TaskGraphError::TaskNotFound(id.clone()))
    }

    fn iter(&self) -> impl Iterator<Item = &ResolutionTask> {
        self.order.iter().filter_map(|id| self.tasks.get(id))
    }

    fn reference(task: &ResolutionTask) -> DependencyRef {
        DependencyRef {
            id: task.id.clone(),
            title: task.title.clone(),
            status: task.status,
        }
    }

    fn dependencies_done(&self, task: &ResolutionTask) -> bool {
        task.dependencies.iter().all(|dep| {
            self.tasks
                .get(dep)
                .is_some_and(|d| d.status == TaskStatus::Done)
        })
    }

    /// Move BLOCKED dependents of `id` back to PENDING once all of their
    /// dependencies are DONE.
    fn unblock_dependents(&mut self, id: &TaskId) -> Vec<TaskId> {
        let candidates: Vec<TaskId> = self
            .iter()
            .filter(|t| t.status == TaskStatus::Blocked && t.dependencies.contains(id))
            .filter(|t| self.dependencies_done(t))
            .map(|t| t.id.clone())
            .collect();

        let mut unblocked = Vec::new();
        for dependent in candidates {
            if let Some(task) = self.tasks.get_mut(&dependent)
                && task
                    .transition(TaskStatus::Pending, Some("Unblocked: all dependencies done"))
                    .is_ok()
            {
                unblocked.push(dependent);
            }
        }
        unblocked
    }
}

pub struct TaskGraphManager {
    registry: Mutex<TaskRegistry>,
    compliance: Option<Arc<ComplianceEngine>>,
    logger: Arc<dyn ResolutionEventLogger>,
}

impl Default for TaskGraphManager {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskGraphManager {
    pub fn new() -> Self {
        Self {
            registry: Mutex::new(TaskRegistry::default()),
            compliance: None,
            logger: Arc::new(NoEventLogger),
        }
    }

    pub fn with_compliance(mut self, engine: Arc<ComplianceEngine>) -> Self {
        self.compliance = Some(engine);
        self
    }

    pub fn with_event_logger(mut self, logger: Arc<dyn ResolutionEventLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Register a task. Every dependency must already be registered.
    pub async fn create_task(&self, task: ResolutionTask) -> Result<TaskId, TaskGraphError> {
        let mut registry = self.registry.lock().await;
        if registry.tasks.contains_key(&task.id) {
            return Err(TaskGraphError::DuplicateTask(task.id));
        }
        if let Some(missing) = task
            .dependencies
            .iter()
            .find(|dep| !registry.tasks.contains_key(*dep))
        {
            return Err(TaskGraphError::UnknownDependency {
                task: task.id.clone(),
                dependency: missing.clone(),
            });
        }

        let id = task.id.clone();
        debug!("Created task {} ({} deps)", id, task.dependencies.len());
        registry.order.push(id.clone());
        registry.tasks.insert(id.clone(), task);
        Ok(id)
    }

    /// Add a dependency edge between two registered tasks. Cycles are not
    /// rejected here; they surface through [`Self::validate_dependency_set`].
    pub async fn add_dependency(
        &self,
        task_id: &TaskId,
        dependency: &TaskId,
    ) -> Result<(), TaskGraphError> {
        let mut registry = self.registry.lock().await;
        if !registry.tasks.contains_key(dependency) {
            return Err(TaskGraphError::UnknownDependency {
                task: task_id.clone(),
                dependency: dependency.clone(),
            });
        }
        registry.get_mut(task_id)?.dependencies.insert(dependency.clone());
        Ok(())
    }

    pub async fn get_task(&self, id: &TaskId) -> Option<ResolutionTask> {
        self.registry.lock().await.tasks.get(id).cloned()
    }

    /// How many of `ids` are DONE. Unknown ids count as incomplete.
    pub async fn completed_count(&self, ids: &[TaskId]) -> usize {
        let registry = self.registry.lock().await;
        ids.iter()
            .filter(|id| {
                registry
                    .tasks
                    .get(*id)
                    .is_some_and(|t| t.status == TaskStatus::Done)
            })
            .count()
    }

    pub async fn task_count(&self) -> usize {
        self.registry.lock().await.tasks.len()
    }

    /// Transition a task. When `validate` is set and the new status is
    /// BLOCKED or DONE, the task content is scored by the compliance engine
    /// and the score stored on the task.
    pub async fn update_status(
        &self,
        id: &TaskId,
        status: TaskStatus,
        notes: Option<&str>,
        validate: bool,
    ) -> Result<StatusUpdate, TaskGraphError> {
        let mut registry = self.registry.lock().await;
        let task = registry.get_mut(id)?;
        let previous = task.status;
        task.transition(status, notes)?;

        let compliance = match &self.compliance {
            Some(engine) if validate && matches!(status, TaskStatus::Blocked | TaskStatus::Done) => {
                let mut context = BTreeMap::new();
                context.insert("task_id".to_string(), Value::String(id.to_string()));
                let result = engine.validate(
                    &task.compliance_content(),
                    &ComplianceScope::phase(task.phase.tag()),
                    context,
                );
                task.constitutional_score = Some(result.overall_score);
                Some(result)
            }
            _ => None,
        };
        let snapshot = task.clone();

        let unblocked = if status == TaskStatus::Done {
            registry.unblock_dependents(id)
        } else {
            Vec::new()
        };
        drop(registry);

        info!("Task {}: {} -> {}", id, previous, status);
        self.logger.log(ResolutionEvent::new(
            TASK_STATUS_CHANGED,
            serde_json::json!({
                "task_id": id.as_str(),
                "from": previous.as_str(),
                "to": status.as_str(),
                "unblocked": unblocked.iter().map(TaskId::as_str).collect::<Vec<_>>(),
                "constitutional_score": snapshot.constitutional_score,
            }),
        ));

        Ok(StatusUpdate {
            task: snapshot,
            previous,
            unblocked,
            compliance,
        })
    }

    /// Dependencies, dependents and the computed blocked flag of a task.
    pub async fn get_dependencies(&self, id: &TaskId) -> Result<DependencyInfo, TaskGraphError> {
        let registry = self.registry.lock().await;
        let task = registry.get(id)?;

        let mut dependencies = Vec::new();
        let mut blocking_reasons = Vec::new();
        for dep_id in &task.dependencies {
            match registry.tasks.get(dep_id) {
                Some(dep) => {
                    if dep.status != TaskStatus::Done {
                        blocking_reasons.push(format!(
                            "Dependency {} ({}) is {}",
                            dep.id, dep.title, dep.status
                        ));
                    }
                    dependencies.push(TaskRegistry::reference(dep));
                }
                None => blocking_reasons.push(format!("Dependency {dep_id} is not registered")),
            }
        }
        let dependents = registry
            .iter()
            .filter(|t| t.dependencies.contains(id))
            .map(TaskRegistry::reference)
            .collect();

        Ok(DependencyInfo {
            task_id: id.clone(),
            dependencies,
            dependents,
            blocked: !blocking_reasons.is_empty(),
            blocking_reasons,
        })
    }

    /// Detect cycles within `ids` and tasks blocked by an incomplete
    /// dependency outside the set.
    pub async fn validate_dependency_set(
        &self,
        ids: &[TaskId],
    ) -> Result<DependencyValidation, TaskGraphError> {
        let registry = self.registry.lock().await;
        let members: HashSet<&TaskId> = ids.iter().collect();

        let mut graph = DependencyGraph::new();
        let mut blocked_tasks = Vec::new();
        for id in ids {
            let task = registry.get(id)?;
            graph.add_node(id);
            let mut blocked_by = Vec::new();
            for dep in &task.dependencies {
                if members.contains(dep) {
                    graph.add_edge(id, dep);
                } else if registry
                    .tasks
                    .get(dep)
                    .is_none_or(|d| d.status != TaskStatus::Done)
                {
                    blocked_by.push(dep.clone());
                }
            }
            if !blocked_by.is_empty() {
                blocked_tasks.push(BlockedTask {
                    task_id: id.clone(),
                    blocked_by,
                });
            }
        }

        let circular_dependencies = graph.find_cycles();
        let mut issues: Vec<String> = circular_dependencies
            .iter()
            .map(|cycle| {
                let path: Vec<&str> = cycle.iter().map(TaskId::as_str).collect();
                format!("Circular dependency: {}", path.join(" -> "))
            })
            .collect();
        issues.extend(blocked_tasks.iter().map(|b| {
            let deps: Vec<&str> = b.blocked_by.iter().map(TaskId::as_str).collect();
            format!(
                "Task {} is blocked by incomplete external dependencies: {}",
                b.task_id,
                deps.join(", ")
            )
        }));

        Ok(DependencyValidation {
            valid: circular_dependencies.is_empty(),
            circular_dependencies,
            blocked_tasks,
            issues,
        })
    }

    pub async fn list_tasks(&self, filter: &TaskFilter) -> Vec<ResolutionTask> {
        let registry = self.registry.lock().await;
        registry.iter().filter(|t| filter.matches(t)).cloned().collect()
    }

    /// PENDING tasks whose dependencies are all DONE.
    pub async fn ready_tasks(&self) -> Vec<ResolutionTask> {
        let registry = self.registry.lock().await;
        registry
            .iter()
            .filter(|t| t.status == TaskStatus::Pending && registry.dependencies_done(t))
            .cloned()
            .collect()
    }

    /// Create one task per execution checkpoint of `strategy`.
    ///
    /// A critical-path checkpoint depends on the previous critical-path
    /// checkpoint; parallel checkpoints depend only on the previous
    /// critical one.
    pub async fn materialize_strategy(
        &self,
        strategy: &MultiPhaseStrategy,
        group: &str,
    ) -> Result<Vec<TaskId>, TaskGraphError> {
        let mut ids = Vec::with_capacity(strategy.execution_checkpoints.len());
        let mut last_critical: Option<TaskId> = None;

        for checkpoint in &strategy.execution_checkpoints {
            let id = TaskId::new(format!("{group}-{}", checkpoint.id));
            let rollback = checkpoint
                .failure_procedures
                .first()
                .cloned()
                .or_else(|| {
                    strategy
                        .strategy
                        .has_rollback()
                        .then(|| strategy.strategy.rollback_strategy.clone())
                });

            let mut task = ResolutionTask::new(id.clone(), checkpoint.name.clone())
                .with_phase(checkpoint.phase)
                .with_priority(if checkpoint.critical_path {
                    TaskPriority::High
                } else {
                    TaskPriority::Medium
                })
                .with_parallel_group(group)
                .with_estimated_duration(checkpoint.estimated_duration_minutes);
            task.completion_criteria = checkpoint.success_criteria.clone();
            task.validation_steps = checkpoint.validation_criteria().cloned().collect();
            task.rollback_procedure = rollback;
            if let Some(previous) = &last_critical {
                task = task.with_dependency(previous.clone());
            }

            self.create_task(task).await?;
            if !checkpoint.parallel_executable {
                last_critical = Some(id.clone());
            }
            ids.push(id);
        }

        info!(
            "Materialized {} tasks for '{}' in group {}",
            ids.len(),
            strategy.name(),
            group
        );
        Ok(ids)
    }

    /// Record the worktree a task runs in.
    pub async fn assign_worktree(&self, id: &TaskId, path: PathBuf) -> Result<(), TaskGraphError> {
        let mut registry = self.registry.lock().await;
        registry.get_mut(id)?.worktree_path = Some(path);
        Ok(())
    }

    /// Force a task to CANCELLED after its rollback ran.
    pub async fn mark_rolled_back(
        &self,
        id: &TaskId,
        note: impl Into<String>,
    ) -> Result<ResolutionTask, TaskGraphError> {
        let mut registry = self.registry.lock().await;
        let task = registry.get_mut(id)?;
        let previous = task.status;
        task.mark_rolled_back(note);
        let snapshot = task.clone();
        drop(registry);

        self.logger.log(ResolutionEvent::new(
            TASK_STATUS_CHANGED,
            serde_json::json!({
                "task_id": id.as_str(),
                "from": previous.as_str(),
                "to": TaskStatus::Cancelled.as_str(),
                "rolled_back": true,
            }),
        ));
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::builtin_rules::builtin_rules;
    use resolver_domain::{ExecutionCheckpoint, ExecutionPhase, ResolutionStrategy, StrategyType};

    fn id(s: &str) -> TaskId {
        TaskId::new(s)
    }

    async fn chain() -> TaskGraphManager {
        let graph = TaskGraphManager::new();
        graph.create_task(ResolutionTask::new("b", "B")).await.unwrap();
        graph.create_task(ResolutionTask::new("c", "C")).await.unwrap();
        graph
            .create_task(ResolutionTask::new("a", "A").with_dependency("b"))
            .await
            .unwrap();
        graph
    }

    // ===== Creation =====

    #[tokio::test]
    async fn test_unknown_dependency_rejected() {
        let graph = TaskGraphManager::new();
        let err = graph
            .create_task(ResolutionTask::new("a", "A").with_dependency("missing"))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            TaskGraphError::UnknownDependency {
                task: id("a"),
                dependency: id("missing")
            }
        );
    }

    #[tokio::test]
    async fn test_duplicate_rejected() {
        let graph = chain().await;
        let err = graph.create_task(ResolutionTask::new("a", "A")).await.unwrap_err();
        assert_eq!(err, TaskGraphError::DuplicateTask(id("a")));
    }

    // ===== Transitions =====

    #[tokio::test]
    async fn test_done_unblocks_dependent() {
        let graph = chain().await;
        graph
            .update_status(&id("a"), TaskStatus::Blocked, Some("waiting on b"), false)
            .await
            .unwrap();

        let update = graph
            .update_status(&id("b"), TaskStatus::Done, None, false)
            .await
            .unwrap();
        assert_eq!(update.unblocked, vec![id("a")]);
        assert_eq!(graph.get_task(&id("a")).await.unwrap().status, TaskStatus::Pending);
    }

    #[tokio::test]
    async fn test_second_dependency_keeps_blocked() {
        let graph = chain().await;
        graph.add_dependency(&id("a"), &id("c")).await.unwrap();
        graph
            .update_status(&id("a"), TaskStatus::Blocked, None, false)
            .await
            .unwrap();

        let update = graph
            .update_status(&id("b"), TaskStatus::Done, None, false)
            .await
            .unwrap();
        assert!(update.unblocked.is_empty());
        assert_eq!(graph.get_task(&id("a")).await.unwrap().status, TaskStatus::Blocked);

        graph.update_status(&id("c"), TaskStatus::Done, None, false).await.unwrap();
        assert_eq!(graph.get_task(&id("a")).await.unwrap().status, TaskStatus::Pending);
    }

    #[tokio::test]
    async fn test_terminal_status_cannot_be_left() {
        let graph = chain().await;
        graph.update_status(&id("b"), TaskStatus::Done, None, false).await.unwrap();
        let err = graph
            .update_status(&id("b"), TaskStatus::Pending, None, false)
            .await
            .unwrap_err();
        assert!(matches!(err, TaskGraphError::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn test_done_with_validation_stores_score() {
        let engine = Arc::new(ComplianceEngine::default());
        engine.register_rules(builtin_rules());
        let graph = TaskGraphManager::new().with_compliance(engine.clone());
        graph
            .create_task(ResolutionTask::new("t", "Merge hunks").with_validation_step("Run tests"))
            .await
            .unwrap();

        let update = graph
            .update_status(&id("t"), TaskStatus::Done, Some("merged"), true)
            .await
            .unwrap();
        assert_eq!(update.task.constitutional_score, Some(1.0));
        assert!(update.compliance.is_some());
        assert_eq!(engine.history_len(), 1);

        let skipped = graph
            .update_status(&id("b-missing"), TaskStatus::Done, None, true)
            .await;
        assert!(matches!(skipped, Err(TaskGraphError::TaskNotFound(_))));
    }

    // ===== Dependencies =====

    #[tokio::test]
    async fn test_get_dependencies_reports_blocking() {
        let graph = chain().await;
        let info = graph.get_dependencies(&id("a")).await.unwrap();
        assert!(info.blocked);
        assert_eq!(info.dependencies.len(), 1);
        assert!(info.blocking_reasons[0].contains("PENDING"));

        let info_b = graph.get_dependencies(&id("b")).await.unwrap();
        assert!(!info_b.blocked);
        assert_eq!(info_b.dependents[0].id, id("a"));
    }

    #[tokio::test]
    async fn test_validate_detects_cycle() {
        let graph = chain().await;
        graph.add_dependency(&id("b"), &id("a")).await.unwrap();
        let validation = graph
            .validate_dependency_set(&[id("a"), id("b")])
            .await
            .unwrap();
        assert!(!validation.valid);
        assert_eq!(validation.circular_dependencies.len(), 1);
    }

    #[tokio::test]
    async fn test_validate_reports_external_block() {
        let graph = chain().await;
        let validation = graph.validate_dependency_set(&[id("a")]).await.unwrap();
        assert!(validation.valid);
        assert!(!validation.is_executable());
        assert_eq!(validation.blocked_tasks[0].blocked_by, vec![id("b")]);

        graph.update_status(&id("b"), TaskStatus::Done, None, false).await.unwrap();
        let validation = graph.validate_dependency_set(&[id("a")]).await.unwrap();
        assert!(validation.is_executable());
    }

    #[tokio::test]
    async fn test_ready_tasks_and_filters() {
        let graph = chain().await;
        let ready: Vec<TaskId> = graph.ready_tasks().await.into_iter().map(|t| t.id).collect();
        assert_eq!(ready, vec![id("b"), id("c")]);

        graph.update_status(&id("c"), TaskStatus::Deferred, None, false).await.unwrap();
        let deferred = graph
            .list_tasks(&TaskFilter::all().with_status(TaskStatus::Deferred))
            .await;
        assert_eq!(deferred.len(), 1);
    }

    // ===== Materialization =====

    #[tokio::test]
    async fn test_materialize_chains_critical_path() {
        let mut strategy = MultiPhaseStrategy::new(ResolutionStrategy::new(
            "Conservative",
            StrategyType::ConservativeMerge,
        ));
        strategy.strategy.rollback_strategy = "Revert".into();
        strategy.execution_checkpoints = vec![
            ExecutionCheckpoint::new("cp1", "Analyze", ExecutionPhase::Analysis),
            ExecutionCheckpoint::new("cp2", "Implement", ExecutionPhase::Implementation),
            ExecutionCheckpoint::new("cp3", "Document", ExecutionPhase::Documentation).parallel(),
            ExecutionCheckpoint::new("cp4", "Validate", ExecutionPhase::Validation)
                .with_criterion("Tests pass"),
        ];

        let graph = TaskGraphManager::new();
        let ids = graph.materialize_strategy(&strategy, "g1").await.unwrap();
        assert_eq!(ids.len(), 4);

        let t2 = graph.get_task(&id("g1-cp2")).await.unwrap();
        let t3 = graph.get_task(&id("g1-cp3")).await.unwrap();
        let t4 = graph.get_task(&id("g1-cp4")).await.unwrap();
        assert!(t2.dependencies.contains(&id("g1-cp1")));
        assert!(t3.dependencies.contains(&id("g1-cp2")));
        assert!(t4.dependencies.contains(&id("g1-cp2")));
        assert!(!t4.dependencies.contains(&id("g1-cp3")));
        assert_eq!(t4.validation_steps, vec!["Tests pass".to_string()]);
        assert_eq!(t4.rollback_procedure.as_deref(), Some("Revert"));
        assert_eq!(
            graph.list_tasks(&TaskFilter::all().in_group("g1")).await.len(),
            4
        );
    }

    #[tokio::test]
    async fn test_mark_rolled_back_leaves_done() {
        let graph = chain().await;
        graph.update_status(&id("b"), TaskStatus::Done, None, false).await.unwrap();
        let task = graph.mark_rolled_back(&id("b"), "rolled back").await.unwrap();
        assert_eq!(task.status, TaskStatus::Cancelled);
    }
}
