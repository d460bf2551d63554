//! Parallel Coordinator
//!
//! Runs a session's tasks in dependency order, each inside its own
//! worktree, bounded by a semaphore. Barriers are polled against the task
//! registry; a barrier that times out is reported, never raised.
//!
//! A task failure marks that task BLOCKED and skips its in-session
//! dependents. Independent siblings keep running.

use crate::config::CoordinationParams;
use crate::ports::event_logger::{
    BARRIER_RESOLVED, NoEventLogger, ResolutionEvent, ResolutionEventLogger, SESSION_CLEANED_UP,
};
use crate::ports::progress::CoordinationProgressNotifier;
use crate::ports::task_executor::TaskExecutor;
use crate::use_cases::task_graph::{TaskGraphError, TaskGraphManager};
use crate::use_cases::worktree_allocator::{CleanupSummary, WorktreeAllocator};
use chrono::Utc;
use resolver_domain::{
    BarrierId, BarrierResult, BarrierStatus, CoordinationBarrier, CoordinationSession,
    CoordinationStrategy, DependencyGraph, ExecutionReport, ResourceRequest, SessionId,
    SessionStatus, TaskId, TaskOutcome, TaskRunStatus, TaskStatus, TriggerCondition,
    completed_ratio,
};
use serde::Serialize;
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Lower bound on the barrier poll interval.
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoordinationError {
    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),

    #[error("Barrier not found: {0}")]
    BarrierNotFound(BarrierId),

    #[error("Session {session} is {status}, expected initialized")]
    InvalidSessionState {
        session: SessionId,
        status: SessionStatus,
    },

    #[error("Task {task} is not part of session {session}")]
    TaskNotInSession { session: SessionId, task: TaskId },

    #[error("Session {session} has {} circular dependency chain(s)", .cycles.len())]
    CircularDependency {
        session: SessionId,
        cycles: Vec<Vec<TaskId>>,
    },

    #[error("Session {session} has {} task(s) blocked by incomplete external dependencies", .tasks.len())]
    ExternallyBlocked {
        session: SessionId,
        tasks: Vec<TaskId>,
    },

    #[error(transparent)]
    TaskGraph(#[from] TaskGraphError),
}

/// What cleaning up a session released.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionCleanup {
    pub barriers_removed: usize,
    #[serde(flatten)]
    pub resources: CleanupSummary,
}

struct SessionEntry {
    session: CoordinationSession,
    barriers: Vec<CoordinationBarrier>,
    cancel: CancellationToken,
}

pub struct ParallelCoordinator {
    tasks: Arc<TaskGraphManager>,
    allocator: Option<Arc<WorktreeAllocator>>,
    params: CoordinationParams,
    logger: Arc<dyn ResolutionEventLogger>,
    sessions: Mutex<HashMap<SessionId, SessionEntry>>,
}

impl ParallelCoordinator {
    pub fn new(tasks: Arc<TaskGraphManager>) -> Self {
        Self {
            tasks,
            allocator: None,
            params: CoordinationParams::default(),
            logger: Arc::new(NoEventLogger),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Run every task inside a worktree provisioned by `allocator`.
    pub fn with_allocator(mut self, allocator: Arc<WorktreeAllocator>) -> Self {
        self.allocator = Some(allocator);
        self
    }

    pub fn with_params(mut self, params: CoordinationParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_event_logger(mut self, logger: Arc<dyn ResolutionEventLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn params(&self) -> &CoordinationParams {
        &self.params
    }

    pub fn task_graph(&self) -> &Arc<TaskGraphManager> {
        &self.tasks
    }

    // ===== Sessions =====

    /// Register a session over existing tasks.
    pub async fn initialize_session(
        &self,
        group: &str,
        task_ids: Vec<TaskId>,
        strategy: CoordinationStrategy,
    ) -> Result<CoordinationSession, CoordinationError> {
        for id in &task_ids {
            if self.tasks.get_task(id).await.is_none() {
                return Err(TaskGraphError::TaskNotFound(id.clone()).into());
            }
        }

        let session = CoordinationSession::new(group, task_ids, strategy);
        info!(
            "Session {} initialized: group={}, tasks={}, strategy={}",
            session.id,
            group,
            session.task_ids.len(),
            strategy
        );

        self.sessions.lock().await.insert(
            session.id.clone(),
            SessionEntry {
                session: session.clone(),
                barriers: Vec::new(),
                cancel: CancellationToken::new(),
            },
        );
        Ok(session)
    }

    pub async fn session(&self, session_id: &SessionId) -> Option<CoordinationSession> {
        let sessions = self.sessions.lock().await;
        sessions.get(session_id).map(|e| e.session.clone())
    }

    pub async fn session_status(&self, session_id: &SessionId) -> Option<SessionStatus> {
        let sessions = self.sessions.lock().await;
        sessions.get(session_id).map(|e| e.session.status)
    }

    pub async fn barriers(&self, session_id: &SessionId) -> Vec<CoordinationBarrier> {
        let sessions = self.sessions.lock().await;
        sessions
            .get(session_id)
            .map(|e| e.barriers.clone())
            .unwrap_or_default()
    }

    async fn set_status(&self, session_id: &SessionId, status: SessionStatus) {
        let mut sessions = self.sessions.lock().await;
        if let Some(entry) = sessions.get_mut(session_id) {
            entry.session.status = status;
            if matches!(
                status,
                SessionStatus::Completed | SessionStatus::Failed | SessionStatus::Cancelled
            ) {
                entry.session.completed_at = Some(Utc::now());
            }
        }
    }

    /// Stop dispatching new tasks and release any barrier waits.
    ///
    /// Tasks already running finish on their own.
    pub async fn cancel_session(&self, session_id: &SessionId) -> Result<(), CoordinationError> {
        let mut sessions = self.sessions.lock().await;
        let entry = sessions
            .get_mut(session_id)
            .ok_or_else(|| CoordinationError::SessionNotFound(session_id.clone()))?;
        entry.cancel.cancel();
        if matches!(
            entry.session.status,
            SessionStatus::Initialized | SessionStatus::Running
        ) {
            entry.session.status = SessionStatus::Cancelled;
            entry.session.completed_at = Some(Utc::now());
        }
        info!("Session {} cancelled", session_id);
        Ok(())
    }

    // ===== Barriers =====

    /// Add a barrier over tasks of the session. `timeout` defaults to the
    /// configured barrier timeout.
    pub async fn create_barrier(
        &self,
        session_id: &SessionId,
        name: &str,
        task_ids: Vec<TaskId>,
        condition: TriggerCondition,
        timeout: Option<Duration>,
    ) -> Result<CoordinationBarrier, CoordinationError> {
        let mut sessions = self.sessions.lock().await;
        let entry = sessions
            .get_mut(session_id)
            .ok_or_else(|| CoordinationError::SessionNotFound(session_id.clone()))?;

        if let Some(task) = task_ids.iter().find(|t| !entry.session.contains(t)) {
            return Err(CoordinationError::TaskNotInSession {
                session: session_id.clone(),
                task: task.clone(),
            });
        }

        let timeout = timeout.unwrap_or(self.params.barrier_timeout);
        let barrier = CoordinationBarrier::new(
            session_id.clone(),
            name,
            task_ids,
            condition,
            timeout.as_millis() as u64,
        );
        debug!(
            "Barrier '{}' created in session {}: {} over {} task(s)",
            name,
            session_id,
            condition,
            barrier.task_ids.len()
        );
        entry.barriers.push(barrier.clone());
        Ok(barrier)
    }

    /// Poll until the barrier condition holds, the timeout elapses or the
    /// session is cancelled.
    pub async fn wait_barrier(
        &self,
        session_id: &SessionId,
        barrier_id: &BarrierId,
        progress: &dyn CoordinationProgressNotifier,
    ) -> Result<BarrierResult, CoordinationError> {
        let (barrier, token) = {
            let sessions = self.sessions.lock().await;
            let entry = sessions
                .get(session_id)
                .ok_or_else(|| CoordinationError::SessionNotFound(session_id.clone()))?;
            let barrier = entry
                .barriers
                .iter()
                .find(|b| &b.id == barrier_id)
                .cloned()
                .ok_or_else(|| CoordinationError::BarrierNotFound(barrier_id.clone()))?;
            (barrier, entry.cancel.clone())
        };

        progress.on_barrier_wait(&barrier.name);
        let started = Instant::now();
        let timeout = Duration::from_millis(barrier.timeout_ms);
        let poll = self.params.poll_interval.max(MIN_POLL_INTERVAL);
        let total = barrier.task_ids.len();

        let (status, completed) = loop {
            let completed = self.tasks.completed_count(&barrier.task_ids).await;
            if barrier.condition.is_met(completed_ratio(completed, total)) {
                break (BarrierStatus::Triggered, completed);
            }
            if token.is_cancelled() {
                break (BarrierStatus::Cancelled, completed);
            }
            let elapsed = started.elapsed();
            if elapsed >= timeout {
                break (BarrierStatus::TimedOut, completed);
            }
            tokio::select! {
                _ = tokio::time::sleep(poll.min(timeout - elapsed)) => {}
                _ = token.cancelled() => {}
            }
        };

        {
            let mut sessions = self.sessions.lock().await;
            if let Some(stored) = sessions
                .get_mut(session_id)
                .and_then(|e| e.barriers.iter_mut().find(|b| &b.id == barrier_id))
            {
                if status == BarrierStatus::Triggered {
                    stored.mark_triggered();
                } else {
                    stored.status = status;
                }
            }
        }

        let result = BarrierResult {
            barrier_id: barrier.id.clone(),
            name: barrier.name.clone(),
            triggered: status == BarrierStatus::Triggered,
            completed,
            total,
            completed_ratio: completed_ratio(completed, total),
            waited_ms: started.elapsed().as_millis() as u64,
            status,
        };

        if result.triggered {
            info!(
                "Barrier '{}' triggered: {}/{} complete",
                result.name, completed, total
            );
        } else {
            warn!(
                "Barrier '{}' {}: {}/{} complete after {}ms",
                result.name, status, completed, total, result.waited_ms
            );
        }
        self.logger.log(ResolutionEvent::new(
            BARRIER_RESOLVED,
            json!({
                "session_id": session_id.as_str(),
                "barrier_id": result.barrier_id.as_str(),
                "name": result.name,
                "condition": barrier.condition.to_string(),
                "status": status.as_str(),
                "completed": completed,
                "total": total,
                "waited_ms": result.waited_ms,
            }),
        ));
        progress.on_barrier_resolved(&result);
        Ok(result)
    }

    // ===== Execution =====

    /// Execute every task of an initialized session, then resolve its
    /// barriers.
    pub async fn execute_session(
        &self,
        session_id: &SessionId,
        executor: Arc<dyn TaskExecutor>,
        progress: &dyn CoordinationProgressNotifier,
    ) -> Result<ExecutionReport, CoordinationError> {
        let started = Instant::now();
        let (session, token) = {
            let sessions = self.sessions.lock().await;
            let entry = sessions
                .get(session_id)
                .ok_or_else(|| CoordinationError::SessionNotFound(session_id.clone()))?;
            if entry.session.status != SessionStatus::Initialized {
                return Err(CoordinationError::InvalidSessionState {
                    session: session_id.clone(),
                    status: entry.session.status,
                });
            }
            (entry.session.clone(), entry.cancel.clone())
        };

        let validation = self.tasks.validate_dependency_set(&session.task_ids).await?;
        if !validation.valid {
            self.set_status(session_id, SessionStatus::Failed).await;
            return Err(CoordinationError::CircularDependency {
                session: session_id.clone(),
                cycles: validation.circular_dependencies,
            });
        }
        if !validation.blocked_tasks.is_empty() {
            self.set_status(session_id, SessionStatus::Failed).await;
            return Err(CoordinationError::ExternallyBlocked {
                session: session_id.clone(),
                tasks: validation
                    .blocked_tasks
                    .into_iter()
                    .map(|b| b.task_id)
                    .collect(),
            });
        }

        self.set_status(session_id, SessionStatus::Running).await;
        progress.on_session_start(session_id, session.task_ids.len());
        info!(
            "Executing session {} ({} tasks, {})",
            session_id,
            session.task_ids.len(),
            session.strategy
        );

        // In-session dependencies only; external ones were checked above.
        let members: HashSet<&TaskId> = session.task_ids.iter().collect();
        let mut deps: HashMap<TaskId, Vec<TaskId>> = HashMap::new();
        let mut succeeded: HashSet<TaskId> = HashSet::new();
        let mut failed: HashSet<TaskId> = HashSet::new();
        let mut outcomes: HashMap<TaskId, TaskOutcome> = HashMap::new();
        for id in &session.task_ids {
            let Some(task) = self.tasks.get_task(id).await else {
                continue;
            };
            match task.status {
                TaskStatus::Done => {
                    succeeded.insert(id.clone());
                    outcomes.insert(
                        id.clone(),
                        TaskOutcome::succeeded(id.clone(), Some("already done".into()), 0),
                    );
                }
                TaskStatus::Cancelled => {
                    failed.insert(id.clone());
                    outcomes.insert(id.clone(), TaskOutcome::skipped(id.clone(), "task is cancelled"));
                }
                _ => {}
            }
            deps.insert(
                id.clone(),
                task.dependencies
                    .iter()
                    .filter(|d| members.contains(d))
                    .cloned()
                    .collect(),
            );
        }

        let graph = DependencyGraph::from_dependencies(
            session
                .task_ids
                .iter()
                .map(|id| (id, deps.get(id).into_iter().flatten())),
        );
        let mut waiting: Vec<TaskId> = graph
            .topological_order()
            .unwrap_or_else(|| session.task_ids.clone())
            .into_iter()
            .filter(|id| !outcomes.contains_key(id))
            .collect();

        let limit = match session.strategy {
            CoordinationStrategy::Sequential => 1,
            CoordinationStrategy::Parallel => self.params.max_concurrency.max(1),
        };
        let semaphore = Arc::new(Semaphore::new(limit));
        let mut join_set = JoinSet::new();
        let mut running: HashMap<tokio::task::Id, TaskId> = HashMap::new();

        loop {
            let mut still_waiting = Vec::new();
            for id in waiting.drain(..) {
                let task_deps = deps.get(&id).map(Vec::as_slice).unwrap_or_default();
                if let Some(dep) = task_deps.iter().find(|d| failed.contains(*d)) {
                    debug!("Skipping task {}: dependency {} did not succeed", id, dep);
                    failed.insert(id.clone());
                    let reason = format!("dependency {dep} did not succeed");
                    outcomes.insert(id.clone(), TaskOutcome::skipped(id.clone(), reason));
                    progress.on_task_complete(&id, false);
                } else if task_deps.iter().all(|d| succeeded.contains(d)) {
                    if token.is_cancelled() {
                        failed.insert(id.clone());
                        outcomes.insert(id.clone(), TaskOutcome::skipped(id.clone(), "session cancelled"));
                        continue;
                    }
                    progress.on_task_start(&id);
                    let handle = join_set.spawn(run_task(
                        Arc::clone(&self.tasks),
                        self.allocator.clone(),
                        Arc::clone(&executor),
                        Arc::clone(&semaphore),
                        session.group.clone(),
                        id.clone(),
                        self.params.resources.clone(),
                    ));
                    running.insert(handle.id(), id);
                } else {
                    still_waiting.push(id);
                }
            }
            waiting = still_waiting;

            match join_set.join_next_with_id().await {
                None => break,
                Some(Ok((handle_id, outcome))) => {
                    running.remove(&handle_id);
                    let ok = outcome.status == TaskRunStatus::Succeeded;
                    if ok {
                        succeeded.insert(outcome.task_id.clone());
                    } else {
                        failed.insert(outcome.task_id.clone());
                    }
                    progress.on_task_complete(&outcome.task_id, ok);
                    outcomes.insert(outcome.task_id.clone(), outcome);
                }
                Some(Err(e)) => {
                    warn!("Task join error: {}", e);
                    if let Some(id) = running.remove(&e.id()) {
                        failed.insert(id.clone());
                        progress.on_task_complete(&id, false);
                        outcomes.insert(id.clone(), TaskOutcome::failed(id, e.to_string(), 0));
                    }
                }
            }
        }

        for id in waiting {
            outcomes.insert(
                id.clone(),
                TaskOutcome::skipped(id, "dependencies never resolved"),
            );
        }

        let barrier_ids: Vec<BarrierId> = {
            let sessions = self.sessions.lock().await;
            sessions
                .get(session_id)
                .map(|e| e.barriers.iter().map(|b| b.id.clone()).collect())
                .unwrap_or_default()
        };
        let mut barrier_results = Vec::with_capacity(barrier_ids.len());
        for barrier_id in &barrier_ids {
            barrier_results.push(self.wait_barrier(session_id, barrier_id, progress).await?);
        }

        let outcomes: Vec<TaskOutcome> = session
            .task_ids
            .iter()
            .filter_map(|id| outcomes.remove(id))
            .collect();
        let status = if token.is_cancelled() {
            SessionStatus::Cancelled
        } else if outcomes
            .iter()
            .all(|o| o.status == TaskRunStatus::Succeeded)
        {
            SessionStatus::Completed
        } else {
            SessionStatus::Failed
        };
        self.set_status(session_id, status).await;

        let report = ExecutionReport {
            session_id: session_id.clone(),
            status,
            outcomes,
            barrier_results,
            elapsed_ms: started.elapsed().as_millis() as u64,
        };
        info!(
            "Session {} finished: {} ({} task(s), {}ms)",
            session_id,
            status,
            report.outcomes.len(),
            report.elapsed_ms
        );
        progress.on_session_complete(&report);
        Ok(report)
    }

    /// Release worktrees, allocations and barriers of a session, whatever
    /// state it ended in.
    pub async fn cleanup_session(
        &self,
        session_id: &SessionId,
    ) -> Result<SessionCleanup, CoordinationError> {
        let task_ids = {
            let sessions = self.sessions.lock().await;
            sessions
                .get(session_id)
                .map(|e| e.session.task_ids.clone())
                .ok_or_else(|| CoordinationError::SessionNotFound(session_id.clone()))?
        };

        let resources = match &self.allocator {
            Some(allocator) => allocator.cleanup(&task_ids).await,
            None => CleanupSummary::default(),
        };

        let barriers_removed = {
            let mut sessions = self.sessions.lock().await;
            match sessions.get_mut(session_id) {
                Some(entry) => {
                    entry.cancel.cancel();
                    entry.session.status = SessionStatus::CleanedUp;
                    std::mem::take(&mut entry.barriers).len()
                }
                None => 0,
            }
        };

        let cleanup = SessionCleanup {
            barriers_removed,
            resources,
        };
        info!(
            "Session {} cleaned up: {} worktree(s), {} barrier(s)",
            session_id, cleanup.resources.worktrees_removed, barriers_removed
        );
        self.logger.log(ResolutionEvent::new(
            SESSION_CLEANED_UP,
            json!({
                "session_id": session_id.as_str(),
                "worktrees_removed": cleanup.resources.worktrees_removed,
                "allocations_released": cleanup.resources.allocations_released,
                "barriers_removed": barriers_removed,
                "errors": cleanup.resources.errors,
            }),
        ));
        Ok(cleanup)
    }
}

/// One dispatched task: worktree, resource budgets, executor, final status.
async fn run_task(
    tasks: Arc<TaskGraphManager>,
    allocator: Option<Arc<WorktreeAllocator>>,
    executor: Arc<dyn TaskExecutor>,
    semaphore: Arc<Semaphore>,
    group: String,
    task_id: TaskId,
    default_resources: Vec<ResourceRequest>,
) -> TaskOutcome {
    let Ok(_permit) = semaphore.acquire_owned().await else {
        return TaskOutcome::failed(task_id, "scheduler closed", 0);
    };
    let started = Instant::now();
    let elapsed_ms = || started.elapsed().as_millis() as u64;

    if let Err(e) = tasks
        .update_status(&task_id, TaskStatus::InProgress, None, false)
        .await
    {
        return TaskOutcome::failed(task_id, e.to_string(), elapsed_ms());
    }

    let worktree = match &allocator {
        Some(allocator) => match allocator.allocate(&task_id, &group).await {
            Ok(env) => {
                if let Err(e) = tasks.assign_worktree(&task_id, env.path.clone()).await {
                    warn!("Failed to record worktree of {}: {}", task_id, e);
                }
                Some(env)
            }
            Err(e) => {
                let message = format!("Worktree allocation failed: {e}");
                block_task(&tasks, &task_id, &message).await;
                return TaskOutcome::failed(task_id, message, elapsed_ms());
            }
        },
        None => None,
    };

    let Some(task) = tasks.get_task(&task_id).await else {
        return TaskOutcome::failed(task_id, "task disappeared from registry", elapsed_ms());
    };

    if let Some(allocator) = &allocator {
        let requests = if task.resources.is_empty() {
            &default_resources
        } else {
            &task.resources
        };
        if !requests.is_empty() {
            let granted = allocator.request_resources(&task_id, requests).await;
            debug!("Recorded {} resource allocation(s) for {}", granted.len(), task_id);
        }
    }

    match executor.execute(&task, worktree.as_ref()).await {
        Ok(message) => match tasks
            .update_status(&task_id, TaskStatus::Done, message.as_deref(), true)
            .await
        {
            Ok(_) => TaskOutcome::succeeded(task_id, message, elapsed_ms()),
            Err(e) => TaskOutcome::failed(task_id, e.to_string(), elapsed_ms()),
        },
        Err(error) => {
            warn!("Task {} failed: {}", task_id, error);
            block_task(&tasks, &task_id, &error).await;
            TaskOutcome::failed(task_id, error, elapsed_ms())
        }
    }
}

async fn block_task(tasks: &TaskGraphManager, task_id: &TaskId, reason: &str) {
    if let Err(e) = tasks
        .update_status(task_id, TaskStatus::Blocked, Some(reason), true)
        .await
    {
        warn!("Failed to mark {} blocked: {}", task_id, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::progress::NoProgress;
    use crate::ports::task_executor::{DryRunExecutor, FnTaskExecutor};
    use crate::ports::worktree_backend::{WorktreeBackend, WorktreeError};
    use async_trait::async_trait;
    use futures::FutureExt;
    use resolver_domain::{ResolutionTask, ResourceType};
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn id(s: &str) -> TaskId {
        TaskId::new(s)
    }

    async fn graph_with(tasks: Vec<ResolutionTask>) -> Arc<TaskGraphManager> {
        let graph = Arc::new(TaskGraphManager::new());
        for task in tasks {
            graph.create_task(task).await.unwrap();
        }
        graph
    }

    fn fast_params() -> CoordinationParams {
        CoordinationParams::default()
            .with_poll_interval(Duration::from_millis(10))
            .with_barrier_timeout(Duration::from_secs(1))
    }

    struct MemoryBackend {
        created: AtomicUsize,
        removed: AtomicUsize,
    }

    #[async_trait]
    impl WorktreeBackend for MemoryBackend {
        async fn create_worktree(&self, path: &Path, _branch: &str) -> Result<PathBuf, WorktreeError> {
            self.created.fetch_add(1, Ordering::SeqCst);
            Ok(path.to_path_buf())
        }

        async fn remove_worktree(&self, _path: &Path) -> Result<(), WorktreeError> {
            self.removed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    // ===== Sessions =====

    #[tokio::test]
    async fn test_initialize_rejects_unknown_task() {
        let coordinator = ParallelCoordinator::new(graph_with(vec![]).await);
        let err = coordinator
            .initialize_session("g", vec![id("nope")], CoordinationStrategy::Parallel)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CoordinationError::TaskGraph(TaskGraphError::TaskNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_barrier_rejects_foreign_task() {
        let graph = graph_with(vec![ResolutionTask::new("a", "A"), ResolutionTask::new("b", "B")]).await;
        let coordinator = ParallelCoordinator::new(graph);
        let session = coordinator
            .initialize_session("g", vec![id("a")], CoordinationStrategy::Parallel)
            .await
            .unwrap();
        let err = coordinator
            .create_barrier(&session.id, "x", vec![id("b")], TriggerCondition::AnyComplete, None)
            .await
            .unwrap_err();
        assert!(matches!(err, CoordinationError::TaskNotInSession { .. }));
    }

    // ===== Barriers =====

    #[tokio::test(start_paused = true)]
    async fn test_majority_barrier_triggers_at_two_of_three() {
        let graph = graph_with(vec![
            ResolutionTask::new("a", "A"),
            ResolutionTask::new("b", "B"),
            ResolutionTask::new("c", "C"),
        ])
        .await;
        let coordinator = ParallelCoordinator::new(graph.clone()).with_params(fast_params());
        let ids = vec![id("a"), id("b"), id("c")];
        let session = coordinator
            .initialize_session("g", ids.clone(), CoordinationStrategy::Parallel)
            .await
            .unwrap();
        let barrier = coordinator
            .create_barrier(
                &session.id,
                "majority",
                ids,
                TriggerCondition::MajorityComplete { threshold: 0.6 },
                None,
            )
            .await
            .unwrap();

        graph.update_status(&id("a"), TaskStatus::Done, None, false).await.unwrap();
        graph.update_status(&id("b"), TaskStatus::Done, None, false).await.unwrap();

        let result = coordinator
            .wait_barrier(&session.id, &barrier.id, &NoProgress)
            .await
            .unwrap();
        assert!(result.triggered);
        assert_eq!(result.status, BarrierStatus::Triggered);
        assert_eq!(result.completed, 2);
        assert_eq!(
            coordinator.barriers(&session.id).await[0].status,
            BarrierStatus::Triggered
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_majority_barrier_times_out_at_one_of_three() {
        let graph = graph_with(vec![
            ResolutionTask::new("a", "A"),
            ResolutionTask::new("b", "B"),
            ResolutionTask::new("c", "C"),
        ])
        .await;
        let coordinator = ParallelCoordinator::new(graph.clone()).with_params(fast_params());
        let ids = vec![id("a"), id("b"), id("c")];
        let session = coordinator
            .initialize_session("g", ids.clone(), CoordinationStrategy::Parallel)
            .await
            .unwrap();
        let barrier = coordinator
            .create_barrier(
                &session.id,
                "majority",
                ids,
                TriggerCondition::MajorityComplete { threshold: 0.6 },
                Some(Duration::from_millis(200)),
            )
            .await
            .unwrap();

        graph.update_status(&id("a"), TaskStatus::Done, None, false).await.unwrap();

        let result = coordinator
            .wait_barrier(&session.id, &barrier.id, &NoProgress)
            .await
            .unwrap();
        assert!(!result.triggered);
        assert_eq!(result.status, BarrierStatus::TimedOut);
        assert_eq!(result.completed, 1);
        assert!(result.waited_ms >= 200);
    }

    #[tokio::test]
    async fn test_empty_barrier_triggers_immediately() {
        let graph = graph_with(vec![ResolutionTask::new("a", "A")]).await;
        let coordinator = ParallelCoordinator::new(graph);
        let session = coordinator
            .initialize_session("g", vec![id("a")], CoordinationStrategy::Parallel)
            .await
            .unwrap();
        let barrier = coordinator
            .create_barrier(&session.id, "none", vec![], TriggerCondition::AllComplete, None)
            .await
            .unwrap();
        let result = coordinator
            .wait_barrier(&session.id, &barrier.id, &NoProgress)
            .await
            .unwrap();
        assert!(result.triggered);
        assert_eq!(result.completed_ratio, 1.0);
    }

    // ===== Execution =====

    #[tokio::test]
    async fn test_execute_runs_in_dependency_order() {
        let graph = graph_with(vec![
            ResolutionTask::new("a", "A"),
            ResolutionTask::new("b", "B").with_dependency("a"),
            ResolutionTask::new("c", "C").with_dependency("b"),
        ])
        .await;
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let seen = order.clone();
        let executor = Arc::new(FnTaskExecutor::new(move |task| {
            let seen = seen.clone();
            async move {
                seen.lock().unwrap().push(task.id.to_string());
                Ok(None)
            }
            .boxed()
        }));

        let coordinator = ParallelCoordinator::new(graph.clone()).with_params(fast_params());
        let session = coordinator
            .initialize_session("g", vec![id("c"), id("b"), id("a")], CoordinationStrategy::Parallel)
            .await
            .unwrap();
        let report = coordinator
            .execute_session(&session.id, executor, &NoProgress)
            .await
            .unwrap();

        assert_eq!(report.status, SessionStatus::Completed);
        assert!(report.all_succeeded());
        assert_eq!(*order.lock().unwrap(), vec!["a", "b", "c"]);
        assert_eq!(graph.get_task(&id("c")).await.unwrap().status, TaskStatus::Done);
    }

    #[tokio::test]
    async fn test_failure_skips_dependents_but_not_siblings() {
        let graph = graph_with(vec![
            ResolutionTask::new("bad", "Bad"),
            ResolutionTask::new("after", "After").with_dependency("bad"),
            ResolutionTask::new("sibling", "Sibling"),
        ])
        .await;
        let executor = Arc::new(FnTaskExecutor::new(|task| {
            async move {
                if task.id.as_str() == "bad" {
                    Err("merge conflict persists".to_string())
                } else {
                    Ok(Some("ok".to_string()))
                }
            }
            .boxed()
        }));

        let coordinator = ParallelCoordinator::new(graph.clone()).with_params(fast_params());
        let session = coordinator
            .initialize_session(
                "g",
                vec![id("bad"), id("after"), id("sibling")],
                CoordinationStrategy::Parallel,
            )
            .await
            .unwrap();
        let report = coordinator
            .execute_session(&session.id, executor, &NoProgress)
            .await
            .unwrap();

        assert_eq!(report.status, SessionStatus::Failed);
        assert_eq!(report.outcome(&id("bad")).unwrap().status, TaskRunStatus::Failed);
        assert_eq!(report.outcome(&id("after")).unwrap().status, TaskRunStatus::Skipped);
        assert_eq!(report.outcome(&id("sibling")).unwrap().status, TaskRunStatus::Succeeded);

        let bad = graph.get_task(&id("bad")).await.unwrap();
        assert_eq!(bad.status, TaskStatus::Blocked);
        assert_eq!(graph.get_task(&id("after")).await.unwrap().status, TaskStatus::Pending);
    }

    #[tokio::test]
    async fn test_cycle_fails_session_before_dispatch() {
        let graph = graph_with(vec![ResolutionTask::new("a", "A"), ResolutionTask::new("b", "B")]).await;
        graph.add_dependency(&id("a"), &id("b")).await.unwrap();
        graph.add_dependency(&id("b"), &id("a")).await.unwrap();

        let coordinator = ParallelCoordinator::new(graph.clone());
        let session = coordinator
            .initialize_session("g", vec![id("a"), id("b")], CoordinationStrategy::Parallel)
            .await
            .unwrap();
        let err = coordinator
            .execute_session(&session.id, Arc::new(DryRunExecutor), &NoProgress)
            .await
            .unwrap_err();

        assert!(matches!(err, CoordinationError::CircularDependency { .. }));
        assert_eq!(coordinator.session_status(&session.id).await, Some(SessionStatus::Failed));
        assert_eq!(graph.get_task(&id("a")).await.unwrap().status, TaskStatus::Pending);
    }

    #[tokio::test]
    async fn test_external_block_fails_session() {
        let graph = graph_with(vec![
            ResolutionTask::new("outside", "Outside"),
            ResolutionTask::new("a", "A").with_dependency("outside"),
        ])
        .await;
        let coordinator = ParallelCoordinator::new(graph);
        let session = coordinator
            .initialize_session("g", vec![id("a")], CoordinationStrategy::Sequential)
            .await
            .unwrap();
        let err = coordinator
            .execute_session(&session.id, Arc::new(DryRunExecutor), &NoProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, CoordinationError::ExternallyBlocked { ref tasks, .. } if tasks == &vec![id("a")]));
    }

    #[tokio::test]
    async fn test_session_cannot_run_twice() {
        let graph = graph_with(vec![ResolutionTask::new("a", "A")]).await;
        let coordinator = ParallelCoordinator::new(graph);
        let session = coordinator
            .initialize_session("g", vec![id("a")], CoordinationStrategy::Sequential)
            .await
            .unwrap();
        coordinator
            .execute_session(&session.id, Arc::new(DryRunExecutor), &NoProgress)
            .await
            .unwrap();
        let err = coordinator
            .execute_session(&session.id, Arc::new(DryRunExecutor), &NoProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, CoordinationError::InvalidSessionState { .. }));
    }

    #[tokio::test]
    async fn test_execute_with_worktrees_and_cleanup() {
        let graph = graph_with(vec![ResolutionTask::new("a", "A"), ResolutionTask::new("b", "B")]).await;
        let backend = Arc::new(MemoryBackend {
            created: AtomicUsize::new(0),
            removed: AtomicUsize::new(0),
        });
        let allocator = Arc::new(WorktreeAllocator::new(backend.clone(), "/tmp/wt"));
        let coordinator = ParallelCoordinator::new(graph.clone())
            .with_allocator(allocator)
            .with_params(fast_params());

        let session = coordinator
            .initialize_session("group one", vec![id("a"), id("b")], CoordinationStrategy::Parallel)
            .await
            .unwrap();
        coordinator
            .create_barrier(
                &session.id,
                "all",
                vec![id("a"), id("b")],
                TriggerCondition::AllComplete,
                None,
            )
            .await
            .unwrap();
        let report = coordinator
            .execute_session(&session.id, Arc::new(DryRunExecutor), &NoProgress)
            .await
            .unwrap();

        assert!(report.all_succeeded());
        assert_eq!(report.barrier_results.len(), 1);
        assert!(report.barrier_results[0].triggered);
        assert_eq!(backend.created.load(Ordering::SeqCst), 2);
        assert!(graph.get_task(&id("a")).await.unwrap().worktree_path.is_some());

        let cleanup = coordinator.cleanup_session(&session.id).await.unwrap();
        assert_eq!(cleanup.resources.worktrees_removed, 2);
        assert_eq!(cleanup.barriers_removed, 1);
        assert_eq!(backend.removed.load(Ordering::SeqCst), 2);
        assert_eq!(
            coordinator.session_status(&session.id).await,
            Some(SessionStatus::CleanedUp)
        );
    }

    #[tokio::test]
    async fn test_execution_records_resources_until_cleanup() {
        let graph = graph_with(vec![
            ResolutionTask::new("a", "A")
                .with_resource(ResourceRequest::new(ResourceType::Disk, 5.0)),
            ResolutionTask::new("b", "B"),
        ])
        .await;
        let backend = Arc::new(MemoryBackend {
            created: AtomicUsize::new(0),
            removed: AtomicUsize::new(0),
        });
        let allocator = Arc::new(WorktreeAllocator::new(backend, "/tmp/wt"));
        let params = fast_params().with_resources(vec![
            ResourceRequest::new(ResourceType::Cpu, 1.0),
            ResourceRequest::new(ResourceType::Memory, 256.0),
        ]);
        let coordinator = ParallelCoordinator::new(graph)
            .with_allocator(allocator.clone())
            .with_params(params);

        let session = coordinator
            .initialize_session("g", vec![id("a"), id("b")], CoordinationStrategy::Parallel)
            .await
            .unwrap();
        let report = coordinator
            .execute_session(&session.id, Arc::new(DryRunExecutor), &NoProgress)
            .await
            .unwrap();
        assert!(report.all_succeeded());

        let own = allocator.allocations(&id("a")).await;
        assert_eq!(own.len(), 1);
        assert_eq!(own[0].resource_type, ResourceType::Disk);
        let defaults = allocator.allocations(&id("b")).await;
        assert_eq!(defaults.len(), 2);

        let cleanup = coordinator.cleanup_session(&session.id).await.unwrap();
        assert_eq!(cleanup.resources.allocations_released, 3);
        assert!(allocator.allocations(&id("a")).await.is_empty());
        assert!(allocator.allocations(&id("b")).await.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_session_dispatches_nothing() {
        let graph = graph_with(vec![ResolutionTask::new("a", "A")]).await;
        let coordinator = ParallelCoordinator::new(graph);
        let session = coordinator
            .initialize_session("g", vec![id("a")], CoordinationStrategy::Parallel)
            .await
            .unwrap();
        coordinator.cancel_session(&session.id).await.unwrap();
        assert_eq!(
            coordinator.session_status(&session.id).await,
            Some(SessionStatus::Cancelled)
        );
        let err = coordinator
            .execute_session(&session.id, Arc::new(DryRunExecutor), &NoProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, CoordinationError::InvalidSessionState { .. }));
    }
}
