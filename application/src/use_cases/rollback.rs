//! Rollback use case
//!
//! Undoes tasks in reverse dependency order by running each task's declared
//! rollback procedure through a caller-supplied [`RollbackExecutor`].
//! One failing rollback never stops the others.

use crate::ports::event_logger::{
    NoEventLogger, ROLLBACK_EXECUTED, ResolutionEvent, ResolutionEventLogger,
};
use crate::ports::task_executor::RollbackExecutor;
use crate::use_cases::task_graph::TaskGraphManager;
use resolver_domain::{DependencyGraph, TaskId};
use serde::Serialize;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RollbackFailure {
    pub task_id: TaskId,
    pub error: String,
}

/// What a rollback run did, per task.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RollbackReport {
    /// Order in which rollbacks were attempted.
    pub order: Vec<TaskId>,
    pub rolled_back: Vec<TaskId>,
    /// Tasks without a rollback procedure.
    pub skipped: Vec<TaskId>,
    pub failures: Vec<RollbackFailure>,
}

impl RollbackReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct RollbackUseCase {
    tasks: Arc<TaskGraphManager>,
    logger: Arc<dyn ResolutionEventLogger>,
}

impl RollbackUseCase {
    pub fn new(tasks: Arc<TaskGraphManager>) -> Self {
        Self {
            tasks,
            logger: Arc::new(NoEventLogger),
        }
    }

    pub fn with_event_logger(mut self, logger: Arc<dyn ResolutionEventLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Dependents first: the reverse of a topological order over `task_ids`.
    /// A set containing a cycle is rolled back in the listed order.
    async fn reverse_order(&self, task_ids: &[TaskId]) -> Vec<TaskId> {
        let members: HashSet<&TaskId> = task_ids.iter().collect();
        let mut graph = DependencyGraph::new();
        for id in task_ids {
            graph.add_node(id);
            if let Some(task) = self.tasks.get_task(id).await {
                for dep in task.dependencies.iter().filter(|d| members.contains(d)) {
                    graph.add_edge(id, dep);
                }
            }
        }
        match graph.topological_order() {
            Some(mut order) => {
                order.reverse();
                order
            }
            None => {
                warn!("Rollback set contains a cycle; falling back to listed order");
                task_ids.to_vec()
            }
        }
    }

    pub async fn rollback(
        &self,
        task_ids: &[TaskId],
        executor: &dyn RollbackExecutor,
    ) -> RollbackReport {
        let mut report = RollbackReport {
            order: self.reverse_order(task_ids).await,
            ..Default::default()
        };

        for id in report.order.clone() {
            let Some(task) = self.tasks.get_task(&id).await else {
                report.failures.push(RollbackFailure {
                    task_id: id.clone(),
                    error: format!("Task not found: {id}"),
                });
                continue;
            };
            let Some(procedure) = task.rollback_procedure.clone() else {
                report.skipped.push(id);
                continue;
            };

            match executor.rollback(&task, &procedure).await {
                Ok(()) => match self
                    .tasks
                    .mark_rolled_back(&id, format!("Rolled back: {procedure}"))
                    .await
                {
                    Ok(_) => report.rolled_back.push(id),
                    Err(e) => report.failures.push(RollbackFailure {
                        task_id: id,
                        error: e.to_string(),
                    }),
                },
                Err(error) => {
                    warn!("Rollback of {} failed: {}", id, error);
                    report.failures.push(RollbackFailure { task_id: id, error });
                }
            }
        }

        info!(
            "Rollback finished: {} rolled back, {} skipped, {} failed",
            report.rolled_back.len(),
            report.skipped.len(),
            report.failures.len()
        );
        self.logger.log(ResolutionEvent::new(
            ROLLBACK_EXECUTED,
            json!({
                "order": report.order,
                "rolled_back": report.rolled_back,
                "skipped": report.skipped,
                "failures": report.failures,
            }),
        ));
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use resolver_domain::{ResolutionTask, TaskStatus};
    use std::sync::Mutex;

    struct RecordingRollback {
        calls: Mutex<Vec<String>>,
        fail_on: Option<&'static str>,
    }

    impl RecordingRollback {
        fn new(fail_on: Option<&'static str>) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_on,
            }
        }
    }

    #[async_trait]
    impl RollbackExecutor for RecordingRollback {
        async fn rollback(
            &self,
            task: &resolver_domain::ResolutionTask,
            _procedure: &str,
        ) -> Result<(), String> {
            self.calls.lock().unwrap().push(task.id.to_string());
            if self.fail_on == Some(task.id.as_str()) {
                return Err("revert rejected".into());
            }
            Ok(())
        }
    }

    async fn chain() -> Arc<TaskGraphManager> {
        let graph = Arc::new(TaskGraphManager::new());
        graph
            .create_task(ResolutionTask::new("a", "A").with_rollback("git checkout a"))
            .await
            .unwrap();
        graph
            .create_task(
                ResolutionTask::new("b", "B")
                    .with_dependency("a")
                    .with_rollback("git checkout b"),
            )
            .await
            .unwrap();
        graph
            .create_task(
                ResolutionTask::new("c", "C")
                    .with_dependency("b")
                    .with_rollback("git checkout c"),
            )
            .await
            .unwrap();
        graph
    }

    fn ids() -> Vec<TaskId> {
        vec![TaskId::new("a"), TaskId::new("b"), TaskId::new("c")]
    }

    #[tokio::test]
    async fn test_rollback_runs_in_reverse_dependency_order() {
        let graph = chain().await;
        let executor = RecordingRollback::new(None);
        let report = RollbackUseCase::new(graph.clone())
            .rollback(&ids(), &executor)
            .await;

        assert!(report.is_clean());
        assert_eq!(*executor.calls.lock().unwrap(), vec!["c", "b", "a"]);
        let a = graph.get_task(&TaskId::new("a")).await.unwrap();
        assert_eq!(a.status, TaskStatus::Cancelled);
        assert!(a.notes.iter().any(|n| n.contains("git checkout a")));
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_remaining_rollbacks() {
        let graph = chain().await;
        let executor = RecordingRollback::new(Some("b"));
        let report = RollbackUseCase::new(graph.clone())
            .rollback(&ids(), &executor)
            .await;

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].task_id, TaskId::new("b"));
        assert_eq!(report.rolled_back, vec![TaskId::new("c"), TaskId::new("a")]);
        assert_eq!(
            graph.get_task(&TaskId::new("b")).await.unwrap().status,
            TaskStatus::Pending
        );
    }

    #[tokio::test]
    async fn test_tasks_without_procedure_are_skipped() {
        let graph = Arc::new(TaskGraphManager::new());
        graph
            .create_task(ResolutionTask::new("bare", "No rollback"))
            .await
            .unwrap();
        let executor = RecordingRollback::new(None);
        let report = RollbackUseCase::new(graph)
            .rollback(&[TaskId::new("bare"), TaskId::new("ghost")], &executor)
            .await;

        assert_eq!(report.skipped, vec![TaskId::new("bare")]);
        assert_eq!(report.failures.len(), 1);
        assert!(executor.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cycle_rolls_back_in_listed_order() {
        let graph = chain().await;
        graph
            .add_dependency(&TaskId::new("a"), &TaskId::new("c"))
            .await
            .unwrap();
        let executor = RecordingRollback::new(None);
        let report = RollbackUseCase::new(graph).rollback(&ids(), &executor).await;

        assert_eq!(report.order, ids());
        assert_eq!(*executor.calls.lock().unwrap(), vec!["a", "b", "c"]);
    }
}
