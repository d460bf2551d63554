//! Execution callbacks supplied by the caller.
//!
//! The coordinator never runs work itself: it dispatches each task to a
//! [`TaskExecutor`] and records the outcome. Rollback works the same way
//! through a [`RollbackExecutor`].

use async_trait::async_trait;
use futures::future::BoxFuture;
use resolver_domain::{ResolutionTask, WorktreeEnvironment};

/// Runs one task, returning an optional message on success or the error
/// text on failure.
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    async fn execute(
        &self,
        task: &ResolutionTask,
        worktree: Option<&WorktreeEnvironment>,
    ) -> Result<Option<String>, String>;
}

/// Runs a task's declared rollback procedure.
#[async_trait]
pub trait RollbackExecutor: Send + Sync {
    async fn rollback(&self, task: &ResolutionTask, procedure: &str) -> Result<(), String>;
}

type TaskFn = dyn Fn(ResolutionTask) -> BoxFuture<'static, Result<Option<String>, String>>
    + Send
    + Sync;

/// Adapter turning a closure into a [`TaskExecutor`].
///
/// ```
/// use futures::FutureExt;
/// use resolver_application::ports::task_executor::FnTaskExecutor;
///
/// let executor = FnTaskExecutor::new(|task| {
///     async move { Ok(Some(format!("ran {}", task.title))) }.boxed()
/// });
/// # let _ = executor;
/// ```
pub struct FnTaskExecutor {
    f: Box<TaskFn>,
}

impl FnTaskExecutor {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(ResolutionTask) -> BoxFuture<'static, Result<Option<String>, String>>
            + Send
            + Sync
            + 'static,
    {
        Self { f: Box::new(f) }
    }
}

#[async_trait]
impl TaskExecutor for FnTaskExecutor {
    async fn execute(
        &self,
        task: &ResolutionTask,
        _worktree: Option<&WorktreeEnvironment>,
    ) -> Result<Option<String>, String> {
        (self.f)(task.clone()).await
    }
}

/// Executor that marks every task successful without doing anything.
pub struct DryRunExecutor;

#[async_trait]
impl TaskExecutor for DryRunExecutor {
    async fn execute(
        &self,
        task: &ResolutionTask,
        _worktree: Option<&WorktreeEnvironment>,
    ) -> Result<Option<String>, String> {
        Ok(Some(format!("dry run: {}", task.title)))
    }
}

#[async_trait]
impl RollbackExecutor for DryRunExecutor {
    async fn rollback(&self, _task: &ResolutionTask, _procedure: &str) -> Result<(), String> {
        Ok(())
    }
}
