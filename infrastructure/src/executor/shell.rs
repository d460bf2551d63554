//! Runs one shell command per task
//!
//! The same command runs for every task; the task is described to it
//! through environment variables:
//!
//! | Variable | Value |
//! |----------|-------|
//! | `RESOLVER_TASK_ID` | task id |
//! | `RESOLVER_TASK_TITLE` | task title |
//! | `RESOLVER_TASK_PHASE` | phase tag (`analysis`, `implementation`, ...) |
//! | `RESOLVER_WORKTREE` | worktree path, when one was allocated |
//! | `RESOLVER_BRANCH` | worktree branch, when one was allocated |
//! | `RESOLVER_ROLLBACK_PROCEDURE` | rollback procedure text (rollback only) |

use crate::process::{self, CommandOutput};
use async_trait::async_trait;
use resolver_application::{RollbackExecutor, TaskExecutor};
use resolver_domain::{ResolutionTask, WorktreeEnvironment};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// Default timeout per task (10 minutes)
const DEFAULT_TIMEOUT_SECS: u64 = 600;

pub struct ShellTaskExecutor {
    command: String,
    rollback_command: Option<String>,
    working_dir: Option<PathBuf>,
    timeout: Duration,
}

impl ShellTaskExecutor {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            rollback_command: None,
            working_dir: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Command run for rollbacks; without one, rollbacks are refused.
    pub fn with_rollback_command(mut self, command: impl Into<String>) -> Self {
        self.rollback_command = Some(command.into());
        self
    }

    /// Directory used when a task has no worktree.
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn run(
        &self,
        command: &str,
        task: &ResolutionTask,
        worktree: Option<&WorktreeEnvironment>,
        procedure: Option<&str>,
    ) -> Result<CommandOutput, String> {
        let mut cmd = process::shell(command);
        cmd.env("RESOLVER_TASK_ID", task.id.as_str())
            .env("RESOLVER_TASK_TITLE", &task.title)
            .env("RESOLVER_TASK_PHASE", task.phase.tag());

        let dir = worktree
            .map(|w| w.path.clone())
            .or_else(|| task.worktree_path.clone())
            .or_else(|| self.working_dir.clone());
        if let Some(dir) = &dir {
            cmd.current_dir(dir);
        }
        if let Some(worktree) = worktree {
            cmd.env("RESOLVER_WORKTREE", &worktree.path)
                .env("RESOLVER_BRANCH", &worktree.branch_name);
        }
        if let Some(procedure) = procedure {
            cmd.env("RESOLVER_ROLLBACK_PROCEDURE", procedure);
        }

        debug!("Running '{}' for task {}", command, task.id);
        let output = process::run(cmd, None, self.timeout)
            .await
            .map_err(|e| e.to_string())?;
        if output.success() {
            Ok(output)
        } else {
            Err(output.failure_message())
        }
    }
}

#[async_trait]
impl TaskExecutor for ShellTaskExecutor {
    async fn execute(
        &self,
        task: &ResolutionTask,
        worktree: Option<&WorktreeEnvironment>,
    ) -> Result<Option<String>, String> {
        let output = self.run(&self.command, task, worktree, None).await?;
        let stdout = output.stdout.trim();
        Ok((!stdout.is_empty()).then(|| stdout.lines().last().unwrap_or(stdout).to_string()))
    }
}

#[async_trait]
impl RollbackExecutor for ShellTaskExecutor {
    async fn rollback(&self, task: &ResolutionTask, procedure: &str) -> Result<(), String> {
        let Some(command) = &self.rollback_command else {
            return Err("no rollback command configured".to_string());
        };
        self.run(command, task, None, Some(procedure)).await.map(|_| ())
    }
}
