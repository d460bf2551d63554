//! `git worktree` backend

use crate::process::{self, ProcessError};
use async_trait::async_trait;
use resolver_application::{WorktreeBackend, WorktreeError};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

const GIT_TIMEOUT: Duration = Duration::from_secs(60);

/// Creates each worktree on a fresh branch of the repository at `repo`.
#[derive(Debug, Clone)]
pub struct GitWorktreeBackend {
    repo: PathBuf,
    base_branch: Option<String>,
    timeout: Duration,
}

impl GitWorktreeBackend {
    pub fn new(repo: impl Into<PathBuf>) -> Self {
        Self {
            repo: repo.into(),
            base_branch: None,
            timeout: GIT_TIMEOUT,
        }
    }

    /// Start new branches from `branch` instead of the current HEAD.
    pub fn with_base_branch(mut self, branch: Option<String>) -> Self {
        self.base_branch = branch;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Worktree paths are resolved against the repository, not the cwd.
    fn absolute(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.repo.join(path)
        }
    }

    async fn git(&self, args: &[&str]) -> Result<String, String> {
        let mut cmd = Command::new("git");
        cmd.arg("-C").arg(&self.repo).args(args);
        debug!("git {}", args.join(" "));
        match process::run(cmd, None, self.timeout).await {
            Ok(output) if output.success() => Ok(output.stdout),
            Ok(output) => Err(output.failure_message()),
            Err(ProcessError::Timeout { timeout, .. }) => {
                Err(format!("git timed out after {timeout:?}"))
            }
            Err(e) => Err(e.to_string()),
        }
    }
}

#[async_trait]
impl WorktreeBackend for GitWorktreeBackend {
    async fn create_worktree(&self, path: &Path, branch: &str) -> Result<PathBuf, WorktreeError> {
        let target = self.absolute(path);
        let shown = target.display().to_string();
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| WorktreeError::Io(e.to_string()))?;
        }

        let mut args = vec!["worktree", "add", "-b", branch, shown.as_str()];
        if let Some(base) = &self.base_branch {
            args.push(base.as_str());
        }
        self.git(&args)
            .await
            .map_err(|message| WorktreeError::CreateFailed {
                path: shown.clone(),
                message,
            })?;

        info!("Created worktree {} on branch {}", shown, branch);
        Ok(target)
    }

    async fn remove_worktree(&self, path: &Path) -> Result<(), WorktreeError> {
        let target = self.absolute(path);
        let shown = target.display().to_string();
        self.git(&["worktree", "remove", "--force", shown.as_str()])
            .await
            .map_err(|message| WorktreeError::RemoveFailed {
                path: shown.clone(),
                message,
            })?;
        debug!("Removed worktree {}", shown);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn git_available() -> bool {
        std::process::Command::new("git")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn init_repo(dir: &Path) {
        let run = |args: &[&str]| {
            let status = std::process::Command::new("git")
                .arg("-C")
                .arg(dir)
                .args(["-c", "user.name=resolver", "-c", "user.email=resolver@localhost"])
                .args(args)
                .output()
                .unwrap();
            assert!(status.status.success(), "git {:?} failed", args);
        };
        run(&["init", "--quiet"]);
        run(&["commit", "--allow-empty", "--quiet", "-m", "init"]);
    }

    #[tokio::test]
    async fn test_create_and_remove_worktree() {
        if !git_available() {
            return;
        }
        let repo = tempfile::tempdir().unwrap();
        init_repo(repo.path());
        let backend = GitWorktreeBackend::new(repo.path());

        let path = backend
            .create_worktree(Path::new(".worktrees/merge/task-a"), "resolution/task-a")
            .await
            .unwrap();
        assert_eq!(path, repo.path().join(".worktrees/merge/task-a"));
        assert!(path.join(".git").exists());

        backend.remove_worktree(&path).await.unwrap();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_duplicate_branch_fails() {
        if !git_available() {
            return;
        }
        let repo = tempfile::tempdir().unwrap();
        init_repo(repo.path());
        let backend = GitWorktreeBackend::new(repo.path());

        backend
            .create_worktree(Path::new("wt/one"), "resolution/same")
            .await
            .unwrap();
        let err = backend
            .create_worktree(Path::new("wt/two"), "resolution/same")
            .await
            .unwrap_err();
        assert!(matches!(err, WorktreeError::CreateFailed { .. }));
    }

    #[tokio::test]
    async fn test_outside_repository_fails() {
        if !git_available() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let backend = GitWorktreeBackend::new(dir.path().join("not-a-repo"));
        let err = backend
            .create_worktree(Path::new("wt"), "resolution/x")
            .await
            .unwrap_err();
        assert!(matches!(err, WorktreeError::CreateFailed { .. }));
    }
}
