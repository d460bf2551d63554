//! Worktree backend port
//!
//! Only the create/remove contract of the version-control system matters to
//! the coordinator. Errors are surfaced to the caller but never abort a
//! session.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WorktreeError {
    #[error("Failed to create worktree at {path}: {message}")]
    CreateFailed { path: String, message: String },

    #[error("Failed to remove worktree at {path}: {message}")]
    RemoveFailed { path: String, message: String },

    #[error("Worktree for {0} is still being provisioned")]
    Busy(String),

    #[error("I/O error: {0}")]
    Io(String),
}

#[async_trait]
pub trait WorktreeBackend: Send + Sync {
    /// Create a worktree at `path` on a new `branch`, returning its path.
    async fn create_worktree(&self, path: &Path, branch: &str) -> Result<PathBuf, WorktreeError>;

    /// Remove a worktree previously created by this backend.
    async fn remove_worktree(&self, path: &Path) -> Result<(), WorktreeError>;
}
