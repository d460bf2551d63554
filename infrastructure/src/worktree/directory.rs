//! Plain-directory worktrees

use async_trait::async_trait;
use resolver_application::{WorktreeBackend, WorktreeError};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Backend that isolates tasks in empty directories.
#[derive(Debug, Default, Clone)]
pub struct DirectoryWorktreeBackend;

#[async_trait]
impl WorktreeBackend for DirectoryWorktreeBackend {
    async fn create_worktree(&self, path: &Path, branch: &str) -> Result<PathBuf, WorktreeError> {
        tokio::fs::create_dir_all(path)
            .await
            .map_err(|e| WorktreeError::CreateFailed {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        debug!("Created directory worktree {} ({})", path.display(), branch);
        Ok(path.to_path_buf())
    }

    async fn remove_worktree(&self, path: &Path) -> Result<(), WorktreeError> {
        match tokio::fs::remove_dir_all(path).await {
            Ok(()) => Ok(()),
            // Already gone: removal is idempotent
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(WorktreeError::RemoveFailed {
                path: path.display().to_string(),
                message: e.to_string(),
            }),
        }
    }
}
