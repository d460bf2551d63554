//! Worktree backends
//!
//! [`GitWorktreeBackend`] creates real `git worktree` checkouts on a new
//! branch. [`DirectoryWorktreeBackend`] only creates and removes plain
//! directories, for runs outside a repository.

mod directory;
mod git;

pub use directory::DirectoryWorktreeBackend;
pub use git::GitWorktreeBackend;
