//! Infrastructure layer for conflict-resolver
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod backend;
pub mod config;
pub mod executor;
pub mod logging;
pub mod process;
pub mod rules;
pub mod worktree;

// Re-export commonly used types
pub use backend::{CommandBackendError, CommandStrategyBackend};
pub use config::{ConfigLoader, FileConfig, FileOutputConfig, FileOutputFormat};
pub use executor::ShellTaskExecutor;
pub use logging::JsonlEventLogger;
pub use rules::{RuleFileError, load_rules};
pub use worktree::{DirectoryWorktreeBackend, GitWorktreeBackend};
