//! Shell-command task and rollback executors

mod shell;

pub use shell::ShellTaskExecutor;
