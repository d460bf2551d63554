//! Async child-process execution shared by the command-driven adapters
//!
//! Every external program (git, a strategy generator, a task command) is
//! run through [`run`]: piped stdio, optional stdin, a hard timeout and
//! truncated output.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

/// Maximum captured size per stream (1 MB)
pub const MAX_OUTPUT_SIZE: usize = 1024 * 1024;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' timed out after {timeout:?}")]
    Timeout { program: String, timeout: Duration },

    #[error("I/O error while waiting for '{program}': {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Captured result of a finished process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Stdout followed by stderr, separated the same way the terminal shows them.
    pub fn combined(&self) -> String {
        let mut combined = self.stdout.trim_end().to_string();
        let stderr = self.stderr.trim_end();
        if !stderr.is_empty() {
            if !combined.is_empty() {
                combined.push_str("\n--- stderr ---\n");
            }
            combined.push_str(stderr);
        }
        combined
    }

    /// One-line failure description for task notes and error messages.
    pub fn failure_message(&self) -> String {
        let code = self
            .exit_code
            .map_or_else(|| "signal".to_string(), |c| c.to_string());
        let detail = self.combined();
        let last_line = detail.lines().last().unwrap_or("").trim();
        if last_line.is_empty() {
            format!("exited with code {code}")
        } else {
            format!("exited with code {code}: {last_line}")
        }
    }
}

/// `sh -c <command>` (or `cmd /C` on Windows)
pub fn shell(command: &str) -> Command {
    if cfg!(target_os = "windows") {
        let mut c = Command::new("cmd");
        c.args(["/C", command]);
        c
    } else {
        let mut c = Command::new("sh");
        c.args(["-c", command]);
        c
    }
}

/// Run `cmd` to completion, feeding `stdin` if given.
///
/// The child is killed when the timeout elapses.
pub async fn run(
    mut cmd: Command,
    stdin: Option<&str>,
    timeout: Duration,
) -> Result<CommandOutput, ProcessError> {
    let program = cmd.as_std().get_program().to_string_lossy().into_owned();
    cmd.stdin(if stdin.is_some() {
        Stdio::piped()
    } else {
        Stdio::null()
    })
    .stdout(Stdio::piped())
    .stderr(Stdio::piped())
    .kill_on_drop(true);

    let mut child = cmd.spawn().map_err(|source| ProcessError::Spawn {
        program: program.clone(),
        source,
    })?;

    // Written from a separate task so a child filling its stdout pipe
    // cannot deadlock against our stdin write.
    if let Some(input) = stdin
        && let Some(mut pipe) = child.stdin.take()
    {
        let input = input.to_string();
        tokio::spawn(async move {
            if let Err(e) = pipe.write_all(input.as_bytes()).await {
                debug!("stdin write ended early: {}", e);
            }
        });
    }

    match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => Ok(CommandOutput {
            exit_code: output.status.code(),
            stdout: truncated(&output.stdout),
            stderr: truncated(&output.stderr),
        }),
        Ok(Err(source)) => Err(ProcessError::Io { program, source }),
        Err(_) => {
            warn!("'{}' timed out after {:?}", program, timeout);
            Err(ProcessError::Timeout { program, timeout })
        }
    }
}

/// Run a shell command in `cwd`.
pub async fn run_shell(
    command: &str,
    cwd: Option<&Path>,
    stdin: Option<&str>,
    timeout: Duration,
) -> Result<CommandOutput, ProcessError> {
    let mut cmd = shell(command);
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }
    run(cmd, stdin, timeout).await
}

fn truncated(bytes: &[u8]) -> String {
    let mut text = String::from_utf8_lossy(bytes).into_owned();
    if text.len() > MAX_OUTPUT_SIZE {
        let mut cut = MAX_OUTPUT_SIZE;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text.truncate(cut);
        text.push_str("\n... (output truncated)");
    }
    text
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(10);

    #[tokio::test]
    async fn test_run_shell_echo() {
        let output = run_shell("echo hello", None, None, TIMEOUT).await.unwrap();
        assert!(output.success());
        assert_eq!(output.stdout.trim(), "hello");
    }

    #[tokio::test]
    async fn test_run_shell_with_working_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let output = run_shell("pwd", Some(temp_dir.path()), None, TIMEOUT)
            .await
            .unwrap();
        let name = temp_dir.path().file_name().unwrap().to_str().unwrap();
        assert!(output.stdout.contains(name));
    }

    #[tokio::test]
    async fn test_run_shell_feeds_stdin() {
        let output = run_shell("tr a-z A-Z", None, Some("resolve"), TIMEOUT)
            .await
            .unwrap();
        assert_eq!(output.stdout.trim(), "RESOLVE");
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_reported() {
        let output = run_shell("echo broken >&2; exit 3", None, None, TIMEOUT)
            .await
            .unwrap();
        assert!(!output.success());
        assert_eq!(output.exit_code, Some(3));
        assert_eq!(output.failure_message(), "exited with code 3: broken");
    }

    #[tokio::test]
    async fn test_timeout_kills_process() {
        let err = run_shell("sleep 5", None, None, Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessError::Timeout { .. }));
    }

    #[test]
    fn test_combined_output() {
        let output = CommandOutput {
            exit_code: Some(0),
            stdout: "out\n".into(),
            stderr: "err\n".into(),
        };
        assert_eq!(output.combined(), "out\n--- stderr ---\nerr");
    }
}
