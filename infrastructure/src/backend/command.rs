//! Shell-command strategy backend
//!
//! Pipes the rendered prompt to an external program (any CLI that reads a
//! prompt on stdin and prints a JSON strategy object) and returns its
//! stdout.

use crate::process::{self, ProcessError};
use async_trait::async_trait;
use resolver_application::{StrategyBackendError, StrategyTextBackend};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum CommandBackendError {
    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error("'{command}' {detail}")]
    NonZeroExit { command: String, detail: String },

    #[error("backend returned an empty response")]
    EmptyResponse,
}

impl From<CommandBackendError> for StrategyBackendError {
    fn from(e: CommandBackendError) -> Self {
        match e {
            CommandBackendError::Process(ProcessError::Spawn { .. }) => {
                StrategyBackendError::Unavailable(e.to_string())
            }
            CommandBackendError::Process(ProcessError::Timeout { .. }) => {
                StrategyBackendError::Timeout
            }
            other => StrategyBackendError::RequestFailed(other.to_string()),
        }
    }
}

/// Default timeout for one strategy draft (60 seconds)
const DEFAULT_TIMEOUT_SECS: u64 = 60;

pub struct CommandStrategyBackend {
    command: String,
    timeout: Duration,
}

impl CommandStrategyBackend {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    async fn run(&self, system_prompt: &str, prompt: &str) -> Result<String, CommandBackendError> {
        let input = format!("{system_prompt}\n\n{prompt}");
        debug!("Sending {} byte prompt to '{}'", input.len(), self.command);

        let output = process::run_shell(&self.command, None, Some(&input), self.timeout).await?;
        if !output.success() {
            return Err(CommandBackendError::NonZeroExit {
                command: self.command.clone(),
                detail: output.failure_message(),
            });
        }
        if output.stdout.trim().is_empty() {
            return Err(CommandBackendError::EmptyResponse);
        }
        Ok(output.stdout)
    }
}

#[async_trait]
impl StrategyTextBackend for CommandStrategyBackend {
    fn name(&self) -> &str {
        "command"
    }

    async fn complete(
        &self,
        system_prompt: &str,
        prompt: &str,
    ) -> Result<String, StrategyBackendError> {
        Ok(self.run(system_prompt, prompt).await?)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_prompt_is_piped_to_command() {
        let backend = CommandStrategyBackend::new("cat");
        let response = backend.complete("SYSTEM", "USER PROMPT").await.unwrap();
        assert!(response.starts_with("SYSTEM"));
        assert!(response.contains("USER PROMPT"));
    }

    #[tokio::test]
    async fn test_failing_command_is_request_failure() {
        let backend = CommandStrategyBackend::new("echo 'quota exceeded' >&2; exit 2");
        let err = backend.complete("s", "p").await.unwrap_err();
        match err {
            StrategyBackendError::RequestFailed(msg) => assert!(msg.contains("quota exceeded")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_response_is_rejected() {
        let backend = CommandStrategyBackend::new("cat > /dev/null");
        assert!(matches!(
            backend.complete("s", "p").await,
            Err(StrategyBackendError::RequestFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_slow_command_times_out() {
        let backend =
            CommandStrategyBackend::new("sleep 5").with_timeout(Duration::from_millis(100));
        assert!(matches!(
            backend.complete("s", "p").await,
            Err(StrategyBackendError::Timeout)
        ));
    }
}
