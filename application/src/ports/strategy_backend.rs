//! Strategy text backend port
//!
//! Defines the black-box contract for an external generator that drafts
//! strategy prose: a rendered prompt goes in, text containing a JSON
//! strategy object comes out.

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur while talking to a text backend
#[derive(Error, Debug)]
pub enum StrategyBackendError {
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Timeout")]
    Timeout,
}

/// Backend that turns a prompt into strategy text
#[async_trait]
pub trait StrategyTextBackend: Send + Sync {
    /// Human-readable backend name for logs
    fn name(&self) -> &str;

    /// Send the prompt and return the raw response text
    async fn complete(&self, system_prompt: &str, prompt: &str)
    -> Result<String, StrategyBackendError>;
}
