//! Strategy source port
//!
//! A [`StrategySource`] drafts the prose of one strategy archetype
//! (name, approach, steps, pros/cons). The generator wraps the draft with
//! risk factors, checkpoints and confidence.

use super::strategy_backend::StrategyBackendError;
use async_trait::async_trait;
use resolver_domain::{Conflict, DomainError, GenerationContext, ResolutionStrategy, StrategyType};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StrategySourceError {
    /// The backend answered but the answer is not a usable strategy.
    #[error("Malformed strategy output: {0}")]
    Malformed(#[from] DomainError),

    #[error("Backend error: {0}")]
    Backend(#[from] StrategyBackendError),

    #[error("Archetype {0} is not supported by this source")]
    Unsupported(StrategyType),
}

impl StrategySourceError {
    /// Whether the failure only drops the candidate.
    pub fn is_recoverable(&self) -> bool {
        match self {
            StrategySourceError::Malformed(e) => e.is_recoverable(),
            StrategySourceError::Backend(_) | StrategySourceError::Unsupported(_) => true,
        }
    }
}

#[async_trait]
pub trait StrategySource: Send + Sync {
    fn name(&self) -> &str;

    async fn draft(
        &self,
        conflict: &Conflict,
        context: &GenerationContext,
        strategy_type: StrategyType,
    ) -> Result<ResolutionStrategy, StrategySourceError>;
}
