//! Strategy source backed by an external text generator.

use crate::ports::strategy_backend::StrategyTextBackend;
use crate::ports::strategy_source::{StrategySource, StrategySourceError};
use async_trait::async_trait;
use resolver_domain::strategy::parse_strategy_response;
use resolver_domain::{
    Conflict, GenerationContext, ResolutionStrategy, StrategyPromptTemplate, StrategyType,
};
use std::sync::Arc;
use tracing::debug;

/// Renders a prompt per archetype and parses the backend's JSON answer.
pub struct TextBackendStrategySource<B: StrategyTextBackend + ?Sized> {
    backend: Arc<B>,
}

impl<B: StrategyTextBackend + ?Sized> TextBackendStrategySource<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl<B: StrategyTextBackend + ?Sized + 'static> StrategySource for TextBackendStrategySource<B> {
    fn name(&self) -> &str {
        self.backend.name()
    }

    async fn draft(
        &self,
        conflict: &Conflict,
        context: &GenerationContext,
        strategy_type: StrategyType,
    ) -> Result<ResolutionStrategy, StrategySourceError> {
        let prompt = StrategyPromptTemplate::strategy_prompt(conflict, context, strategy_type);
        let response = self
            .backend
            .complete(StrategyPromptTemplate::system(), &prompt)
            .await?;
        debug!(
            "Backend {} returned {} bytes for {}",
            self.backend.name(),
            response.len(),
            strategy_type
        );
        Ok(parse_strategy_response(&response, strategy_type)?)
    }
}
