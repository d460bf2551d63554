//! Resolve Conflict use case
//!
//! End-to-end flow: generate strategies, gate each through Standard
//! validation, materialize the chosen one into tasks, then execute those
//! tasks in a coordination session with one barrier per phase.

use crate::ports::progress::CoordinationProgressNotifier;
use crate::ports::task_executor::TaskExecutor;
use crate::use_cases::generate_strategies::{DroppedStrategy, GenerateStrategiesUseCase};
use crate::use_cases::parallel_coordinator::{CoordinationError, ParallelCoordinator};
use crate::use_cases::task_graph::TaskGraphError;
use crate::use_cases::validation::ValidationPipeline;
use resolver_domain::{
    Conflict, CoordinationStrategy, DomainError, ExecutionPhase, ExecutionReport,
    GenerationContext, MultiPhaseStrategy, StandardValidationResult, TaskId, TriggerCondition,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum ResolveConflictError {
    #[error(transparent)]
    InvalidConflict(#[from] DomainError),

    #[error("No strategy could be generated for the conflict")]
    NoStrategy,

    #[error(transparent)]
    TaskGraph(#[from] TaskGraphError),

    #[error(transparent)]
    Coordination(#[from] CoordinationError),
}

/// A strategy together with its Standard validation.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredStrategy {
    pub strategy: MultiPhaseStrategy,
    pub validation: StandardValidationResult,
}

/// The chosen strategy and the tasks materialized from it.
#[derive(Debug, Clone, Serialize)]
pub struct ResolutionPlan {
    pub group: String,
    pub conflict_summary: String,
    pub selected: ScoredStrategy,
    /// Remaining candidates, best-ranked first.
    pub alternatives: Vec<ScoredStrategy>,
    pub dropped: Vec<DroppedStrategy>,
    pub used_fallback: bool,
    pub task_ids: Vec<TaskId>,
    /// Set when the strategy asks for approval or failed Standard validation.
    pub requires_approval: bool,
}

pub struct ResolveConflictUseCase {
    generator: Arc<GenerateStrategiesUseCase>,
    pipeline: Arc<ValidationPipeline>,
    coordinator: Arc<ParallelCoordinator>,
    strategy: CoordinationStrategy,
}

impl ResolveConflictUseCase {
    pub fn new(
        generator: Arc<GenerateStrategiesUseCase>,
        pipeline: Arc<ValidationPipeline>,
        coordinator: Arc<ParallelCoordinator>,
    ) -> Self {
        Self {
            generator,
            pipeline,
            coordinator,
            strategy: CoordinationStrategy::Parallel,
        }
    }

    pub fn with_strategy(mut self, strategy: CoordinationStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Generate, validate and materialize. The selected strategy is the
    /// best-ranked one passing Standard validation, or the best-ranked
    /// overall when none passes.
    pub async fn plan(
        &self,
        conflict: &Conflict,
        context: &GenerationContext,
    ) -> Result<ResolutionPlan, ResolveConflictError> {
        conflict.validate()?;
        let generated = self.generator.execute(conflict, context).await;

        let mut scored: Vec<ScoredStrategy> = generated
            .strategies
            .into_iter()
            .map(|strategy| {
                let validation = self.pipeline.standard(&strategy);
                ScoredStrategy {
                    strategy,
                    validation,
                }
            })
            .collect();
        if scored.is_empty() {
            return Err(ResolveConflictError::NoStrategy);
        }

        let chosen = scored.iter().position(|s| s.validation.passed).unwrap_or(0);
        let selected = scored.remove(chosen);
        if !selected.validation.passed {
            warn!(
                "No strategy passed standard validation; using '{}' ({:.2})",
                selected.strategy.name(),
                selected.validation.overall_score
            );
        }

        let group = plan_group(conflict, &selected.strategy);
        let task_ids = self
            .coordinator
            .task_graph()
            .materialize_strategy(&selected.strategy, &group)
            .await?;

        let requires_approval =
            selected.strategy.strategy.requires_approval || !selected.validation.passed;
        info!(
            "Planned '{}' for {}: {} task(s), approval {}",
            selected.strategy.name(),
            conflict.kind().as_str(),
            task_ids.len(),
            if requires_approval { "required" } else { "not required" }
        );

        Ok(ResolutionPlan {
            group,
            conflict_summary: conflict.summary(),
            selected,
            alternatives: scored,
            dropped: generated.dropped,
            used_fallback: generated.used_fallback,
            task_ids,
            requires_approval,
        })
    }

    /// Run the plan's tasks with an all-complete barrier per phase, then
    /// clean up the session whether or not execution succeeded.
    pub async fn execute(
        &self,
        plan: &ResolutionPlan,
        executor: Arc<dyn TaskExecutor>,
        progress: &dyn CoordinationProgressNotifier,
    ) -> Result<ExecutionReport, ResolveConflictError> {
        let session = self
            .coordinator
            .initialize_session(&plan.group, plan.task_ids.clone(), self.strategy)
            .await?;

        let mut phases: BTreeMap<ExecutionPhase, Vec<TaskId>> = BTreeMap::new();
        for id in &plan.task_ids {
            if let Some(task) = self.coordinator.task_graph().get_task(id).await {
                phases.entry(task.phase).or_default().push(id.clone());
            }
        }
        for (phase, ids) in phases {
            self.coordinator
                .create_barrier(
                    &session.id,
                    &format!("{}-complete", phase.tag()),
                    ids,
                    TriggerCondition::AllComplete,
                    None,
                )
                .await?;
        }

        let result = self
            .coordinator
            .execute_session(&session.id, executor, progress)
            .await;
        if let Err(e) = self.coordinator.cleanup_session(&session.id).await {
            warn!("Cleanup of session {} failed: {}", session.id, e);
        }
        Ok(result?)
    }
}

/// Task group name: conflict kind plus a short strategy id.
fn plan_group(conflict: &Conflict, strategy: &MultiPhaseStrategy) -> String {
    let short: String = strategy.id().as_str().chars().take(8).collect();
    format!("{}-{}", conflict.kind().as_str(), short)
}
