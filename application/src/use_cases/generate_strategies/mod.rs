//! Generate Strategies use case
//!
//! Selects strategy archetypes for a conflict, drafts each one concurrently
//! through a [`StrategySource`], enriches the drafts with preservation
//! records, risk factors and checkpoints, then ranks the result.

mod hybrid;
mod rule_based;
mod selection;
mod templates;
mod text_backend;

pub use hybrid::{build_hybrid, manual_fallback};
pub use rule_based::RuleBasedStrategySource;
pub use selection::{base_confidence, compute_confidence, select_archetypes};
pub use templates::{checkpoints_for, risk_factors_for, scaled_minutes};
pub use text_backend::TextBackendStrategySource;

use crate::config::GenerationParams;
use crate::ports::event_logger::{
    NoEventLogger, ResolutionEvent, ResolutionEventLogger, STRATEGIES_GENERATED,
};
use crate::ports::strategy_source::StrategySource;
use resolver_domain::{
    Conflict, EnhancementPreservation, GenerationContext, GenerationTimings, MultiPhaseStrategy,
    ResolutionStrategy, RiskLevel, StrategyType, rank_strategies, ranking_score,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// An archetype that could not be built, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DroppedStrategy {
    pub strategy_type: StrategyType,
    pub reason: String,
}

/// Output of a generation run, ranked best-first.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedStrategies {
    pub strategies: Vec<MultiPhaseStrategy>,
    pub dropped: Vec<DroppedStrategy>,
    pub used_fallback: bool,
    pub complexity: f64,
}

impl GeneratedStrategies {
    pub fn top(&self) -> Option<&MultiPhaseStrategy> {
        self.strategies.first()
    }

    pub fn contains(&self, strategy_type: StrategyType) -> bool {
        self.strategies
            .iter()
            .any(|s| s.strategy_type() == strategy_type)
    }
}

/// Use case for generating ranked resolution strategies.
pub struct GenerateStrategiesUseCase {
    source: Arc<dyn StrategySource>,
    params: GenerationParams,
    logger: Arc<dyn ResolutionEventLogger>,
}

impl GenerateStrategiesUseCase {
    pub fn new(source: Arc<dyn StrategySource>) -> Self {
        Self {
            source,
            params: GenerationParams::default(),
            logger: Arc::new(NoEventLogger),
        }
    }

    /// Generator backed by the offline rule-based source.
    pub fn rule_based() -> Self {
        Self::new(Arc::new(RuleBasedStrategySource))
    }

    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_event_logger(mut self, logger: Arc<dyn ResolutionEventLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn params(&self) -> &GenerationParams {
        &self.params
    }

    pub async fn execute(
        &self,
        conflict: &Conflict,
        context: &GenerationContext,
    ) -> GeneratedStrategies {
        let complexity = context
            .complexity_score
            .unwrap_or_else(|| conflict.complexity_hint())
            .clamp(0.0, 10.0);
        let archetypes = select_archetypes(conflict, context, complexity, &self.params);

        info!(
            "Generating {} strategies via {} (complexity {:.1})",
            archetypes.len(),
            self.source.name(),
            complexity
        );

        let started = Instant::now();
        let mut join_set = JoinSet::new();
        let mut spawned: HashMap<tokio::task::Id, StrategyType> = HashMap::new();
        for (index, archetype) in archetypes.iter().copied().enumerate() {
            let source = Arc::clone(&self.source);
            let conflict = conflict.clone();
            let context = context.clone();
            let handle = join_set.spawn(async move {
                let drafting = Instant::now();
                let draft = source.draft(&conflict, &context, archetype).await;
                (index, archetype, draft, drafting.elapsed())
            });
            spawned.insert(handle.id(), archetype);
        }

        let mut drafts: Vec<(usize, ResolutionStrategy, Duration)> = Vec::new();
        let mut dropped = Vec::new();
        while let Some(result) = join_set.join_next_with_id().await {
            match result {
                Ok((_, (index, archetype, Ok(draft), elapsed))) => {
                    debug!("Drafted {} in {:?}", archetype, elapsed);
                    drafts.push((index, draft, elapsed));
                }
                Ok((_, (_, archetype, Err(e), _))) => {
                    warn!("Dropping {}: {}", archetype, e);
                    dropped.push(DroppedStrategy {
                        strategy_type: archetype,
                        reason: e.to_string(),
                    });
                }
                Err(e) => {
                    warn!("Draft task join error: {}", e);
                    if let Some(archetype) = spawned.get(&e.id()).copied() {
                        dropped.push(DroppedStrategy {
                            strategy_type: archetype,
                            reason: format!("draft task failed: {e}"),
                        });
                    }
                }
            }
        }
        // Restore generation order so ranking ties stay stable.
        drafts.sort_by_key(|(index, _, _)| *index);
        dropped.sort_by_key(|d| archetypes.iter().position(|a| *a == d.strategy_type));

        let mut strategies: Vec<MultiPhaseStrategy> = drafts
            .into_iter()
            .map(|(_, draft, drafting)| {
                let enriching = Instant::now();
                let mut strategy = enrich(draft, conflict, context, complexity);
                strategy.generation_timings = Some(GenerationTimings {
                    specification_ms: millis(drafting),
                    strategy_ms: millis(drafting + enriching.elapsed()),
                });
                strategy
            })
            .collect();

        let used_fallback = strategies.is_empty();
        if used_fallback {
            warn!("All archetypes failed, returning manual fallback");
            let mut fallback = manual_fallback(conflict, context, complexity);
            let total = millis(started.elapsed());
            fallback.generation_timings = Some(GenerationTimings {
                specification_ms: total,
                strategy_ms: total,
            });
            strategies.push(fallback);
        } else if self.params.enable_hybrid {
            let merging = Instant::now();
            if let Some(mut hybrid) = build_hybrid(&strategies) {
                hybrid.generation_timings = hybrid_timings(&strategies, merging.elapsed());
                strategies.push(hybrid);
            }
        }

        rank_strategies(&mut strategies);
        strategies.truncate(self.params.max_strategies.max(1));

        self.logger.log(ResolutionEvent::new(
            STRATEGIES_GENERATED,
            serde_json::json!({
                "conflict_type": conflict.kind().as_str(),
                "complexity": complexity,
                "strategies": strategies.iter().map(|s| serde_json::json!({
                    "id": s.id().as_str(),
                    "strategy_type": s.strategy_type().as_str(),
                    "confidence": s.confidence(),
                    "ranking_score": ranking_score(&s.strategy),
                })).collect::<Vec<_>>(),
                "dropped": dropped.len(),
                "used_fallback": used_fallback,
            }),
        ));

        GeneratedStrategies {
            strategies,
            dropped,
            used_fallback,
            complexity,
        }
    }
}

fn millis(duration: Duration) -> u64 {
    duration.as_millis() as u64
}

/// Inputs were drafted concurrently, so the hybrid costs the slowest input
/// plus the merge.
fn hybrid_timings(inputs: &[MultiPhaseStrategy], merge: Duration) -> Option<GenerationTimings> {
    let timings: Vec<GenerationTimings> =
        inputs.iter().filter_map(|s| s.generation_timings).collect();
    if timings.is_empty() {
        return None;
    }
    Some(GenerationTimings {
        specification_ms: timings.iter().map(|t| t.specification_ms).max().unwrap_or(0),
        strategy_ms: timings.iter().map(|t| t.strategy_ms).max().unwrap_or(0) + millis(merge),
    })
}

/// Wrap a drafted strategy with preservation records, risk factors and
/// checkpoints, then derive confidence, time and approval from them.
fn enrich(
    mut draft: ResolutionStrategy,
    conflict: &Conflict,
    context: &GenerationContext,
    complexity: f64,
) -> MultiPhaseStrategy {
    let archetype = draft.strategy_type;
    let risk_factors = risk_factors_for(archetype, conflict, context, complexity);
    let checkpoints = checkpoints_for(archetype, complexity);

    let aggregate = resolver_domain::aggregate_residual_risk(&risk_factors);
    draft.confidence = compute_confidence(archetype, &risk_factors, conflict, context);
    draft.risk_level = draft.risk_level.max(RiskLevel::from_residual(aggregate));
    draft.requires_approval = draft.requires_approval
        || draft.risk_level.requires_approval()
        || archetype == StrategyType::ArchitecturalRefactor;
    draft.estimated_time = checkpoints.iter().map(|c| c.estimated_duration_minutes).sum();

    let preservation = context
        .affected_features
        .iter()
        .map(|feature| preservation_record(feature, archetype))
        .collect();

    let parallel = checkpoints.iter().any(|c| c.parallel_executable);
    let mut strategy = MultiPhaseStrategy::new(draft);
    strategy.enhancement_preservation = preservation;
    strategy.risk_factors = risk_factors;
    strategy.execution_checkpoints = checkpoints;
    strategy.parallel_executable = parallel;
    strategy
}

fn preservation_record(feature: &str, archetype: StrategyType) -> EnhancementPreservation {
    let method = match archetype {
        StrategyType::FeaturePreservation => "Keep the feature behind its current interface",
        StrategyType::ArchitecturalRefactor => "Move the feature intact into the new structure",
        StrategyType::SafeMode => "Verify the feature against the pre-change snapshot",
        _ => "Keep the feature's code paths unchanged during the merge",
    };
    let mut record = EnhancementPreservation::new(feature, method);
    record.validation_steps = vec![
        format!("Run the regression tests for '{feature}'"),
        format!("Verify '{feature}' behaves as before the resolution"),
    ];
    record.rollback_plan = format!("Restore '{feature}' from the pre-resolution commit");
    record.critical = matches!(
        archetype,
        StrategyType::FeaturePreservation | StrategyType::SafeMode
    );
    record
}
