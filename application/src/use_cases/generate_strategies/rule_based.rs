//! Deterministic strategy prose built from conflict data alone.
//!
//! This is the default [`StrategySource`]: it needs no external service, so
//! the whole generator stays testable offline.

use crate::ports::strategy_source::{StrategySource, StrategySourceError};
use async_trait::async_trait;
use resolver_domain::{
    Conflict, GenerationContext, ResolutionStrategy, RiskLevel, StrategyType,
};

pub struct RuleBasedStrategySource;

impl RuleBasedStrategySource {
    /// Short noun phrase naming what is being resolved.
    fn subject(conflict: &Conflict) -> String {
        match conflict {
            Conflict::MergeConflict(c) => format!("{} (PR {} vs PR {})", c.file_path, c.pr1_id, c.pr2_id),
            Conflict::DependencyConflict(c) => {
                format!("dependencies of {}", c.affected_nodes.join(", "))
            }
            Conflict::ArchitectureViolation(c) => format!("the {} pattern", c.pattern_name),
            Conflict::SemanticConflict(c) => format!("PR {} and PR {}", c.pr1_id, c.pr2_id),
            Conflict::ResourceConflict(c) => {
                format!("{} {}", c.resource_type, c.resource_id)
            }
        }
    }

    pub fn build(
        conflict: &Conflict,
        context: &GenerationContext,
        strategy_type: StrategyType,
    ) -> ResolutionStrategy {
        let subject = Self::subject(conflict);
        let mut strategy = ResolutionStrategy::new(strategy_type.display_name(), strategy_type);
        strategy.risk_level = RiskLevel::Low;

        match strategy_type {
            StrategyType::ConservativeMerge => {
                strategy.approach = format!(
                    "Merge both sides of {subject} with the smallest possible change, keeping every non-overlapping hunk as is."
                );
                strategy.steps = vec![
                    format!("Identify overlapping hunks in {subject}"),
                    "Resolve each overlap by keeping both intents where they are compatible".into(),
                    "Build and run the unit tests".into(),
                    "Run the full regression suite".into(),
                    "Record each merge decision for reviewers".into(),
                ];
                strategy.pros = vec![
                    "Minimal diff against both branches".into(),
                    "Easy to review".into(),
                ];
                strategy.cons = vec!["Leaves structural duplication in place".into()];
                strategy.rollback_strategy =
                    "Revert the merge commit and restore both branches from their pre-merge tips".into();
                strategy.validation_approach =
                    "Unit tests after the merge, then the full regression suite".into();
            }
            StrategyType::FeaturePreservation => {
                strategy.approach = format!(
                    "Integrate {subject} while preserving every affected feature behind its current interface."
                );
                strategy.steps = vec![
                    format!("Identify features touched by {subject}"),
                    "Write a preservation plan per feature".into(),
                    "Integrate both changes behind the preserved interfaces".into(),
                    "Verify each preserved feature with its regression tests".into(),
                    "Check performance against the recorded baselines".into(),
                ];
                strategy.pros = vec![
                    "No existing behaviour is lost".into(),
                    "Preservation is verified per feature".into(),
                ];
                strategy.cons = vec!["Takes longer than a plain merge".into()];
                strategy.rollback_strategy =
                    "Restore the previous interface implementations and revert the integration commit".into();
                strategy.validation_approach =
                    "Feature regression tests and performance baseline comparison".into();
            }
            StrategyType::ArchitecturalRefactor => {
                strategy.approach = format!(
                    "Restructure the components around {subject} so the conflict cannot recur."
                );
                strategy.steps = vec![
                    format!("Analyze the boundaries involved in {subject}"),
                    "Design the target module structure".into(),
                    "Refactor the affected components".into(),
                    "Migrate dependent modules".into(),
                    "Validate layer rules and run integration tests".into(),
                ];
                strategy.pros = vec![
                    "Removes the root cause".into(),
                    "Leaves a cleaner dependency graph".into(),
                ];
                strategy.cons = vec![
                    "Largest change set".into(),
                    "Needs architecture owner sign-off".into(),
                ];
                strategy.rollback_strategy =
                    "Restore components from the pre-refactor commit and keep the compatibility shim".into();
                strategy.validation_approach =
                    "Layer-rule checks plus the integration test suite".into();
            }
            StrategyType::FastTrack => {
                strategy.approach =
                    format!("Apply the smallest safe fix for {subject} and defer cleanup.");
                strategy.steps = vec![
                    format!("Triage {subject}"),
                    "Apply a targeted fix".into(),
                    "Run smoke tests".into(),
                    "Open a follow-up ticket for deferred cleanup".into(),
                ];
                strategy.pros = vec!["Fastest path to an unblocked branch".into()];
                strategy.cons = vec![
                    "Defers broader cleanup".into(),
                    "Relies on smoke coverage only".into(),
                ];
                strategy.rollback_strategy = "Revert the fix commit".into();
                strategy.validation_approach = "Smoke tests on the merged branch".into();
            }
            StrategyType::SafeMode => {
                strategy.approach = format!(
                    "Resolve {subject} in an isolated worktree with a reversible step for every change."
                );
                strategy.steps = vec![
                    "Snapshot both branches with tags".into(),
                    "Plan reversible steps with an undo for each".into(),
                    format!("Apply the changes for {subject} in an isolated worktree"),
                    "Verify the result against the snapshot".into(),
                    "Have a second engineer review the candidate".into(),
                ];
                strategy.pros = vec![
                    "Every step can be undone".into(),
                    "Shared branches are untouched until review".into(),
                ];
                strategy.cons = vec!["Slowest option".into()];
                strategy.rollback_strategy =
                    "Restore the snapshot tags and discard the isolated worktree".into();
                strategy.validation_approach =
                    "Snapshot comparison and a second engineer review".into();
            }
            StrategyType::Hybrid | StrategyType::ManualFallback | StrategyType::Custom => {
                strategy.approach = format!("Resolve {subject} manually after reviewer analysis.");
                strategy.steps = vec![
                    format!("Review {subject} with both change owners"),
                    "Apply the agreed resolution".into(),
                    "Verify both changes behave as intended".into(),
                ];
                strategy.pros = vec!["Human judgement on an unusual conflict".into()];
                strategy.cons = vec!["Slow and hard to repeat".into()];
                strategy.rollback_strategy = "Revert the resolution commit".into();
                strategy.validation_approach = "Manual verification by both change owners".into();
            }
        }

        strategy.success_criteria = vec![
            "All tests pass on the resolved branch".into(),
            "Both change owners confirm the outcome".into(),
        ];
        for feature in &context.affected_features {
            strategy
                .success_criteria
                .push(format!("Feature '{feature}' verified as preserved"));
        }
        strategy
    }
}

#[async_trait]
impl StrategySource for RuleBasedStrategySource {
    fn name(&self) -> &str {
        "rule-based"
    }

    async fn draft(
        &self,
        conflict: &Conflict,
        context: &GenerationContext,
        strategy_type: StrategyType,
    ) -> Result<ResolutionStrategy, StrategySourceError> {
        Ok(Self::build(conflict, context, strategy_type))
    }
}
