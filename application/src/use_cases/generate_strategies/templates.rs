//! Per-archetype checkpoint and risk templates.
//!
//! Durations are base minutes; [`checkpoints_for`] scales them by
//! `1 + complexity / 10`.

use resolver_domain::{
    Conflict, ExecutionCheckpoint, ExecutionPhase, GenerationContext, RiskCategory, RiskFactor,
    StrategyType, Urgency,
};

/// Scale a base duration by complexity on the 0–10 scale.
pub fn scaled_minutes(base: u32, complexity: f64) -> u32 {
    (base as f64 * (1.0 + complexity.clamp(0.0, 10.0) / 10.0)).round() as u32
}

fn checkpoint(
    archetype: StrategyType,
    index: usize,
    name: &str,
    phase: ExecutionPhase,
    minutes: u32,
) -> ExecutionCheckpoint {
    let prefix = archetype.as_str().to_lowercase();
    ExecutionCheckpoint::new(format!("{prefix}-cp{}", index + 1), name, phase).with_duration(minutes)
}

fn template(archetype: StrategyType) -> Vec<ExecutionCheckpoint> {
    use ExecutionPhase::*;
    let cp = |i, name, phase, minutes| checkpoint(archetype, i, name, phase, minutes);

    match archetype {
        StrategyType::ConservativeMerge => vec![
            cp(0, "Analyze conflicting changes", Analysis, 15)
                .with_output("Map of overlapping hunks")
                .with_criterion("Review confirms every overlapping hunk is mapped")
                .with_failure_procedure("Escalate unclear hunks to both authors")
                .rollback_point(),
            cp(1, "Plan line-level merge", Planning, 10)
                .with_output("Merge plan per hunk")
                .with_criterion("Plan reviewed by both change authors")
                .with_failure_procedure("Return to analysis with the open questions"),
            cp(2, "Apply minimal merge", Implementation, 30)
                .with_output("Merged working tree")
                .with_criterion("Build succeeds and unit tests pass")
                .with_failure_procedure("Reset the worktree to the pre-merge commit")
                .rollback_point(),
            cp(3, "Run regression suite", Validation, 20)
                .with_output("Regression test report")
                .with_criterion("Full test suite passes with no new failures")
                .with_failure_procedure("Revert the merge commit and reopen the conflict"),
            cp(4, "Record merge decisions", Documentation, 10)
                .with_output("Merge notes")
                .with_criterion("Reviewer confirms merge notes are complete")
                .parallel(),
        ],
        StrategyType::FeaturePreservation => vec![
            cp(0, "Inventory affected features", Analysis, 20)
                .with_output("Feature inventory with owners")
                .with_criterion("Each feature owner confirms the inventory")
                .with_failure_procedure("Escalate unknown features to product owners")
                .rollback_point(),
            cp(1, "Design preservation plan", Planning, 20)
                .with_output("Preservation plan per feature")
                .with_criterion("Plan reviewed against every inventoried feature")
                .with_failure_procedure("Revise the plan with the feature owners"),
            cp(2, "Integrate changes behind preserved interfaces", Implementation, 45)
                .with_output("Integrated working tree")
                .with_criterion("Existing feature tests pass after integration")
                .with_failure_procedure("Restore the previous interface implementation")
                .rollback_point(),
            cp(3, "Verify feature preservation", Validation, 30)
                .with_output("Preservation test report")
                .with_criterion("Verify each preserved feature end to end")
                .with_failure_procedure("Revert the integration and reopen the conflict"),
            cp(4, "Check performance baselines", Validation, 15)
                .with_output("Benchmark comparison")
                .with_criterion("Check benchmarks stay within 5% of baseline")
                .with_failure_procedure("Profile the regression before merging")
                .parallel(),
            cp(5, "Document preserved behaviour", Documentation, 10)
                .with_output("Preservation notes")
                .with_criterion("Reviewer confirms notes cover every feature")
                .parallel(),
        ],
        StrategyType::ArchitecturalRefactor => vec![
            cp(0, "Assess architectural boundaries", Analysis, 30)
                .with_output("Boundary and dependency map")
                .with_criterion("Architecture review confirms the violation analysis")
                .with_failure_procedure("Escalate to the architecture owners")
                .rollback_point(),
            cp(1, "Design target structure", Planning, 45)
                .with_output("Target module layout")
                .with_criterion("Design reviewed by the architecture owners")
                .with_failure_procedure("Iterate on the design before implementation"),
            cp(2, "Refactor affected components", Implementation, 90)
                .with_output("Refactored components")
                .with_criterion("Component tests pass after refactoring")
                .with_failure_procedure("Restore the components from the pre-refactor commit")
                .rollback_point(),
            cp(3, "Migrate dependent modules", Implementation, 45)
                .with_output("Migrated dependents")
                .with_criterion("Dependent module tests pass")
                .with_failure_procedure("Keep the compatibility shim until migration succeeds")
                .parallel(),
            cp(4, "Validate layer rules and integration", Validation, 40)
                .with_output("Integration test report")
                .with_criterion("Validate layer rules and run integration tests")
                .with_failure_procedure("Revert the refactor and restore the previous layout"),
            cp(5, "Update architecture records", Documentation, 20)
                .with_output("Updated architecture decision record")
                .with_criterion("Review confirms the decision record is updated")
                .parallel(),
        ],
        StrategyType::FastTrack => vec![
            cp(0, "Triage conflict", Analysis, 5)
                .with_output("Triage note")
                .with_criterion("Confirm the conflict scope is limited")
                .with_failure_procedure("Switch to the conservative merge plan")
                .rollback_point(),
            cp(1, "Apply targeted fix", Implementation, 15)
                .with_output("Patched working tree")
                .with_criterion("Build succeeds and affected tests pass")
                .with_failure_procedure("Reset the worktree to the pre-fix commit")
                .rollback_point(),
            cp(2, "Run smoke tests", Validation, 10)
                .with_output("Smoke test report")
                .with_criterion("Smoke tests pass on the merged branch")
                .with_failure_procedure("Revert the fix commit"),
            cp(3, "Record deferred cleanup", Documentation, 5)
                .with_output("Follow-up ticket")
                .with_criterion("Review confirms the follow-up ticket exists")
                .parallel(),
        ],
        StrategyType::SafeMode => vec![
            cp(0, "Snapshot current state", Analysis, 10)
                .with_output("Tagged snapshot of both branches")
                .with_criterion("Verify the snapshot tags resolve to the expected commits")
                .with_failure_procedure("Abort before any change is made")
                .rollback_point(),
            cp(1, "Plan reversible steps", Planning, 15)
                .with_output("Step list with an undo for each step")
                .with_criterion("Review confirms every step has an undo")
                .with_failure_procedure("Drop steps without an undo from the plan"),
            cp(2, "Apply changes in isolated worktree", Implementation, 25)
                .with_output("Isolated candidate branch")
                .with_criterion("Unit tests pass in the isolated worktree")
                .with_failure_procedure("Discard the isolated worktree")
                .rollback_point(),
            cp(3, "Verify against snapshot", Validation, 25)
                .with_output("Diff and test report against the snapshot")
                .with_criterion("Verify behaviour matches the snapshot plus intended changes")
                .with_failure_procedure("Restore the snapshot tags"),
            cp(4, "Second engineer review", Validation, 15)
                .with_output("Review sign-off")
                .with_criterion("Second engineer review approves the candidate")
                .with_failure_procedure("Return to planning with the review findings"),
            cp(5, "Document recovery path", Documentation, 10)
                .with_output("Recovery runbook")
                .with_criterion("Review confirms the runbook restores the snapshot")
                .parallel(),
        ],
        StrategyType::Hybrid | StrategyType::ManualFallback | StrategyType::Custom => vec![
            cp(0, "Manual conflict review", Analysis, 30)
                .with_output("Reviewer notes")
                .with_criterion("Review identifies a resolution approach")
                .with_failure_procedure("Escalate to the repository maintainers")
                .rollback_point(),
            cp(1, "Apply reviewed resolution", Implementation, 60)
                .with_output("Resolved working tree")
                .with_criterion("Tests pass after the manual resolution")
                .with_failure_procedure("Reset the worktree to the pre-resolution commit")
                .rollback_point(),
            cp(2, "Verify manual resolution", Validation, 30)
                .with_output("Verification report")
                .with_criterion("Verify both changes behave as intended")
                .with_failure_procedure("Revert the resolution commit"),
        ],
    }
}

/// Execution checkpoints for an archetype, durations scaled by complexity.
pub fn checkpoints_for(archetype: StrategyType, complexity: f64) -> Vec<ExecutionCheckpoint> {
    template(archetype)
        .into_iter()
        .map(|cp| {
            let minutes = scaled_minutes(cp.estimated_duration_minutes, complexity);
            cp.with_duration(minutes)
        })
        .collect()
}

fn risk_multiplier(archetype: StrategyType) -> f64 {
    match archetype {
        StrategyType::SafeMode => 0.6,
        StrategyType::ConservativeMerge => 0.8,
        StrategyType::FeaturePreservation => 0.9,
        StrategyType::ArchitecturalRefactor => 1.2,
        StrategyType::FastTrack => 1.25,
        StrategyType::Hybrid | StrategyType::ManualFallback | StrategyType::Custom => 1.0,
    }
}

fn urgency_pressure(urgency: Urgency) -> f64 {
    match urgency {
        Urgency::Low => 0.0,
        Urgency::Medium => 0.1,
        Urgency::High => 0.2,
        Urgency::Critical => 0.3,
    }
}

/// Risk factors for an archetype, one per category.
///
/// Probability grows with complexity, severity and urgency; the archetype
/// and the caller's risk tolerance scale it.
pub fn risk_factors_for(
    archetype: StrategyType,
    conflict: &Conflict,
    context: &GenerationContext,
    complexity: f64,
) -> Vec<RiskFactor> {
    let cf = complexity.clamp(0.0, 10.0) / 10.0;
    let severity = conflict.severity().weight();
    let pressure = urgency_pressure(context.urgency);
    let scale = risk_multiplier(archetype) * context.risk_tolerance.probability_factor();

    let entries = [
        (
            RiskCategory::Technical,
            "Merged code introduces a regression",
            0.2 + 0.5 * cf,
            0.3 + 0.5 * severity,
            "Run the full test suite at every rollback point",
        ),
        (
            RiskCategory::Business,
            "Users lose behaviour delivered by one of the changes",
            0.1 + 0.3 * severity,
            0.4 + 0.3 * severity,
            "Confirm the outcome with both change owners before release",
        ),
        (
            RiskCategory::Resource,
            "Resolution needs more reviewer time than planned",
            0.1 + 0.3 * cf,
            0.3,
            "Book reviewers for the validation checkpoints up front",
        ),
        (
            RiskCategory::Quality,
            "Resolution leaves inconsistent code paths",
            0.15 + 0.4 * cf,
            0.5,
            "Lint and review the merged diff as a whole",
        ),
        (
            RiskCategory::Timeline,
            "Resolution delays dependent work",
            0.1 + pressure + 0.2 * cf,
            0.3 + pressure,
            "Track checkpoint durations and escalate overruns",
        ),
    ];

    entries
        .into_iter()
        .map(|(category, description, probability, impact, mitigation)| {
            RiskFactor::new(category, description, probability * scale, impact, mitigation)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use resolver_domain::MergeConflict;
    use resolver_domain::strategy::is_validation_step;

    const ARCHETYPES: [StrategyType; 6] = [
        StrategyType::ConservativeMerge,
        StrategyType::FeaturePreservation,
        StrategyType::ArchitecturalRefactor,
        StrategyType::FastTrack,
        StrategyType::SafeMode,
        StrategyType::ManualFallback,
    ];

    #[test]
    fn test_every_checkpoint_has_a_validation_criterion() {
        for archetype in ARCHETYPES {
            for cp in checkpoints_for(archetype, 3.0) {
                assert!(
                    cp.success_criteria.iter().any(|c| is_validation_step(c)),
                    "{} / {} lacks a validation criterion",
                    archetype,
                    cp.name
                );
            }
        }
    }

    #[test]
    fn test_duration_scales_with_complexity() {
        assert_eq!(scaled_minutes(10, 0.0), 10);
        assert_eq!(scaled_minutes(10, 5.0), 15);
        assert_eq!(scaled_minutes(10, 10.0), 20);
    }

    #[test]
    fn test_checkpoint_ids_unique_per_archetype() {
        let cps = checkpoints_for(StrategyType::SafeMode, 0.0);
        let mut ids: Vec<_> = cps.iter().map(|c| c.id.clone()).collect();
        ids.dedup();
        assert_eq!(ids.len(), cps.len());
        assert!(ids[0].starts_with("safe_mode-"));
    }

    #[test]
    fn test_risk_factors_cover_all_categories() {
        let conflict = Conflict::MergeConflict(MergeConflict::default());
        let factors = risk_factors_for(
            StrategyType::ConservativeMerge,
            &conflict,
            &GenerationContext::default(),
            5.0,
        );
        assert_eq!(factors.len(), 5);
        assert!(factors.iter().all(|f| f.residual_risk <= 0.5));
    }

    #[test]
    fn test_safe_mode_carries_less_risk_than_fast_track() {
        let conflict = Conflict::MergeConflict(MergeConflict::default());
        let context = GenerationContext::default();
        let safe: f64 = risk_factors_for(StrategyType::SafeMode, &conflict, &context, 5.0)
            .iter()
            .map(|f| f.residual_risk)
            .sum();
        let fast: f64 = risk_factors_for(StrategyType::FastTrack, &conflict, &context, 5.0)
            .iter()
            .map(|f| f.residual_risk)
            .sum();
        assert!(safe < fast);
    }
}
