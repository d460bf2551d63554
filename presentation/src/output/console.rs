//! Console output formatter for resolution results

use colored::Colorize;
use resolver_application::{GeneratedStrategies, ResolutionPlan, RollbackReport};
use resolver_domain::{
    ConfigIssue, ExecutionReport, MultiPhaseStrategy, RiskLevel, SessionStatus, TaskRunStatus,
    ValidationCheck, ValidationOutcome,
};
use serde::Serialize;

/// Formats resolution results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Disable ANSI colors for every subsequent formatting call
    pub fn set_color(enabled: bool) {
        if !enabled {
            colored::control::set_override(false);
        }
    }

    /// Ranked strategies from a generation run
    pub fn format_strategies(generated: &GeneratedStrategies) -> String {
        let mut output = String::new();

        output.push_str(&Self::header("Resolution Strategies"));
        output.push('\n');
        output.push_str(&format!(
            "{} {:.1}/10\n",
            "Complexity:".cyan().bold(),
            generated.complexity
        ));
        if generated.used_fallback {
            output.push_str(&format!(
                "{}\n",
                "No archetype could be built; manual resolution required.".red().bold()
            ));
        }

        for (rank, strategy) in generated.strategies.iter().enumerate() {
            output.push_str(&Self::strategy_block(rank + 1, strategy));
        }

        if !generated.dropped.is_empty() {
            output.push_str(&Self::section_header("Dropped"));
            for dropped in &generated.dropped {
                output.push_str(&format!(
                    "  {} {}: {}\n",
                    "x".red(),
                    dropped.strategy_type.as_str(),
                    dropped.reason
                ));
            }
        }

        output.push_str(&Self::footer());
        output
    }

    /// One strategy with its validation at the requested level
    pub fn format_validation(strategy: &MultiPhaseStrategy, outcome: &ValidationOutcome) -> String {
        let mut output = String::new();

        let verdict = if outcome.passed() {
            "PASS".green().bold()
        } else {
            "FAIL".red().bold()
        };
        output.push_str(&format!(
            "\n{} {} {}\n",
            format!("── {} ({}) ──", strategy.name(), strategy.strategy.strategy_type.as_str())
                .yellow()
                .bold(),
            verdict,
            format!(
                "{} validation, score {}, {}",
                outcome.level(),
                Self::percent(outcome.overall_score()),
                outcome.readiness_label()
            )
            .dimmed()
        ));

        match outcome {
            ValidationOutcome::Quick(result) => {
                output.push_str(&Self::checks(&result.checks));
            }
            ValidationOutcome::Standard(result) => {
                output.push_str(&Self::checks(&result.quick.checks));
                output.push_str(&format!(
                    "  {} constitutional {} ({}), preservation {}\n",
                    "Scores:".cyan(),
                    Self::percent(result.constitutional_score),
                    result.compliance_level.as_str(),
                    Self::percent(result.preservation.score)
                ));
                for gate in &result.quality_gates {
                    output.push_str(&format!(
                        "  {} gate {}: {:.2} / {:.2}\n",
                        Self::mark(gate.passed),
                        gate.name,
                        gate.actual,
                        gate.threshold
                    ));
                }
            }
            ValidationOutcome::Comprehensive(result) => {
                output.push_str(&Self::checks(&result.workflow.checks));
                let metrics = &result.quality_metrics;
                output.push_str(&format!(
                    "  {} maintainability {}, testability {}, security {}, reliability {}\n",
                    "Quality:".cyan(),
                    Self::percent(metrics.maintainability),
                    Self::percent(metrics.testability),
                    Self::percent(metrics.security),
                    Self::percent(metrics.reliability)
                ));
                output.push_str(&format!(
                    "  {} {} (residual risk {:.2})\n",
                    "Performance:".cyan(),
                    Self::percent(result.performance.score),
                    result.risk_assessment.residual_risk
                ));
                for issue in &result.critical_issues {
                    output.push_str(&format!("  {} {}\n", "!".red().bold(), issue.red()));
                }
            }
        }

        for issue in outcome.issues() {
            output.push_str(&format!("  {} {}\n", "-".yellow(), issue));
        }
        output
    }

    /// The strategy chosen for execution and its materialized tasks
    pub fn format_plan(plan: &ResolutionPlan) -> String {
        let mut output = String::new();

        output.push_str(&Self::header("Resolution Plan"));
        output.push('\n');
        output.push_str(&format!(
            "{} {}\n",
            "Conflict:".cyan().bold(),
            plan.conflict_summary
        ));
        output.push_str(&format!("{} {}\n", "Group:".cyan().bold(), plan.group));
        output.push_str(&Self::strategy_block(1, &plan.selected.strategy));
        output.push_str(&format!(
            "  {} standard validation {} ({})\n",
            Self::mark(plan.selected.validation.passed),
            Self::percent(plan.selected.validation.overall_score),
            plan.selected.validation.resolution_readiness.as_str()
        ));
        if plan.requires_approval {
            output.push_str(&format!("  {}\n", "Requires approval before execution".yellow().bold()));
        }

        output.push_str(&Self::section_header("Tasks"));
        for id in &plan.task_ids {
            output.push_str(&format!("  * {}\n", id));
        }
        if !plan.alternatives.is_empty() {
            output.push_str(&format!(
                "\n{} {}\n",
                "Alternatives:".dimmed(),
                plan.alternatives
                    .iter()
                    .map(|a| a.strategy.name().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
                    .dimmed()
            ));
        }
        output
    }

    /// Per-task outcomes and barrier results of a session
    pub fn format_report(report: &ExecutionReport) -> String {
        let mut output = String::new();

        output.push_str(&Self::section_header("Execution"));
        for outcome in &report.outcomes {
            let mark = match outcome.status {
                TaskRunStatus::Succeeded => "v".green(),
                TaskRunStatus::Failed => "x".red(),
                TaskRunStatus::Skipped => "-".yellow(),
            };
            output.push_str(&format!(
                "  {} {} {}",
                mark,
                outcome.task_id,
                format!("({} ms)", outcome.duration_ms).dimmed()
            ));
            if let Some(message) = &outcome.message {
                output.push_str(&format!(": {}", message));
            }
            output.push('\n');
        }

        if !report.barrier_results.is_empty() {
            output.push_str(&Self::section_header("Barriers"));
            for barrier in &report.barrier_results {
                output.push_str(&format!(
                    "  {} {} {}/{} ({})\n",
                    Self::mark(barrier.triggered),
                    barrier.name,
                    barrier.completed,
                    barrier.total,
                    barrier.status.as_str()
                ));
            }
        }

        let status = match report.status {
            SessionStatus::Completed => report.status.as_str().green().bold(),
            SessionStatus::Cancelled => report.status.as_str().yellow().bold(),
            _ => report.status.as_str().red().bold(),
        };
        output.push_str(&format!(
            "\n{} {} ({} succeeded, {} failed, {} skipped in {} ms)\n",
            "Session:".cyan().bold(),
            status,
            report.count(TaskRunStatus::Succeeded),
            report.count(TaskRunStatus::Failed),
            report.count(TaskRunStatus::Skipped),
            report.elapsed_ms
        ));
        output
    }

    pub fn format_rollback(report: &RollbackReport) -> String {
        let mut output = Self::section_header("Rollback");
        for id in &report.rolled_back {
            output.push_str(&format!("  {} {}\n", "v".green(), id));
        }
        for id in &report.skipped {
            output.push_str(&format!("  {} {} (no rollback procedure)\n", "-".yellow(), id));
        }
        for failure in &report.failures {
            output.push_str(&format!("  {} {}: {}\n", "x".red(), failure.task_id, failure.error));
        }
        output
    }

    pub fn format_config_issues(issues: &[ConfigIssue]) -> String {
        issues
            .iter()
            .map(|issue| {
                let label = if issue.is_error() {
                    "error".red().bold()
                } else {
                    "warning".yellow().bold()
                };
                format!("{}: {}", label, issue.message)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Format any result record as pretty JSON
    pub fn format_json<T: Serialize + ?Sized>(value: &T) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
    }

    fn strategy_block(rank: usize, strategy: &MultiPhaseStrategy) -> String {
        let s = &strategy.strategy;
        let mut output = format!(
            "\n{}\n",
            format!("── #{} {} ({}) ──", rank, s.name, s.strategy_type.as_str())
                .yellow()
                .bold()
        );
        output.push_str(&format!(
            "  {} {}  {} {}  {} {} min  {} {}\n",
            "confidence".dimmed(),
            Self::percent(s.confidence),
            "risk".dimmed(),
            Self::risk(s.risk_level),
            "time".dimmed(),
            s.estimated_time,
            "checkpoints".dimmed(),
            strategy.execution_checkpoints.len()
        ));
        if !s.approach.is_empty() {
            output.push_str(&format!("{}\n", Self::indent(&s.approach, "  ")));
        }
        for (i, step) in s.steps.iter().enumerate() {
            output.push_str(&format!("  {}. {}\n", i + 1, step));
        }
        if s.requires_approval {
            output.push_str(&format!("  {}\n", "approval required".yellow()));
        }
        output
    }

    fn checks(checks: &[ValidationCheck]) -> String {
        checks
            .iter()
            .map(|check| {
                format!(
                    "  {} {} {}\n",
                    Self::mark(check.passed),
                    check.name,
                    Self::percent(check.score).dimmed()
                )
            })
            .collect()
    }

    fn risk(level: RiskLevel) -> colored::ColoredString {
        match level {
            RiskLevel::Low => level.as_str().green(),
            RiskLevel::Medium => level.as_str().yellow(),
            RiskLevel::High | RiskLevel::Critical => level.as_str().red(),
        }
    }

    fn mark(passed: bool) -> colored::ColoredString {
        if passed { "v".green() } else { "x".red() }
    }

    fn percent(score: f64) -> String {
        format!("{:.0}%", score * 100.0)
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resolver_domain::{
        BarrierId, BarrierResult, BarrierStatus, ConfigIssueCode, ResolutionStrategy, SessionId,
        StrategyType, TaskId, TaskOutcome,
    };

    fn plain() {
        colored::control::set_override(false);
    }

    #[test]
    fn test_indent() {
        assert_eq!(ConsoleFormatter::indent("a\nb", "  "), "  a\n  b");
    }

    #[test]
    fn test_strategy_block_lists_steps() {
        plain();
        let mut strategy = ResolutionStrategy::new("Careful merge", StrategyType::ConservativeMerge);
        strategy.steps = vec!["Diff both branches".into(), "Merge hunks".into()];
        strategy.confidence = 0.85;
        let block = ConsoleFormatter::strategy_block(1, &MultiPhaseStrategy::new(strategy));

        assert!(block.contains("#1 Careful merge (CONSERVATIVE_MERGE)"));
        assert!(block.contains("confidence 85%"));
        assert!(block.contains("2. Merge hunks"));
    }

    #[test]
    fn test_report_summarizes_outcomes() {
        plain();
        let report = ExecutionReport {
            session_id: SessionId::new("s-1"),
            status: SessionStatus::Failed,
            outcomes: vec![
                TaskOutcome::succeeded(TaskId::new("a"), None, 12),
                TaskOutcome {
                    task_id: TaskId::new("b"),
                    status: TaskRunStatus::Failed,
                    message: Some("tests failed".into()),
                    duration_ms: 40,
                },
            ],
            barrier_results: vec![BarrierResult {
                barrier_id: BarrierId::new("b-1"),
                name: "implementation-complete".into(),
                triggered: false,
                completed: 1,
                total: 2,
                completed_ratio: 0.5,
                waited_ms: 300,
                status: BarrierStatus::TimedOut,
            }],
            elapsed_ms: 352,
        };

        let text = ConsoleFormatter::format_report(&report);
        assert!(text.contains("b (40 ms): tests failed"));
        assert!(text.contains("implementation-complete 1/2 (timed_out)"));
        assert!(text.contains("Session: failed"));
        assert!(text.contains("1 succeeded, 1 failed, 0 skipped"));
    }

    #[test]
    fn test_config_issues() {
        plain();
        let text = ConsoleFormatter::format_config_issues(&[
            ConfigIssue::error(ConfigIssueCode::ZeroPollInterval, "poll interval is zero"),
            ConfigIssue::warning(ConfigIssueCode::EmptyRuleSet, "no rules"),
        ]);
        assert_eq!(text, "error: poll interval is zero\nwarning: no rules");
    }

    #[test]
    fn test_json_output() {
        let json = ConsoleFormatter::format_json(&serde_json::json!({"ok": true}));
        assert!(json.contains("\"ok\": true"));
    }
}
