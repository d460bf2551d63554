//! CLI entrypoint for conflict-resolver
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use resolver_application::{
    CoordinationProgressNotifier, DryRunExecutor, NoEventLogger, NoProgress, ResolutionContext,
    ResolutionContextBuilder, ResolutionEventLogger, RollbackReport, TaskExecutor,
    TextBackendStrategySource,
};
use resolver_domain::{
    ConfigIssue, Conflict, OutputFormat, SessionStatus, TaskRunStatus, ValidationLevel,
};
use resolver_infrastructure::{
    CommandStrategyBackend, ConfigLoader, FileConfig, GitWorktreeBackend, JsonlEventLogger,
    ShellTaskExecutor, load_rules,
};
use resolver_presentation::{
    Cli, Command, ConsoleFormatter, ExecuteArgs, GenerateArgs, ProgressReporter, SimpleProgress,
    ValidateArgs,
};
use std::io::IsTerminal;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_ref());
        return Ok(());
    }

    let file_config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow!("Failed to load configuration: {}", e))?
    };

    let _log_guard = init_logging(cli.verbose, file_config.logging.log_dir.as_deref());
    info!("Starting conflict-resolver");

    let issues = file_config.validate();
    if !issues.is_empty() {
        eprintln!("{}", ConsoleFormatter::format_config_issues(&issues));
    }
    if issues.iter().any(ConfigIssue::is_error) {
        bail!("Invalid configuration");
    }

    ConsoleFormatter::set_color(file_config.output.color);
    let format: OutputFormat = file_config
        .output
        .resolve_format(cli.output.map(Into::into));

    let Some(command) = cli.command else {
        bail!("No command given. Run with --help for usage.");
    };

    // === Dependency Injection ===
    let builder = context_builder(&file_config)?;

    match command {
        Command::Generate(args) => generate(builder.build(), &args, format).await,
        Command::Validate(args) => validate(builder.build(), &args, format).await,
        Command::Execute(args) => {
            let quiet = cli.quiet || format == OutputFormat::Json;
            execute(builder, &file_config, &args, format, quiet).await
        }
    }
}

/// Console logging from the `-v` count, plus an optional daily log file.
fn init_logging(verbose: u8, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "conflict-resolver.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(level))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(file_layer)
        .init();

    guard
}

/// Everything except the worktree backend, which only `execute` needs.
fn context_builder(file_config: &FileConfig) -> Result<ResolutionContextBuilder> {
    let run_id = chrono::Utc::now().format("%Y%m%dT%H%M%S%.3fZ").to_string();
    let logger: Arc<dyn ResolutionEventLogger> = match &file_config.logging.event_log {
        Some(path) => match JsonlEventLogger::new(path) {
            Some(logger) => Arc::new(logger.with_run_id(run_id)),
            None => Arc::new(NoEventLogger),
        },
        None => Arc::new(NoEventLogger),
    };

    let rules = match &file_config.compliance.rules_file {
        Some(path) => load_rules(path)
            .with_context(|| format!("Failed to load rules from {}", path.display()))?,
        None => Vec::new(),
    };

    let mut builder = ResolutionContext::builder(file_config.to_resolver_config())
        .with_event_logger(logger)
        .with_rules(rules);

    if let Some(command) = &file_config.generation.backend_command {
        info!("Drafting strategies through '{}'", command);
        let backend = Arc::new(
            CommandStrategyBackend::new(command.clone()).with_timeout(Duration::from_secs(
                file_config.generation.backend_timeout_secs,
            )),
        );
        builder = builder.with_strategy_source(Arc::new(TextBackendStrategySource::new(backend)));
    }

    Ok(builder)
}

fn load_conflict(path: &Path) -> Result<Conflict> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read conflict file {}", path.display()))?;
    let conflict: Conflict = serde_json::from_str(&content)
        .with_context(|| format!("Invalid conflict description in {}", path.display()))?;
    conflict.validate()?;
    Ok(conflict)
}

async fn generate(ctx: ResolutionContext, args: &GenerateArgs, format: OutputFormat) -> Result<()> {
    let conflict = load_conflict(&args.conflict)?;
    let generated = ctx
        .generator
        .execute(&conflict, &args.context.to_context())
        .await;

    let output = match format {
        OutputFormat::Text => ConsoleFormatter::format_strategies(&generated),
        OutputFormat::Json => ConsoleFormatter::format_json(&generated),
    };
    println!("{}", output);
    Ok(())
}

async fn validate(ctx: ResolutionContext, args: &ValidateArgs, format: OutputFormat) -> Result<()> {
    let conflict = load_conflict(&args.conflict)?;
    let generated = ctx
        .generator
        .execute(&conflict, &args.context.to_context())
        .await;
    let level: ValidationLevel = args.level.into();

    let results: Vec<_> = generated
        .strategies
        .iter()
        .map(|strategy| (strategy, ctx.pipeline.validate(level, strategy)))
        .collect();

    match format {
        OutputFormat::Text => {
            for (strategy, outcome) in &results {
                print!("{}", ConsoleFormatter::format_validation(strategy, outcome));
            }
            println!();
        }
        OutputFormat::Json => {
            let records: Vec<_> = results
                .iter()
                .map(|(strategy, outcome)| {
                    serde_json::json!({
                        "strategy_id": strategy.id(),
                        "name": strategy.name(),
                        "strategy_type": strategy.strategy.strategy_type,
                        "validation": outcome,
                    })
                })
                .collect();
            println!("{}", ConsoleFormatter::format_json(&records));
        }
    }
    Ok(())
}

async fn execute(
    mut builder: ResolutionContextBuilder,
    file_config: &FileConfig,
    args: &ExecuteArgs,
    format: OutputFormat,
    quiet: bool,
) -> Result<()> {
    let conflict = load_conflict(&args.conflict)?;

    let shell = match (&args.command, args.dry_run) {
        (_, true) => None,
        (Some(command), false) => {
            let mut executor = ShellTaskExecutor::new(command.clone());
            if let Some(repo) = &args.repo {
                executor = executor.with_working_dir(repo.clone());
            }
            if let Some(rollback) = &args.rollback_command {
                executor = executor.with_rollback_command(rollback.clone());
            }
            Some(Arc::new(executor))
        }
        (None, false) => bail!("execute needs --command <shell> or --dry-run"),
    };

    if let (Some(repo), false) = (&args.repo, args.dry_run) {
        builder = builder.with_worktree_backend(Arc::new(
            GitWorktreeBackend::new(repo.clone())
                .with_base_branch(file_config.coordination.base_branch.clone()),
        ));
    }
    let ctx = builder.build();

    let resolver = ctx.resolver(args.strategy());
    let plan = resolver
        .plan(&conflict, &args.context.to_context())
        .await?;

    if plan.requires_approval && !args.approve && !args.dry_run {
        if format == OutputFormat::Text {
            println!("{}", ConsoleFormatter::format_plan(&plan));
        }
        bail!("Plan requires approval; re-run with --approve to execute it");
    }

    let progress: Box<dyn CoordinationProgressNotifier> = if quiet {
        Box::new(NoProgress)
    } else if std::io::stderr().is_terminal() {
        Box::new(ProgressReporter::new())
    } else {
        Box::new(SimpleProgress)
    };

    let executor: Arc<dyn TaskExecutor> = match &shell {
        Some(shell) => shell.clone() as Arc<dyn TaskExecutor>,
        None => Arc::new(DryRunExecutor),
    };
    let report = resolver.execute(&plan, executor, progress.as_ref()).await?;

    let mut rollback: Option<RollbackReport> = None;
    if report.status == SessionStatus::Failed
        && args.rollback_command.is_some()
        && let Some(shell) = &shell
    {
        let succeeded: Vec<_> = report
            .outcomes
            .iter()
            .filter(|o| o.status == TaskRunStatus::Succeeded)
            .map(|o| o.task_id.clone())
            .collect();
        warn!("Session failed; rolling back {} task(s)", succeeded.len());
        rollback = Some(ctx.rollback().rollback(&succeeded, shell.as_ref()).await);
    }

    match format {
        OutputFormat::Text => {
            println!("{}", ConsoleFormatter::format_plan(&plan));
            println!("{}", ConsoleFormatter::format_report(&report));
            if let Some(rollback) = &rollback {
                println!("{}", ConsoleFormatter::format_rollback(rollback));
            }
        }
        OutputFormat::Json => {
            let record = serde_json::json!({
                "plan": plan,
                "report": report,
                "rollback": rollback,
            });
            println!("{}", ConsoleFormatter::format_json(&record));
        }
    }

    if report.status != SessionStatus::Completed {
        bail!("Session finished {}", report.status.as_str());
    }
    Ok(())
}
