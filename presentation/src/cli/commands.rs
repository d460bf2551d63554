//! CLI command definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use resolver_domain::{
    CoordinationStrategy, GenerationContext, RiskTolerance, TeamExperience, Urgency,
    ValidationLevel,
};
use std::path::PathBuf;

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Colored human-readable report
    Text,
    /// Pretty-printed JSON
    Json,
}

impl From<OutputFormat> for resolver_domain::OutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Text => resolver_domain::OutputFormat::Text,
            OutputFormat::Json => resolver_domain::OutputFormat::Json,
        }
    }
}

/// Validation depth
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LevelArg {
    Quick,
    Standard,
    Comprehensive,
}

impl From<LevelArg> for ValidationLevel {
    fn from(level: LevelArg) -> Self {
        match level {
            LevelArg::Quick => ValidationLevel::Quick,
            LevelArg::Standard => ValidationLevel::Standard,
            LevelArg::Comprehensive => ValidationLevel::Comprehensive,
        }
    }
}

/// CLI arguments for conflict-resolver
#[derive(Parser, Debug)]
#[command(name = "conflict-resolver")]
#[command(author, version, about = "Generate, validate and execute resolution strategies for development conflicts")]
#[command(long_about = r#"
conflict-resolver turns a development conflict (merge, dependency,
architecture, semantic or resource conflict) into ranked resolution
strategies, checks them against constitutional rules, and executes the
chosen strategy as a graph of tasks in isolated worktrees.

Conflicts are read from a JSON file tagged with "conflict_type", e.g.:
  {"conflict_type": "merge_conflict", "pr1_id": "481", "pr2_id": "486",
   "file_path": "src/billing.rs", "similarity_score": 0.8}

Configuration files are loaded from (in priority order):
1. RESOLVER_* environment variables
2. --config <path>     Explicit config file
3. ./resolver.toml     Project-level config
4. ~/.config/conflict-resolver/config.toml   Global config

Example:
  conflict-resolver generate conflict.json --urgency high
  conflict-resolver validate conflict.json --level comprehensive
  conflict-resolver execute conflict.json --command "cargo test" --repo .
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Output format (overrides [output] format)
    #[arg(short, long, value_enum, global = true)]
    pub output: Option<OutputFormat>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate ranked resolution strategies
    Generate(GenerateArgs),
    /// Generate strategies and validate each at the given level
    Validate(ValidateArgs),
    /// Plan the best strategy and execute its tasks
    Execute(ExecuteArgs),
}

/// Caller context steering strategy generation
#[derive(Args, Debug, Clone, Default)]
pub struct ContextArgs {
    /// Accepted risk (very_low, low, medium, high)
    #[arg(long, value_name = "LEVEL")]
    pub risk_tolerance: Option<RiskTolerance>,

    /// Time pressure (low, medium, high, critical)
    #[arg(long, value_name = "LEVEL")]
    pub urgency: Option<Urgency>,

    /// Complexity on a 0-10 scale (derived from the conflict if omitted)
    #[arg(long, value_name = "SCORE")]
    pub complexity: Option<f64>,

    /// Feature the resolution must preserve (can be specified multiple times)
    #[arg(long = "feature", value_name = "NAME")]
    pub features: Vec<String>,

    /// Team experience (junior, intermediate, senior)
    #[arg(long, value_name = "LEVEL")]
    pub team: Option<TeamExperience>,

    /// Number of similar conflicts resolved before
    #[arg(long, value_name = "COUNT", default_value_t = 0)]
    pub similar_resolved: u32,
}

impl ContextArgs {
    pub fn to_context(&self) -> GenerationContext {
        let mut context = GenerationContext::default()
            .with_similar_conflicts(self.similar_resolved);
        if let Some(tolerance) = self.risk_tolerance {
            context = context.with_risk_tolerance(tolerance);
        }
        if let Some(urgency) = self.urgency {
            context = context.with_urgency(urgency);
        }
        if let Some(complexity) = self.complexity {
            context = context.with_complexity(complexity);
        }
        if let Some(team) = self.team {
            context = context.with_team_experience(team);
        }
        for feature in &self.features {
            context = context.with_feature(feature.clone());
        }
        context
    }
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Conflict description (JSON)
    pub conflict: PathBuf,

    #[command(flatten)]
    pub context: ContextArgs,
}

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Conflict description (JSON)
    pub conflict: PathBuf,

    /// Validation depth
    #[arg(short, long, value_enum, default_value = "standard")]
    pub level: LevelArg,

    #[command(flatten)]
    pub context: ContextArgs,
}

#[derive(Args, Debug)]
pub struct ExecuteArgs {
    /// Conflict description (JSON)
    pub conflict: PathBuf,

    /// Repository in which task worktrees are created
    #[arg(long, value_name = "PATH")]
    pub repo: Option<PathBuf>,

    /// Shell command run once per task (task details in RESOLVER_* env vars)
    #[arg(long, value_name = "SHELL")]
    pub command: Option<String>,

    /// Shell command run for each task when rolling back a failed execution
    #[arg(long, value_name = "SHELL")]
    pub rollback_command: Option<String>,

    /// Plan and mark tasks done without running anything or creating worktrees
    #[arg(long)]
    pub dry_run: bool,

    /// Run tasks one at a time
    #[arg(long)]
    pub sequential: bool,

    /// Execute even when the plan requires approval
    #[arg(long)]
    pub approve: bool,

    #[command(flatten)]
    pub context: ContextArgs,
}

impl ExecuteArgs {
    pub fn strategy(&self) -> CoordinationStrategy {
        if self.sequential {
            CoordinationStrategy::Sequential
        } else {
            CoordinationStrategy::Parallel
        }
    }
}
