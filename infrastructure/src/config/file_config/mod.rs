//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use domain types where appropriate.

mod compliance;
mod coordination;
mod generation;
mod logging;
mod output;
mod validation;

pub use compliance::FileComplianceConfig;
pub use coordination::FileCoordinationConfig;
pub use generation::FileGenerationConfig;
pub use logging::FileLoggingConfig;
pub use output::{FileOutputConfig, FileOutputFormat};
pub use validation::FileValidationConfig;

use resolver_application::ResolverConfig;
use resolver_domain::{ConfigIssue, ConfigIssueCode};
use serde::{Deserialize, Serialize};

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Rule registry settings
    pub compliance: FileComplianceConfig,
    /// Strategy generator settings
    pub generation: FileGenerationConfig,
    /// Quality gate thresholds and benchmark targets
    pub validation: FileValidationConfig,
    /// Session execution settings
    pub coordination: FileCoordinationConfig,
    /// Diagnostic and audit log destinations
    pub logging: FileLoggingConfig,
    /// Output settings
    pub output: FileOutputConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        for (field, value) in self.validation.thresholds() {
            if !(0.0..=1.0).contains(&value) {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::ThresholdOutOfRange,
                    format!("{field}: {value} is outside 0.0..=1.0"),
                ));
            }
        }

        if self.coordination.poll_interval_ms == 0 {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::ZeroPollInterval,
                "coordination.poll_interval_ms must be greater than zero",
            ));
        }
        if self.coordination.max_concurrency == 0 {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::ZeroConcurrency,
                "coordination.max_concurrency must be greater than zero",
            ));
        }
        if self.generation.max_strategies == 0 {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::ZeroMaxStrategies,
                "generation.max_strategies is 0; one strategy will still be returned",
            ));
        }

        match &self.compliance.rules_file {
            Some(path) if !path.exists() => issues.push(ConfigIssue::error(
                ConfigIssueCode::MissingRulesFile,
                format!("compliance.rules_file: {} does not exist", path.display()),
            )),
            None if !self.compliance.include_builtin_rules => issues.push(ConfigIssue::warning(
                ConfigIssueCode::EmptyRuleSet,
                "No rules configured: every compliance check will score 1.0",
            )),
            _ => {}
        }

        issues
    }

    /// Application parameters derived from the file values.
    pub fn to_resolver_config(&self) -> ResolverConfig {
        ResolverConfig::default()
            .with_generation(self.generation.to_params())
            .with_validation(self.validation.to_thresholds())
            .with_coordination(self.coordination.to_params())
            .with_compliance(self.compliance.to_params())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resolver_domain::OutputFormat;
    use std::time::Duration;

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
[compliance]
history_capacity = 50
include_builtin_rules = false

[generation]
max_strategies = 3
enable_hybrid = false
backend_command = "strategy-bot --json"

[validation]
overall_threshold = 0.8
strategy_target_secs = 2.5

[coordination]
poll_interval_ms = 100
max_concurrency = 2
base_branch = "main"

[logging]
event_log = "logs/events.jsonl"

[output]
format = "json"
color = false
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.compliance.history_capacity, 50);
        assert!(!config.compliance.include_builtin_rules);
        assert_eq!(config.generation.max_strategies, 3);
        assert_eq!(
            config.generation.backend_command.as_deref(),
            Some("strategy-bot --json")
        );
        assert_eq!(config.coordination.base_branch.as_deref(), Some("main"));
        assert_eq!(config.output.format, Some(OutputFormat::Json));
        assert!(!config.output.color);

        let resolver = config.to_resolver_config();
        assert_eq!(resolver.generation.max_strategies, 3);
        assert!(!resolver.generation.enable_hybrid);
        assert_eq!(resolver.validation.overall, 0.8);
        assert_eq!(resolver.validation.strategy_target, Duration::from_millis(2500));
        assert_eq!(resolver.coordination.poll_interval, Duration::from_millis(100));
        assert_eq!(resolver.coordination.max_concurrency, 2);
        assert_eq!(resolver.compliance.history_capacity, 50);
    }

    #[test]
    fn test_deserialize_partial_config() {
        let toml_str = r#"
[coordination]
max_concurrency = 8
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.coordination.max_concurrency, 8);
        // Defaults should apply
        assert_eq!(config.coordination.poll_interval_ms, 500);
        assert_eq!(config.coordination.barrier_timeout_secs, 300);
        assert_eq!(config.validation.constitutional_threshold, 0.7);
        assert!(config.compliance.include_builtin_rules);
    }

    #[test]
    fn test_default_config_matches_application_defaults() {
        let resolver = FileConfig::default().to_resolver_config();
        assert_eq!(resolver.generation, Default::default());
        assert_eq!(resolver.validation, Default::default());
        assert_eq!(resolver.coordination, Default::default());
        assert_eq!(resolver.compliance, Default::default());
    }

    #[test]
    fn test_validate_valid_config() {
        let config = FileConfig::default();
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_validate_reports_every_issue() {
        let mut config = FileConfig::default();
        config.validation.overall_threshold = 1.5;
        config.validation.preservation_threshold = -0.1;
        config.coordination.poll_interval_ms = 0;
        config.coordination.max_concurrency = 0;
        config.compliance.rules_file = Some("/nonexistent/rules.toml".into());

        let issues = config.validate();
        let codes: Vec<ConfigIssueCode> = issues.iter().map(|i| i.code).collect();
        assert_eq!(
            codes,
            vec![
                ConfigIssueCode::ThresholdOutOfRange,
                ConfigIssueCode::ThresholdOutOfRange,
                ConfigIssueCode::ZeroPollInterval,
                ConfigIssueCode::ZeroConcurrency,
                ConfigIssueCode::MissingRulesFile,
            ]
        );
        assert!(issues.iter().all(ConfigIssue::is_error));
    }

    #[test]
    fn test_validate_warns_on_empty_rule_set() {
        let mut config = FileConfig::default();
        config.compliance.include_builtin_rules = false;
        let issues = config.validate();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, ConfigIssueCode::EmptyRuleSet);
        assert!(!issues[0].is_error());
    }
}
