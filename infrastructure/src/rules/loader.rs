//! Rule file parsing (TOML `[[rules]]` tables or JSON)

use resolver_domain::{ConstitutionalRule, RuleSeverity};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum RuleFileError {
    #[error("Failed to read rule file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML rule file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid JSON rule file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported rule file extension: {0} (expected .toml or .json)")]
    UnsupportedFormat(String),

    #[error("Rule #{index} is invalid: {reason}")]
    InvalidRule { index: usize, reason: String },
}

/// One rule as written in a file. The weight defaults from the severity.
#[derive(Debug, Deserialize)]
struct RuleFileEntry {
    id: String,
    category: String,
    #[serde(default)]
    description: String,
    severity: RuleSeverity,
    pattern: String,
    #[serde(default, alias = "severity_weight")]
    weight: Option<f64>,
    #[serde(default)]
    auto_fixable: bool,
    #[serde(default)]
    remediation: String,
    #[serde(default, alias = "applicable_phases")]
    phases: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RuleFile {
    #[serde(default)]
    rules: Vec<RuleFileEntry>,
}

/// JSON accepts either `{"rules": [...]}` or a bare array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JsonRuleFile {
    Wrapped(RuleFile),
    Bare(Vec<RuleFileEntry>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleFormat {
    Toml,
    Json,
}

impl RuleFormat {
    fn from_path(path: &Path) -> Result<Self, RuleFileError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Ok(RuleFormat::Toml),
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(RuleFormat::Json),
            other => Err(RuleFileError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }
}

/// Read and parse a rule file, choosing the format from its extension.
pub fn load_rules(path: &Path) -> Result<Vec<ConstitutionalRule>, RuleFileError> {
    let format = RuleFormat::from_path(path)?;
    let content = std::fs::read_to_string(path).map_err(|source| RuleFileError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let rules = parse_rules(&content, format)?;
    debug!("Loaded {} rule(s) from {}", rules.len(), path.display());
    Ok(rules)
}

pub fn parse_rules(
    content: &str,
    format: RuleFormat,
) -> Result<Vec<ConstitutionalRule>, RuleFileError> {
    let entries = match format {
        RuleFormat::Toml => toml::from_str::<RuleFile>(content)?.rules,
        RuleFormat::Json => match serde_json::from_str::<JsonRuleFile>(content)? {
            JsonRuleFile::Wrapped(file) => file.rules,
            JsonRuleFile::Bare(entries) => entries,
        },
    };

    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| into_rule(index, entry))
        .collect()
}

fn into_rule(index: usize, entry: RuleFileEntry) -> Result<ConstitutionalRule, RuleFileError> {
    let invalid = |reason: &str| RuleFileError::InvalidRule {
        index,
        reason: reason.to_string(),
    };
    if entry.id.trim().is_empty() {
        return Err(invalid("id is empty"));
    }
    if entry.pattern.is_empty() {
        return Err(invalid("pattern is empty"));
    }

    let mut rule = ConstitutionalRule::new(entry.id, entry.category, entry.severity, entry.pattern)
        .with_description(entry.description)
        .with_remediation(entry.remediation)
        .for_phases(entry.phases);
    if let Some(weight) = entry.weight {
        if !(0.0..=1.0).contains(&weight) {
            return Err(invalid("weight must be within 0.0..=1.0"));
        }
        rule = rule.with_weight(weight);
    }
    if entry.auto_fixable {
        rule = rule.auto_fixable();
    }
    Ok(rule)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TOML_RULES: &str = r#"
[[rules]]
id = "TEAM-001"
category = "safety"
severity = "CRITICAL"
pattern = '(?i)drop\s+table'
remediation = "Write a migration instead"

[[rules]]
id = "TEAM-002"
category = "documentation"
severity = "MINOR"
pattern = '(?i)\bfixme\b'
weight = 0.3
phases = ["implementation"]
auto_fixable = true
"#;

    // ===== Parsing =====

    #[test]
    fn test_parse_toml_rules() {
        let rules = parse_rules(TOML_RULES, RuleFormat::Toml).unwrap();
        assert_eq!(rules.len(), 2);

        assert_eq!(rules[0].id, "TEAM-001");
        assert_eq!(rules[0].severity, RuleSeverity::Critical);
        assert_eq!(rules[0].severity_weight, RuleSeverity::Critical.default_weight());
        assert_eq!(rules[0].remediation, "Write a migration instead");

        assert_eq!(rules[1].severity_weight, 0.3);
        assert!(rules[1].auto_fixable);
        assert_eq!(rules[1].applicable_phases, vec!["implementation"]);
    }

    #[test]
    fn test_parse_json_object_and_array() {
        let wrapped = r#"{"rules": [{"id": "J-1", "category": "safety", "severity": "MAJOR", "pattern": "rm -rf"}]}"#;
        let bare = r#"[{"id": "J-1", "category": "safety", "severity": "MAJOR", "pattern": "rm -rf"}]"#;

        let a = parse_rules(wrapped, RuleFormat::Json).unwrap();
        let b = parse_rules(bare, RuleFormat::Json).unwrap();
        assert_eq!(a, b);
        assert_eq!(a[0].severity_weight, RuleSeverity::Major.default_weight());
    }

    #[test]
    fn test_invalid_entries_are_reported_with_index() {
        let toml = r#"
[[rules]]
id = "OK-1"
category = "safety"
severity = "INFO"
pattern = "x"

[[rules]]
id = "BAD-1"
category = "safety"
severity = "INFO"
pattern = "y"
weight = 1.5
"#;
        let err = parse_rules(toml, RuleFormat::Toml).unwrap_err();
        assert!(matches!(err, RuleFileError::InvalidRule { index: 1, .. }));

        let err = parse_rules(
            r#"[{"id": " ", "category": "c", "severity": "INFO", "pattern": "p"}]"#,
            RuleFormat::Json,
        )
        .unwrap_err();
        assert!(matches!(err, RuleFileError::InvalidRule { index: 0, .. }));
    }

    #[test]
    fn test_unknown_severity_is_a_parse_error() {
        let toml = r#"
[[rules]]
id = "X"
category = "c"
severity = "catastrophic"
pattern = "p"
"#;
        assert!(matches!(
            parse_rules(toml, RuleFormat::Toml),
            Err(RuleFileError::Toml(_))
        ));
    }

    // ===== Files =====

    #[test]
    fn test_load_rules_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(TOML_RULES.as_bytes()).unwrap();

        let rules = load_rules(file.path()).unwrap();
        assert_eq!(rules.len(), 2);
    }

    #[test]
    fn test_load_rules_rejects_unknown_extension() {
        let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        assert!(matches!(
            load_rules(file.path()),
            Err(RuleFileError::UnsupportedFormat(ext)) if ext == "yaml"
        ));
    }

    #[test]
    fn test_load_rules_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_rules(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, RuleFileError::Io { .. }));
    }
}
