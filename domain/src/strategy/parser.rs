//! Strategy parsing from text-backend responses.
//!
//! The backend returns free text that should contain one JSON object.
//! Three shapes are accepted, in order:
//!
//! 1. a fenced ` ```json ` (or ` ```strategy `) block
//! 2. the whole response as raw JSON
//! 3. the outermost `{ ... }` span inside surrounding prose
//!
//! Anything else is a [`DomainError::MalformedStrategy`], which callers treat
//! as a recoverable, per-candidate failure.

use super::entities::{ResolutionStrategy, StrategyType};
use super::risk::RiskLevel;
use crate::core::error::DomainError;
use crate::core::score::clamp_unit;
use serde_json::Value;

/// Parse a backend response into a strategy of the given archetype.
pub fn parse_strategy_response(
    response: &str,
    strategy_type: StrategyType,
) -> Result<ResolutionStrategy, DomainError> {
    let json = extract_json(response).ok_or_else(|| {
        DomainError::MalformedStrategy("response contains no JSON object".to_string())
    })?;
    parse_strategy_json(&json, strategy_type)
}

fn extract_json(response: &str) -> Option<Value> {
    let mut in_block = false;
    let mut block = String::new();
    for line in response.lines() {
        let trimmed = line.trim();
        if !in_block && (trimmed == "```json" || trimmed == "```strategy") {
            in_block = true;
            block.clear();
        } else if in_block && trimmed == "```" {
            in_block = false;
            if let Ok(value) = serde_json::from_str::<Value>(&block) {
                return Some(value);
            }
        } else if in_block {
            block.push_str(line);
            block.push('\n');
        }
    }

    if let Ok(value) = serde_json::from_str::<Value>(response.trim()) {
        return Some(value);
    }

    let start = response.find('{')?;
    let end = response.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str::<Value>(&response[start..=end]).ok()
}

fn string_list(json: &Value, key: &str) -> Vec<String> {
    match json.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| match v {
                Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
                Value::Object(map) => map
                    .get("description")
                    .or_else(|| map.get("step"))
                    .and_then(|d| d.as_str())
                    .map(str::to_string),
                _ => None,
            })
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}

/// Parse an estimated time in minutes from a number or strings such as
/// `"45"`, `"45 minutes"`, `"2 hours"`, `"1.5h"`.
fn parse_minutes(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_f64().map(|m| m.max(0.0).round() as u32),
        Value::String(s) => {
            let lower = s.to_lowercase();
            let number: String = lower
                .chars()
                .skip_while(|c| !c.is_ascii_digit())
                .take_while(|c| c.is_ascii_digit() || *c == '.')
                .collect();
            let amount: f64 = number.parse().ok()?;
            let minutes = if lower.contains("hour") || lower.trim_end().ends_with('h') {
                amount * 60.0
            } else if lower.contains("day") {
                amount * 8.0 * 60.0
            } else {
                amount
            };
            Some(minutes.max(0.0).round() as u32)
        }
        _ => None,
    }
}

/// Build a strategy from a JSON object following the backend contract.
///
/// `name` and `approach` are required; everything else falls back to
/// neutral defaults.
pub fn parse_strategy_json(
    json: &Value,
    strategy_type: StrategyType,
) -> Result<ResolutionStrategy, DomainError> {
    if !json.is_object() {
        return Err(DomainError::MalformedStrategy(
            "expected a JSON object".to_string(),
        ));
    }

    let name = json
        .get("name")
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| DomainError::MalformedStrategy("missing 'name'".to_string()))?;
    let approach = json
        .get("approach")
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| DomainError::MalformedStrategy("missing 'approach'".to_string()))?;

    let mut strategy = ResolutionStrategy::new(name, strategy_type);
    strategy.approach = approach.to_string();
    strategy.steps = string_list(json, "steps");
    strategy.pros = string_list(json, "pros");
    strategy.cons = string_list(json, "cons");
    strategy.success_criteria = string_list(json, "success_criteria");
    strategy.confidence = json
        .get("confidence")
        .and_then(|v| v.as_f64())
        .map(clamp_unit)
        .unwrap_or(0.5);
    strategy.estimated_time = json
        .get("estimated_time")
        .and_then(parse_minutes)
        .unwrap_or(60);
    strategy.risk_level = match json.get("risk_level").and_then(|v| v.as_str()) {
        Some(level) => level.parse().unwrap_or(RiskLevel::Medium),
        None => RiskLevel::Medium,
    };
    strategy.requires_approval = json
        .get("requires_approval")
        .and_then(|v| v.as_bool())
        .unwrap_or_else(|| strategy.risk_level.requires_approval());
    strategy.rollback_strategy = json
        .get("rollback_strategy")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    strategy.validation_approach = json
        .get("validation_approach")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();

    if strategy.steps.is_empty() {
        return Err(DomainError::MalformedStrategy(
            "strategy has no steps".to_string(),
        ));
    }

    Ok(strategy)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"{
        "name": "Careful merge",
        "approach": "Rebase PR 2 onto PR 1",
        "steps": ["Rebase", "Run tests"],
        "pros": ["Low risk"],
        "cons": ["Slower"],
        "confidence": 0.82,
        "estimated_time": "2 hours",
        "risk_level": "low",
        "requires_approval": false,
        "success_criteria": ["CI green"],
        "rollback_strategy": "git revert",
        "validation_approach": "Full test suite"
    }"#;

    #[test]
    fn test_parse_raw_json() {
        let s = parse_strategy_response(VALID, StrategyType::ConservativeMerge).unwrap();
        assert_eq!(s.name, "Careful merge");
        assert_eq!(s.steps.len(), 2);
        assert_eq!(s.estimated_time, 120);
        assert_eq!(s.risk_level, RiskLevel::Low);
        assert!((s.confidence - 0.82).abs() < 1e-9);
        assert_eq!(s.strategy_type, StrategyType::ConservativeMerge);
    }

    #[test]
    fn test_parse_fenced_block() {
        let response = format!("Here is my plan:\n```json\n{}\n```\nGood luck.", VALID);
        let s = parse_strategy_response(&response, StrategyType::FastTrack).unwrap();
        assert_eq!(s.rollback_strategy, "git revert");
    }

    #[test]
    fn test_parse_embedded_object() {
        let response = format!("Sure! {} Hope this helps.", VALID.replace('\n', " "));
        assert!(parse_strategy_response(&response, StrategyType::SafeMode).is_ok());
    }

    #[test]
    fn test_missing_json_is_malformed() {
        let err = parse_strategy_response("I cannot help with that.", StrategyType::SafeMode)
            .unwrap_err();
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_missing_required_fields() {
        let err = parse_strategy_response(r#"{"approach":"x","steps":["a"]}"#, StrategyType::Custom)
            .unwrap_err();
        assert_eq!(err, DomainError::MalformedStrategy("missing 'name'".into()));

        let err = parse_strategy_response(r#"{"name":"n","approach":"x"}"#, StrategyType::Custom)
            .unwrap_err();
        assert_eq!(
            err,
            DomainError::MalformedStrategy("strategy has no steps".into())
        );
    }

    #[test]
    fn test_defaults_and_clamping() {
        let s = parse_strategy_response(
            r#"{"name":"n","approach":"a","steps":[{"description":"do it"}],"confidence":3.0,"risk_level":"high"}"#,
            StrategyType::Custom,
        )
        .unwrap();
        assert_eq!(s.confidence, 1.0);
        assert_eq!(s.estimated_time, 60);
        assert_eq!(s.steps, vec!["do it".to_string()]);
        assert!(s.requires_approval);
    }

    #[test]
    fn test_parse_minutes_variants() {
        assert_eq!(parse_minutes(&serde_json::json!(30)), Some(30));
        assert_eq!(parse_minutes(&serde_json::json!("45 minutes")), Some(45));
        assert_eq!(parse_minutes(&serde_json::json!("1.5h")), Some(90));
        assert_eq!(parse_minutes(&serde_json::json!("about 1 day")), Some(480));
        assert_eq!(parse_minutes(&serde_json::json!("soon")), None);
    }
}
