//! Compliance Engine
//!
//! Compiles rule patterns once at registration and scores arbitrary text or
//! structured content against them. Every validation is appended to a
//! bounded history that backs the statistics and trend reports.

use crate::ports::event_logger::{
    COMPLIANCE_VALIDATED, NoEventLogger, ResolutionEvent, ResolutionEventLogger,
};
use regex::Regex;
use resolver_domain::compliance::compliance_score;
use resolver_domain::core::string::truncate;
use resolver_domain::{
    ComplianceResult, ComplianceScope, ComplianceStatistics, ComplianceTrend, ConstitutionalRule,
    Violation,
};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Maximum length of the match excerpt stored in a violation location.
const EXCERPT_LEN: usize = 60;

#[derive(Error, Debug)]
pub enum ComplianceError {
    #[error("Could not serialize content for validation: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A rule plus its compiled pattern. A rule whose pattern failed to compile
/// stays registered so it can be reported as failed on every validation.
struct RegisteredRule {
    rule: ConstitutionalRule,
    pattern: Result<Regex, String>,
}

/// Summary of a [`ComplianceEngine::register_rules`] call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleRegistration {
    pub registered: usize,
    /// `(rule_id, reason)` for rules that were skipped or failed to compile.
    pub rejected: Vec<(String, String)>,
}

pub struct ComplianceEngine {
    rules: Mutex<Vec<RegisteredRule>>,
    history: Mutex<VecDeque<ComplianceResult>>,
    history_capacity: usize,
    logger: Arc<dyn ResolutionEventLogger>,
}

impl ComplianceEngine {
    pub fn new(history_capacity: usize) -> Self {
        Self {
            rules: Mutex::new(Vec::new()),
            history: Mutex::new(VecDeque::new()),
            history_capacity: history_capacity.max(1),
            logger: Arc::new(NoEventLogger),
        }
    }

    pub fn with_event_logger(mut self, logger: Arc<dyn ResolutionEventLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Register rules. Rules are immutable once registered: a second rule
    /// with an existing id is rejected. A pattern that does not compile is
    /// kept but reported in `rejected` and scored as failed on validation.
    pub fn register_rules<I>(&self, rules: I) -> RuleRegistration
    where
        I: IntoIterator<Item = ConstitutionalRule>,
    {
        let mut registry = self.rules.lock().unwrap_or_else(PoisonError::into_inner);
        let mut known: HashSet<String> = registry.iter().map(|r| r.rule.id.clone()).collect();
        let mut summary = RuleRegistration::default();

        for rule in rules {
            if !known.insert(rule.id.clone()) {
                warn!("Rule {} already registered; ignoring duplicate", rule.id);
                summary
                    .rejected
                    .push((rule.id.clone(), "duplicate rule id".to_string()));
                continue;
            }
            let pattern = Regex::new(&rule.pattern).map_err(|e| e.to_string());
            if let Err(e) = &pattern {
                warn!("Rule {} has an invalid pattern: {}", rule.id, e);
                summary.rejected.push((rule.id.clone(), e.clone()));
            } else {
                summary.registered += 1;
            }
            registry.push(RegisteredRule { rule, pattern });
        }

        debug!(
            "Registered {} rules ({} rejected)",
            summary.registered,
            summary.rejected.len()
        );
        summary
    }

    pub fn rule_count(&self) -> usize {
        self.rules
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn rules(&self) -> Vec<ConstitutionalRule> {
        self.rules
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|r| r.rule.clone())
            .collect()
    }

    /// Validate text content against every rule applicable to `scope`.
    pub fn validate(
        &self,
        content: &str,
        scope: &ComplianceScope,
        mut context: BTreeMap<String, Value>,
    ) -> ComplianceResult {
        let mut violations = Vec::new();
        let mut passed = Vec::new();
        let mut failed = Vec::new();
        let mut pattern_errors = BTreeMap::new();
        let mut scored_rules = 0usize;

        {
            let registry = self.rules.lock().unwrap_or_else(PoisonError::into_inner);
            for entry in registry.iter().filter(|r| r.rule.applies_to(scope)) {
                let regex = match &entry.pattern {
                    Ok(regex) => regex,
                    Err(e) => {
                        failed.push(entry.rule.id.clone());
                        pattern_errors.insert(entry.rule.id.clone(), Value::String(e.clone()));
                        continue;
                    }
                };
                scored_rules += 1;

                let mut matches = regex.find_iter(content);
                let Some(first) = matches.next() else {
                    passed.push(entry.rule.id.clone());
                    continue;
                };
                let count = 1 + matches.count();
                violations.push(Self::violation(&entry.rule, first.start(), first.as_str(), count));
                failed.push(entry.rule.id.clone());
            }
        }

        if !pattern_errors.is_empty() {
            context.insert("pattern_errors".to_string(), Value::Object(pattern_errors.into_iter().collect()));
        }
        if let Some(phase) = &scope.phase {
            context
                .entry("phase".to_string())
                .or_insert_with(|| Value::String(phase.clone()));
        }

        let result = ComplianceResult::from_parts(violations, passed, failed, scored_rules, context);
        info!(
            "Compliance: score {:.2}, level {}, {} violations",
            result.overall_score,
            result.level,
            result.violations.len()
        );
        self.logger.log(ResolutionEvent::new(
            COMPLIANCE_VALIDATED,
            serde_json::json!({
                "score": result.overall_score,
                "level": result.level.as_str(),
                "violations": result.violations.len(),
                "failed_rules": result.failed_rules,
            }),
        ));
        self.record(result.clone());
        result
    }

    /// Validate structured content by serializing it to JSON first.
    pub fn validate_structured(
        &self,
        value: &Value,
        scope: &ComplianceScope,
        context: BTreeMap<String, Value>,
    ) -> Result<ComplianceResult, ComplianceError> {
        let content = serde_json::to_string(value)?;
        Ok(self.validate(&content, scope, context))
    }

    /// Validate any serializable record.
    pub fn validate_record<T: Serialize>(
        &self,
        record: &T,
        scope: &ComplianceScope,
        context: BTreeMap<String, Value>,
    ) -> Result<ComplianceResult, ComplianceError> {
        let content = serde_json::to_string(record)?;
        Ok(self.validate(&content, scope, context))
    }

    /// `max(0, 1 − Σ(weight × confidence) / rule_count)`.
    pub fn score(&self, violations: &[Violation], rule_count: usize) -> f64 {
        compliance_score(violations, rule_count)
    }

    pub fn statistics(&self) -> ComplianceStatistics {
        let history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        ComplianceStatistics::from_history(history.iter())
    }

    pub fn trend(&self, window: usize) -> ComplianceTrend {
        let history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        let scores: Vec<f64> = history.iter().map(|r| r.overall_score).collect();
        ComplianceTrend::from_scores(&scores, window)
    }

    pub fn history_len(&self) -> usize {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn record(&self, result: ComplianceResult) {
        let mut history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        history.push_back(result);
        while history.len() > self.history_capacity {
            history.pop_front();
        }
    }

    fn violation(rule: &ConstitutionalRule, offset: usize, excerpt: &str, matches: usize) -> Violation {
        Violation {
            rule_id: rule.id.clone(),
            severity: rule.severity,
            confidence: Violation::confidence_for_matches(matches),
            location: format!("offset {}: \"{}\"", offset, truncate(excerpt, EXCERPT_LEN)),
            remediation: rule.remediation.clone(),
            suggested_fix: rule.auto_fixable.then(|| rule.remediation.clone()),
            severity_weight: rule.severity_weight,
        }
    }
}

impl Default for ComplianceEngine {
    fn default() -> Self {
        Self::new(1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resolver_domain::{ComplianceLevel, RuleSeverity, TrendDirection};

    fn engine_with(rules: Vec<ConstitutionalRule>) -> ComplianceEngine {
        let engine = ComplianceEngine::new(10);
        engine.register_rules(rules);
        engine
    }

    fn critical_rule() -> ConstitutionalRule {
        ConstitutionalRule::new("SAFE", "safety", RuleSeverity::Critical, r"(?i)force push")
    }

    fn minor_rule() -> ConstitutionalRule {
        ConstitutionalRule::new("DOC", "documentation", RuleSeverity::Minor, r"TODO")
            .with_remediation("Resolve placeholder")
            .auto_fixable()
    }

    // ===== Scoring =====

    #[test]
    fn test_clean_content_is_compliant() {
        let engine = engine_with(vec![critical_rule(), minor_rule()]);
        let result = engine.validate("merge both sides", &ComplianceScope::all(), BTreeMap::new());
        assert_eq!(result.overall_score, 1.0);
        assert_eq!(result.level, ComplianceLevel::Compliant);
        assert_eq!(result.passed_rules.len(), 2);
    }

    #[test]
    fn test_match_count_drives_confidence() {
        let engine = engine_with(vec![critical_rule(), minor_rule()]);
        let result = engine.validate("TODO TODO", &ComplianceScope::all(), BTreeMap::new());
        let violation = &result.violations[0];
        assert!((violation.confidence - 0.4).abs() < 1e-9);
        // penalty 0.4 * 0.4 = 0.16 over 2 rules
        assert!((result.overall_score - 0.92).abs() < 1e-9);
        assert_eq!(result.level, ComplianceLevel::Minor);
        assert_eq!(violation.suggested_fix.as_deref(), Some("Resolve placeholder"));
    }

    #[test]
    fn test_critical_violation_sets_level() {
        let engine = engine_with(vec![critical_rule()]);
        let result = engine.validate("Force push to main", &ComplianceScope::all(), BTreeMap::new());
        assert!(result.has_critical());
        assert!(result.overall_score >= 0.0 && result.overall_score <= 1.0);
        assert!(result.violations[0].location.starts_with("offset 0"));
    }

    #[test]
    fn test_empty_registry_scores_one() {
        let engine = ComplianceEngine::new(10);
        let result = engine.validate("anything", &ComplianceScope::all(), BTreeMap::new());
        assert_eq!(result.overall_score, 1.0);
    }

    // ===== Registration =====

    #[test]
    fn test_bad_pattern_is_isolated() {
        let engine = ComplianceEngine::new(10);
        let bad = ConstitutionalRule::new("BAD", "safety", RuleSeverity::Major, r"(unclosed");
        let registration = engine.register_rules(vec![bad, minor_rule()]);
        assert_eq!(registration.registered, 1);
        assert_eq!(registration.rejected[0].0, "BAD");

        let result = engine.validate("clean", &ComplianceScope::all(), BTreeMap::new());
        assert_eq!(result.overall_score, 1.0);
        assert!(result.failed_rules.contains(&"BAD".to_string()));
        assert!(result.context.contains_key("pattern_errors"));
    }

    #[test]
    fn test_duplicate_rule_rejected() {
        let engine = engine_with(vec![minor_rule()]);
        let registration = engine.register_rules(vec![minor_rule()]);
        assert_eq!(registration.registered, 0);
        assert_eq!(engine.rule_count(), 1);
    }

    #[test]
    fn test_scope_filters_phases() {
        let phased = minor_rule().for_phases(["documentation"]);
        let engine = engine_with(vec![phased]);
        let result = engine.validate("TODO", &ComplianceScope::phase("implementation"), BTreeMap::new());
        assert!(result.violations.is_empty());
        let result = engine.validate("TODO", &ComplianceScope::phase("documentation"), BTreeMap::new());
        assert_eq!(result.violations.len(), 1);
    }

    #[test]
    fn test_validate_structured() {
        let engine = engine_with(vec![minor_rule()]);
        let value = serde_json::json!({"steps": ["TODO: decide"]});
        let result = engine
            .validate_structured(&value, &ComplianceScope::all(), BTreeMap::new())
            .unwrap();
        assert_eq!(result.violations.len(), 1);
    }

    // ===== History =====

    #[test]
    fn test_history_is_bounded() {
        let engine = ComplianceEngine::new(3);
        for _ in 0..5 {
            engine.validate("x", &ComplianceScope::all(), BTreeMap::new());
        }
        assert_eq!(engine.history_len(), 3);
        assert_eq!(engine.statistics().total_validations, 3);
    }

    #[test]
    fn test_trend_improves() {
        let engine = engine_with(vec![critical_rule()]);
        for _ in 0..2 {
            engine.validate("force push", &ComplianceScope::all(), BTreeMap::new());
        }
        for _ in 0..2 {
            engine.validate("clean", &ComplianceScope::all(), BTreeMap::new());
        }
        assert_eq!(engine.trend(2).direction, TrendDirection::Improving);
    }
}
