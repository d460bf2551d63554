//! Default rule set registered when `include_builtin_rules` is enabled.
//!
//! Patterns describe *violations*: a match means the content does something
//! the rule forbids.

use resolver_domain::{ConstitutionalRule, RuleSeverity};

pub fn builtin_rules() -> Vec<ConstitutionalRule> {
    vec![
        ConstitutionalRule::new(
            "SAFE-001",
            "safety",
            RuleSeverity::Critical,
            r"(?i)\b(force[- ]push|push\s+(-f|--force)\b|reset\s+--hard\s+origin)",
        )
        .with_description("History on shared branches must never be rewritten")
        .with_remediation("Create a new commit or a revert instead of rewriting history"),
        ConstitutionalRule::new(
            "SAFE-002",
            "safety",
            RuleSeverity::Critical,
            r"(?i)\b(drop\s+(table|database)|rm\s+-rf\s+/)",
        )
        .with_description("Destructive data operations are forbidden in resolution steps")
        .with_remediation("Replace the destructive operation with a reversible migration"),
        ConstitutionalRule::new(
            "SAFE-003",
            "safety",
            RuleSeverity::Major,
            r"(?i)(--no-verify|skip(ping)?\s+(the\s+)?(tests|ci|review|validation))",
        )
        .with_description("Verification steps must not be bypassed")
        .with_remediation("Run the full verification suite before merging")
        .for_phases(["implementation", "validation"]),
        ConstitutionalRule::new(
            "PRES-001",
            "preservation",
            RuleSeverity::Major,
            r"(?i)\b(remove|drop|delete|disable)\s+(the\s+)?(existing\s+)?(feature|functionality)\b",
        )
        .with_description("Existing features must be preserved by the resolution")
        .with_remediation("Keep both behaviours and add preservation tests for the feature"),
        ConstitutionalRule::new(
            "QUAL-001",
            "quality",
            RuleSeverity::Minor,
            r"(?i)\bwithout\s+(any\s+)?(tests?|testing|validation)\b",
        )
        .with_description("Every change must be covered by validation")
        .with_remediation("Add a validation step to the affected checkpoint"),
        ConstitutionalRule::new(
            "DOC-001",
            "documentation",
            RuleSeverity::Minor,
            r"\b(TODO|FIXME|TBD)\b",
        )
        .with_description("Plans must not contain unresolved placeholders")
        .with_remediation("Replace the placeholder with the concrete step")
        .auto_fixable(),
        ConstitutionalRule::new(
            "NAME-001",
            "naming",
            RuleSeverity::Warning,
            r"(?i)\b(tmp|temp|foo|bar|xxx)_branch\b",
        )
        .with_description("Branches created during resolution should have descriptive names")
        .with_remediation("Use resolution/<group>/<task> branch names")
        .auto_fixable(),
        ConstitutionalRule::new(
            "INFO-001",
            "process",
            RuleSeverity::Info,
            r"(?i)\b(hotfix|workaround)\b",
        )
        .with_description("Workarounds should be tracked for follow-up")
        .with_remediation("Open a follow-up ticket for the permanent fix"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    #[test]
    fn test_builtin_patterns_compile_and_ids_unique() {
        let rules = builtin_rules();
        let mut ids: Vec<&str> = rules.iter().map(|r| r.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), rules.len());
        for rule in &rules {
            assert!(Regex::new(&rule.pattern).is_ok(), "bad pattern in {}", rule.id);
        }
    }

    #[test]
    fn test_safety_pattern_matches_force_push() {
        let rule = &builtin_rules()[0];
        let re = Regex::new(&rule.pattern).unwrap();
        assert!(re.is_match("then git push --force to main"));
        assert!(!re.is_match("push the branch for review"));
    }
}
