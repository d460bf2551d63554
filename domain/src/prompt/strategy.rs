//! Prompt templates for the strategy-text backend

use crate::conflict::Conflict;
use crate::strategy::{GenerationContext, StrategyType};

/// Templates for asking a text backend to draft one strategy
pub struct StrategyPromptTemplate;

impl StrategyPromptTemplate {
    /// System prompt shared by every archetype
    pub fn system() -> &'static str {
        r#"You are a senior engineer planning how to resolve a conflict between concurrent changes.
Propose one concrete resolution strategy of the requested type.
Be specific about the ordered steps, how each step is verified, and how to roll back.
Respond with a single JSON object inside a ```json code block and nothing else."#
    }

    /// Short guidance per archetype
    pub fn archetype_guidance(strategy_type: StrategyType) -> &'static str {
        match strategy_type {
            StrategyType::ConservativeMerge => {
                "Minimise change: keep both sides where possible and resolve overlaps line by line."
            }
            StrategyType::FeaturePreservation => {
                "Every existing feature on both sides must keep working; say how each is verified."
            }
            StrategyType::ArchitecturalRefactor => {
                "Restructure the affected components so the conflict cannot recur."
            }
            StrategyType::FastTrack => {
                "Resolve as quickly as possible with the smallest safe change; defer cleanup."
            }
            StrategyType::SafeMode => {
                "Prefer reverting or isolating changes over merging them; every step must be reversible."
            }
            StrategyType::Hybrid | StrategyType::ManualFallback | StrategyType::Custom => {
                "Combine the most appropriate techniques for this conflict."
            }
        }
    }

    /// User prompt describing the conflict and the expected JSON shape
    pub fn strategy_prompt(
        conflict: &Conflict,
        context: &GenerationContext,
        strategy_type: StrategyType,
    ) -> String {
        let mut prompt = format!(
            r#"## Conflict

Type: {}
Severity: {}
Summary: {}
Affected: {}

## Context

Risk tolerance: {}
Urgency: {}
"#,
            conflict.kind().as_str(),
            conflict.severity(),
            conflict.summary(),
            conflict.affected_ids().join(", "),
            context.risk_tolerance.as_str(),
            context.urgency.as_str(),
        );

        if let Some(complexity) = context.complexity_score {
            prompt.push_str(&format!("Complexity: {:.1}/10\n", complexity));
        }
        if !context.affected_features.is_empty() {
            prompt.push_str(&format!(
                "Features to preserve: {}\n",
                context.affected_features.join(", ")
            ));
        }

        prompt.push_str(&format!(
            r#"
## Requested strategy: {}

{}

Return JSON with these fields:
- "name": string
- "approach": string
- "steps": array of strings (at least one)
- "pros", "cons": arrays of strings
- "confidence": number between 0 and 1
- "estimated_time": minutes as a number, or a duration such as "2 hours"
- "risk_level": "low" | "medium" | "high" | "critical"
- "requires_approval": boolean
- "success_criteria": array of strings
- "rollback_strategy": string
- "validation_approach": string"#,
            strategy_type.display_name(),
            Self::archetype_guidance(strategy_type),
        ));

        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conflict::MergeConflict;
    use crate::strategy::RiskTolerance;

    #[test]
    fn test_strategy_prompt_mentions_conflict_and_type() {
        let conflict = Conflict::MergeConflict(MergeConflict {
            pr1_id: "101".into(),
            pr2_id: "102".into(),
            file_path: "src/auth.rs".into(),
            similarity_score: 0.8,
            ..Default::default()
        });
        let context = GenerationContext::default()
            .with_risk_tolerance(RiskTolerance::Low)
            .with_feature("oauth login");
        let prompt =
            StrategyPromptTemplate::strategy_prompt(&conflict, &context, StrategyType::SafeMode);

        assert!(prompt.contains("merge_conflict"));
        assert!(prompt.contains("oauth login"));
        assert!(prompt.contains(StrategyType::SafeMode.display_name()));
        assert!(prompt.contains("\"rollback_strategy\""));
    }
}
