//! Statistics and trend reports over the compliance history.

use super::result::{ComplianceLevel, ComplianceResult};
use crate::core::score::mean;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Score at or above which a validation counts as passing.
pub const PASSING_SCORE: f64 = 0.7;

/// Band inside which two window means are considered equal.
const TREND_TOLERANCE: f64 = 0.05;

/// Aggregate figures over a compliance history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceStatistics {
    pub total_validations: usize,
    pub average_score: f64,
    pub pass_rate: f64,
    pub level_counts: HashMap<String, usize>,
    /// `(rule_id, violation_count)`, most frequent first, at most five.
    pub most_violated_rules: Vec<(String, usize)>,
}

impl ComplianceStatistics {
    pub fn from_history<'a, I>(history: I) -> Self
    where
        I: IntoIterator<Item = &'a ComplianceResult>,
    {
        let mut scores = Vec::new();
        let mut passed = 0usize;
        let mut level_counts: HashMap<String, usize> = HashMap::new();
        let mut rule_counts: HashMap<String, usize> = HashMap::new();

        for result in history {
            scores.push(result.overall_score);
            if result.overall_score >= PASSING_SCORE {
                passed += 1;
            }
            *level_counts
                .entry(result.level.as_str().to_string())
                .or_default() += 1;
            for violation in &result.violations {
                *rule_counts.entry(violation.rule_id.clone()).or_default() += 1;
            }
        }

        let mut most_violated_rules: Vec<(String, usize)> = rule_counts.into_iter().collect();
        most_violated_rules.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        most_violated_rules.truncate(5);

        let total = scores.len();
        Self {
            total_validations: total,
            average_score: mean(&scores),
            pass_rate: if total == 0 {
                0.0
            } else {
                passed as f64 / total as f64
            },
            level_counts,
            most_violated_rules,
        }
    }

    pub fn count_for(&self, level: ComplianceLevel) -> usize {
        self.level_counts.get(level.as_str()).copied().unwrap_or(0)
    }
}

/// Direction of recent compliance scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Improving,
    Declining,
    Stable,
    InsufficientData,
}

/// Comparison of the latest window of scores against the one before it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceTrend {
    pub direction: TrendDirection,
    pub window: usize,
    pub recent_average: f64,
    pub previous_average: f64,
}

impl ComplianceTrend {
    /// Build a trend from scores in chronological order.
    pub fn from_scores(scores: &[f64], window: usize) -> Self {
        let window = window.max(1);
        if scores.len() < window * 2 {
            return Self {
                direction: TrendDirection::InsufficientData,
                window,
                recent_average: mean(&scores[scores.len().saturating_sub(window)..]),
                previous_average: 0.0,
            };
        }

        let recent = &scores[scores.len() - window..];
        let previous = &scores[scores.len() - window * 2..scores.len() - window];
        let recent_average = mean(recent);
        let previous_average = mean(previous);
        let delta = recent_average - previous_average;

        let direction = if delta > TREND_TOLERANCE {
            TrendDirection::Improving
        } else if delta < -TREND_TOLERANCE {
            TrendDirection::Declining
        } else {
            TrendDirection::Stable
        };

        Self {
            direction,
            window,
            recent_average,
            previous_average,
        }
    }
}
