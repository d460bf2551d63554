//! Coordination barriers: quorum conditions over a set of tasks.

use crate::core::ids::{BarrierId, SessionId, TaskId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ratios within this distance of 1.0 count as complete.
const RATIO_EPSILON: f64 = 1e-9;

/// Condition under which a barrier releases.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "condition", rename_all = "snake_case")]
pub enum TriggerCondition {
    AllComplete,
    AnyComplete,
    MajorityComplete { threshold: f64 },
}

impl TriggerCondition {
    pub fn as_str(&self) -> &str {
        match self {
            TriggerCondition::AllComplete => "all_complete",
            TriggerCondition::AnyComplete => "any_complete",
            TriggerCondition::MajorityComplete { .. } => "majority_complete",
        }
    }

    /// Parse a condition name, attaching `threshold` for majority barriers.
    pub fn parse(name: &str, threshold: f64) -> Option<Self> {
        match name.trim().to_lowercase().replace('-', "_").as_str() {
            "all_complete" | "all" => Some(TriggerCondition::AllComplete),
            "any_complete" | "any" => Some(TriggerCondition::AnyComplete),
            "majority_complete" | "majority" => Some(TriggerCondition::MajorityComplete {
                threshold: threshold.clamp(0.0, 1.0),
            }),
            _ => None,
        }
    }

    /// Whether a completed ratio in `[0, 1]` satisfies the condition.
    pub fn is_met(&self, completed_ratio: f64) -> bool {
        match self {
            TriggerCondition::AllComplete => completed_ratio >= 1.0 - RATIO_EPSILON,
            TriggerCondition::AnyComplete => completed_ratio > 0.0,
            TriggerCondition::MajorityComplete { threshold } => completed_ratio >= *threshold,
        }
    }
}

impl std::fmt::Display for TriggerCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TriggerCondition::MajorityComplete { threshold } => {
                write!(f, "majority_complete({threshold})")
            }
            other => write!(f, "{}", other.as_str()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BarrierStatus {
    #[default]
    Waiting,
    Triggered,
    TimedOut,
    Cancelled,
}

impl BarrierStatus {
    pub fn as_str(&self) -> &str {
        match self {
            BarrierStatus::Waiting => "waiting",
            BarrierStatus::Triggered => "triggered",
            BarrierStatus::TimedOut => "timed_out",
            BarrierStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for BarrierStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Fraction of `total` that is complete. An empty member set is complete.
pub fn completed_ratio(completed: usize, total: usize) -> f64 {
    if total == 0 {
        1.0
    } else {
        completed as f64 / total as f64
    }
}

/// A synchronization point over member tasks of one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinationBarrier {
    pub id: BarrierId,
    pub session_id: SessionId,
    pub name: String,
    pub task_ids: Vec<TaskId>,
    #[serde(flatten)]
    pub condition: TriggerCondition,
    pub timeout_ms: u64,
    pub created_at: DateTime<Utc>,
    pub triggered_at: Option<DateTime<Utc>>,
    pub status: BarrierStatus,
}

impl CoordinationBarrier {
    pub fn new(
        session_id: SessionId,
        name: impl Into<String>,
        task_ids: Vec<TaskId>,
        condition: TriggerCondition,
        timeout_ms: u64,
    ) -> Self {
        Self {
            id: BarrierId::generate(),
            session_id,
            name: name.into(),
            task_ids,
            condition,
            timeout_ms,
            created_at: Utc::now(),
            triggered_at: None,
            status: BarrierStatus::Waiting,
        }
    }

    pub fn mark_triggered(&mut self) {
        self.status = BarrierStatus::Triggered;
        self.triggered_at = Some(Utc::now());
    }
}

/// Outcome of waiting on a barrier. A timeout is a result, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarrierResult {
    pub barrier_id: BarrierId,
    pub name: String,
    pub triggered: bool,
    pub completed: usize,
    pub total: usize,
    pub completed_ratio: f64,
    pub waited_ms: u64,
    pub status: BarrierStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_majority_threshold() {
        let cond = TriggerCondition::MajorityComplete { threshold: 0.6 };
        assert!(cond.is_met(completed_ratio(2, 3)));
        assert!(!cond.is_met(completed_ratio(1, 3)));
    }

    #[test]
    fn test_all_and_any() {
        assert!(TriggerCondition::AllComplete.is_met(completed_ratio(3, 3)));
        assert!(!TriggerCondition::AllComplete.is_met(completed_ratio(2, 3)));
        assert!(TriggerCondition::AnyComplete.is_met(completed_ratio(1, 3)));
        assert!(!TriggerCondition::AnyComplete.is_met(completed_ratio(0, 3)));
    }

    #[test]
    fn test_empty_barrier_is_complete() {
        assert_eq!(completed_ratio(0, 0), 1.0);
        assert!(TriggerCondition::AllComplete.is_met(completed_ratio(0, 0)));
    }

    #[test]
    fn test_condition_wire_format() {
        let json =
            serde_json::to_value(TriggerCondition::MajorityComplete { threshold: 0.6 }).unwrap();
        assert_eq!(json["condition"], "majority_complete");
        assert_eq!(json["threshold"], 0.6);
    }

    #[test]
    fn test_parse_condition() {
        assert_eq!(
            TriggerCondition::parse("majority", 1.5),
            Some(TriggerCondition::MajorityComplete { threshold: 1.0 })
        );
        assert_eq!(
            TriggerCondition::parse("all-complete", 0.0),
            Some(TriggerCondition::AllComplete)
        );
        assert_eq!(TriggerCondition::parse("some", 0.5), None);
    }
}
