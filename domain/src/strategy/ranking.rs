//! Strategy ranking.
//!
//! `score = confidence − 0.3 × risk − 0.1 × hours`, sorted descending with a
//! stable sort so ties keep generation order.

use super::entities::{MultiPhaseStrategy, ResolutionStrategy};

const RISK_WEIGHT: f64 = 0.3;
const TIME_WEIGHT: f64 = 0.1;

/// Ranking score of a single strategy.
pub fn ranking_score(strategy: &ResolutionStrategy) -> f64 {
    strategy.confidence
        - RISK_WEIGHT * strategy.risk_level.numeric()
        - TIME_WEIGHT * strategy.estimated_hours()
}

/// Sort strategies best-first in place.
pub fn rank_strategies(strategies: &mut [MultiPhaseStrategy]) {
    strategies.sort_by(|a, b| {
        ranking_score(&b.strategy)
            .partial_cmp(&ranking_score(&a.strategy))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::entities::StrategyType;
    use crate::strategy::risk::RiskLevel;

    fn strategy(name: &str, confidence: f64, risk: RiskLevel, minutes: u32) -> MultiPhaseStrategy {
        let mut s = ResolutionStrategy::new(name, StrategyType::Custom);
        s.confidence = confidence;
        s.risk_level = risk;
        s.estimated_time = minutes;
        MultiPhaseStrategy::new(s)
    }

    #[test]
    fn test_confident_low_risk_outranks_fast_high_risk() {
        let mut list = vec![
            strategy("B", 0.5, RiskLevel::High, 20),
            strategy("A", 0.9, RiskLevel::Low, 30),
        ];
        rank_strategies(&mut list);
        assert_eq!(list[0].name(), "A");
        assert_eq!(list[1].name(), "B");
    }

    #[test]
    fn test_score_formula() {
        let s = strategy("x", 0.8, RiskLevel::Medium, 120);
        let expected = 0.8 - 0.3 * 0.5 - 0.1 * 2.0;
        assert!((ranking_score(&s.strategy) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_ties_keep_generation_order() {
        let mut list = vec![
            strategy("first", 0.7, RiskLevel::Low, 60),
            strategy("second", 0.7, RiskLevel::Low, 60),
            strategy("third", 0.7, RiskLevel::Low, 60),
        ];
        rank_strategies(&mut list);
        let names: Vec<_> = list.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["first", "second", "third"]);
    }
}
