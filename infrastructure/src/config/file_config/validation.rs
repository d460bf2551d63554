//! Validation configuration from TOML (`[validation]` section)

use resolver_application::ValidationThresholds;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw validation thresholds from TOML. Performance targets are seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileValidationConfig {
    pub constitutional_threshold: f64,
    pub preservation_threshold: f64,
    pub overall_threshold: f64,
    pub specification_target_secs: f64,
    pub strategy_target_secs: f64,
    pub validation_target_secs: f64,
}

impl Default for FileValidationConfig {
    fn default() -> Self {
        let thresholds = ValidationThresholds::default();
        Self {
            constitutional_threshold: thresholds.constitutional,
            preservation_threshold: thresholds.preservation,
            overall_threshold: thresholds.overall,
            specification_target_secs: thresholds.specification_target.as_secs_f64(),
            strategy_target_secs: thresholds.strategy_target.as_secs_f64(),
            validation_target_secs: thresholds.validation_target.as_secs_f64(),
        }
    }
}

fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value.max(0.0)).unwrap_or(Duration::ZERO)
}

impl FileValidationConfig {
    /// Thresholds as named; out-of-range values are clamped here and
    /// reported by `FileConfig::validate`.
    pub fn to_thresholds(&self) -> ValidationThresholds {
        ValidationThresholds {
            constitutional: self.constitutional_threshold.clamp(0.0, 1.0),
            preservation: self.preservation_threshold.clamp(0.0, 1.0),
            overall: self.overall_threshold.clamp(0.0, 1.0),
            specification_target: seconds(self.specification_target_secs),
            strategy_target: seconds(self.strategy_target_secs),
            validation_target: seconds(self.validation_target_secs),
        }
    }

    /// `(field, value)` pairs of the unit-interval thresholds.
    pub(super) fn thresholds(&self) -> [(&'static str, f64); 3] {
        [
            ("validation.constitutional_threshold", self.constitutional_threshold),
            ("validation.preservation_threshold", self.preservation_threshold),
            ("validation.overall_threshold", self.overall_threshold),
        ]
    }
}
