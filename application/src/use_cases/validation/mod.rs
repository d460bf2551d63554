//! Validation pipeline
//!
//! Three escalating validators, each a strict superset of the previous:
//! quick structural checks, standard compliance and preservation gates, and
//! comprehensive workflow, performance and risk analysis.

mod comprehensive;
mod quick;
mod standard;

pub use comprehensive::{assess_risk, quality_metrics, validate_comprehensive, validate_workflow};
pub use quick::validate_quick;
pub use standard::{analyze_preservation, constitutional_compliance, validate_standard};

use crate::config::ValidationThresholds;
use crate::use_cases::compliance_engine::ComplianceEngine;
use resolver_domain::{
    ComprehensiveValidationResult, MultiPhaseStrategy, QuickValidationResult,
    StandardValidationResult, ValidationLevel, ValidationOutcome,
};
use std::sync::Arc;
use tracing::info;

pub struct ValidationPipeline {
    engine: Arc<ComplianceEngine>,
    thresholds: ValidationThresholds,
}

impl ValidationPipeline {
    pub fn new(engine: Arc<ComplianceEngine>) -> Self {
        Self {
            engine,
            thresholds: ValidationThresholds::default(),
        }
    }

    pub fn with_thresholds(mut self, thresholds: ValidationThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn thresholds(&self) -> &ValidationThresholds {
        &self.thresholds
    }

    pub fn quick(&self, strategy: &MultiPhaseStrategy) -> QuickValidationResult {
        validate_quick(strategy)
    }

    pub fn standard(&self, strategy: &MultiPhaseStrategy) -> StandardValidationResult {
        validate_standard(&self.engine, &self.thresholds, strategy)
    }

    pub fn comprehensive(&self, strategy: &MultiPhaseStrategy) -> ComprehensiveValidationResult {
        validate_comprehensive(&self.engine, &self.thresholds, strategy)
    }

    /// Run the validator for `level`.
    pub fn validate(&self, level: ValidationLevel, strategy: &MultiPhaseStrategy) -> ValidationOutcome {
        let outcome = match level {
            ValidationLevel::Quick => ValidationOutcome::Quick(self.quick(strategy)),
            ValidationLevel::Standard => ValidationOutcome::Standard(self.standard(strategy)),
            ValidationLevel::Comprehensive => {
                ValidationOutcome::Comprehensive(Box::new(self.comprehensive(strategy)))
            }
        };
        info!(
            "{} validation of '{}': score {:.2}, {}",
            level,
            strategy.name(),
            outcome.overall_score(),
            outcome.readiness_label()
        );
        outcome
    }
}
