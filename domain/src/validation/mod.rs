//! Validation records shared by the quick, standard and comprehensive
//! validators.

pub mod readiness;
pub mod results;

pub use readiness::{
    DeploymentReadiness, QUICK_PASS_THRESHOLD, QualityGate, ResolutionReadiness, ValidationCheck,
    ValidationLevel,
};
pub use results::{
    BenchmarkStep, ComprehensiveValidationResult, PerformanceBenchmark, PreservationAnalysis,
    QualityMetrics, QuickValidationResult, RiskAssessment, StandardValidationResult,
    ValidationOutcome, WorkflowValidation, risk_category_weight,
};
