//! Container for all application parameter groups.

use super::params::{ComplianceParams, CoordinationParams, GenerationParams, ValidationThresholds};

/// Every parameter group the use cases need, built once by the binary.
#[derive(Debug, Clone, Default)]
pub struct ResolverConfig {
    pub generation: GenerationParams,
    pub validation: ValidationThresholds,
    pub coordination: CoordinationParams,
    pub compliance: ComplianceParams,
}

impl ResolverConfig {
    pub fn with_generation(mut self, generation: GenerationParams) -> Self {
        self.generation = generation;
        self
    }

    pub fn with_validation(mut self, validation: ValidationThresholds) -> Self {
        self.validation = validation;
        self
    }

    pub fn with_coordination(mut self, coordination: CoordinationParams) -> Self {
        self.coordination = coordination;
        self
    }

    pub fn with_compliance(mut self, compliance: ComplianceParams) -> Self {
        self.compliance = compliance;
        self
    }
}
