//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("{field} must be within 0.0..=1.0, got {value}")]
    OutOfRange { field: &'static str, value: f64 },

    #[error("Unknown {kind}: {value}")]
    UnknownValue { kind: &'static str, value: String },

    #[error("Invalid status transition for task {task}: {from} -> {to}")]
    InvalidTransition {
        task: String,
        from: String,
        to: String,
    },

    #[error("Malformed strategy: {0}")]
    MalformedStrategy(String),

    #[error("Invalid conflict: {0}")]
    InvalidConflict(String),
}

impl DomainError {
    /// Build an [`DomainError::UnknownValue`] for a failed enum parse.
    pub fn unknown(kind: &'static str, value: impl Into<String>) -> Self {
        DomainError::UnknownValue {
            kind,
            value: value.into(),
        }
    }

    /// Whether the error comes from malformed external input rather than a
    /// programming or configuration mistake.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, DomainError::MalformedStrategy(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_display() {
        let error = DomainError::OutOfRange {
            field: "confidence",
            value: 1.5,
        };
        assert_eq!(
            error.to_string(),
            "confidence must be within 0.0..=1.0, got 1.5"
        );
    }

    #[test]
    fn test_recoverable_only_for_malformed_strategy() {
        assert!(DomainError::MalformedStrategy("no json".into()).is_recoverable());
        assert!(!DomainError::unknown("risk level", "extreme").is_recoverable());
        assert!(!DomainError::InvalidConflict("empty".into()).is_recoverable());
    }
}
