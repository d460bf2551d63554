//! Helpers for values constrained to the unit interval.

use super::error::DomainError;

/// Clamp a value into `[0, 1]`. `NaN` collapses to `0.0`.
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Ensure `value` lies in `[0, 1]`, naming the offending field otherwise.
pub fn ensure_unit(field: &'static str, value: f64) -> Result<f64, DomainError> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(DomainError::OutOfRange { field, value })
    }
}

/// Weighted sum of `(weight, score)` pairs.
///
/// Weights are used as given; callers are expected to pass weights that
/// sum to 1.0 when a normalized result is wanted.
pub fn weighted_sum(parts: &[(f64, f64)]) -> f64 {
    parts.iter().map(|(weight, score)| weight * score).sum()
}

/// Arithmetic mean, `0.0` for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_unit() {
        assert_eq!(clamp_unit(-0.5), 0.0);
        assert_eq!(clamp_unit(1.7), 1.0);
        assert_eq!(clamp_unit(0.42), 0.42);
        assert_eq!(clamp_unit(f64::NAN), 0.0);
    }

    #[test]
    fn test_ensure_unit() {
        assert!(ensure_unit("score", 0.5).is_ok());
        assert!(ensure_unit("score", 1.0).is_ok());
        assert!(matches!(
            ensure_unit("score", 1.01),
            Err(DomainError::OutOfRange { field: "score", .. })
        ));
    }

    #[test]
    fn test_weighted_sum_and_mean() {
        let total = weighted_sum(&[(0.3, 1.0), (0.25, 1.0), (0.25, 0.0), (0.2, 0.5)]);
        assert!((total - 0.65).abs() < 1e-9);
        assert_eq!(mean(&[]), 0.0);
        assert!((mean(&[0.2, 0.4]) - 0.3).abs() < 1e-9);
    }
}
