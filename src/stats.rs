//! Statistical primitives
//!
//! Plain mean and population variance over a slice of scores. The unguarded
//! forms return NaN on empty input; the aggregators never call them with an
//! empty slice.

/// Arithmetic mean. NaN for an empty slice.
///
/// Computed incrementally so large finite scores do not overflow the sum.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut center = 0.0;
    for (k, value) in values.iter().enumerate() {
        center += (value - center) / (k + 1) as f64;
    }
    center
}

/// Arithmetic mean, defined as 0 for an empty slice
pub fn mean_or_zero(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    mean(values)
}

/// Population variance: mean of squared deviations, divisor N.
/// NaN for an empty slice.
///
/// Uses Welford's update, so identical scores yield exactly 0 at any magnitude.
pub fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut center = 0.0;
    let mut sum_sq = 0.0;
    for (k, value) in values.iter().enumerate() {
        let delta = value - center;
        center += delta / (k + 1) as f64;
        sum_sq += delta * (value - center);
    }
    sum_sq / values.len() as f64
}

/// Index of the first non-finite value, if any
pub(crate) fn first_non_finite(values: &[f64]) -> Option<usize> {
    values.iter().position(|v| !v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean() {
        assert!((mean(&[10.0, 20.0, 30.0, 40.0, 50.0]) - 30.0).abs() < 1e-12);
    }

    #[test]
    fn test_mean_of_empty_is_nan() {
        assert!(mean(&[]).is_nan());
        assert!(variance(&[]).is_nan());
    }

    #[test]
    fn test_mean_or_zero_guards_empty() {
        assert_eq!(mean_or_zero(&[]), 0.0);
        assert_eq!(mean_or_zero(&[4.0, 6.0]), 5.0);
    }

    #[test]
    fn test_population_variance_divides_by_n() {
        // deviations from 18: 8 (x9) and 72 -> (576 + 5184) / 10
        let mut scores = vec![10.0; 9];
        scores.push(90.0);
        assert!((variance(&scores) - 576.0).abs() < 1e-9);

        // sample variance of [1, 2, 3, 4] would be 1.666..., population is 1.25
        assert!((variance(&[1.0, 2.0, 3.0, 4.0]) - 1.25).abs() < 1e-12);
    }

    #[test]
    fn test_variance_of_constant_is_zero() {
        assert_eq!(variance(&[50.0; 25]), 0.0);
        assert_eq!(variance(&[7.5]), 0.0);
    }

    #[test]
    fn test_large_finite_scores_do_not_overflow() {
        assert_eq!(mean(&[1e308, 1e308]), 1e308);
        assert_eq!(mean(&[-1e308, -1e308, -1e308]), -1e308);
        assert_eq!(variance(&[1e308, 1e308]), 0.0);
        assert_eq!(variance(&[f64::MAX; 4]), 0.0);
    }

    #[test]
    fn test_first_non_finite() {
        assert_eq!(first_non_finite(&[1.0, 2.0]), None);
        assert_eq!(first_non_finite(&[1.0, f64::NAN, f64::INFINITY]), Some(1));
    }
}
