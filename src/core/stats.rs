//! Numeric helpers shared by the extractors and the modality classifier.
//!
//! All statistics are population statistics. Empty or degenerate inputs
//! return 0 instead of NaN.

use statrs::statistics::Statistics;

/// Relative tolerance under which a standard deviation counts as zero.
const DEGENERATE_SPREAD: f64 = 1e-9;

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().mean()
}

pub fn variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    values.iter().population_variance()
}

pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    values.iter().population_std_dev()
}

/// Standard deviation over mean; 0 when the mean is 0.
pub fn coefficient_of_variation(values: &[f64]) -> f64 {
    let m = mean(values);
    if m.abs() < f64::EPSILON {
        return 0.0;
    }
    let sd = std_dev(values);
    if is_degenerate(sd, m) {
        return 0.0;
    }
    sd / m.abs()
}

/// Fisher-Pearson moment coefficient of skewness.
pub fn skewness(values: &[f64]) -> f64 {
    if values.len() < 3 {
        return 0.0;
    }
    let m = mean(values);
    let sd = std_dev(values);
    if is_degenerate(sd, m) {
        return 0.0;
    }
    values.iter().map(|&v| ((v - m) / sd).powi(3)).sum::<f64>() / values.len() as f64
}

/// Largest value, or 0 for an empty slice.
pub fn peak(values: &[f64]) -> f64 {
    values.iter().copied().fold(0.0_f64, f64::max)
}

/// Replace non-finite values with `fallback` and clamp into [0, 1].
pub fn unit(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        fallback
    }
}

fn is_degenerate(sd: f64, m: f64) -> bool {
    !sd.is_finite() || sd <= DEGENERATE_SPREAD * m.abs().max(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_std_dev() {
        let values = vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((std_dev(&values) - 2.0).abs() < 1e-12);
        assert!((variance(&values) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_inputs_are_zero() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(std_dev(&[1.0]), 0.0);
        assert_eq!(coefficient_of_variation(&[]), 0.0);
        assert_eq!(skewness(&[1.0, 2.0]), 0.0);
        assert_eq!(peak(&[]), 0.0);
    }

    #[test]
    fn test_constant_series_has_no_skew() {
        let values = vec![16.67; 50];
        assert_eq!(coefficient_of_variation(&values), 0.0);
        assert_eq!(skewness(&values), 0.0);
    }

    #[test]
    fn test_right_tail_is_positive_skew() {
        let values = vec![1.0, 1.0, 1.0, 2.0, 2.0, 3.0, 10.0];
        assert!(skewness(&values) > 1.0);
        assert!(skewness(&values.iter().map(|v| -v).collect::<Vec<_>>()) < -1.0);
    }

    #[test]
    fn test_unit_guards_nan() {
        assert_eq!(unit(f64::NAN, 0.5), 0.5);
        assert_eq!(unit(1.5, 0.5), 1.0);
        assert_eq!(unit(-0.1, 0.5), 0.0);
    }
}
