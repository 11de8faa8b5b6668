//! Error metrics used by the fitness evaluators.
//!
//! Degenerate inputs (empty slices, zero-variance targets) yield NaN;
//! the evaluators convert non-finite metric values to the worst
//! admissible fitness.

use statrs::statistics::Statistics;

/// Mean squared error between `estimated` and `target`.
///
/// # Panics
/// Panics if the slices differ in length.
pub fn mean_squared_error(estimated: &[f64], target: &[f64]) -> f64 {
    assert_eq!(estimated.len(), target.len(), "slice length mismatch");
    if estimated.is_empty() {
        return f64::NAN;
    }
    let sum: f64 = estimated.iter().zip(target).map(|(e, t)| (e - t) * (e - t)).sum();
    sum / estimated.len() as f64
}

/// Mean squared error divided by the variance of the target.
pub fn normalized_mean_squared_error(estimated: &[f64], target: &[f64]) -> f64 {
    mean_squared_error(estimated, target) / target.iter().population_variance()
}

/// Pearson correlation coefficient between `a` and `b`.
///
/// # Panics
/// Panics if the slices differ in length.
pub fn pearson_r(a: &[f64], b: &[f64]) -> f64 {
    assert_eq!(a.len(), b.len(), "slice length mismatch");
    if a.is_empty() {
        return f64::NAN;
    }
    let mean_a = a.iter().mean();
    let mean_b = b.iter().mean();
    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (&x, &y) in a.iter().zip(b) {
        let dx = x - mean_a;
        let dy = y - mean_b;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }
    cov / (var_a.sqrt() * var_b.sqrt())
}

/// Squared Pearson correlation between `a` and `b`.
pub fn r_squared(a: &[f64], b: &[f64]) -> f64 {
    let r = pearson_r(a, b);
    r * r
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mse_zero_for_identical() {
        let a = [1.0, 2.0, 3.0];
        assert_eq!(mean_squared_error(&a, &a), 0.0);
    }

    #[test]
    fn test_mse_constant_offset() {
        let a = [1.0, 2.0, 3.0];
        let b = [2.0, 3.0, 4.0];
        assert_relative_eq!(mean_squared_error(&a, &b), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_nmse_scales_with_target_variance() {
        // Predicting the mean gives NMSE = 1.
        let target = [1.0, 2.0, 3.0, 4.0];
        let mean = [2.5, 2.5, 2.5, 2.5];
        assert_relative_eq!(normalized_mean_squared_error(&mean, &target), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_nmse_degenerate_target() {
        let target = [3.0, 3.0, 3.0];
        let estimated = [1.0, 2.0, 3.0];
        assert!(!normalized_mean_squared_error(&estimated, &target).is_finite());
    }

    #[test]
    fn test_pearson_perfect_correlation() {
        let a = [1.0, 2.0, 3.0, 4.0];
        let b = [2.0, 4.0, 6.0, 8.0];
        assert_relative_eq!(pearson_r(&a, &b), 1.0, epsilon = 1e-12);
        assert_relative_eq!(r_squared(&a, &b), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_pearson_anticorrelation() {
        let a = [1.0, 2.0, 3.0];
        let b = [3.0, 2.0, 1.0];
        assert_relative_eq!(pearson_r(&a, &b), -1.0, epsilon = 1e-12);
        assert_relative_eq!(r_squared(&a, &b), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_pearson_constant_input_is_nan() {
        let a = [1.0, 1.0, 1.0];
        let b = [1.0, 2.0, 3.0];
        assert!(pearson_r(&a, &b).is_nan());
    }
}
