//! Post-processing of optimizer output.

use ndarray::Array1;

/// Snap weights with `|w| < threshold` to exactly zero and rescale the rest so
/// the total equals `budget`.
///
/// Rescaling is skipped when the surviving weights sum to zero.
pub fn clean_weights(weights: &Array1<f64>, threshold: f64, budget: f64) -> Array1<f64> {
    let mut cleaned = weights.mapv(|w| if w.abs() < threshold { 0.0 } else { w });
    let total = cleaned.sum();
    if total.abs() > f64::EPSILON && total != budget {
        cleaned *= budget / total;
    }
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_small_weights_snap_to_zero() {
        let cleaned = clean_weights(&array![0.5, 0.49995, 0.00005], 1e-4, 1.0);
        assert_eq!(cleaned[2], 0.0);
        assert_relative_eq!(cleaned.sum(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(cleaned[0], 0.5 / 0.99995, epsilon = 1e-12);
    }

    #[test]
    fn test_negative_dust_is_cleaned() {
        let cleaned = clean_weights(&array![1.00002, -0.00002], 1e-4, 1.0);
        assert_eq!(cleaned[1], 0.0);
        assert_relative_eq!(cleaned[0], 1.0, epsilon = 1e-15);
    }

    #[test]
    fn test_clean_weights_untouched() {
        let weights = array![0.25, 0.75];
        assert_eq!(clean_weights(&weights, 1e-4, 1.0), weights);
    }
}
