//! Small descriptive-statistics helpers shared by the metrics engine and the simulator.

use ndarray::ArrayView1;

/// Quantile of an ascending-sorted slice using linear interpolation between
/// order statistics.
///
/// `q` is clamped to `[0, 1]`. Returns `None` for an empty slice.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let h = last as f64 * q.clamp(0.0, 1.0);
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(last);
    let frac = h - lo as f64;
    Some(sorted[lo] + frac * (sorted[hi] - sorted[lo]))
}

/// Quantile of an unsorted sample. See [`quantile_sorted`].
pub fn quantile(values: ArrayView1<'_, f64>, q: f64) -> Option<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    quantile_sorted(&sorted, q)
}

/// Whether a standard deviation is indistinguishable from zero relative to the mean.
pub fn is_negligible_dispersion(std: f64, mean: f64) -> bool {
    std <= 1e-10 * (1.0 + mean.abs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;
    use rstest::rstest;

    #[rstest]
    #[case(0.0, 1.0)]
    #[case(1.0, 4.0)]
    #[case(0.5, 2.5)]
    #[case(0.05, 1.15)]
    #[case(0.95, 3.85)]
    fn test_quantile_interpolates(#[case] q: f64, #[case] expected: f64) {
        let values = array![4.0, 1.0, 3.0, 2.0];
        assert_relative_eq!(quantile(values.view(), q).unwrap(), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_quantile_edge_cases() {
        assert_eq!(quantile_sorted(&[], 0.5), None);
        assert_eq!(quantile_sorted(&[7.0], 0.05), Some(7.0));
        assert_eq!(quantile_sorted(&[1.0, 2.0], 2.0), Some(2.0));
    }

    #[test]
    fn test_negligible_dispersion() {
        assert!(is_negligible_dispersion(0.0, 0.001));
        assert!(is_negligible_dispersion(1e-17, 0.001));
        assert!(!is_negligible_dispersion(1e-4, 0.001));
    }
}
