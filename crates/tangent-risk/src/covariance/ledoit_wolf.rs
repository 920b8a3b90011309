//! Ledoit-Wolf Shrinkage Covariance Estimator
//!
//! Implements the analytical shrinkage estimators from:
//! - "A well-conditioned estimator for large-dimensional covariance matrices"
//!   (Ledoit & Wolf, 2004) for the scaled-identity and diagonal targets
//! - "Honey, I Shrunk the Sample Covariance Matrix" (Ledoit & Wolf, 2004) for
//!   the constant-correlation target
//!
//! The estimator has the form:
//! Σ_LW = δ* F + (1-δ*) S
//!
//! where:
//! - S is the sample covariance matrix (divided by T)
//! - F is the shrinkage target
//! - δ* is the optimal shrinkage intensity (computed analytically)

use super::{CovarianceError, CovarianceEstimator};
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

/// Shrinkage target types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ShrinkageTarget {
    /// Identity matrix scaled by average variance: F = μ * I where μ = trace(S)/n
    #[default]
    ConstantVariance,

    /// Diagonal variances with the average pairwise correlation off the diagonal
    ConstantCorrelation,

    /// Diagonal matrix (no off-diagonal elements)
    Diagonal,
}

/// Ledoit-Wolf covariance estimator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedoitWolfConfig {
    /// Minimum number of observations required (default: 2)
    pub min_observations: usize,

    /// Shrinkage target type (default: ConstantVariance)
    pub target: ShrinkageTarget,

    /// Whether to center returns (subtract mean) before computing covariance
    pub center: bool,
}

impl Default for LedoitWolfConfig {
    fn default() -> Self {
        Self {
            min_observations: 2,
            target: ShrinkageTarget::ConstantVariance,
            center: true,
        }
    }
}

/// Ledoit-Wolf shrinkage covariance estimator
#[derive(Debug, Default)]
pub struct LedoitWolfEstimator {
    config: LedoitWolfConfig,
}

impl LedoitWolfEstimator {
    /// Create a new Ledoit-Wolf estimator with the given configuration
    pub const fn new(config: LedoitWolfConfig) -> Self {
        Self { config }
    }

    fn prepare(&self, returns: &Array2<f64>) -> Result<Array2<f64>, CovarianceError> {
        let n_periods = returns.nrows();
        if n_periods < self.config.min_observations.max(1) {
            return Err(CovarianceError::InsufficientData {
                required: self.config.min_observations.max(1),
                actual: n_periods,
            });
        }
        if returns.iter().any(|r| !r.is_finite()) {
            return Err(CovarianceError::InvalidParameter(
                "returns contain non-finite values".to_string(),
            ));
        }

        if self.config.center {
            let means = crate::returns::column_means(returns);
            Ok(returns - &means.insert_axis(Axis(0)))
        } else {
            Ok(returns.clone())
        }
    }

    /// Sample covariance S = (1/T) * X^T * X of prepared returns
    fn sample_covariance(x: &Array2<f64>) -> Array2<f64> {
        x.t().dot(x) / x.nrows() as f64
    }

    /// Compute the shrinkage target matrix F
    fn shrinkage_target(&self, sample_cov: &Array2<f64>) -> Array2<f64> {
        let n = sample_cov.nrows();

        match self.config.target {
            ShrinkageTarget::ConstantVariance => {
                let mu = sample_cov.diag().sum() / n as f64;
                Array2::eye(n) * mu
            }

            ShrinkageTarget::Diagonal => Array2::from_diag(&sample_cov.diag()),

            ShrinkageTarget::ConstantCorrelation => {
                let sd = sample_cov.diag().mapv(f64::sqrt);
                let r_bar = average_correlation(sample_cov);
                Array2::from_shape_fn((n, n), |(i, j)| {
                    if i == j {
                        sample_cov[[i, i]]
                    } else {
                        r_bar * sd[i] * sd[j]
                    }
                })
            }
        }
    }

    /// Optimal shrinkage intensity for prepared returns.
    fn compute_shrinkage_intensity(
        &self,
        x: &Array2<f64>,
        sample_cov: &Array2<f64>,
        target: &Array2<f64>,
    ) -> f64 {
        match self.config.target {
            ShrinkageTarget::ConstantVariance => frobenius_intensity(x, sample_cov, target, true),
            ShrinkageTarget::Diagonal => frobenius_intensity(x, sample_cov, target, false),
            ShrinkageTarget::ConstantCorrelation => {
                constant_correlation_intensity(x, sample_cov, target)
            }
        }
    }

    /// Shrinkage intensity δ* in `[0, 1]` for the given returns
    /// (useful for diagnostics)
    pub fn shrinkage_intensity(&self, returns: &Array2<f64>) -> Result<f64, CovarianceError> {
        self.estimate_with_intensity(returns).map(|(_, delta)| delta)
    }

    /// Shrunk covariance together with the intensity that produced it.
    pub fn estimate_with_intensity(
        &self,
        returns: &Array2<f64>,
    ) -> Result<(Array2<f64>, f64), CovarianceError> {
        let x = self.prepare(returns)?;
        let sample_cov = Self::sample_covariance(&x);
        let target = self.shrinkage_target(&sample_cov);
        let delta = self.compute_shrinkage_intensity(&x, &sample_cov, &target);

        tracing::trace!(shrinkage_target = ?self.config.target, delta, "ledoit-wolf shrinkage");

        // Σ_LW = δ* F + (1-δ*) S
        Ok((&target * delta + &sample_cov * (1.0 - delta), delta))
    }
}

impl CovarianceEstimator for LedoitWolfEstimator {
    fn estimate(&self, returns: &Array2<f64>) -> Result<Array2<f64>, CovarianceError> {
        self.estimate_with_intensity(returns).map(|(cov, _)| cov)
    }
}

/// Mean off-diagonal correlation of a covariance matrix.
///
/// Pairs involving a zero-variance asset count as uncorrelated.
fn average_correlation(sample_cov: &Array2<f64>) -> f64 {
    let n = sample_cov.nrows();
    if n < 2 {
        return 0.0;
    }
    let sd = sample_cov.diag().mapv(f64::sqrt);
    let mut sum = 0.0;
    for i in 0..n {
        for j in 0..n {
            if i != j && sd[i] > 0.0 && sd[j] > 0.0 {
                sum += sample_cov[[i, j]] / (sd[i] * sd[j]);
            }
        }
    }
    sum / (n * (n - 1)) as f64
}

/// δ = min(b², d²) / d² with
/// d² = ||S - F||² and b² = (1/T²) Σ_t ||x_t x_tᵀ - S||²,
/// summed over all entries or over off-diagonal entries only.
fn frobenius_intensity(
    x: &Array2<f64>,
    sample_cov: &Array2<f64>,
    target: &Array2<f64>,
    include_diagonal: bool,
) -> f64 {
    let (n_periods, n) = x.dim();
    let counted = |i: usize, j: usize| include_diagonal || i != j;

    let mut d2 = 0.0;
    for i in 0..n {
        for j in 0..n {
            if counted(i, j) {
                d2 += (sample_cov[[i, j]] - target[[i, j]]).powi(2);
            }
        }
    }
    if d2 <= 0.0 {
        return 0.0;
    }

    let mut b2 = 0.0;
    for row in x.rows() {
        for i in 0..n {
            for j in 0..n {
                if counted(i, j) {
                    b2 += (row[i] * row[j] - sample_cov[[i, j]]).powi(2);
                }
            }
        }
    }
    b2 /= (n_periods * n_periods) as f64;

    b2.min(d2) / d2
}

/// Constant-correlation intensity δ = clamp((π̂ - ρ̂) / γ̂ / T, 0, 1).
fn constant_correlation_intensity(
    x: &Array2<f64>,
    sample_cov: &Array2<f64>,
    target: &Array2<f64>,
) -> f64 {
    let (n_periods, n) = x.dim();
    let t = n_periods as f64;

    let gamma_hat: f64 = (sample_cov - target).mapv(|v| v * v).sum();
    if n < 2 || gamma_hat <= 0.0 {
        return 0.0;
    }

    let sd = sample_cov.diag().mapv(f64::sqrt);
    if sd.iter().any(|&s| s <= 0.0) {
        return 0.0;
    }
    let r_bar = average_correlation(sample_cov);

    let squared = x.mapv(|v| v * v);
    let cubed = x.mapv(|v| v * v * v);

    // π_ij = (1/T) Σ_t x_ti² x_tj² - s_ij²
    let pi_mat = squared.t().dot(&squared) / t - sample_cov.mapv(|v| v * v);
    let pi_hat = pi_mat.sum();
    let pi_diag = pi_mat.diag().sum();

    // θ_ij = (1/T) Σ_t x_ti³ x_tj - s_ii s_ij
    let third = cubed.t().dot(x) / t;
    let mut rho_off = 0.0;
    for i in 0..n {
        for j in 0..n {
            if i != j {
                let theta = third[[i, j]] - sample_cov[[i, i]] * sample_cov[[i, j]];
                rho_off += sd[j] / sd[i] * theta;
            }
        }
    }
    let rho_hat = pi_diag + r_bar * rho_off;

    ((pi_hat - rho_hat) / gamma_hat / t).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::covariance::is_positive_definite;
    use approx::assert_relative_eq;
    use ndarray::array;
    use rand::{SeedableRng, rngs::StdRng};
    use rand_distr::{Distribution, StandardNormal};

    fn fixture() -> Array2<f64> {
        array![
            [0.010, 0.004, -0.002],
            [-0.006, 0.002, 0.005],
            [0.004, -0.003, 0.001],
            [0.012, 0.006, -0.004],
            [-0.008, -0.001, 0.003],
            [0.003, 0.005, 0.002],
        ]
    }

    const CONSTANT_VARIANCE_DELTA: f64 = 0.197_182_177_559_896;
    const DIAGONAL_DELTA: f64 = 0.164_382_298_544_829;
    const CONSTANT_CORRELATION_DELTA: f64 = 0.152_079_036_125_021;

    /// Correlated returns: the second asset follows the first plus noise.
    fn correlated(n_periods: usize, seed: u64) -> Array2<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut returns = Array2::zeros((n_periods, 3));
        for mut row in returns.rows_mut() {
            let [z1, z2, z3]: [f64; 3] = std::array::from_fn(|_| StandardNormal.sample(&mut rng));
            let a = 0.01 * z1;
            row[0] = a;
            row[1] = a + 0.004 * z2;
            row[2] = 0.015 * z3 - 0.5 * a;
        }
        returns
    }

    fn estimator(target: ShrinkageTarget) -> LedoitWolfEstimator {
        LedoitWolfEstimator::new(LedoitWolfConfig {
            target,
            ..Default::default()
        })
    }

    #[test]
    fn test_ledoit_wolf_config_default() {
        let config = LedoitWolfConfig::default();
        assert_eq!(config.min_observations, 2);
        assert_eq!(config.target, ShrinkageTarget::ConstantVariance);
        assert!(config.center);
    }

    #[test]
    fn test_insufficient_data() {
        let estimator = LedoitWolfEstimator::default();
        let returns = Array2::<f64>::zeros((1, 3));
        assert!(matches!(
            estimator.estimate(&returns),
            Err(CovarianceError::InsufficientData { .. })
        ));
    }

    #[test]
    fn test_sample_covariance_uncentered() {
        let returns = array![[1.0, 2.0], [2.0, 4.0], [3.0, 6.0]];
        let sample_cov = LedoitWolfEstimator::sample_covariance(&returns);

        // Expected: (1/3) * [[14, 28], [28, 56]]
        assert_relative_eq!(sample_cov[[0, 0]], 14.0 / 3.0, epsilon = 1e-10);
        assert_relative_eq!(sample_cov[[0, 1]], 28.0 / 3.0, epsilon = 1e-10);
        assert_relative_eq!(sample_cov[[1, 1]], 56.0 / 3.0, epsilon = 1e-10);
    }

    #[test]
    fn test_constant_variance_target() {
        let estimator = LedoitWolfEstimator::default();
        let sample_cov = array![[4.0, 1.0, 0.5], [1.0, 9.0, 1.5], [0.5, 1.5, 16.0]];
        let target = estimator.shrinkage_target(&sample_cov);

        let mu = 29.0 / 3.0;
        assert_relative_eq!(target[[0, 0]], mu, epsilon = 1e-10);
        assert_relative_eq!(target[[2, 2]], mu, epsilon = 1e-10);
        assert_relative_eq!(target[[0, 1]], 0.0, epsilon = 1e-10);
    }

    #[test]
    fn test_constant_correlation_target() {
        let estimator = estimator(ShrinkageTarget::ConstantCorrelation);
        let sample_cov = array![[4.0, 1.0, 0.0], [1.0, 1.0, 0.5], [0.0, 0.5, 1.0]];
        let target = estimator.shrinkage_target(&sample_cov);

        // Correlations: 0.5, 0.0, 0.5 -> mean 1/3
        assert_relative_eq!(target[[0, 0]], 4.0, epsilon = 1e-12);
        assert_relative_eq!(target[[0, 1]], 2.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(target[[1, 2]], 1.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(target[[2, 0]], 2.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_diagonal_target() {
        let estimator = estimator(ShrinkageTarget::Diagonal);
        let sample_cov = array![[4.0, 1.0, 0.5], [1.0, 9.0, 1.5], [0.5, 1.5, 16.0]];
        let target = estimator.shrinkage_target(&sample_cov);

        assert_relative_eq!(target[[1, 1]], 9.0, epsilon = 1e-10);
        assert_relative_eq!(target[[0, 1]], 0.0, epsilon = 1e-10);
        assert_relative_eq!(target[[1, 2]], 0.0, epsilon = 1e-10);
    }

    #[test]
    fn test_no_shrinkage_when_sample_equals_target() {
        // Uncorrelated, equal variances: S is already μI
        let returns = array![[1.0, 1.0], [1.0, -1.0], [-1.0, 1.0], [-1.0, -1.0]];
        let (cov, delta) = LedoitWolfEstimator::default()
            .estimate_with_intensity(&returns)
            .unwrap();
        assert_eq!(delta, 0.0);
        assert_relative_eq!(cov[[0, 0]], 1.0, epsilon = 1e-12);
        assert_relative_eq!(cov[[0, 1]], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_constant_variance_intensity_value() {
        let delta = LedoitWolfEstimator::default()
            .shrinkage_intensity(&fixture())
            .unwrap();
        assert_relative_eq!(delta, CONSTANT_VARIANCE_DELTA, epsilon = 1e-9);
    }

    #[test]
    fn test_constant_correlation_intensity_value() {
        let delta = estimator(ShrinkageTarget::ConstantCorrelation)
            .shrinkage_intensity(&fixture())
            .unwrap();
        assert_relative_eq!(delta, CONSTANT_CORRELATION_DELTA, epsilon = 1e-9);
    }

    #[test]
    fn test_diagonal_intensity_value() {
        let delta = estimator(ShrinkageTarget::Diagonal)
            .shrinkage_intensity(&fixture())
            .unwrap();
        assert_relative_eq!(delta, DIAGONAL_DELTA, epsilon = 1e-9);
    }

    #[test]
    fn test_trace_preserved_and_diagonal_kept() {
        let returns = fixture();
        let x = LedoitWolfEstimator::default().prepare(&returns).unwrap();
        let sample_cov = LedoitWolfEstimator::sample_covariance(&x);

        let scaled = LedoitWolfEstimator::default().estimate(&returns).unwrap();
        assert_relative_eq!(scaled.diag().sum(), sample_cov.diag().sum(), epsilon = 1e-14);

        for target in [ShrinkageTarget::Diagonal, ShrinkageTarget::ConstantCorrelation] {
            let shrunk = estimator(target).estimate(&returns).unwrap();
            for i in 0..3 {
                assert_relative_eq!(shrunk[[i, i]], sample_cov[[i, i]], epsilon = 1e-14);
            }
        }
    }

    #[test]
    fn test_intensity_falls_with_more_observations() {
        for target in [
            ShrinkageTarget::ConstantVariance,
            ShrinkageTarget::Diagonal,
            ShrinkageTarget::ConstantCorrelation,
        ] {
            let estimator = estimator(target);
            let short = estimator.shrinkage_intensity(&correlated(15, 7)).unwrap();
            let long = estimator.shrinkage_intensity(&correlated(2000, 7)).unwrap();
            assert!((0.0..=1.0).contains(&short), "{target:?}: {short}");
            assert!(long < short, "{target:?}: {long} >= {short}");
            assert!(long < 0.05, "{target:?}: {long}");
        }
    }

    #[test]
    fn test_estimate_produces_valid_covariance() {
        let returns = correlated(40, 11);
        for target in [
            ShrinkageTarget::ConstantVariance,
            ShrinkageTarget::Diagonal,
            ShrinkageTarget::ConstantCorrelation,
        ] {
            let cov = estimator(target).estimate(&returns).unwrap();
            for i in 0..3 {
                for j in 0..3 {
                    assert_relative_eq!(cov[[i, j]], cov[[j, i]], epsilon = 1e-15);
                }
            }
            assert!(is_positive_definite(&cov));
        }
    }

    #[test]
    fn test_non_finite_rejected() {
        let returns = array![[0.01, f64::NAN], [0.02, 0.01]];
        assert!(matches!(
            LedoitWolfEstimator::default().estimate(&returns),
            Err(CovarianceError::InvalidParameter(_))
        ));
    }
}
