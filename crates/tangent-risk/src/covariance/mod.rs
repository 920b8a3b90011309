//! Asset covariance estimation
//!
//! Provides sample and Ledoit-Wolf shrinkage estimators for the covariance of
//! asset returns, plus the collinearity check that runs before any shrinkage
//! is applied. Shrinkage always produces a well-conditioned matrix, so a
//! duplicated or perfectly collinear asset must be caught on the raw sample
//! statistics or it would pass unnoticed into the optimizer.

pub mod ledoit_wolf;
pub mod sample;
pub mod utils;

pub use ledoit_wolf::{LedoitWolfConfig, LedoitWolfEstimator, ShrinkageTarget};
pub use sample::SampleCovarianceEstimator;
pub use utils::{
    EigenDecomposition, cholesky, cholesky_solve, condition_number, is_positive_definite,
    jacobi_eigendecomp,
};

use crate::{TRADING_DAYS_PER_YEAR, returns::ReturnMatrix, stats};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during covariance estimation
#[derive(Debug, Error)]
pub enum CovarianceError {
    /// Insufficient data for estimation
    #[error("Insufficient data: need at least {required} observations, got {actual}")]
    InsufficientData {
        /// Required number of observations
        required: usize,
        /// Actual number of observations
        actual: usize,
    },

    /// Perfectly collinear or constant assets
    #[error("Singular covariance: {} are collinear or constant", .symbols.join(", "))]
    Singular {
        /// Assets involved
        symbols: Vec<String>,
    },

    /// Matrix is not positive definite
    #[error("Covariance matrix is not positive definite (pivot {index})")]
    NotPositiveDefinite {
        /// Row at which the Cholesky factorization broke down
        index: usize,
    },

    /// Dimension mismatch
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension
        actual: usize,
    },

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Trait for covariance matrix estimators
pub trait CovarianceEstimator {
    /// Estimate the covariance matrix from asset returns
    ///
    /// # Arguments
    /// * `returns` - Matrix where each row is a time period and each column is an asset
    ///
    /// # Returns
    /// * Estimated covariance matrix (N x N where N is number of assets), per period
    fn estimate(&self, returns: &Array2<f64>) -> Result<Array2<f64>, CovarianceError>;
}

/// Which estimator [`estimate_covariance`] uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CovarianceMethod {
    /// Ledoit-Wolf shrinkage
    #[default]
    LedoitWolf,
    /// Unbiased sample covariance
    Sample,
}

/// Covariance estimation configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CovarianceConfig {
    /// Estimator (default: Ledoit-Wolf)
    pub method: CovarianceMethod,
    /// Shrinkage target for Ledoit-Wolf (default: constant variance)
    pub target: ShrinkageTarget,
    /// Periods per year used to annualize (default: 252)
    pub trading_days: f64,
    /// Smallest admissible Cholesky pivot of the sample correlation matrix (default: 1e-10)
    pub singular_tolerance: f64,
}

impl Default for CovarianceConfig {
    fn default() -> Self {
        Self {
            method: CovarianceMethod::LedoitWolf,
            target: ShrinkageTarget::ConstantVariance,
            trading_days: TRADING_DAYS_PER_YEAR,
            singular_tolerance: 1e-10,
        }
    }
}

/// Annualized covariance over named assets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CovarianceMatrix {
    symbols: Vec<String>,
    values: Array2<f64>,
    shrinkage: f64,
}

impl CovarianceMatrix {
    /// Wrap a square matrix.
    pub fn new(
        symbols: Vec<String>,
        values: Array2<f64>,
        shrinkage: f64,
    ) -> Result<Self, CovarianceError> {
        if values.nrows() != values.ncols() {
            return Err(CovarianceError::DimensionMismatch {
                expected: values.nrows(),
                actual: values.ncols(),
            });
        }
        if values.nrows() != symbols.len() {
            return Err(CovarianceError::DimensionMismatch {
                expected: symbols.len(),
                actual: values.nrows(),
            });
        }
        Ok(Self {
            symbols,
            values,
            shrinkage,
        })
    }

    /// Asset symbols in row order.
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Covariance values.
    pub const fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Shrinkage intensity applied (0 for the sample estimator).
    pub const fn shrinkage(&self) -> f64 {
        self.shrinkage
    }

    /// Per-asset volatilities.
    pub fn volatilities(&self) -> Array1<f64> {
        self.values.diag().mapv(f64::sqrt)
    }

    /// Correlation matrix implied by the covariance.
    pub fn correlation(&self) -> Array2<f64> {
        correlation_from_covariance(&self.values)
    }
}

pub(crate) fn correlation_from_covariance(cov: &Array2<f64>) -> Array2<f64> {
    let sd = cov.diag().mapv(f64::sqrt);
    let n = cov.nrows();
    Array2::from_shape_fn((n, n), |(i, j)| {
        if i == j {
            1.0
        } else {
            cov[[i, j]] / (sd[i] * sd[j])
        }
    })
}

/// Reject constant or perfectly collinear assets.
///
/// Runs on the unshrunk sample statistics. When there are fewer observations
/// than assets the sample matrix is rank deficient by construction, so only
/// constant assets and exact pairwise collinearity are reported in that case.
pub fn check_collinearity(
    returns: &Array2<f64>,
    symbols: &[String],
    tolerance: f64,
) -> Result<(), CovarianceError> {
    let (n_periods, n_assets) = returns.dim();
    let sample = SampleCovarianceEstimator::default().estimate(returns)?;
    let means = crate::returns::column_means(returns);
    let name = |i: usize| symbols.get(i).cloned().unwrap_or_else(|| format!("#{i}"));

    for i in 0..n_assets {
        if stats::is_negligible_dispersion(sample[[i, i]].max(0.0).sqrt(), means[i]) {
            return Err(CovarianceError::Singular {
                symbols: vec![name(i)],
            });
        }
    }

    let corr = correlation_from_covariance(&sample);
    for i in 0..n_assets {
        for j in (i + 1)..n_assets {
            if corr[[i, j]].abs() >= 1.0 - tolerance {
                return Err(CovarianceError::Singular {
                    symbols: vec![name(i), name(j)],
                });
            }
        }
    }

    if n_periods > n_assets {
        let mut lower = Array2::<f64>::zeros((n_assets, n_assets));
        for j in 0..n_assets {
            let pivot = corr[[j, j]] - (0..j).map(|k| lower[[j, k]].powi(2)).sum::<f64>();
            if pivot <= tolerance {
                let mut involved: Vec<String> = (0..j)
                    .filter(|&k| lower[[j, k]].abs() > 1e-12)
                    .map(name)
                    .collect();
                involved.push(name(j));
                return Err(CovarianceError::Singular { symbols: involved });
            }
            let diag = pivot.sqrt();
            lower[[j, j]] = diag;
            for i in (j + 1)..n_assets {
                let dot: f64 = (0..j).map(|k| lower[[i, k]] * lower[[j, k]]).sum();
                lower[[i, j]] = (corr[[i, j]] - dot) / diag;
            }
        }
    }

    Ok(())
}

/// Annualized covariance of the assets in `returns`.
///
/// # Errors
/// * [`CovarianceError::InsufficientData`] with fewer than two periods
/// * [`CovarianceError::Singular`] for constant or collinear assets
pub fn estimate_covariance(
    returns: &ReturnMatrix,
    config: &CovarianceConfig,
) -> Result<CovarianceMatrix, CovarianceError> {
    if !config.trading_days.is_finite() || config.trading_days <= 0.0 {
        return Err(CovarianceError::InvalidParameter(format!(
            "trading_days must be positive, got {}",
            config.trading_days
        )));
    }
    if returns.n_periods() < 2 {
        return Err(CovarianceError::InsufficientData {
            required: 2,
            actual: returns.n_periods(),
        });
    }

    check_collinearity(returns.values(), returns.symbols(), config.singular_tolerance)?;

    let (daily, shrinkage) = match config.method {
        CovarianceMethod::LedoitWolf => {
            let estimator = LedoitWolfEstimator::new(LedoitWolfConfig {
                target: config.target,
                ..Default::default()
            });
            estimator.estimate_with_intensity(returns.values())?
        }
        CovarianceMethod::Sample => (
            SampleCovarianceEstimator::default().estimate(returns.values())?,
            0.0,
        ),
    };

    let annual = daily * config.trading_days;
    cholesky(&annual)?;

    tracing::debug!(
        assets = returns.n_assets(),
        periods = returns.n_periods(),
        method = ?config.method,
        shrinkage,
        condition_number = condition_number(&annual),
        "estimated covariance"
    );

    CovarianceMatrix::new(returns.symbols().to_vec(), annual, shrinkage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use ndarray::array;

    fn matrix(symbols: &[&str], values: Array2<f64>) -> ReturnMatrix {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let dates = (0..values.nrows())
            .map(|i| start + chrono::Days::new(i as u64))
            .collect();
        ReturnMatrix::new(symbols.iter().map(|s| s.to_string()).collect(), dates, values).unwrap()
    }

    fn sample_returns() -> Array2<f64> {
        array![
            [0.010, 0.004, -0.002],
            [-0.006, 0.002, 0.005],
            [0.004, -0.003, 0.001],
            [0.012, 0.006, -0.004],
            [-0.008, -0.001, 0.003],
            [0.003, 0.005, 0.002],
            [-0.002, -0.004, -0.001],
            [0.007, 0.001, 0.004],
        ]
    }

    #[test]
    fn test_estimate_is_annualized_and_positive_definite() {
        let returns = matrix(&["A", "B", "C"], sample_returns());
        let config = CovarianceConfig {
            method: CovarianceMethod::Sample,
            ..Default::default()
        };
        let cov = estimate_covariance(&returns, &config).unwrap();
        let daily = SampleCovarianceEstimator::default()
            .estimate(returns.values())
            .unwrap();

        assert_relative_eq!(cov.values()[[0, 1]], daily[[0, 1]] * 252.0, epsilon = 1e-14);
        assert_eq!(cov.shrinkage(), 0.0);
        assert!(is_positive_definite(cov.values()));
    }

    #[test]
    fn test_ledoit_wolf_default() {
        let returns = matrix(&["A", "B", "C"], sample_returns());
        let cov = estimate_covariance(&returns, &CovarianceConfig::default()).unwrap();
        assert!((0.0..=1.0).contains(&cov.shrinkage()));
        assert!(is_positive_definite(cov.values()));
        assert_eq!(cov.symbols(), &["A", "B", "C"]);
        let corr = cov.correlation();
        assert_relative_eq!(corr[[1, 1]], 1.0);
        assert!(corr[[0, 1]].abs() < 1.0);
    }

    #[test]
    fn test_duplicate_asset_is_singular() {
        let base = sample_returns();
        let mut values = Array2::<f64>::zeros((base.nrows(), 4));
        values.slice_mut(ndarray::s![.., 0..3]).assign(&base);
        values.column_mut(3).assign(&base.column(1));

        let returns = matrix(&["A", "B", "C", "B2"], values);
        match estimate_covariance(&returns, &CovarianceConfig::default()) {
            Err(CovarianceError::Singular { symbols }) => {
                assert_eq!(symbols, vec!["B".to_string(), "B2".to_string()]);
            }
            other => panic!("expected singular covariance, got {other:?}"),
        }
    }

    #[test]
    fn test_linear_combination_is_singular() {
        let base = sample_returns();
        let mut values = Array2::<f64>::zeros((base.nrows(), 4));
        values.slice_mut(ndarray::s![.., 0..3]).assign(&base);
        let combo = &base.column(0) * 0.5 + &base.column(2) * 0.5;
        values.column_mut(3).assign(&combo);

        let returns = matrix(&["A", "B", "C", "D"], values);
        match estimate_covariance(&returns, &CovarianceConfig::default()) {
            Err(CovarianceError::Singular { symbols }) => {
                assert!(symbols.contains(&"D".to_string()));
            }
            other => panic!("expected singular covariance, got {other:?}"),
        }
    }

    #[test]
    fn test_constant_asset_is_singular() {
        let mut values = sample_returns();
        values.column_mut(2).fill(0.001);
        let returns = matrix(&["A", "B", "C"], values);
        match estimate_covariance(&returns, &CovarianceConfig::default()) {
            Err(CovarianceError::Singular { symbols }) => assert_eq!(symbols, vec!["C"]),
            other => panic!("expected singular covariance, got {other:?}"),
        }
    }

    #[test]
    fn test_insufficient_periods() {
        let returns = matrix(&["A"], array![[0.01]]);
        assert!(matches!(
            estimate_covariance(&returns, &CovarianceConfig::default()),
            Err(CovarianceError::InsufficientData { .. })
        ));
    }

    #[test]
    fn test_volatilities() {
        let cov = CovarianceMatrix::new(
            vec!["A".into(), "B".into()],
            array![[0.04, 0.0], [0.0, 0.09]],
            0.0,
        )
        .unwrap();
        assert_relative_eq!(cov.volatilities()[0], 0.2, epsilon = 1e-12);
        assert_relative_eq!(cov.volatilities()[1], 0.3, epsilon = 1e-12);
        assert!(CovarianceMatrix::new(vec!["A".into()], array![[1.0, 0.0]], 0.0).is_err());
    }
}
