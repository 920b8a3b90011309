//! Unbiased sample covariance.

use super::{CovarianceError, CovarianceEstimator};
use crate::returns::column_means;
use ndarray::{Array2, Axis};

/// Sample covariance estimator with an `n - ddof` denominator.
#[derive(Debug, Clone, Copy)]
pub struct SampleCovarianceEstimator {
    ddof: usize,
}

impl SampleCovarianceEstimator {
    /// Create an estimator with the given delta degrees of freedom.
    pub const fn new(ddof: usize) -> Self {
        Self { ddof }
    }
}

impl Default for SampleCovarianceEstimator {
    fn default() -> Self {
        Self::new(1)
    }
}

impl CovarianceEstimator for SampleCovarianceEstimator {
    fn estimate(&self, returns: &Array2<f64>) -> Result<Array2<f64>, CovarianceError> {
        let n_periods = returns.nrows();
        let required = (self.ddof + 1).max(2);
        if n_periods < required {
            return Err(CovarianceError::InsufficientData {
                required,
                actual: n_periods,
            });
        }

        let centered = returns - &column_means(returns).insert_axis(Axis(0));
        Ok(centered.t().dot(&centered) / (n_periods - self.ddof) as f64)
    }
}
