//! Error types for return and risk calculations.

use crate::covariance::CovarianceError;
use thiserror::Error;

/// Errors from return, metric and expected-return calculations.
#[derive(Debug, Error)]
pub enum RiskError {
    /// Too few aligned observations
    #[error("Insufficient history: need at least {required} observations, got {actual}")]
    InsufficientHistory {
        /// Required number of observations
        required: usize,
        /// Actual number of observations
        actual: usize,
    },

    /// Input that makes a statistic undefined, such as a zero-variance series
    #[error("Degenerate input: {0}")]
    DegenerateInput(String),

    /// Malformed portfolio relative to the available data
    #[error("Invalid portfolio: {0}")]
    InvalidPortfolio(String),

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

    /// Covariance estimation error
    #[error("Covariance error: {0}")]
    Covariance(#[from] CovarianceError),
}
