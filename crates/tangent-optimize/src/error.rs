//! Error types for portfolio optimization.

use thiserror::Error;

/// Errors that can occur during optimization
#[derive(Debug, Error)]
pub enum OptimizeError {
    /// Covariance matrix is singular or not positive definite
    #[error("Singular covariance: {0}")]
    SingularCovariance(String),

    /// No allocation satisfies the bounds and budget
    #[error("Infeasible constraints: {0}")]
    InfeasibleConstraints(String),

    /// Every feasible allocation has non-positive excess return
    #[error("No feasible allocation beats the risk-free rate ({max_excess:.6} at best)")]
    NoPositiveExcessReturn {
        /// Highest attainable excess return
        max_excess: f64,
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
