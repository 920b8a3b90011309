//! Unified error type.
//!
//! Every component crate has its own error enum. [`Error`] wraps them all and
//! [`Error::kind`] maps each variant onto a small, stable [`ErrorKind`] so
//! callers can branch on the failure class without matching message text.

use std::fmt;
use tangent_data::DataError;
use tangent_optimize::OptimizeError;
use tangent_risk::{CovarianceError, RiskError};
use tangent_sim::SimulationError;
use thiserror::Error;

/// Result type for Tangent operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure classes surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Price history or a quote could not be obtained
    DataUnavailable,
    /// Too few aligned observations for the requested statistic
    InsufficientHistory,
    /// Inputs without measurable dispersion or without a meaningful optimum
    DegenerateInput,
    /// Covariance matrix is singular or assets are collinear
    SingularCovariance,
    /// No allocation satisfies the weight bounds and budget
    InfeasibleConstraints,
    /// Malformed portfolio weights or holdings
    InvalidPortfolio,
    /// Bad configuration value or argument
    InvalidInput,
    /// Filesystem failure
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::DataUnavailable => "data unavailable",
            Self::InsufficientHistory => "insufficient history",
            Self::DegenerateInput => "degenerate input",
            Self::SingularCovariance => "singular covariance",
            Self::InfeasibleConstraints => "infeasible constraints",
            Self::InvalidPortfolio => "invalid portfolio",
            Self::InvalidInput => "invalid input",
            Self::Io => "io",
        };
        f.write_str(name)
    }
}

/// Errors from any Tangent component.
#[derive(Debug, Error)]
pub enum Error {
    /// Price data error
    #[error(transparent)]
    Data(#[from] DataError),

    /// Returns or risk metrics error
    #[error(transparent)]
    Risk(#[from] RiskError),

    /// Covariance estimation error
    #[error(transparent)]
    Covariance(#[from] CovarianceError),

    /// Optimization error
    #[error(transparent)]
    Optimize(#[from] OptimizeError),

    /// Simulation error
    #[error(transparent)]
    Simulation(#[from] SimulationError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Failure class of this error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Data(e) => data_kind(e),
            Self::Risk(e) => risk_kind(e),
            Self::Covariance(e) => covariance_kind(e),
            Self::Optimize(e) => match e {
                OptimizeError::SingularCovariance(_) => ErrorKind::SingularCovariance,
                OptimizeError::InfeasibleConstraints(_) => ErrorKind::InfeasibleConstraints,
                OptimizeError::NoPositiveExcessReturn { .. } => ErrorKind::DegenerateInput,
                OptimizeError::DimensionMismatch { .. } | OptimizeError::InvalidParameter(_) => {
                    ErrorKind::InvalidInput
                }
            },
            Self::Simulation(SimulationError::InvalidParameter(_))
            | Self::Config(_)
            | Self::Serialization(_) => ErrorKind::InvalidInput,
            Self::Io(_) => ErrorKind::Io,
        }
    }
}

const fn data_kind(err: &DataError) -> ErrorKind {
    match err {
        DataError::DataUnavailable { .. }
        | DataError::YahooApi(_)
        | DataError::TimeConversion(_) => ErrorKind::DataUnavailable,
        DataError::InvalidPortfolio(_) => ErrorKind::InvalidPortfolio,
        DataError::InvalidSeries { .. }
        | DataError::InvalidDateRange { .. }
        | DataError::InvalidSymbol(_)
        | DataError::Serialization(_) => ErrorKind::InvalidInput,
        DataError::Io(_) => ErrorKind::Io,
    }
}

const fn risk_kind(err: &RiskError) -> ErrorKind {
    match err {
        RiskError::InsufficientHistory { .. } => ErrorKind::InsufficientHistory,
        RiskError::DegenerateInput(_) => ErrorKind::DegenerateInput,
        RiskError::InvalidPortfolio(_) => ErrorKind::InvalidPortfolio,
        RiskError::DimensionMismatch { .. } | RiskError::InvalidParameter(_) => {
            ErrorKind::InvalidInput
        }
        RiskError::Covariance(e) => covariance_kind(e),
    }
}

const fn covariance_kind(err: &CovarianceError) -> ErrorKind {
    match err {
        CovarianceError::InsufficientData { .. } => ErrorKind::InsufficientHistory,
        CovarianceError::Singular { .. } | CovarianceError::NotPositiveDefinite { .. } => {
            ErrorKind::SingularCovariance
        }
        CovarianceError::DimensionMismatch { .. } | CovarianceError::InvalidParameter(_) => {
            ErrorKind::InvalidInput
        }
    }
}
