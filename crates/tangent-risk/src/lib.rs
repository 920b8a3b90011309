#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/tangent/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod covariance;
pub mod error;
pub mod expected;
pub mod metrics;
pub mod returns;
pub mod stats;

// Re-export main types
pub use covariance::{
    CovarianceConfig, CovarianceError, CovarianceEstimator, CovarianceMatrix, CovarianceMethod,
    LedoitWolfEstimator, SampleCovarianceEstimator, ShrinkageTarget, estimate_covariance,
};
pub use error::RiskError;
pub use expected::{
    ExpectedReturns, ExpectedReturnsMethod, annualized_expected_returns, expected_returns,
};
pub use metrics::{RiskMetrics, RiskMetricsConfig, RiskMetricsEngine, VarMethod};
pub use returns::{ReturnMatrix, ReturnSeries, ReturnsCalculator, ReturnsConfig};

/// Trading days per year used to annualize daily statistics.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;
