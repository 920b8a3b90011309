//! Risk metrics over a daily return series.
//!
//! All statistics use the sample standard deviation (`n - 1` denominator) and
//! are annualized with a trading-day count. A series with no measurable
//! dispersion is rejected instead of yielding an infinite or `NaN` ratio.

use crate::{TRADING_DAYS_PER_YEAR, error::RiskError, stats};
use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

/// Value-at-Risk methodology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VarMethod {
    /// Parametric normal quantile: `Phi^-1(1 - confidence) * std + mean`
    #[default]
    Gaussian,
    /// Empirical `1 - confidence` quantile of the observed returns
    Historical,
}

/// Risk metrics configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskMetricsConfig {
    /// Annual risk-free rate (default: 0.02)
    pub risk_free_rate: f64,
    /// VaR confidence level, strictly between 0 and 1 (default: 0.95)
    pub confidence: f64,
    /// Trading days per year (default: 252)
    pub trading_days: f64,
    /// VaR methodology (default: Gaussian)
    pub var_method: VarMethod,
}

impl Default for RiskMetricsConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.02,
            confidence: 0.95,
            trading_days: TRADING_DAYS_PER_YEAR,
            var_method: VarMethod::Gaussian,
        }
    }
}

/// Summary risk statistics of a portfolio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskMetrics {
    /// Annualized Sharpe ratio
    pub sharpe_ratio: f64,
    /// Annualized volatility
    pub volatility: f64,
    /// One-period Value-at-Risk as a return quantile (negative means loss)
    pub value_at_risk: f64,
}

/// Computes Sharpe ratio, volatility and Value-at-Risk.
#[derive(Debug, Clone, Default)]
pub struct RiskMetricsEngine {
    config: RiskMetricsConfig,
}

impl RiskMetricsEngine {
    /// Create a new engine with the given configuration
    pub const fn new(config: RiskMetricsConfig) -> Self {
        Self { config }
    }

    /// Engine configuration.
    pub const fn config(&self) -> &RiskMetricsConfig {
        &self.config
    }

    fn validate(&self) -> Result<(), RiskError> {
        let c = &self.config;
        if c.confidence.is_nan() || c.confidence <= 0.0 || c.confidence >= 1.0 {
            return Err(RiskError::InvalidParameter(format!(
                "confidence must be in (0, 1), got {}",
                c.confidence
            )));
        }
        if !c.trading_days.is_finite() || c.trading_days <= 0.0 {
            return Err(RiskError::InvalidParameter(format!(
                "trading_days must be positive, got {}",
                c.trading_days
            )));
        }
        if !c.risk_free_rate.is_finite() {
            return Err(RiskError::InvalidParameter(
                "risk_free_rate must be finite".to_string(),
            ));
        }
        Ok(())
    }

    /// Sample mean and standard deviation.
    fn moments(&self, returns: ArrayView1<'_, f64>) -> Result<(f64, f64), RiskError> {
        self.validate()?;
        if returns.len() < 2 {
            return Err(RiskError::InsufficientHistory {
                required: 2,
                actual: returns.len(),
            });
        }
        if returns.iter().any(|r| !r.is_finite()) {
            return Err(RiskError::DegenerateInput(
                "return series contains non-finite values".to_string(),
            ));
        }
        let mean = returns.mean().unwrap_or_default();
        let std = returns.std(1.0);
        Ok((mean, std))
    }

    /// Annualized volatility: `std * sqrt(trading_days)`.
    pub fn volatility(&self, returns: ArrayView1<'_, f64>) -> Result<f64, RiskError> {
        let (_, std) = self.moments(returns)?;
        Ok(std * self.config.trading_days.sqrt())
    }

    /// Annualized Sharpe ratio: `sqrt(252) * (mean - rf / 252) / std`.
    ///
    /// # Errors
    /// [`RiskError::DegenerateInput`] if the returns have zero variance.
    pub fn sharpe_ratio(&self, returns: ArrayView1<'_, f64>) -> Result<f64, RiskError> {
        let (mean, std) = self.moments(returns)?;
        if stats::is_negligible_dispersion(std, mean) {
            return Err(RiskError::DegenerateInput(format!(
                "return series has zero variance (mean {mean:.6}), Sharpe ratio is undefined"
            )));
        }
        let days = self.config.trading_days;
        let excess = mean - self.config.risk_free_rate / days;
        Ok(days.sqrt() * excess / std)
    }

    /// One-period Value-at-Risk at the configured confidence.
    pub fn value_at_risk(&self, returns: ArrayView1<'_, f64>) -> Result<f64, RiskError> {
        let (mean, std) = self.moments(returns)?;
        let tail = 1.0 - self.config.confidence;
        match self.config.var_method {
            VarMethod::Gaussian => {
                let normal = Normal::new(0.0, 1.0)
                    .map_err(|e| RiskError::InvalidParameter(e.to_string()))?;
                Ok(normal.inverse_cdf(tail) * std + mean)
            }
            VarMethod::Historical => stats::quantile(returns, tail).ok_or(
                RiskError::InsufficientHistory {
                    required: 2,
                    actual: 0,
                },
            ),
        }
    }

    /// All metrics at once; fails if any single metric is undefined.
    pub fn evaluate(&self, returns: ArrayView1<'_, f64>) -> Result<RiskMetrics, RiskError> {
        let metrics = RiskMetrics {
            sharpe_ratio: self.sharpe_ratio(returns)?,
            volatility: self.volatility(returns)?,
            value_at_risk: self.value_at_risk(returns)?,
        };
        tracing::debug!(
            sharpe = metrics.sharpe_ratio,
            volatility = metrics.volatility,
            var = metrics.value_at_risk,
            observations = returns.len(),
            "evaluated risk metrics"
        );
        Ok(metrics)
    }
}
