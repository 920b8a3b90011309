//! Annualized expected returns.

use crate::{TRADING_DAYS_PER_YEAR, error::RiskError, returns::ReturnMatrix};
use ndarray::{Array1, Axis};
use serde::{Deserialize, Serialize};

/// How historical returns are turned into an annual expectation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpectedReturnsMethod {
    /// Geometric growth rate: `prod(1 + r)^(252 / T) - 1`
    #[default]
    Compounded,
    /// Arithmetic mean scaled by the trading-day count
    Arithmetic,
}

/// Expected annual return per asset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpectedReturns {
    symbols: Vec<String>,
    values: Array1<f64>,
}

impl ExpectedReturns {
    /// Wrap a return vector.
    pub fn new(symbols: Vec<String>, values: Array1<f64>) -> Result<Self, RiskError> {
        if symbols.len() != values.len() {
            return Err(RiskError::DimensionMismatch {
                expected: symbols.len(),
                actual: values.len(),
            });
        }
        Ok(Self { symbols, values })
    }

    /// Asset symbols.
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Expected returns in symbol order.
    pub const fn values(&self) -> &Array1<f64> {
        &self.values
    }

    /// Expected return of `symbol`.
    pub fn get(&self, symbol: &str) -> Option<f64> {
        let index = self.symbols.iter().position(|s| s == symbol)?;
        Some(self.values[index])
    }
}

/// Annualized expected return of every asset in `returns`.
pub fn expected_returns(
    returns: &ReturnMatrix,
    method: ExpectedReturnsMethod,
    trading_days: f64,
) -> Result<ExpectedReturns, RiskError> {
    if !trading_days.is_finite() || trading_days <= 0.0 {
        return Err(RiskError::InvalidParameter(format!(
            "trading_days must be positive, got {trading_days}"
        )));
    }
    let periods = returns.n_periods();
    if periods == 0 {
        return Err(RiskError::InsufficientHistory {
            required: 1,
            actual: 0,
        });
    }

    let values = match method {
        ExpectedReturnsMethod::Arithmetic => returns
            .values()
            .mean_axis(Axis(0))
            .map(|m| m * trading_days)
            .ok_or(RiskError::InsufficientHistory {
                required: 1,
                actual: 0,
            })?,
        ExpectedReturnsMethod::Compounded => {
            let exponent = trading_days / periods as f64;
            returns
                .values()
                .map_axis(Axis(0), |column| {
                    // Log-sum keeps long histories from overflowing the product
                    let log_growth: f64 = column.iter().map(|r| r.ln_1p()).sum();
                    (log_growth * exponent).exp_m1()
                })
        }
    };

    ExpectedReturns::new(returns.symbols().to_vec(), values)
}

/// [`expected_returns`] with the default 252-day year.
pub fn annualized_expected_returns(
    returns: &ReturnMatrix,
    method: ExpectedReturnsMethod,
) -> Result<ExpectedReturns, RiskError> {
    expected_returns(returns, method, TRADING_DAYS_PER_YEAR)
}
