//! Price alignment and simple returns.
//!
//! Series are aligned on the intersection of their dates before any return is
//! taken, so every row of a [`ReturnMatrix`] spans the same interval for every
//! asset. Rows holding a non-finite return are dropped rather than patched.

use crate::error::RiskError;
use chrono::NaiveDate;
use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tangent_data::{Portfolio, PriceSeries};

/// Returns calculator configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnsConfig {
    /// Minimum number of aligned price observations (default: 2)
    pub min_observations: usize,
}

impl Default for ReturnsConfig {
    fn default() -> Self {
        Self {
            min_observations: 2,
        }
    }
}

/// Per-asset simple returns on a common date index.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnMatrix {
    symbols: Vec<String>,
    dates: Vec<NaiveDate>,
    values: Array2<f64>,
}

impl ReturnMatrix {
    /// Build a matrix from parts.
    ///
    /// `values` is `dates.len() x symbols.len()`; row `t` holds the returns
    /// ending on `dates[t]`.
    pub fn new(
        symbols: Vec<String>,
        dates: Vec<NaiveDate>,
        values: Array2<f64>,
    ) -> Result<Self, RiskError> {
        if values.nrows() != dates.len() {
            return Err(RiskError::DimensionMismatch {
                expected: dates.len(),
                actual: values.nrows(),
            });
        }
        if values.ncols() != symbols.len() {
            return Err(RiskError::DimensionMismatch {
                expected: symbols.len(),
                actual: values.ncols(),
            });
        }
        let mut seen = BTreeSet::new();
        for symbol in &symbols {
            if !seen.insert(symbol.as_str()) {
                return Err(RiskError::InvalidPortfolio(format!(
                    "{symbol} appears more than once"
                )));
            }
        }
        Ok(Self {
            symbols,
            dates,
            values,
        })
    }

    /// Asset symbols, one per column.
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Return dates, one per row.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Raw `T x N` return values.
    pub const fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Number of return periods.
    pub fn n_periods(&self) -> usize {
        self.values.nrows()
    }

    /// Number of assets.
    pub fn n_assets(&self) -> usize {
        self.values.ncols()
    }

    /// Column index of `symbol`.
    pub fn index_of(&self, symbol: &str) -> Option<usize> {
        self.symbols.iter().position(|s| s == symbol)
    }

    /// Return series of a single asset.
    pub fn column(&self, symbol: &str) -> Option<ReturnSeries> {
        let index = self.index_of(symbol)?;
        Some(ReturnSeries {
            dates: self.dates.clone(),
            values: self.values.column(index).to_owned(),
        })
    }
}

/// Dated returns of a single asset or portfolio.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReturnSeries {
    dates: Vec<NaiveDate>,
    values: Array1<f64>,
}

impl ReturnSeries {
    /// Build a series from parallel dates and returns.
    pub fn new(dates: Vec<NaiveDate>, values: Array1<f64>) -> Result<Self, RiskError> {
        if dates.len() != values.len() {
            return Err(RiskError::DimensionMismatch {
                expected: dates.len(),
                actual: values.len(),
            });
        }
        Ok(Self { dates, values })
    }

    /// Return dates.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Return values.
    pub const fn values(&self) -> &Array1<f64> {
        &self.values
    }

    /// Borrowed view of the values.
    pub fn view(&self) -> ArrayView1<'_, f64> {
        self.values.view()
    }

    /// Number of returns.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the series is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Converts price series into aligned per-asset and portfolio returns.
#[derive(Debug, Clone, Default)]
pub struct ReturnsCalculator {
    config: ReturnsConfig,
}

impl ReturnsCalculator {
    /// Create a new calculator with the given configuration
    pub const fn new(config: ReturnsConfig) -> Self {
        Self { config }
    }

    /// Dates present in every series, ascending, with the aligned prices.
    fn align(series: &[PriceSeries]) -> (Vec<NaiveDate>, Vec<Vec<f64>>) {
        let Some((first, rest)) = series.split_first() else {
            return (Vec::new(), Vec::new());
        };

        first
            .points()
            .iter()
            .filter_map(|point| {
                let mut row = Vec::with_capacity(series.len());
                row.push(point.close);
                for other in rest {
                    row.push(other.close_on(point.date)?);
                }
                Some((point.date, row))
            })
            .unzip()
    }

    /// Simple returns for every asset over the aligned dates.
    ///
    /// # Errors
    /// * [`RiskError::InvalidPortfolio`] if no series is given or a symbol repeats
    /// * [`RiskError::InsufficientHistory`] if fewer than `min_observations`
    ///   dates are common to all series, or no finite return remains
    pub fn asset_returns(&self, series: &[PriceSeries]) -> Result<ReturnMatrix, RiskError> {
        if series.is_empty() {
            return Err(RiskError::InvalidPortfolio(
                "no price series supplied".to_string(),
            ));
        }

        let symbols: Vec<String> = series.iter().map(|s| s.symbol().to_string()).collect();
        let (dates, prices) = Self::align(series);

        let required = self.config.min_observations.max(2);
        if dates.len() < required {
            return Err(RiskError::InsufficientHistory {
                required,
                actual: dates.len(),
            });
        }

        let n_assets = symbols.len();
        let mut return_dates = Vec::with_capacity(dates.len() - 1);
        let mut flat = Vec::with_capacity((dates.len() - 1) * n_assets);
        let mut dropped = 0usize;

        for (t, window) in prices.windows(2).enumerate() {
            let row: Vec<f64> = window[1]
                .iter()
                .zip(&window[0])
                .map(|(now, prev)| now / prev - 1.0)
                .collect();
            if row.iter().all(|r| r.is_finite()) {
                return_dates.push(dates[t + 1]);
                flat.extend(row);
            } else {
                dropped += 1;
            }
        }

        if dropped > 0 {
            tracing::debug!(dropped, "dropped rows with non-finite returns");
        }
        if return_dates.is_empty() {
            return Err(RiskError::InsufficientHistory {
                required: 1,
                actual: 0,
            });
        }

        tracing::debug!(
            assets = n_assets,
            aligned_dates = dates.len(),
            periods = return_dates.len(),
            "computed asset returns"
        );

        let values = Array2::from_shape_vec((return_dates.len(), n_assets), flat)
            .map_err(|e| RiskError::InvalidParameter(e.to_string()))?;
        ReturnMatrix::new(symbols, return_dates, values)
    }

    /// Weighted portfolio returns.
    ///
    /// Weights are normalized to sum to one. Assets in the matrix that the
    /// portfolio does not hold carry zero weight.
    ///
    /// # Errors
    /// [`RiskError::InvalidPortfolio`] if the portfolio names an asset missing
    /// from the matrix.
    pub fn portfolio_returns(
        &self,
        returns: &ReturnMatrix,
        portfolio: &Portfolio,
    ) -> Result<ReturnSeries, RiskError> {
        let normalized = portfolio.normalized();
        let mut weights = Array1::<f64>::zeros(returns.n_assets());

        for (symbol, &weight) in normalized.weights() {
            let index = returns.index_of(symbol).ok_or_else(|| {
                RiskError::InvalidPortfolio(format!("no return history for {symbol}"))
            })?;
            weights[index] = weight;
        }

        let values = returns.values().dot(&weights);
        ReturnSeries::new(returns.dates().to_vec(), values)
    }

    /// Per-asset and portfolio returns in one pass.
    pub fn compute(
        &self,
        series: &[PriceSeries],
        portfolio: &Portfolio,
    ) -> Result<(ReturnMatrix, ReturnSeries), RiskError> {
        let matrix = self.asset_returns(series)?;
        let portfolio_returns = self.portfolio_returns(&matrix, portfolio)?;
        Ok((matrix, portfolio_returns))
    }
}

/// Mean of each column.
pub(crate) fn column_means(values: &Array2<f64>) -> Array1<f64> {
    values
        .mean_axis(Axis(0))
        .unwrap_or_else(|| Array1::zeros(values.ncols()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn series(symbol: &str, days: &[u32], closes: &[f64]) -> PriceSeries {
        let dates: Vec<_> = days.iter().map(|&d| date(d)).collect();
        PriceSeries::from_parts(symbol, &dates, closes).unwrap()
    }

    #[test]
    fn test_simple_returns() {
        let calc = ReturnsCalculator::default();
        let matrix = calc
            .asset_returns(&[series("A", &[2, 3, 4], &[100.0, 110.0, 99.0])])
            .unwrap();

        assert_eq!(matrix.n_periods(), 2);
        assert_eq!(matrix.dates(), &[date(3), date(4)]);
        assert_relative_eq!(matrix.values()[[0, 0]], 0.10, epsilon = 1e-12);
        assert_relative_eq!(matrix.values()[[1, 0]], -0.10, epsilon = 1e-12);
    }

    #[test]
    fn test_alignment_uses_common_dates() {
        let calc = ReturnsCalculator::default();
        let a = series("A", &[2, 3, 4, 5, 8], &[10.0, 11.0, 12.0, 13.0, 14.0]);
        let b = series("B", &[2, 4, 5, 8, 9], &[20.0, 22.0, 24.0, 26.0, 28.0]);

        let matrix = calc.asset_returns(&[a, b]).unwrap();

        // Common dates: 2, 4, 5, 8
        assert_eq!(matrix.n_periods(), 3);
        assert_eq!(matrix.dates(), &[date(4), date(5), date(8)]);
        // A moves 10 -> 12 across the gap left by B's missing date
        assert_relative_eq!(matrix.values()[[0, 0]], 0.2, epsilon = 1e-12);
        assert_relative_eq!(matrix.values()[[0, 1]], 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_insufficient_history() {
        let calc = ReturnsCalculator::default();
        let a = series("A", &[2, 3], &[10.0, 11.0]);
        let b = series("B", &[4, 5], &[10.0, 11.0]);
        assert!(matches!(
            calc.asset_returns(&[a, b]),
            Err(RiskError::InsufficientHistory { required: 2, actual: 0 })
        ));

        let single = series("A", &[2], &[10.0]);
        assert!(matches!(
            calc.asset_returns(&[single]),
            Err(RiskError::InsufficientHistory { actual: 1, .. })
        ));
    }

    #[test]
    fn test_duplicate_symbols_rejected() {
        let calc = ReturnsCalculator::default();
        let a = series("A", &[2, 3, 4], &[10.0, 11.0, 12.0]);
        assert!(matches!(
            calc.asset_returns(&[a.clone(), a]),
            Err(RiskError::InvalidPortfolio(_))
        ));
        assert!(matches!(
            calc.asset_returns(&[]),
            Err(RiskError::InvalidPortfolio(_))
        ));
    }

    #[test]
    fn test_portfolio_returns_normalize_weights() {
        let calc = ReturnsCalculator::default();
        let a = series("A", &[2, 3], &[100.0, 110.0]);
        let b = series("B", &[2, 3], &[100.0, 90.0]);
        let portfolio = Portfolio::new([("A", 3.0), ("B", 1.0)]).unwrap();

        let (_, returns) = calc.compute(&[a, b], &portfolio).unwrap();
        assert_eq!(returns.len(), 1);
        assert_relative_eq!(returns.values()[0], 0.75 * 0.1 - 0.25 * 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_unheld_assets_get_zero_weight() {
        let calc = ReturnsCalculator::default();
        let a = series("A", &[2, 3], &[100.0, 110.0]);
        let b = series("B", &[2, 3], &[100.0, 90.0]);
        let portfolio = Portfolio::new([("A", 1.0)]).unwrap();

        let (_, returns) = calc.compute(&[a, b], &portfolio).unwrap();
        assert_relative_eq!(returns.values()[0], 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_unknown_ticker_is_invalid_portfolio() {
        let calc = ReturnsCalculator::default();
        let a = series("A", &[2, 3], &[100.0, 110.0]);
        let portfolio = Portfolio::new([("A", 0.5), ("ZZZ", 0.5)]).unwrap();
        assert!(matches!(
            calc.compute(&[a], &portfolio),
            Err(RiskError::InvalidPortfolio(_))
        ));
    }

    #[test]
    fn test_column_extraction() {
        let calc = ReturnsCalculator::default();
        let a = series("A", &[2, 3, 4], &[10.0, 11.0, 12.1]);
        let b = series("B", &[2, 3, 4], &[10.0, 9.0, 9.0]);
        let matrix = calc.asset_returns(&[a, b]).unwrap();

        let column = matrix.column("B").unwrap();
        assert_eq!(column.len(), 2);
        assert_relative_eq!(column.values()[1], 0.0, epsilon = 1e-12);
        assert!(matrix.column("C").is_none());
    }
}
