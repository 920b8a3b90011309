//! Portfolio inputs: weight mappings and share-count holdings.

use crate::error::{DataError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Mapping from symbol to portfolio weight.
///
/// Weights need not be normalized, and individual weights may be negative
/// (short positions), but every weight is finite and the total is strictly
/// positive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, f64>",
    into = "BTreeMap<String, f64>"
)]
pub struct Portfolio {
    weights: BTreeMap<String, f64>,
}

impl Portfolio {
    /// Create a validated portfolio from `(symbol, weight)` pairs.
    ///
    /// # Errors
    /// [`DataError::InvalidPortfolio`] if the portfolio is empty, a symbol is
    /// blank or repeated, a weight is non-finite, or the total weight is not
    /// strictly positive.
    pub fn new<I, S>(weights: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut map = BTreeMap::new();
        for (symbol, weight) in weights {
            let symbol = symbol.into();
            if symbol.trim().is_empty() {
                return Err(DataError::InvalidPortfolio("empty symbol".to_string()));
            }
            if !weight.is_finite() {
                return Err(DataError::InvalidPortfolio(format!(
                    "weight for {symbol} is not finite"
                )));
            }
            if map.insert(symbol.clone(), weight).is_some() {
                return Err(DataError::InvalidPortfolio(format!(
                    "{symbol} appears more than once"
                )));
            }
        }

        if map.is_empty() {
            return Err(DataError::InvalidPortfolio(
                "portfolio has no assets".to_string(),
            ));
        }

        let total: f64 = map.values().sum();
        if !total.is_finite() || total <= 0.0 {
            return Err(DataError::InvalidPortfolio(format!(
                "total weight must be positive, got {total}"
            )));
        }

        Ok(Self { weights: map })
    }

    /// Symbols in ascending order.
    pub fn symbols(&self) -> Vec<String> {
        self.weights.keys().cloned().collect()
    }

    /// Weight of `symbol`, if held.
    pub fn weight(&self, symbol: &str) -> Option<f64> {
        self.weights.get(symbol).copied()
    }

    /// All weights keyed by symbol.
    pub const fn weights(&self) -> &BTreeMap<String, f64> {
        &self.weights
    }

    /// Number of assets.
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Always false; a portfolio holds at least one asset.
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Sum of all weights.
    pub fn total_weight(&self) -> f64 {
        self.weights.values().sum()
    }

    /// Copy of the portfolio rescaled so weights sum to 1.
    pub fn normalized(&self) -> Self {
        let total = self.total_weight();
        Self {
            weights: self
                .weights
                .iter()
                .map(|(s, w)| (s.clone(), w / total))
                .collect(),
        }
    }
}

impl TryFrom<BTreeMap<String, f64>> for Portfolio {
    type Error = DataError;

    fn try_from(weights: BTreeMap<String, f64>) -> Result<Self> {
        Self::new(weights)
    }
}

impl From<Portfolio> for BTreeMap<String, f64> {
    fn from(portfolio: Portfolio) -> Self {
        portfolio.weights
    }
}

/// Share counts per symbol.
///
/// Holdings are converted to a value-weighted [`Portfolio`] with current
/// prices before any analysis runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holdings {
    shares: BTreeMap<String, f64>,
}

impl Holdings {
    /// Create validated holdings from `(symbol, shares)` pairs.
    ///
    /// Share counts must be finite and strictly positive.
    pub fn new<I, S>(shares: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut map = BTreeMap::new();
        for (symbol, count) in shares {
            let symbol = symbol.into();
            if symbol.trim().is_empty() {
                return Err(DataError::InvalidPortfolio("empty symbol".to_string()));
            }
            if !count.is_finite() || count <= 0.0 {
                return Err(DataError::InvalidPortfolio(format!(
                    "share count for {symbol} must be positive, got {count}"
                )));
            }
            *map.entry(symbol).or_insert(0.0) += count;
        }

        if map.is_empty() {
            return Err(DataError::InvalidPortfolio(
                "holdings have no assets".to_string(),
            ));
        }

        Ok(Self { shares: map })
    }

    /// Symbols in ascending order.
    pub fn symbols(&self) -> Vec<String> {
        self.shares.keys().cloned().collect()
    }

    /// Share counts keyed by symbol.
    pub const fn shares(&self) -> &BTreeMap<String, f64> {
        &self.shares
    }

    /// Market value of every position, keyed by symbol.
    ///
    /// # Errors
    /// * [`DataError::DataUnavailable`] if a price is missing
    /// * [`DataError::InvalidPortfolio`] if a price is non-finite or non-positive
    pub fn position_values(&self, prices: &BTreeMap<String, f64>) -> Result<BTreeMap<String, f64>> {
        self.shares
            .iter()
            .map(|(symbol, &count)| {
                let price = prices
                    .get(symbol)
                    .copied()
                    .ok_or_else(|| DataError::unavailable(symbol, "no current price"))?;
                if !price.is_finite() || price <= 0.0 {
                    return Err(DataError::InvalidPortfolio(format!(
                        "price for {symbol} must be positive, got {price}"
                    )));
                }
                Ok((symbol.clone(), count * price))
            })
            .collect()
    }

    /// Total market value.
    pub fn market_value(&self, prices: &BTreeMap<String, f64>) -> Result<f64> {
        Ok(self.position_values(prices)?.values().sum())
    }

    /// Convert to value weights (`shares * price / total value`).
    pub fn to_portfolio(&self, prices: &BTreeMap<String, f64>) -> Result<Portfolio> {
        let values = self.position_values(prices)?;
        let total: f64 = values.values().sum();
        Portfolio::new(values.into_iter().map(|(s, v)| (s, v / total)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_portfolio_validation() {
        assert!(Portfolio::new([("AAPL", 0.4), ("GOOGL", 0.3), ("TSLA", 0.3)]).is_ok());
        assert!(matches!(
            Portfolio::new(Vec::<(String, f64)>::new()),
            Err(DataError::InvalidPortfolio(_))
        ));
        assert!(matches!(
            Portfolio::new([("AAPL", f64::NAN)]),
            Err(DataError::InvalidPortfolio(_))
        ));
        assert!(matches!(
            Portfolio::new([("AAPL", 0.5), ("MSFT", -0.5)]),
            Err(DataError::InvalidPortfolio(_))
        ));
        assert!(matches!(
            Portfolio::new([("AAPL", 0.5), ("AAPL", 0.5)]),
            Err(DataError::InvalidPortfolio(_))
        ));
    }

    #[test]
    fn test_short_positions_allowed_when_total_positive() {
        let portfolio = Portfolio::new([("AAPL", 1.3), ("MSFT", -0.3)]).unwrap();
        assert_relative_eq!(portfolio.total_weight(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_normalized() {
        let portfolio = Portfolio::new([("A", 40.0), ("B", 60.0)]).unwrap().normalized();
        assert_relative_eq!(portfolio.weight("A").unwrap(), 0.4, epsilon = 1e-12);
        assert_relative_eq!(portfolio.weight("B").unwrap(), 0.6, epsilon = 1e-12);
    }

    #[test]
    fn test_portfolio_serde_validates() {
        let ok: Portfolio = serde_json::from_str(r#"{"AAPL": 0.5, "MSFT": 0.5}"#).unwrap();
        assert_eq!(ok.len(), 2);
        assert!(serde_json::from_str::<Portfolio>(r#"{"AAPL": 0.0}"#).is_err());
    }

    #[test]
    fn test_holdings_to_portfolio() {
        let holdings = Holdings::new([("AAPL", 10.0), ("MSFT", 5.0)]).unwrap();
        let prices = BTreeMap::from([("AAPL".to_string(), 100.0), ("MSFT".to_string(), 300.0)]);

        assert_relative_eq!(holdings.market_value(&prices).unwrap(), 2500.0);
        let portfolio = holdings.to_portfolio(&prices).unwrap();
        assert_relative_eq!(portfolio.weight("AAPL").unwrap(), 0.4, epsilon = 1e-12);
        assert_relative_eq!(portfolio.weight("MSFT").unwrap(), 0.6, epsilon = 1e-12);
    }

    #[test]
    fn test_holdings_missing_price_is_unavailable_not_zero() {
        let holdings = Holdings::new([("AAPL", 10.0), ("MSFT", 5.0)]).unwrap();
        let prices = BTreeMap::from([("AAPL".to_string(), 100.0)]);
        assert!(matches!(
            holdings.to_portfolio(&prices),
            Err(DataError::DataUnavailable { symbol, .. }) if symbol == "MSFT"
        ));

        let zero = BTreeMap::from([("AAPL".to_string(), 100.0), ("MSFT".to_string(), 0.0)]);
        assert!(matches!(
            holdings.to_portfolio(&zero),
            Err(DataError::InvalidPortfolio(_))
        ));
    }

    #[test]
    fn test_holdings_merge_repeated_symbols() {
        let holdings = Holdings::new([("AAPL", 1.0), ("AAPL", 2.0)]).unwrap();
        assert_eq!(holdings.shares().get("AAPL"), Some(&3.0));
        assert!(Holdings::new([("AAPL", 0.0)]).is_err());
    }
}
