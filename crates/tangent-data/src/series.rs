//! Closing-price series.

use crate::error::{DataError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single dated closing price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Trading date
    pub date: NaiveDate,
    /// Closing price
    pub close: f64,
}

impl PricePoint {
    /// Create a new price point.
    pub const fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }
}

/// Closing prices for one symbol, strictly increasing by date.
///
/// Construction validates the series, so every `PriceSeries` handed to the
/// analytics crates has unique ascending dates and finite positive prices.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSeries {
    symbol: String,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Create a validated price series.
    ///
    /// # Errors
    /// * [`DataError::InvalidSymbol`] if `symbol` is blank
    /// * [`DataError::InvalidSeries`] if dates are not strictly increasing or a
    ///   price is non-finite or non-positive
    pub fn new(symbol: impl Into<String>, points: Vec<PricePoint>) -> Result<Self> {
        let symbol = symbol.into();
        if symbol.trim().is_empty() {
            return Err(DataError::InvalidSymbol("Empty symbol".to_string()));
        }

        for (i, point) in points.iter().enumerate() {
            if !point.close.is_finite() || point.close <= 0.0 {
                return Err(DataError::InvalidSeries {
                    symbol,
                    reason: format!("price {} on {} is not a positive number", point.close, point.date),
                });
            }
            if i > 0 && points[i - 1].date >= point.date {
                return Err(DataError::InvalidSeries {
                    symbol,
                    reason: format!(
                        "dates must be strictly increasing ({} followed by {})",
                        points[i - 1].date,
                        point.date
                    ),
                });
            }
        }

        Ok(Self { symbol, points })
    }

    /// Build a series from parallel date and price slices.
    pub fn from_parts(
        symbol: impl Into<String>,
        dates: &[NaiveDate],
        closes: &[f64],
    ) -> Result<Self> {
        let symbol = symbol.into();
        if dates.len() != closes.len() {
            return Err(DataError::InvalidSeries {
                symbol,
                reason: format!("{} dates but {} prices", dates.len(), closes.len()),
            });
        }
        let points = dates
            .iter()
            .zip(closes)
            .map(|(&date, &close)| PricePoint::new(date, close))
            .collect();
        Self::new(symbol, points)
    }

    /// Ticker symbol.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Dated prices in ascending date order.
    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    /// Number of observations.
    pub const fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the series has no observations.
    pub const fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Most recent observation.
    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    /// Closing price on `date`, if present.
    pub fn close_on(&self, date: NaiveDate) -> Option<f64> {
        self.points
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .map(|i| self.points[i].close)
    }

    /// Restrict the series to `start..=end`.
    pub fn between(&self, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            symbol: self.symbol.clone(),
            points: self
                .points
                .iter()
                .filter(|p| p.date >= start && p.date <= end)
                .copied()
                .collect(),
        }
    }
}

#[derive(Deserialize)]
struct RawSeries {
    symbol: String,
    points: Vec<PricePoint>,
}

impl<'de> Deserialize<'de> for PriceSeries {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = RawSeries::deserialize(deserializer)?;
        Self::new(raw.symbol, raw.points).map_err(serde::de::Error::custom)
    }
}
