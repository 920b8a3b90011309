//! In-memory price source.
//!
//! Backs offline analysis and tests. Series can be loaded from a JSON price
//! file shaped as `{ "AAPL": [{"date": "2023-01-03", "close": 125.07}, ...] }`.

use crate::error::{DataError, Result};
use crate::series::{PricePoint, PriceSeries};
use crate::source::{HistoryWindow, PriceSource};
use std::collections::BTreeMap;
use std::path::Path;

/// Price source serving pre-loaded series.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPriceSource {
    series: BTreeMap<String, PriceSeries>,
}

impl InMemoryPriceSource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a source from already-validated series.
    pub fn from_series(series: impl IntoIterator<Item = PriceSeries>) -> Self {
        Self {
            series: series
                .into_iter()
                .map(|s| (s.symbol().to_string(), s))
                .collect(),
        }
    }

    /// Add or replace a series.
    pub fn insert(&mut self, series: PriceSeries) {
        self.series.insert(series.symbol().to_string(), series);
    }

    /// Parse a JSON price document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: BTreeMap<String, Vec<PricePoint>> = serde_json::from_str(json)?;
        let series = raw
            .into_iter()
            .map(|(symbol, points)| PriceSeries::new(symbol, points))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::from_series(series))
    }

    /// Load a JSON price file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Symbols this source can serve.
    pub fn symbols(&self) -> Vec<String> {
        self.series.keys().cloned().collect()
    }

    fn lookup(&self, symbol: &str) -> Result<&PriceSeries> {
        self.series
            .get(symbol)
            .ok_or_else(|| DataError::unavailable(symbol, "symbol not present in price data"))
    }

    /// Synchronous form of [`PriceSource::fetch_series`].
    pub fn series(&self, symbol: &str, window: &HistoryWindow) -> Result<PriceSeries> {
        let full = self.lookup(symbol)?;
        let windowed = match *window {
            HistoryWindow::Range { start, end } => full.between(start, end),
            HistoryWindow::Lookback(lookback) => {
                let Some(last) = full.last() else {
                    return Err(DataError::unavailable(symbol, "series is empty"));
                };
                match lookback.start_from(last.date) {
                    Some(start) => full.between(start, last.date),
                    None => full.clone(),
                }
            }
        };

        if windowed.is_empty() {
            return Err(DataError::unavailable(
                symbol,
                "no observations inside the requested window",
            ));
        }
        Ok(windowed)
    }
}

impl PriceSource for InMemoryPriceSource {
    async fn fetch_series(&self, symbol: &str, window: &HistoryWindow) -> Result<PriceSeries> {
        self.series(symbol, window)
    }

    async fn latest_price(&self, symbol: &str) -> Result<f64> {
        self.lookup(symbol)?
            .last()
            .map(|p| p.close)
            .ok_or_else(|| DataError::unavailable(symbol, "series is empty"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Lookback;
    use chrono::NaiveDate;

    const PRICES: &str = r#"{
        "AAPL": [
            {"date": "2023-06-01", "close": 180.0},
            {"date": "2023-12-01", "close": 190.0},
            {"date": "2024-01-02", "close": 185.0}
        ]
    }"#;

    #[tokio::test]
    async fn test_fetch_range() {
        let source = InMemoryPriceSource::from_json_str(PRICES).unwrap();
        let window = HistoryWindow::range(
            NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        )
        .unwrap();
        let series = source.fetch_series("AAPL", &window).await.unwrap();
        assert_eq!(series.len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_lookback_counts_back_from_last_observation() {
        let source = InMemoryPriceSource::from_json_str(PRICES).unwrap();
        let series = source
            .fetch_series("AAPL", &HistoryWindow::Lookback(Lookback::OneMonth))
            .await
            .unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series.points()[0].close, 185.0);
    }

    #[tokio::test]
    async fn test_unknown_symbol_is_unavailable() {
        let source = InMemoryPriceSource::from_json_str(PRICES).unwrap();
        let result = source
            .fetch_series("MSFT", &HistoryWindow::Lookback(Lookback::Max))
            .await;
        assert!(matches!(result, Err(DataError::DataUnavailable { .. })));
        assert!(matches!(
            source.latest_price("MSFT").await,
            Err(DataError::DataUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_empty_window_is_unavailable() {
        let source = InMemoryPriceSource::from_json_str(PRICES).unwrap();
        let window = HistoryWindow::range(
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2020, 12, 31).unwrap(),
        )
        .unwrap();
        assert!(matches!(
            source.fetch_series("AAPL", &window).await,
            Err(DataError::DataUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_latest_price() {
        let source = InMemoryPriceSource::from_json_str(PRICES).unwrap();
        assert_eq!(source.latest_price("AAPL").await.unwrap(), 185.0);
    }

    #[test]
    fn test_invalid_file_contents_rejected() {
        let bad = r#"{"AAPL": [{"date": "2023-06-01", "close": -1.0}]}"#;
        assert!(matches!(
            InMemoryPriceSource::from_json_str(bad),
            Err(DataError::InvalidSeries { .. })
        ));
    }
}
