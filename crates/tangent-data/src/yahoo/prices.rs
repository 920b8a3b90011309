//! Price history fetching from Yahoo Finance.

use crate::error::{DataError, Result};
use crate::series::{PricePoint, PriceSeries};
use crate::source::{HistoryWindow, PriceSource};
use chrono::{DateTime, NaiveDate, NaiveTime};
use std::time::Duration;
use tokio::time::sleep;
use yahoo_finance_api as yahoo;

/// Yahoo Finance price source with rate limiting.
pub struct YahooPriceSource {
    provider: yahoo::YahooConnector,
    rate_limit_delay: Duration,
}

impl std::fmt::Debug for YahooPriceSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YahooPriceSource")
            .field("rate_limit_delay", &self.rate_limit_delay)
            .finish_non_exhaustive()
    }
}

impl YahooPriceSource {
    /// Create a new Yahoo Finance price source with default rate limiting (1 req/sec).
    pub fn new() -> Result<Self> {
        Self::with_rate_limit(Duration::from_millis(1000))
    }

    /// Create a new Yahoo Finance price source with custom rate limiting.
    pub fn with_rate_limit(rate_limit_delay: Duration) -> Result<Self> {
        Ok(Self {
            provider: yahoo::YahooConnector::new()?,
            rate_limit_delay,
        })
    }

    fn to_offset(date: NaiveDate) -> Result<time::OffsetDateTime> {
        let timestamp = date.and_time(NaiveTime::default()).and_utc().timestamp();
        time::OffsetDateTime::from_unix_timestamp(timestamp)
            .map_err(|e| DataError::TimeConversion(e.to_string()))
    }

    /// Convert Yahoo quotes into a validated series.
    ///
    /// Quotes with a missing or non-positive adjusted close are gaps in the
    /// feed and are dropped; they are never carried forward as zero prices.
    /// When Yahoo repeats a trading day the later quote wins.
    fn to_series(symbol: &str, quotes: &[yahoo::Quote]) -> Result<PriceSeries> {
        let mut points: Vec<PricePoint> = Vec::with_capacity(quotes.len());
        let mut skipped = 0usize;

        for quote in quotes {
            let date = i64::try_from(quote.timestamp)
                .ok()
                .and_then(|ts| DateTime::from_timestamp(ts, 0))
                .map(|dt| dt.date_naive())
                .ok_or_else(|| {
                    DataError::TimeConversion(format!("bad timestamp for {symbol}"))
                })?;

            if !quote.adjclose.is_finite() || quote.adjclose <= 0.0 {
                skipped += 1;
                continue;
            }

            match points.last_mut() {
                Some(last) if last.date == date => last.close = quote.adjclose,
                Some(last) if last.date > date => skipped += 1,
                _ => points.push(PricePoint::new(date, quote.adjclose)),
            }
        }

        if skipped > 0 {
            tracing::debug!(symbol, skipped, "dropped unusable Yahoo quotes");
        }

        if points.is_empty() {
            return Err(DataError::unavailable(
                symbol,
                "No usable prices returned from Yahoo Finance",
            ));
        }

        PriceSeries::new(symbol, points)
    }
}

impl PriceSource for YahooPriceSource {
    async fn fetch_series(&self, symbol: &str, window: &HistoryWindow) -> Result<PriceSeries> {
        if symbol.is_empty() {
            return Err(DataError::InvalidSymbol("Empty symbol".to_string()));
        }

        let response = match *window {
            HistoryWindow::Range { start, end } => {
                if start > end {
                    return Err(DataError::InvalidDateRange {
                        start: start.to_string(),
                        end: end.to_string(),
                    });
                }
                self.provider
                    .get_quote_history(symbol, Self::to_offset(start)?, Self::to_offset(end)?)
                    .await
            }
            HistoryWindow::Lookback(lookback) => {
                self.provider
                    .get_quote_range(symbol, "1d", lookback.as_str())
                    .await
            }
        }
        .map_err(|e| DataError::unavailable(symbol, e.to_string()))?;

        let quotes = response
            .quotes()
            .map_err(|e| DataError::unavailable(symbol, e.to_string()))?;

        let series = Self::to_series(symbol, &quotes)?;
        tracing::debug!(symbol, observations = series.len(), "fetched Yahoo price history");

        // Apply rate limiting
        sleep(self.rate_limit_delay).await;

        Ok(series)
    }

    async fn latest_price(&self, symbol: &str) -> Result<f64> {
        if symbol.is_empty() {
            return Err(DataError::InvalidSymbol("Empty symbol".to_string()));
        }

        let quote = self
            .provider
            .get_latest_quotes(symbol, "1d")
            .await
            .and_then(|response| response.last_quote())
            .map_err(|e| DataError::unavailable(symbol, e.to_string()))?;

        sleep(self.rate_limit_delay).await;

        if !quote.close.is_finite() || quote.close <= 0.0 {
            return Err(DataError::unavailable(symbol, "Yahoo returned no valid close"));
        }
        Ok(quote.close)
    }
}
