//! The price-source contract.

use crate::error::{DataError, Result};
use crate::series::PriceSeries;
use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::str::FromStr;

/// Relative history window, counted back from the most recent observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lookback {
    /// One month
    #[serde(rename = "1mo")]
    OneMonth,
    /// Six months
    #[serde(rename = "6mo")]
    SixMonths,
    /// One year
    #[serde(rename = "1y")]
    OneYear,
    /// Two years
    #[serde(rename = "2y")]
    TwoYears,
    /// Five years
    #[serde(rename = "5y")]
    FiveYears,
    /// Everything available
    #[serde(rename = "max")]
    Max,
}

impl Lookback {
    /// Range string understood by Yahoo Finance.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::OneMonth => "1mo",
            Self::SixMonths => "6mo",
            Self::OneYear => "1y",
            Self::TwoYears => "2y",
            Self::FiveYears => "5y",
            Self::Max => "max",
        }
    }

    /// First date covered when the window ends on `end`, or `None` for [`Lookback::Max`].
    pub fn start_from(&self, end: NaiveDate) -> Option<NaiveDate> {
        let months = match self {
            Self::OneMonth => 1,
            Self::SixMonths => 6,
            Self::OneYear => 12,
            Self::TwoYears => 24,
            Self::FiveYears => 60,
            Self::Max => return None,
        };
        end.checked_sub_months(Months::new(months))
            .and_then(|d| d.checked_add_days(Days::new(1)))
    }
}

impl fmt::Display for Lookback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Lookback {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "1mo" => Ok(Self::OneMonth),
            "6mo" => Ok(Self::SixMonths),
            "1y" => Ok(Self::OneYear),
            "2y" => Ok(Self::TwoYears),
            "5y" => Ok(Self::FiveYears),
            "max" => Ok(Self::Max),
            other => Err(format!(
                "unknown lookback '{other}' (expected 1mo, 6mo, 1y, 2y, 5y or max)"
            )),
        }
    }
}

/// Which part of a symbol's history to retrieve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryWindow {
    /// Inclusive calendar range
    Range {
        /// First date
        start: NaiveDate,
        /// Last date
        end: NaiveDate,
    },
    /// Relative window ending at the latest available observation
    Lookback(Lookback),
}

impl HistoryWindow {
    /// Create a validated calendar range.
    pub fn range(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(DataError::InvalidDateRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self::Range { start, end })
    }
}

impl Default for HistoryWindow {
    /// Calendar year 2023.
    fn default() -> Self {
        Self::Range {
            start: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or_default(),
            end: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default(),
        }
    }
}

/// Anything that can provide price history and current prices.
///
/// Implementations return either a complete, validated series or
/// [`DataError::DataUnavailable`]. Missing observations are never replaced by
/// placeholder values.
pub trait PriceSource {
    /// Fetch closing prices for `symbol` over `window`.
    fn fetch_series(
        &self,
        symbol: &str,
        window: &HistoryWindow,
    ) -> impl Future<Output = Result<PriceSeries>>;

    /// Fetch the most recent closing price for `symbol`.
    fn latest_price(&self, symbol: &str) -> impl Future<Output = Result<f64>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1mo", Lookback::OneMonth)]
    #[case("6MO", Lookback::SixMonths)]
    #[case("1y", Lookback::OneYear)]
    #[case("2y", Lookback::TwoYears)]
    #[case("5y", Lookback::FiveYears)]
    #[case("max", Lookback::Max)]
    fn test_lookback_parse(#[case] input: &str, #[case] expected: Lookback) {
        assert_eq!(input.parse::<Lookback>().unwrap(), expected);
    }

    #[test]
    fn test_lookback_rejects_unknown() {
        assert!("3w".parse::<Lookback>().is_err());
    }

    #[test]
    fn test_lookback_start() {
        let end = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
        assert_eq!(
            Lookback::OneYear.start_from(end),
            NaiveDate::from_ymd_opt(2023, 4, 1)
        );
        assert_eq!(Lookback::Max.start_from(end), None);
    }

    #[test]
    fn test_range_validation() {
        let a = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let b = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        assert!(matches!(
            HistoryWindow::range(a, b),
            Err(DataError::InvalidDateRange { .. })
        ));
        assert!(HistoryWindow::range(b, a).is_ok());
    }

    #[test]
    fn test_default_window() {
        match HistoryWindow::default() {
            HistoryWindow::Range { start, end } => {
                assert_eq!(start, NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
                assert_eq!(end, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
            }
            HistoryWindow::Lookback(_) => panic!("expected a calendar range"),
        }
    }
}
