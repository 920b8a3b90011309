//! Error types for data operations.

use thiserror::Error;

/// Result type for data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur during data operations.
#[derive(Debug, Error)]
pub enum DataError {
    /// No usable price history or quote could be retrieved for a symbol
    #[error("Data unavailable for {symbol}: {reason}")]
    DataUnavailable {
        /// Symbol that was queried
        symbol: String,
        /// Reason the data is unavailable
        reason: String,
    },

    /// Malformed portfolio or holdings input
    #[error("Invalid portfolio: {0}")]
    InvalidPortfolio(String),

    /// Price series violates ordering or value constraints
    #[error("Invalid price series for {symbol}: {reason}")]
    InvalidSeries {
        /// Symbol of the offending series
        symbol: String,
        /// What was wrong with it
        reason: String,
    },

    /// Invalid date range
    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidDateRange {
        /// Start date of the range
        start: String,
        /// End date of the range
        end: String,
    },

    /// Invalid symbol
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    /// Yahoo Finance API error
    #[error("Yahoo Finance API error: {0}")]
    YahooApi(String),

    /// Time conversion error
    #[error("Time conversion error: {0}")]
    TimeConversion(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DataError {
    /// Shorthand for [`DataError::DataUnavailable`].
    pub fn unavailable(symbol: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DataUnavailable {
            symbol: symbol.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(feature = "yahoo")]
impl From<yahoo_finance_api::YahooError> for DataError {
    fn from(err: yahoo_finance_api::YahooError) -> Self {
        Self::YahooApi(err.to_string())
    }
}
