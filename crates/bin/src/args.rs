//! Argument parsing helpers.

use chrono::NaiveDate;
use tangent::data::{DataError, HistoryWindow, Lookback};

/// Parse a `TICKER=VALUE` position.
///
/// The ticker is upper-cased. The value is a weight or a share count
/// depending on the command.
pub(crate) fn parse_position(arg: &str) -> Result<(String, f64), String> {
    let (symbol, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected TICKER=VALUE, got '{arg}'"))?;
    let symbol = symbol.trim();
    if symbol.is_empty() {
        return Err(format!("missing ticker in '{arg}'"));
    }
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid number '{}' for {symbol}", value.trim()))?;
    if !value.is_finite() {
        return Err(format!("value for {symbol} must be finite"));
    }
    Ok((symbol.to_uppercase(), value))
}

/// History window from command-line flags, if any were given.
///
/// An explicit range takes precedence over the config file, as does a lookback.
pub(crate) fn history_window(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    lookback: Option<Lookback>,
) -> Result<Option<HistoryWindow>, DataError> {
    match (start, end, lookback) {
        (Some(start), Some(end), _) => HistoryWindow::range(start, end).map(Some),
        (_, _, Some(lookback)) => Ok(Some(HistoryWindow::Lookback(lookback))),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("AAPL=0.4", "AAPL", 0.4)]
    #[case("googl=30", "GOOGL", 30.0)]
    #[case(" MSFT = 1e-2 ", "MSFT", 0.01)]
    #[case("BRK-B=-0.1", "BRK-B", -0.1)]
    fn test_parse_position(#[case] arg: &str, #[case] symbol: &str, #[case] value: f64) {
        assert_eq!(parse_position(arg).unwrap(), (symbol.to_string(), value));
    }

    #[rstest]
    #[case("AAPL")]
    #[case("=0.5")]
    #[case("AAPL=")]
    #[case("AAPL=abc")]
    #[case("AAPL=inf")]
    fn test_parse_position_rejects(#[case] arg: &str) {
        assert!(parse_position(arg).is_err());
    }

    #[test]
    fn test_history_window() {
        let start = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2022, 12, 31).unwrap();

        assert_eq!(history_window(None, None, None).unwrap(), None);
        assert_eq!(
            history_window(None, None, Some(Lookback::TwoYears)).unwrap(),
            Some(HistoryWindow::Lookback(Lookback::TwoYears))
        );
        assert_eq!(
            history_window(Some(start), Some(end), None).unwrap(),
            Some(HistoryWindow::Range { start, end })
        );
        assert!(matches!(
            history_window(Some(end), Some(start), None),
            Err(DataError::InvalidDateRange { .. })
        ));
    }
}
