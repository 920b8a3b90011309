//! End-to-end checks from price series to risk statistics.

use approx::assert_relative_eq;
use chrono::{Days, NaiveDate};
use tangent_data::{Portfolio, PriceSeries};
use tangent_risk::{
    CovarianceConfig, CovarianceError, ReturnsCalculator, RiskError, RiskMetricsEngine,
    estimate_covariance,
};

fn dates(n: usize) -> Vec<NaiveDate> {
    let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
    (0..n).map(|i| start + Days::new(i as u64)).collect()
}

/// Deterministic wiggly price path.
fn wiggle(symbol: &str, n: usize, phase: f64, drift: f64) -> PriceSeries {
    let mut price = 100.0;
    let closes: Vec<f64> = (0..n)
        .map(|i| {
            let r = drift + 0.01 * ((i as f64) * 0.7 + phase).sin();
            price *= 1.0 + r;
            price
        })
        .collect();
    PriceSeries::from_parts(symbol, &dates(n), &closes).unwrap()
}

#[test]
fn constant_growth_is_degenerate() {
    let closes: Vec<f64> = (0..252).map(|i| 100.0 * 1.001_f64.powi(i)).collect();
    let series = PriceSeries::from_parts("FLAT", &dates(252), &closes).unwrap();
    let portfolio = Portfolio::new([("FLAT", 1.0)]).unwrap();

    let (_, returns) = ReturnsCalculator::default()
        .compute(&[series], &portfolio)
        .unwrap();
    assert_eq!(returns.len(), 251);

    let result = RiskMetricsEngine::default().evaluate(returns.view());
    assert!(matches!(result, Err(RiskError::DegenerateInput(_))));
}

#[test]
fn portfolio_series_length_matches_common_dates() {
    let full = wiggle("A", 30, 0.0, 0.001);
    // B skips every fifth date
    let points: Vec<_> = wiggle("B", 30, 1.3, 0.0)
        .points()
        .iter()
        .enumerate()
        .filter(|(i, _)| i % 5 != 0)
        .map(|(_, p)| *p)
        .collect();
    let gappy = PriceSeries::new("B", points).unwrap();
    let portfolio = Portfolio::new([("A", 0.5), ("B", 0.5)]).unwrap();

    let (matrix, returns) = ReturnsCalculator::default()
        .compute(&[full, gappy], &portfolio)
        .unwrap();

    assert_eq!(returns.len(), 23);
    assert_eq!(matrix.n_periods(), returns.len());
    assert!(returns.len() <= 29);
}

#[test]
fn metrics_are_finite_for_varied_returns() {
    let series = vec![wiggle("A", 120, 0.0, 0.0005), wiggle("B", 120, 2.0, 0.0002)];
    let portfolio = Portfolio::new([("A", 60.0), ("B", 40.0)]).unwrap();
    let (_, returns) = ReturnsCalculator::default()
        .compute(&series, &portfolio)
        .unwrap();

    let metrics = RiskMetricsEngine::default().evaluate(returns.view()).unwrap();
    assert!(metrics.sharpe_ratio.is_finite());
    assert!(metrics.volatility > 0.0);
    assert!(metrics.value_at_risk < 0.0);
    assert_relative_eq!(
        metrics.volatility,
        returns.values().std(1.0) * 252.0_f64.sqrt(),
        epsilon = 1e-12
    );
}

#[test]
fn duplicate_series_is_singular() {
    let a = wiggle("A", 60, 0.0, 0.0005);
    let b = wiggle("B", 60, 2.0, 0.0002);
    let copy = PriceSeries::new("A_COPY", a.points().to_vec()).unwrap();

    let matrix = ReturnsCalculator::default()
        .asset_returns(&[a, b, copy])
        .unwrap();
    let result = estimate_covariance(&matrix, &CovarianceConfig::default());
    match result {
        Err(CovarianceError::Singular { symbols }) => {
            assert_eq!(symbols, vec!["A".to_string(), "A_COPY".to_string()]);
        }
        other => panic!("expected singular covariance, got {other:?}"),
    }
}
