//! Demonstration of tangent-risk: returns, risk metrics and covariance
//!
//! Builds three deterministic price histories, then walks through:
//! - Date-aligned simple returns and the weighted portfolio series
//! - Sharpe ratio, volatility and Value-at-Risk (Gaussian and historical)
//! - Expected returns and Ledoit-Wolf covariance with each shrinkage target

use chrono::{Days, NaiveDate};
use tangent_data::{Portfolio, PriceSeries};
use tangent_risk::{
    CovarianceConfig, ExpectedReturnsMethod, ReturnsCalculator, RiskMetricsConfig,
    RiskMetricsEngine, ShrinkageTarget, VarMethod, estimate_covariance, expected_returns,
};

fn synthetic(symbol: &str, frequency: f64, drift: f64) -> Result<PriceSeries, tangent_data::DataError> {
    let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap_or_default();
    let mut price = 100.0;
    let mut dates = Vec::with_capacity(253);
    let mut closes = Vec::with_capacity(253);
    for i in 0..253u64 {
        price *= 1.0 + drift + 0.012 * ((i as f64) * frequency).sin();
        dates.push(start + Days::new(i));
        closes.push(price);
    }
    PriceSeries::from_parts(symbol, &dates, &closes)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("==========================================================");
    println!("              Tangent Risk - Demo");
    println!("==========================================================\n");

    let panel = vec![
        synthetic("AAA", 0.7, 0.0008)?,
        synthetic("BBB", 1.9, 0.0005)?,
        synthetic("CCC", 0.31, 0.0003)?,
    ];
    let weights = Portfolio::new([("AAA", 0.5), ("BBB", 0.3), ("CCC", 0.2)])?;

    println!("----------------------------------------------------------");
    println!("Returns");
    println!("----------------------------------------------------------");
    let (matrix, portfolio) = ReturnsCalculator::default().compute(&panel, &weights)?;
    println!(
        "Aligned {} periods across {} assets",
        matrix.n_periods(),
        matrix.n_assets()
    );
    println!("Portfolio return series: {} observations\n", portfolio.len());

    println!("----------------------------------------------------------");
    println!("Risk metrics");
    println!("----------------------------------------------------------");
    for var_method in [VarMethod::Gaussian, VarMethod::Historical] {
        let engine = RiskMetricsEngine::new(RiskMetricsConfig {
            var_method,
            ..Default::default()
        });
        let metrics = engine.evaluate(portfolio.view())?;
        println!("{var_method:?} VaR");
        println!("  Sharpe Ratio:  {:>8.3}", metrics.sharpe_ratio);
        println!("  Volatility:    {:>7.2}%", metrics.volatility * 100.0);
        println!("  VaR (95%, 1d): {:>7.2}%", metrics.value_at_risk * 100.0);
    }
    println!();

    println!("----------------------------------------------------------");
    println!("Expected returns and covariance");
    println!("----------------------------------------------------------");
    let mu = expected_returns(&matrix, ExpectedReturnsMethod::Compounded, 252.0)?;
    for (symbol, value) in mu.symbols().iter().zip(mu.values().iter()) {
        println!("  {symbol}: {:>7.2}%", value * 100.0);
    }
    println!();

    for target in [
        ShrinkageTarget::ConstantVariance,
        ShrinkageTarget::ConstantCorrelation,
        ShrinkageTarget::Diagonal,
    ] {
        let config = CovarianceConfig {
            target,
            ..Default::default()
        };
        let cov = estimate_covariance(&matrix, &config)?;
        let vols: Vec<String> = cov
            .volatilities()
            .iter()
            .map(|v| format!("{:.2}%", v * 100.0))
            .collect();
        println!(
            "{target:?}: shrinkage {:.4}, volatilities [{}]",
            cov.shrinkage(),
            vols.join(", ")
        );
    }

    println!("\n==========================================================");
    println!("                    Demo Complete!");
    println!("==========================================================");
    Ok(())
}
