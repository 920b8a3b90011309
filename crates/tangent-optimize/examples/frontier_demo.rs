//! Demonstration of tangent-optimize
//!
//! Solves the maximum-Sharpe and minimum-volatility problems for a small
//! four-asset universe, sweeps the efficient frontier, and repeats the
//! maximum-Sharpe problem with a position cap and with short positions.

use ndarray::array;
use tangent_optimize::{OptimizationResult, Optimizer, OptimizerConfig, WeightBounds};
use tangent_risk::{CovarianceMatrix, ExpectedReturns};

fn print_allocation(title: &str, result: &OptimizationResult) {
    println!("{title}");
    for (symbol, weight) in &result.weights {
        println!("  {symbol:<6} {:>8.2}%", weight * 100.0);
    }
    println!(
        "  return {:.2}%  volatility {:.2}%  sharpe {:.3}\n",
        result.expected_return * 100.0,
        result.volatility * 100.0,
        result.sharpe_ratio
    );
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Tangent Optimize Demo ===\n");

    let symbols: Vec<String> = ["BOND", "VALUE", "GROWTH", "SMALL"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let expected = ExpectedReturns::new(symbols.clone(), array![0.035, 0.07, 0.11, 0.13])?;
    let covariance = CovarianceMatrix::new(
        symbols,
        array![
            [0.0025, 0.0006, 0.0004, 0.0002],
            [0.0006, 0.0256, 0.0150, 0.0160],
            [0.0004, 0.0150, 0.0484, 0.0300],
            [0.0002, 0.0160, 0.0300, 0.0729]
        ],
        0.0,
    )?;

    let optimizer = Optimizer::default();
    print_allocation(
        "1. Maximum Sharpe (long-only)",
        &optimizer.max_sharpe(&expected, &covariance)?,
    );
    print_allocation(
        "2. Minimum volatility",
        &optimizer.min_volatility(&expected, &covariance)?,
    );

    println!("3. Efficient frontier");
    println!("  {:>8} {:>10} {:>8}", "Return", "Volatility", "Sharpe");
    for point in optimizer.efficient_frontier(&expected, &covariance, 8)? {
        println!(
            "  {:>7.2}% {:>9.2}% {:>8.3}",
            point.expected_return * 100.0,
            point.volatility * 100.0,
            point.sharpe_ratio
        );
    }
    println!();

    let capped = Optimizer::new(OptimizerConfig {
        max_weight: 0.35,
        ..Default::default()
    });
    print_allocation(
        "4. Maximum Sharpe, 35% cap per asset",
        &capped.max_sharpe(&expected, &covariance)?,
    );

    let shorts = WeightBounds::uniform(4, -0.5, 1.5);
    print_allocation(
        "5. Maximum Sharpe, shorts down to -50%",
        &optimizer.max_sharpe_with_bounds(&expected, &covariance, &shorts)?,
    );

    Ok(())
}
