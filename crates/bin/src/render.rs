//! Plain-text output.

use std::collections::BTreeMap;
use tangent::{
    Analysis, Optimization,
    data::PriceSeries,
    optimize::{FrontierPoint, OptimizationResult},
    sim::SimulationResult,
};

fn header(title: &str) {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║{title:^62}║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");
}

fn weights_table(weights: &BTreeMap<String, f64>) {
    println!("  {:<10} {:>10}", "Ticker", "Weight");
    println!("  {}", "─".repeat(21));
    for (symbol, weight) in weights {
        println!("  {symbol:<10} {:>9.2}%", weight * 100.0);
    }
}

fn allocation(title: &str, result: &OptimizationResult) {
    println!("{title}");
    weights_table(&result.weights);
    println!();
    println!("  Expected Return:  {:>8.2}%", result.expected_return * 100.0);
    println!("  Volatility:       {:>8.2}%", result.volatility * 100.0);
    println!("  Sharpe Ratio:     {:>8.3}", result.sharpe_ratio);
    println!();
}

pub(crate) fn analysis(analysis: &Analysis) {
    header("PORTFOLIO RISK ANALYSIS");
    weights_table(&analysis.weights);
    println!();
    println!("  Observations:     {:>8}", analysis.observations);
    println!("  Sharpe Ratio:     {:>8.3}", analysis.metrics.sharpe_ratio);
    println!("  Volatility:       {:>8.2}%", analysis.metrics.volatility * 100.0);
    println!(
        "  Value at Risk:    {:>8.2}% (one day)",
        analysis.metrics.value_at_risk * 100.0
    );
    println!();
}

pub(crate) fn optimization(optimization: &Optimization) {
    header("MEAN-VARIANCE OPTIMIZATION");
    println!(
        "Observations: {}   Shrinkage: {:.4}\n",
        optimization.observations, optimization.shrinkage
    );
    println!("Expected annual returns");
    for (symbol, mu) in &optimization.expected_returns {
        println!("  {symbol:<10} {:>9.2}%", mu * 100.0);
    }
    println!();
    allocation("Maximum Sharpe portfolio", &optimization.portfolio);
    allocation("Minimum volatility portfolio", &optimization.min_volatility);
}

pub(crate) fn frontier(points: &[FrontierPoint]) {
    println!("Efficient frontier");
    println!("  {:>8} {:>10} {:>8}", "Return", "Volatility", "Sharpe");
    println!("  {}", "─".repeat(28));
    for point in points {
        println!(
            "  {:>7.2}% {:>9.2}% {:>8.3}",
            point.expected_return * 100.0,
            point.volatility * 100.0,
            point.sharpe_ratio
        );
    }
    println!();
}

pub(crate) fn history(series: &PriceSeries) {
    header(&format!("PRICE HISTORY: {}", series.symbol()));
    println!("  {:<12} {:>12}", "Date", "Close");
    println!("  {}", "─".repeat(25));
    for point in series.points() {
        println!("  {:<12} {:>12.2}", point.date.to_string(), point.close);
    }
    if let (Some(first), Some(last)) = (series.points().first(), series.last()) {
        println!();
        println!(
            "  Change:       {:>+10.2}%",
            (last.close / first.close - 1.0) * 100.0
        );
    }
    println!();
}

pub(crate) fn projection(result: &SimulationResult, initial_value: f64, trials: usize) {
    header("MONTE CARLO PROJECTION");
    println!("  Trials:             {trials:>14}");
    println!("  Horizon (days):     {:>14}", result.mean_path.len());
    println!("  Initial Value:      {initial_value:>14.2}");
    println!();
    println!("  Final Mean:         {:>14.2}", result.final_mean);
    println!("  Final 5th Pct:      {:>14.2}", result.final_p5);
    println!("  Final 95th Pct:     {:>14.2}", result.final_p95);
    println!(
        "  Probability of Loss:{:>13.1}%",
        result.probability_of_loss * 100.0
    );
    println!();
}
