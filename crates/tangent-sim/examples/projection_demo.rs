//! Demonstration of tangent-sim
//!
//! Projects a 100,000 portfolio five years ahead, first from annual return
//! and volatility assumptions, then by bootstrapping a short return history.

use rand::{SeedableRng, rngs::StdRng};
use tangent_sim::{
    BootstrapSampler, MonteCarloSimulator, ParametricSampler, SimulationConfig, SimulationResult,
    horizon_days,
};

fn summary(title: &str, result: &SimulationResult) {
    println!("{title}");
    println!("  Final mean:          {:>12.2}", result.final_mean);
    println!("  Final 5th pct:       {:>12.2}", result.final_p5);
    println!("  Final 95th pct:      {:>12.2}", result.final_p95);
    println!(
        "  Probability of loss: {:>11.1}%\n",
        result.probability_of_loss * 100.0
    );
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Tangent Monte Carlo Demo ===\n");

    let simulator = MonteCarloSimulator::new(SimulationConfig {
        trials: 2000,
        horizon_days: horizon_days(5.0, 252.0)?,
        initial_value: 100_000.0,
    });
    println!(
        "{} trials over {} trading days\n",
        simulator.config().trials,
        simulator.config().horizon_days
    );

    let parametric = ParametricSampler::from_annual(0.08, 0.20, 252.0)?;
    let result = simulator.simulate(&parametric, &mut StdRng::seed_from_u64(42))?;
    summary("1. Parametric: 8% return, 20% volatility", &result);

    let history = vec![
        0.004, -0.012, 0.007, 0.001, -0.003, 0.009, -0.006, 0.002, 0.011, -0.008,
    ];
    let bootstrap = BootstrapSampler::new(history)?;
    let result = simulator.simulate(&bootstrap, &mut StdRng::seed_from_u64(42))?;
    summary("2. Bootstrap from ten observed daily returns", &result);

    let again = simulator.simulate(&bootstrap, &mut StdRng::seed_from_u64(42))?;
    println!("Same seed reproduces the run: {}", again == result);

    Ok(())
}
