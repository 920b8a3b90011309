//! Monte Carlo projection of portfolio value.
//!
//! Every trial compounds `horizon_days` sampled daily returns onto the initial
//! value. Trials are independent and run on the rayon pool; days within a
//! trial are sequential.

use crate::{error::SimulationError, sampler::ReturnSampler};
use ndarray::{Array2, Axis};
use rand::{RngCore, SeedableRng, rngs::StdRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tangent_risk::stats::quantile_sorted;

/// Lower percentile band.
const LOWER_QUANTILE: f64 = 0.05;
/// Upper percentile band.
const UPPER_QUANTILE: f64 = 0.95;

/// Number of whole trading days in `years`.
pub fn horizon_days(years: f64, trading_days: f64) -> Result<usize, SimulationError> {
    let days = (years * trading_days).floor();
    if !days.is_finite() || days < 1.0 {
        return Err(SimulationError::InvalidParameter(format!(
            "horizon of {years} years is shorter than one trading day"
        )));
    }
    Ok(days as usize)
}

/// Simulation size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of simulated paths (default: 1,000)
    pub trials: usize,
    /// Trading days per path (default: 1,260, five years)
    pub horizon_days: usize,
    /// Starting portfolio value (default: 100,000)
    pub initial_value: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            trials: 1000,
            horizon_days: 1260,
            initial_value: 100_000.0,
        }
    }
}

impl SimulationConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.trials == 0 {
            return Err(SimulationError::InvalidParameter(
                "trials must be at least 1".to_string(),
            ));
        }
        if self.horizon_days == 0 {
            return Err(SimulationError::InvalidParameter(
                "horizon must be at least one day".to_string(),
            ));
        }
        if !self.initial_value.is_finite() || self.initial_value <= 0.0 {
            return Err(SimulationError::InvalidParameter(format!(
                "initial value must be positive, got {}",
                self.initial_value
            )));
        }
        Ok(())
    }
}

/// Simulated paths and their per-day summaries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationResult {
    /// `trials x horizon` values; column `t` is the value after `t + 1` days
    #[serde(skip_serializing)]
    pub paths: Array2<f64>,
    /// Mean value per day, clamped into the observed `[min, max]`.
    ///
    /// The mean is not bounded by the percentile bands. Under heavy right skew
    /// (high volatility over long horizons) it can exceed `p95_path`, so
    /// `p5 <= mean <= p95` holds only for moderate dispersion.
    pub mean_path: Vec<f64>,
    /// 5th percentile per day
    pub p5_path: Vec<f64>,
    /// 95th percentile per day
    pub p95_path: Vec<f64>,
    /// Mean final value
    pub final_mean: f64,
    /// 5th percentile of the final value
    pub final_p5: f64,
    /// 95th percentile of the final value
    pub final_p95: f64,
    /// Fraction of trials ending below the initial value
    pub probability_of_loss: f64,
}

/// Monte Carlo simulator
#[derive(Debug, Clone, Default)]
pub struct MonteCarloSimulator {
    config: SimulationConfig,
}

impl MonteCarloSimulator {
    /// Create a new simulator with the given configuration
    pub const fn new(config: SimulationConfig) -> Self {
        Self { config }
    }

    /// Simulator configuration.
    pub const fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Run the simulation, drawing per-trial seeds from `rng`.
    ///
    /// The result depends only on the configuration, the sampler and the state
    /// of `rng`, never on thread scheduling.
    pub fn simulate<S, R>(&self, sampler: &S, rng: &mut R) -> Result<SimulationResult, SimulationError>
    where
        S: ReturnSampler + ?Sized,
        R: RngCore + ?Sized,
    {
        self.config.validate()?;
        let SimulationConfig {
            trials,
            horizon_days,
            initial_value,
        } = self.config;

        tracing::debug!(trials, horizon_days, initial_value, "running monte carlo simulation");

        let seeds: Vec<u64> = (0..trials).map(|_| rng.next_u64()).collect();
        let values: Vec<f64> = seeds
            .into_par_iter()
            .flat_map_iter(|seed| {
                let mut trial_rng = StdRng::seed_from_u64(seed);
                let mut value = initial_value;
                (0..horizon_days)
                    .map(|_| {
                        value *= 1.0 + sampler.sample(&mut trial_rng);
                        value
                    })
                    .collect::<Vec<_>>()
            })
            .collect();
        let paths = Array2::from_shape_vec((trials, horizon_days), values)
            .map_err(|e| SimulationError::InvalidParameter(e.to_string()))?;

        let bands: Vec<(f64, f64, f64)> = paths
            .axis_iter(Axis(1))
            .into_par_iter()
            .map(|column| {
                let mut sorted = column.to_vec();
                sorted.sort_by(f64::total_cmp);
                let low = sorted[0];
                let high = sorted[sorted.len() - 1];
                let mean = (sorted.iter().sum::<f64>() / sorted.len() as f64).max(low).min(high);
                let p5 = quantile_sorted(&sorted, LOWER_QUANTILE).unwrap_or(low);
                let p95 = quantile_sorted(&sorted, UPPER_QUANTILE).unwrap_or(high);
                (mean, p5, p95)
            })
            .collect();

        let mean_path: Vec<f64> = bands.iter().map(|b| b.0).collect();
        let p5_path: Vec<f64> = bands.iter().map(|b| b.1).collect();
        let p95_path: Vec<f64> = bands.iter().map(|b| b.2).collect();

        let finals = paths.column(horizon_days - 1);
        let losses = finals.iter().filter(|&&v| v < initial_value).count();

        let result = SimulationResult {
            final_mean: mean_path[horizon_days - 1],
            final_p5: p5_path[horizon_days - 1],
            final_p95: p95_path[horizon_days - 1],
            probability_of_loss: losses as f64 / trials as f64,
            paths,
            mean_path,
            p5_path,
            p95_path,
        };
        tracing::debug!(
            final_mean = result.final_mean,
            final_p5 = result.final_p5,
            final_p95 = result.final_p95,
            "simulation finished"
        );
        Ok(result)
    }
}
