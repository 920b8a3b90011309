//! Sources of simulated daily returns.

use crate::error::SimulationError;
use rand::{Rng, rngs::StdRng};
use rand_distr::{Distribution, Normal};
use tangent_risk::ReturnSeries;

/// Draws one simple daily return per call.
///
/// Samplers are shared across the worker threads of a simulation, each of
/// which passes its own generator.
pub trait ReturnSampler: Send + Sync {
    /// Draw the next daily return.
    fn sample(&self, rng: &mut StdRng) -> f64;
}

/// Independent normal daily returns.
#[derive(Debug, Clone, Copy)]
pub struct ParametricSampler {
    daily_mean: f64,
    daily_volatility: f64,
    distribution: Normal<f64>,
}

impl ParametricSampler {
    /// Sampler with the given daily mean and volatility.
    ///
    /// # Errors
    /// [`SimulationError::InvalidParameter`] if the mean is not finite or the
    /// volatility is negative or not finite.
    pub fn new(daily_mean: f64, daily_volatility: f64) -> Result<Self, SimulationError> {
        if !daily_mean.is_finite() {
            return Err(SimulationError::InvalidParameter(format!(
                "daily mean must be finite, got {daily_mean}"
            )));
        }
        if !daily_volatility.is_finite() || daily_volatility < 0.0 {
            return Err(SimulationError::InvalidParameter(format!(
                "daily volatility must be finite and non-negative, got {daily_volatility}"
            )));
        }
        let distribution = Normal::new(daily_mean, daily_volatility)
            .map_err(|e| SimulationError::InvalidParameter(e.to_string()))?;
        Ok(Self {
            daily_mean,
            daily_volatility,
            distribution,
        })
    }

    /// Sampler from annualized figures: `mean / days` and `vol / sqrt(days)`.
    pub fn from_annual(
        annual_return: f64,
        annual_volatility: f64,
        trading_days: f64,
    ) -> Result<Self, SimulationError> {
        if !trading_days.is_finite() || trading_days <= 0.0 {
            return Err(SimulationError::InvalidParameter(format!(
                "trading_days must be positive, got {trading_days}"
            )));
        }
        Self::new(
            annual_return / trading_days,
            annual_volatility / trading_days.sqrt(),
        )
    }

    /// Daily mean return.
    pub const fn daily_mean(&self) -> f64 {
        self.daily_mean
    }

    /// Daily volatility.
    pub const fn daily_volatility(&self) -> f64 {
        self.daily_volatility
    }
}

impl ReturnSampler for ParametricSampler {
    fn sample(&self, rng: &mut StdRng) -> f64 {
        self.distribution.sample(rng)
    }
}

/// Resamples observed daily returns with replacement.
#[derive(Debug, Clone)]
pub struct BootstrapSampler {
    returns: Vec<f64>,
}

impl BootstrapSampler {
    /// Sampler over a historical return sample.
    ///
    /// # Errors
    /// [`SimulationError::InvalidParameter`] if the sample is empty or holds a
    /// non-finite value.
    pub fn new(returns: Vec<f64>) -> Result<Self, SimulationError> {
        if returns.is_empty() {
            return Err(SimulationError::InvalidParameter(
                "bootstrap sample is empty".to_string(),
            ));
        }
        if let Some(bad) = returns.iter().find(|r| !r.is_finite()) {
            return Err(SimulationError::InvalidParameter(format!(
                "bootstrap sample contains non-finite return {bad}"
            )));
        }
        Ok(Self { returns })
    }

    /// Sampler over a portfolio return series.
    pub fn from_series(series: &ReturnSeries) -> Result<Self, SimulationError> {
        Self::new(series.values().to_vec())
    }

    /// The sample being resampled.
    pub fn returns(&self) -> &[f64] {
        &self.returns
    }
}

impl ReturnSampler for BootstrapSampler {
    fn sample(&self, rng: &mut StdRng) -> f64 {
        self.returns[rng.gen_range(0..self.returns.len())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rstest::rstest;

    #[test]
    fn test_from_annual_scaling() {
        let sampler = ParametricSampler::from_annual(0.08, 0.20, 252.0).unwrap();
        assert_relative_eq!(sampler.daily_mean(), 0.08 / 252.0, epsilon = 1e-15);
        assert_relative_eq!(
            sampler.daily_volatility(),
            0.20 / 252.0_f64.sqrt(),
            epsilon = 1e-15
        );
    }

    #[test]
    fn test_zero_volatility_returns_mean() {
        let sampler = ParametricSampler::new(0.001, 0.0).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            assert_eq!(sampler.sample(&mut rng), 0.001);
        }
    }

    #[test]
    fn test_parametric_moments() {
        let sampler = ParametricSampler::new(0.0005, 0.01).unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        let draws: Vec<f64> = (0..200_000).map(|_| sampler.sample(&mut rng)).collect();
        let mean = draws.iter().sum::<f64>() / draws.len() as f64;
        let var = draws.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / draws.len() as f64;
        assert_relative_eq!(mean, 0.0005, epsilon = 1e-4);
        assert_relative_eq!(var.sqrt(), 0.01, epsilon = 2e-4);
    }

    #[rstest]
    #[case(f64::NAN, 0.01)]
    #[case(0.0, -0.01)]
    #[case(0.0, f64::INFINITY)]
    fn test_invalid_parametric(#[case] mean: f64, #[case] vol: f64) {
        assert!(matches!(
            ParametricSampler::new(mean, vol),
            Err(SimulationError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_bootstrap_draws_from_sample() {
        let sampler = BootstrapSampler::new(vec![0.01, -0.01]).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let draws: Vec<f64> = (0..1000).map(|_| sampler.sample(&mut rng)).collect();
        assert!(draws.iter().all(|&d| d == 0.01 || d == -0.01));
        assert!(draws.contains(&0.01));
        assert!(draws.contains(&-0.01));
    }

    #[test]
    fn test_invalid_bootstrap() {
        assert!(BootstrapSampler::new(vec![]).is_err());
        assert!(BootstrapSampler::new(vec![0.01, f64::NAN]).is_err());
    }
}
