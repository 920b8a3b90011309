//! Configuration file.
//!
//! Every field has a default, so a config file only needs the values it
//! changes. Files are JSON and are looked up at
//! `<config dir>/tangent/config.json` unless a path is given.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tangent_data::HistoryWindow;
use tangent_optimize::OptimizerConfig;
use tangent_risk::{
    CovarianceConfig, CovarianceMethod, ExpectedReturnsMethod, RiskMetricsConfig,
    ShrinkageTarget,
};
use tangent_sim::{SimulationConfig, horizon_days};

/// Where simulated daily returns come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationMode {
    /// Normal returns from an annual return and volatility
    #[default]
    Parametric,
    /// Bootstrap from the portfolio's historical returns
    Empirical,
}

/// Covariance and expected-return estimation settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CovarianceSection {
    /// Estimator (default: Ledoit-Wolf)
    pub method: CovarianceMethod,
    /// Shrinkage target (default: constant variance)
    pub target: ShrinkageTarget,
    /// Expected-return estimator (default: compounded)
    pub expected_returns: ExpectedReturnsMethod,
}

/// Monte Carlo settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSection {
    /// Return source (default: parametric)
    pub mode: SimulationMode,
    /// Number of trials (default: 1,000)
    pub trials: usize,
    /// Horizon in years (default: 5)
    pub horizon_years: f64,
    /// Starting portfolio value (default: 100,000)
    pub initial_value: f64,
    /// Random seed (default: 42)
    pub seed: u64,
    /// Annual return for parametric mode (default: 0.08)
    pub annual_return: f64,
    /// Annual volatility for parametric mode (default: 0.20)
    pub annual_volatility: f64,
}

impl Default for SimulationSection {
    fn default() -> Self {
        Self {
            mode: SimulationMode::Parametric,
            trials: 1000,
            horizon_years: 5.0,
            initial_value: 100_000.0,
            seed: 42,
            annual_return: 0.08,
            annual_volatility: 0.20,
        }
    }
}

/// Optimizer settings.
///
/// The risk-free rate is not set here; it comes from the `risk` section so
/// analysis and optimization always measure excess return against the same rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerSection {
    /// Lower weight bound per asset (default: 0.0)
    pub min_weight: f64,
    /// Upper weight bound per asset (default: 1.0)
    pub max_weight: f64,
    /// Required sum of weights (default: 1.0)
    pub budget: f64,
    /// Weights smaller than this in magnitude are reported as zero (default: 1e-4)
    pub cleaning_threshold: f64,
    /// Iteration cap for projected-gradient ascent (default: 10,000)
    pub max_iterations: usize,
    /// Convergence tolerance (default: 1e-12)
    pub tolerance: f64,
    /// Relative Cholesky pivot below which the covariance is singular (default: 1e-10)
    pub singular_tolerance: f64,
}

impl Default for OptimizerSection {
    fn default() -> Self {
        let defaults = OptimizerConfig::default();
        Self {
            min_weight: defaults.min_weight,
            max_weight: defaults.max_weight,
            budget: defaults.budget,
            cleaning_threshold: defaults.cleaning_threshold,
            max_iterations: defaults.max_iterations,
            tolerance: defaults.tolerance,
            singular_tolerance: defaults.singular_tolerance,
        }
    }
}

/// Price data settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSection {
    /// History to fetch (default: calendar year 2023)
    pub window: HistoryWindow,
    /// Concurrent price requests (default: 4)
    pub concurrency: usize,
}

impl Default for DataSection {
    fn default() -> Self {
        Self {
            window: HistoryWindow::default(),
            concurrency: 4,
        }
    }
}

/// Complete Tangent configuration.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TangentConfig {
    /// Risk metrics
    pub risk: RiskMetricsConfig,
    /// Covariance and expected returns
    pub covariance: CovarianceSection,
    /// Optimizer
    pub optimizer: OptimizerSection,
    /// Monte Carlo simulation
    pub simulation: SimulationSection,
    /// Price data
    pub data: DataSection,
}

impl TangentConfig {
    /// Default config file location, if the platform has a config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tangent").join("config.json"))
    }

    /// Load and validate a config file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Load `path` if given, otherwise the default file if it exists, otherwise defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_path(path);
        }
        match Self::default_path() {
            Some(default) if default.is_file() => Self::from_path(default),
            _ => Ok(Self::default()),
        }
    }

    /// Reject values no component would accept.
    pub fn validate(&self) -> Result<()> {
        let risk = &self.risk;
        if risk.confidence.is_nan() || risk.confidence <= 0.0 || risk.confidence >= 1.0 {
            return Err(invalid(format!(
                "risk.confidence must be in (0, 1), got {}",
                risk.confidence
            )));
        }
        if !risk.trading_days.is_finite() || risk.trading_days <= 0.0 {
            return Err(invalid(format!(
                "risk.trading_days must be positive, got {}",
                risk.trading_days
            )));
        }
        if !risk.risk_free_rate.is_finite() {
            return Err(invalid("risk-free rate must be finite".to_string()));
        }

        let opt = &self.optimizer;
        if !opt.min_weight.is_finite() || !opt.max_weight.is_finite() {
            return Err(invalid("optimizer weight bounds must be finite".to_string()));
        }
        if opt.min_weight > opt.max_weight {
            return Err(invalid(format!(
                "optimizer.min_weight {} exceeds optimizer.max_weight {}",
                opt.min_weight, opt.max_weight
            )));
        }
        if !opt.budget.is_finite() || opt.budget <= 0.0 {
            return Err(invalid(format!(
                "optimizer.budget must be positive, got {}",
                opt.budget
            )));
        }
        if opt.cleaning_threshold.is_nan() || opt.cleaning_threshold < 0.0 {
            return Err(invalid(format!(
                "optimizer.cleaning_threshold must be non-negative, got {}",
                opt.cleaning_threshold
            )));
        }
        if opt.max_iterations == 0 {
            return Err(invalid("optimizer.max_iterations must be at least 1".to_string()));
        }

        let sim = &self.simulation;
        self.simulation_config()?.validate()?;
        if !sim.annual_return.is_finite() {
            return Err(invalid("simulation.annual_return must be finite".to_string()));
        }
        if !sim.annual_volatility.is_finite() || sim.annual_volatility < 0.0 {
            return Err(invalid(format!(
                "simulation.annual_volatility must be non-negative, got {}",
                sim.annual_volatility
            )));
        }

        if self.data.concurrency == 0 {
            return Err(invalid("data.concurrency must be at least 1".to_string()));
        }
        if let HistoryWindow::Range { start, end } = self.data.window {
            HistoryWindow::range(start, end)?;
        }
        Ok(())
    }

    /// Covariance estimator settings, annualized with the risk trading-day count.
    pub fn covariance_config(&self) -> CovarianceConfig {
        CovarianceConfig {
            method: self.covariance.method,
            target: self.covariance.target,
            trading_days: self.risk.trading_days,
            ..CovarianceConfig::default()
        }
    }

    /// Optimizer settings, measuring excess return against `risk.risk_free_rate`.
    pub const fn optimizer_config(&self) -> OptimizerConfig {
        let opt = &self.optimizer;
        OptimizerConfig {
            risk_free_rate: self.risk.risk_free_rate,
            min_weight: opt.min_weight,
            max_weight: opt.max_weight,
            budget: opt.budget,
            cleaning_threshold: opt.cleaning_threshold,
            max_iterations: opt.max_iterations,
            tolerance: opt.tolerance,
            singular_tolerance: opt.singular_tolerance,
        }
    }

    /// Simulator settings with the horizon converted to trading days.
    pub fn simulation_config(&self) -> Result<SimulationConfig> {
        Ok(SimulationConfig {
            trials: self.simulation.trials,
            horizon_days: horizon_days(self.simulation.horizon_years, self.risk.trading_days)?,
            initial_value: self.simulation.initial_value,
        })
    }
}

fn invalid(message: String) -> Error {
    Error::Config(message)
}
