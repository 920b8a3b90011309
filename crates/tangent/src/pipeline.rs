//! End-to-end analyses over price data.
//!
//! Each function takes validated configuration and price series and returns a
//! complete result or an error; nothing is partially computed. Fetching is
//! kept separate in [`load_panel`] so the analyses stay synchronous and pure.

use crate::{
    config::TangentConfig,
    error::{Error, Result},
};
use futures::stream::{self, StreamExt};
use rand::{SeedableRng, rngs::StdRng};
use serde::Serialize;
use std::collections::BTreeMap;
use tangent_data::{HistoryWindow, Portfolio, PriceSeries, PriceSource};
use tangent_optimize::{FrontierPoint, OptimizationResult, Optimizer};
use tangent_risk::{
    CovarianceMatrix, ExpectedReturns, ReturnMatrix, ReturnSeries, ReturnsCalculator,
    RiskMetrics, RiskMetricsEngine, estimate_covariance, expected_returns,
};
use tangent_sim::{BootstrapSampler, MonteCarloSimulator, ParametricSampler, SimulationResult};

/// Fetch every symbol's history concurrently.
///
/// At most `concurrency` requests are in flight. If any symbol fails, the
/// whole panel fails with the error of the first failing symbol in input
/// order.
pub async fn load_panel<P: PriceSource>(
    source: &P,
    symbols: &[String],
    window: &HistoryWindow,
    concurrency: usize,
) -> Result<Vec<PriceSeries>> {
    if symbols.is_empty() {
        return Err(Error::Config("no symbols requested".to_string()));
    }
    tracing::debug!(symbols = symbols.len(), concurrency, "loading price panel");

    let mut fetched: Vec<(usize, tangent_data::Result<PriceSeries>)> =
        stream::iter(symbols.iter().enumerate())
            .map(|(index, symbol)| async move {
                (index, source.fetch_series(symbol, window).await)
            })
            .buffer_unordered(concurrency.max(1))
            .collect()
            .await;
    fetched.sort_by_key(|(index, _)| *index);

    fetched
        .into_iter()
        .map(|(_, series)| series.map_err(Error::from))
        .collect()
}

/// Risk statistics of a weighted portfolio.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    /// Normalized portfolio weights
    pub weights: BTreeMap<String, f64>,
    /// Sharpe ratio, volatility and Value-at-Risk
    pub metrics: RiskMetrics,
    /// Number of aligned daily returns used
    pub observations: usize,
    /// Daily portfolio returns
    #[serde(skip_serializing)]
    pub returns: ReturnSeries,
}

/// Analyze the portfolio `weights` over `panel`.
pub fn analyze(
    config: &TangentConfig,
    panel: &[PriceSeries],
    weights: &Portfolio,
) -> Result<Analysis> {
    let (_, returns) = ReturnsCalculator::default().compute(panel, weights)?;
    let metrics = RiskMetricsEngine::new(config.risk).evaluate(returns.view())?;
    Ok(Analysis {
        weights: weights.normalized().weights().clone(),
        metrics,
        observations: returns.len(),
        returns,
    })
}

/// Optimal allocation and the estimates it was computed from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Optimization {
    /// Maximum-Sharpe portfolio
    pub portfolio: OptimizationResult,
    /// Minimum-volatility portfolio
    pub min_volatility: OptimizationResult,
    /// Annualized expected return per asset
    pub expected_returns: BTreeMap<String, f64>,
    /// Ledoit-Wolf shrinkage intensity applied (0 for the sample estimator)
    pub shrinkage: f64,
    /// Number of aligned daily returns used
    pub observations: usize,
}

/// Aligned returns and the annualized estimates derived from them.
///
/// Estimating once and reusing the result keeps the optimal allocation and
/// the efficient frontier on exactly the same inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct Estimates {
    /// Aligned daily asset returns
    pub returns: ReturnMatrix,
    /// Annualized expected return per asset
    pub expected: ExpectedReturns,
    /// Annualized covariance
    pub covariance: CovarianceMatrix,
}

impl Estimates {
    /// Maximum-Sharpe and minimum-volatility allocations.
    pub fn optimize(&self, config: &TangentConfig) -> Result<Optimization> {
        let optimizer = Optimizer::new(config.optimizer_config());
        let portfolio = optimizer.max_sharpe(&self.expected, &self.covariance)?;
        let min_volatility = optimizer.min_volatility(&self.expected, &self.covariance)?;

        tracing::info!(
            assets = self.returns.n_assets(),
            sharpe = portfolio.sharpe_ratio,
            shrinkage = self.covariance.shrinkage(),
            "optimized portfolio"
        );

        Ok(Optimization {
            expected_returns: self
                .expected
                .symbols()
                .iter()
                .cloned()
                .zip(self.expected.values().iter().copied())
                .collect(),
            shrinkage: self.covariance.shrinkage(),
            observations: self.returns.n_periods(),
            portfolio,
            min_volatility,
        })
    }

    /// Efficient frontier with `points` portfolios.
    pub fn frontier(&self, config: &TangentConfig, points: usize) -> Result<Vec<FrontierPoint>> {
        Ok(Optimizer::new(config.optimizer_config()).efficient_frontier(
            &self.expected,
            &self.covariance,
            points,
        )?)
    }
}

/// Annualized expected returns and covariance of the assets in `panel`.
pub fn estimate(config: &TangentConfig, panel: &[PriceSeries]) -> Result<Estimates> {
    let returns = ReturnsCalculator::default().asset_returns(panel)?;
    let expected = expected_returns(
        &returns,
        config.covariance.expected_returns,
        config.risk.trading_days,
    )?;
    let covariance = estimate_covariance(&returns, &config.covariance_config())?;
    Ok(Estimates {
        returns,
        expected,
        covariance,
    })
}

/// Maximum-Sharpe and minimum-volatility allocations across `panel`.
pub fn optimize(config: &TangentConfig, panel: &[PriceSeries]) -> Result<Optimization> {
    estimate(config, panel)?.optimize(config)
}

/// Efficient frontier across `panel` with `points` portfolios.
pub fn frontier(
    config: &TangentConfig,
    panel: &[PriceSeries],
    points: usize,
) -> Result<Vec<FrontierPoint>> {
    estimate(config, panel)?.frontier(config, points)
}

/// What drives a projection.
#[derive(Debug, Clone, Copy)]
pub enum ProjectionInput<'a> {
    /// Annual return and volatility assumptions
    Assumptions {
        /// Expected annual return
        annual_return: f64,
        /// Annual volatility
        annual_volatility: f64,
    },
    /// Bootstrap from observed daily portfolio returns
    History(&'a ReturnSeries),
}

impl ProjectionInput<'_> {
    /// Assumptions taken from the simulation config section.
    pub const fn from_config(config: &TangentConfig) -> Self {
        Self::Assumptions {
            annual_return: config.simulation.annual_return,
            annual_volatility: config.simulation.annual_volatility,
        }
    }
}

/// Monte Carlo projection seeded from `config.simulation.seed`.
pub fn project(config: &TangentConfig, input: ProjectionInput<'_>) -> Result<SimulationResult> {
    let mut rng = StdRng::seed_from_u64(config.simulation.seed);
    project_with_rng(config, input, &mut rng)
}

/// Monte Carlo projection drawing trial seeds from `rng`.
pub fn project_with_rng(
    config: &TangentConfig,
    input: ProjectionInput<'_>,
    rng: &mut StdRng,
) -> Result<SimulationResult> {
    let simulator = MonteCarloSimulator::new(config.simulation_config()?);
    let result = match input {
        ProjectionInput::Assumptions {
            annual_return,
            annual_volatility,
        } => {
            let sampler = ParametricSampler::from_annual(
                annual_return,
                annual_volatility,
                config.risk.trading_days,
            )?;
            simulator.simulate(&sampler, rng)?
        }
        ProjectionInput::History(returns) => {
            let sampler = BootstrapSampler::from_series(returns)?;
            simulator.simulate(&sampler, rng)?
        }
    };
    Ok(result)
}
