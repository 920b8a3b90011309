//! Maximum-Sharpe and minimum-volatility portfolios.
//!
//! Both problems are solved over the polytope `lower <= w <= upper, sum(w) = budget`.
//! The unconstrained closed form is tried first and kept when it already
//! satisfies the bounds; otherwise projected-gradient ascent takes over. The
//! Sharpe ratio is pseudo-concave wherever the excess return is positive, so
//! the ascent, started at the highest-return corner, reaches the global optimum.

use crate::{
    bounds::WeightBounds,
    clean::clean_weights,
    error::OptimizeError,
    solver::{self, Schedule},
};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tangent_risk::{
    CovarianceMatrix, ExpectedReturns,
    covariance::{cholesky, cholesky_solve},
};

/// Optimizer configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Annual risk-free rate (default: 0.02)
    pub risk_free_rate: f64,
    /// Lower weight bound applied to every asset (default: 0.0)
    pub min_weight: f64,
    /// Upper weight bound applied to every asset (default: 1.0)
    pub max_weight: f64,
    /// Required sum of weights (default: 1.0)
    pub budget: f64,
    /// Weights smaller than this in magnitude are reported as zero (default: 1e-4)
    pub cleaning_threshold: f64,
    /// Iteration cap for projected-gradient ascent (default: 10,000)
    pub max_iterations: usize,
    /// Largest weight change that still counts as converged (default: 1e-12)
    pub tolerance: f64,
    /// Smallest Cholesky pivot, relative to the mean variance, accepted as non-singular (default: 1e-10)
    pub singular_tolerance: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.02,
            min_weight: 0.0,
            max_weight: 1.0,
            budget: 1.0,
            cleaning_threshold: 1e-4,
            max_iterations: 10_000,
            tolerance: 1e-12,
            singular_tolerance: 1e-10,
        }
    }
}

/// An optimized allocation and its annualized statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    /// Cleaned weight per asset
    pub weights: BTreeMap<String, f64>,
    /// Expected annual return `w . mu`
    pub expected_return: f64,
    /// Annual volatility `sqrt(w' S w)`
    pub volatility: f64,
    /// `(expected_return - rf) / volatility`
    pub sharpe_ratio: f64,
}

impl OptimizationResult {
    /// Weight of `symbol`.
    pub fn weight(&self, symbol: &str) -> Option<f64> {
        self.weights.get(symbol).copied()
    }
}

/// Mean-variance portfolio optimizer
#[derive(Debug, Clone, Default)]
pub struct Optimizer {
    config: OptimizerConfig,
}

impl Optimizer {
    /// Create a new optimizer with the given configuration
    pub const fn new(config: OptimizerConfig) -> Self {
        Self { config }
    }

    /// Optimizer configuration.
    pub const fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Uniform bounds from the configuration.
    pub fn default_bounds(&self, n_assets: usize) -> WeightBounds {
        WeightBounds::uniform(n_assets, self.config.min_weight, self.config.max_weight)
    }

    pub(crate) const fn schedule(&self) -> Schedule {
        Schedule {
            max_iterations: self.config.max_iterations,
            tolerance: self.config.tolerance,
        }
    }

    /// Maximum-Sharpe portfolio under the configured uniform bounds.
    pub fn max_sharpe(
        &self,
        expected: &ExpectedReturns,
        covariance: &CovarianceMatrix,
    ) -> Result<OptimizationResult, OptimizeError> {
        let bounds = self.default_bounds(expected.symbols().len());
        self.max_sharpe_with_bounds(expected, covariance, &bounds)
    }

    /// Maximum-Sharpe portfolio under explicit per-asset bounds.
    ///
    /// # Errors
    /// * [`OptimizeError::SingularCovariance`] if the covariance is not positive definite
    /// * [`OptimizeError::InfeasibleConstraints`] if no allocation meets the bounds and budget
    /// * [`OptimizeError::NoPositiveExcessReturn`] if no feasible allocation beats the risk-free rate
    pub fn max_sharpe_with_bounds(
        &self,
        expected: &ExpectedReturns,
        covariance: &CovarianceMatrix,
        bounds: &WeightBounds,
    ) -> Result<OptimizationResult, OptimizeError> {
        let symbols = matching_symbols(expected, covariance)?;
        let weights =
            self.max_sharpe_weights(expected.values(), covariance.values(), bounds)?;
        self.summarize(symbols, &weights, expected.values(), covariance.values())
    }

    /// Minimum-volatility portfolio under the configured uniform bounds.
    pub fn min_volatility(
        &self,
        expected: &ExpectedReturns,
        covariance: &CovarianceMatrix,
    ) -> Result<OptimizationResult, OptimizeError> {
        let bounds = self.default_bounds(expected.symbols().len());
        self.min_volatility_with_bounds(expected, covariance, &bounds)
    }

    /// Minimum-volatility portfolio under explicit per-asset bounds.
    pub fn min_volatility_with_bounds(
        &self,
        expected: &ExpectedReturns,
        covariance: &CovarianceMatrix,
        bounds: &WeightBounds,
    ) -> Result<OptimizationResult, OptimizeError> {
        let symbols = matching_symbols(expected, covariance)?;
        let weights = self.min_volatility_weights(covariance.values(), bounds)?;
        self.summarize(symbols, &weights, expected.values(), covariance.values())
    }

    /// Validate inputs and return the Cholesky factor of the covariance.
    pub(crate) fn factorize(
        &self,
        mu: Option<&Array1<f64>>,
        cov: &Array2<f64>,
        bounds: &WeightBounds,
    ) -> Result<Array2<f64>, OptimizeError> {
        let n = cov.nrows();
        if n == 0 {
            return Err(OptimizeError::InvalidParameter(
                "no assets to optimize".to_string(),
            ));
        }
        if cov.ncols() != n {
            return Err(OptimizeError::DimensionMismatch {
                expected: n,
                actual: cov.ncols(),
            });
        }
        if let Some(mu) = mu {
            if mu.len() != n {
                return Err(OptimizeError::DimensionMismatch {
                    expected: n,
                    actual: mu.len(),
                });
            }
            if mu.iter().any(|m| !m.is_finite()) {
                return Err(OptimizeError::InvalidParameter(
                    "expected returns must be finite".to_string(),
                ));
            }
        }
        if !self.config.risk_free_rate.is_finite() {
            return Err(OptimizeError::InvalidParameter(
                "risk_free_rate must be finite".to_string(),
            ));
        }
        if !(self.config.budget.is_finite() && self.config.budget > 0.0) {
            return Err(OptimizeError::InvalidParameter(format!(
                "budget must be positive, got {}",
                self.config.budget
            )));
        }
        bounds.validate(n, self.config.budget)?;

        if cov.iter().any(|v| !v.is_finite()) {
            return Err(OptimizeError::SingularCovariance(
                "covariance contains non-finite values".to_string(),
            ));
        }

        let lower = cholesky(cov).map_err(|e| OptimizeError::SingularCovariance(e.to_string()))?;
        let scale = cov.diag().sum() / n as f64;
        if let Some((index, pivot)) = lower
            .diag()
            .iter()
            .map(|d| d * d)
            .enumerate()
            .find(|&(_, pivot)| pivot <= self.config.singular_tolerance * scale)
        {
            return Err(OptimizeError::SingularCovariance(format!(
                "pivot {index} is {pivot:e}, the matrix is numerically singular"
            )));
        }
        Ok(lower)
    }

    /// Raw (uncleaned) maximum-Sharpe weights.
    pub fn max_sharpe_weights(
        &self,
        mu: &Array1<f64>,
        cov: &Array2<f64>,
        bounds: &WeightBounds,
    ) -> Result<Array1<f64>, OptimizeError> {
        let lower = self.factorize(Some(mu), cov, bounds)?;
        let rf = self.config.risk_free_rate;
        let budget = self.config.budget;

        // With sum(w) = budget, w . mu - rf = w . (mu - rf / budget)
        let excess = mu - rf / budget;
        if let Ok(direction) = cholesky_solve(&lower, &excess) {
            let total = direction.sum();
            if total > 0.0 && total.is_finite() {
                let weights = direction * (budget / total);
                if bounds.contains(&weights) {
                    tracing::debug!("tangency portfolio satisfies bounds, using closed form");
                    return Ok(weights);
                }
            }
        }

        let start = bounds.greedy_corner(mu, budget);
        let max_excess = start.dot(mu) - rf;
        if max_excess <= 0.0 {
            return Err(OptimizeError::NoPositiveExcessReturn { max_excess });
        }

        let sharpe = |w: &Array1<f64>| (w.dot(mu) - rf) / w.dot(&cov.dot(w)).sqrt();
        let gradient = |w: &Array1<f64>| {
            let sw = cov.dot(w);
            let variance = w.dot(&sw);
            let sd = variance.sqrt();
            let excess = w.dot(mu) - rf;
            mu / sd - sw * (excess / (variance * sd))
        };

        let ascent = solver::maximize(sharpe, gradient, start, bounds, budget, self.schedule());
        log_ascent("max_sharpe", ascent.iterations, ascent.converged);
        Ok(ascent.weights)
    }

    /// Raw (uncleaned) minimum-volatility weights.
    pub fn min_volatility_weights(
        &self,
        cov: &Array2<f64>,
        bounds: &WeightBounds,
    ) -> Result<Array1<f64>, OptimizeError> {
        let lower = self.factorize(None, cov, bounds)?;
        let n = cov.nrows();
        let budget = self.config.budget;

        let direction = cholesky_solve(&lower, &Array1::ones(n))
            .map_err(|e| OptimizeError::SingularCovariance(e.to_string()))?;
        let weights = &direction * (budget / direction.sum());
        if bounds.contains(&weights) {
            return Ok(weights);
        }

        let start = bounds.project(&Array1::from_elem(n, budget / n as f64), budget);
        let ascent = solver::maximize(
            |w| -w.dot(&cov.dot(w)),
            |w| cov.dot(w) * -2.0,
            start,
            bounds,
            budget,
            self.schedule(),
        );
        log_ascent("min_volatility", ascent.iterations, ascent.converged);
        Ok(ascent.weights)
    }

    /// Clean weights and compute the reported statistics.
    pub(crate) fn summarize(
        &self,
        symbols: &[String],
        weights: &Array1<f64>,
        mu: &Array1<f64>,
        cov: &Array2<f64>,
    ) -> Result<OptimizationResult, OptimizeError> {
        let cleaned = clean_weights(weights, self.config.cleaning_threshold, self.config.budget);
        let expected_return = cleaned.dot(mu);
        let volatility = cleaned.dot(&cov.dot(&cleaned)).sqrt();
        if volatility.is_nan() || volatility <= 0.0 {
            return Err(OptimizeError::SingularCovariance(
                "optimized portfolio has zero volatility".to_string(),
            ));
        }

        Ok(OptimizationResult {
            weights: symbols.iter().cloned().zip(cleaned.iter().copied()).collect(),
            expected_return,
            volatility,
            sharpe_ratio: (expected_return - self.config.risk_free_rate) / volatility,
        })
    }
}

fn log_ascent(problem: &str, iterations: usize, converged: bool) {
    if converged {
        tracing::debug!(problem, iterations, "projected gradient converged");
    } else {
        tracing::warn!(
            problem,
            iterations,
            "projected gradient hit the iteration cap before converging"
        );
    }
}

/// Symbols shared by both inputs, which must list the same assets in the same order.
pub(crate) fn matching_symbols<'a>(
    expected: &'a ExpectedReturns,
    covariance: &CovarianceMatrix,
) -> Result<&'a [String], OptimizeError> {
    if expected.symbols() != covariance.symbols() {
        return Err(OptimizeError::InvalidParameter(format!(
            "expected returns cover [{}] but covariance covers [{}]",
            expected.symbols().join(", "),
            covariance.symbols().join(", ")
        )));
    }
    Ok(expected.symbols())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;
    use rstest::rstest;

    fn inputs(mu: Array1<f64>, cov: Array2<f64>) -> (ExpectedReturns, CovarianceMatrix) {
        let symbols: Vec<String> = (0..mu.len()).map(|i| format!("A{i}")).collect();
        (
            ExpectedReturns::new(symbols.clone(), mu).unwrap(),
            CovarianceMatrix::new(symbols, cov, 0.0).unwrap(),
        )
    }

    fn three_assets() -> (ExpectedReturns, CovarianceMatrix) {
        inputs(
            array![0.10, 0.14, 0.05],
            array![
                [0.04, 0.006, 0.002],
                [0.006, 0.09, 0.01],
                [0.002, 0.01, 0.0225]
            ],
        )
    }

    #[test]
    fn test_analytic_two_asset_tangency() {
        let (mu, cov) = inputs(array![0.12, 0.08], array![[0.04, 0.0], [0.0, 0.01]]);
        let result = Optimizer::default().max_sharpe(&mu, &cov).unwrap();

        // Sigma^-1 (mu - rf) = [2.5, 6.0]
        assert_relative_eq!(result.weight("A0").unwrap(), 2.5 / 8.5, epsilon = 1e-9);
        assert_relative_eq!(result.weight("A1").unwrap(), 6.0 / 8.5, epsilon = 1e-9);
        // Maximum Sharpe is sqrt(e' Sigma^-1 e)
        assert_relative_eq!(result.sharpe_ratio, 0.61_f64.sqrt(), epsilon = 1e-9);
    }

    #[test]
    fn test_dominant_asset_takes_everything() {
        let (mu, cov) = inputs(array![0.15, 0.01], array![[0.04, 0.0], [0.0, 0.04]]);
        let result = Optimizer::default().max_sharpe(&mu, &cov).unwrap();
        assert_relative_eq!(result.weight("A0").unwrap(), 1.0, epsilon = 1e-12);
        assert_eq!(result.weight("A1"), Some(0.0));
        assert_relative_eq!(result.sharpe_ratio, 0.65, epsilon = 1e-9);
    }

    #[test]
    fn test_negative_tangency_weight_is_clipped() {
        let (mu, cov) = inputs(
            array![0.10, 0.12, 0.0],
            array![[0.04, 0.0, 0.0], [0.0, 0.09, 0.0], [0.0, 0.0, 0.04]],
        );
        let result = Optimizer::default().max_sharpe(&mu, &cov).unwrap();
        assert_relative_eq!(result.weight("A0").unwrap(), 18.0 / 28.0, epsilon = 1e-6);
        assert_relative_eq!(result.weight("A1").unwrap(), 10.0 / 28.0, epsilon = 1e-6);
        assert_eq!(result.weight("A2"), Some(0.0));
    }

    #[test]
    fn test_shorts_allowed_by_bounds() {
        let (mu, cov) = inputs(array![0.15, 0.01], array![[0.04, 0.0], [0.0, 0.04]]);
        let optimizer = Optimizer::new(OptimizerConfig {
            min_weight: -1.0,
            max_weight: 2.0,
            ..Default::default()
        });
        let result = optimizer.max_sharpe(&mu, &cov).unwrap();
        // Sigma^-1 (mu - rf) = [3.25, -0.25]
        assert_relative_eq!(result.weight("A0").unwrap(), 3.25 / 3.0, epsilon = 1e-9);
        assert_relative_eq!(result.weight("A1").unwrap(), -0.25 / 3.0, epsilon = 1e-9);
    }

    #[test]
    fn test_weight_cap_binds() {
        let (mu, cov) = three_assets();
        let optimizer = Optimizer::new(OptimizerConfig {
            max_weight: 0.4,
            ..Default::default()
        });
        let result = optimizer.max_sharpe(&mu, &cov).unwrap();
        assert_relative_eq!(result.weight("A0").unwrap(), 0.4, epsilon = 1e-6);
        assert_relative_eq!(result.weight("A1").unwrap(), 0.327_075, epsilon = 1e-5);
        assert_relative_eq!(result.weight("A2").unwrap(), 0.272_925, epsilon = 1e-5);

        let unconstrained = Optimizer::default().max_sharpe(&mu, &cov).unwrap();
        assert!(result.sharpe_ratio <= unconstrained.sharpe_ratio + 1e-12);
    }

    #[rstest]
    #[case(OptimizerConfig::default())]
    #[case(OptimizerConfig { max_weight: 0.5, ..Default::default() })]
    #[case(OptimizerConfig { min_weight: 0.05, ..Default::default() })]
    #[case(OptimizerConfig { risk_free_rate: 0.06, ..Default::default() })]
    fn test_output_invariants(#[case] config: OptimizerConfig) {
        let (mu, cov) = three_assets();
        let result = Optimizer::new(config).max_sharpe(&mu, &cov).unwrap();

        let total: f64 = result.weights.values().sum();
        assert_relative_eq!(total, 1.0, epsilon = 1e-6);
        for &w in result.weights.values() {
            assert!(w >= 0.0);
            assert!(w == 0.0 || w >= 1e-4);
        }
        assert!(result.volatility > 0.0);
        assert!(result.sharpe_ratio.is_finite());
    }

    #[test]
    fn test_singular_covariance() {
        let (mu, cov) = inputs(array![0.10, 0.12], array![[0.04, 0.04], [0.04, 0.04]]);
        assert!(matches!(
            Optimizer::default().max_sharpe(&mu, &cov),
            Err(OptimizeError::SingularCovariance(_))
        ));
        assert!(matches!(
            Optimizer::default().min_volatility(&mu, &cov),
            Err(OptimizeError::SingularCovariance(_))
        ));
    }

    #[test]
    fn test_infeasible_bounds() {
        let (mu, cov) = three_assets();
        let optimizer = Optimizer::new(OptimizerConfig {
            min_weight: 0.5,
            ..Default::default()
        });
        assert!(matches!(
            optimizer.max_sharpe(&mu, &cov),
            Err(OptimizeError::InfeasibleConstraints(_))
        ));

        let optimizer = Optimizer::new(OptimizerConfig {
            max_weight: 0.2,
            ..Default::default()
        });
        assert!(matches!(
            optimizer.max_sharpe(&mu, &cov),
            Err(OptimizeError::InfeasibleConstraints(_))
        ));
    }

    #[test]
    fn test_no_positive_excess_return() {
        let (mu, cov) = inputs(array![0.01, 0.015], array![[0.04, 0.0], [0.0, 0.01]]);
        assert!(matches!(
            Optimizer::default().max_sharpe(&mu, &cov),
            Err(OptimizeError::NoPositiveExcessReturn { .. })
        ));
    }

    #[test]
    fn test_min_volatility() {
        let (mu, cov) = inputs(array![0.12, 0.08], array![[0.04, 0.0], [0.0, 0.01]]);
        let result = Optimizer::default().min_volatility(&mu, &cov).unwrap();
        // Sigma^-1 1 = [25, 100]
        assert_relative_eq!(result.weight("A0").unwrap(), 0.2, epsilon = 1e-9);
        assert_relative_eq!(result.weight("A1").unwrap(), 0.8, epsilon = 1e-9);

        let capped = Optimizer::new(OptimizerConfig {
            max_weight: 0.7,
            ..Default::default()
        })
        .min_volatility(&mu, &cov)
        .unwrap();
        assert_relative_eq!(capped.weight("A0").unwrap(), 0.3, epsilon = 1e-6);
        assert_relative_eq!(capped.weight("A1").unwrap(), 0.7, epsilon = 1e-6);
        assert!(capped.volatility >= result.volatility);
    }

    #[test]
    fn test_min_volatility_three_assets() {
        let (mu, cov) = three_assets();
        let result = Optimizer::default().min_volatility(&mu, &cov).unwrap();
        assert_relative_eq!(result.weight("A0").unwrap(), 0.328_858, epsilon = 1e-5);
        assert_relative_eq!(result.weight("A1").unwrap(), 0.076_474, epsilon = 1e-5);
        assert_relative_eq!(result.weight("A2").unwrap(), 0.594_668, epsilon = 1e-5);
    }

    #[test]
    fn test_mismatched_symbols() {
        let (mu, _) = three_assets();
        let cov = CovarianceMatrix::new(
            vec!["X".into(), "Y".into(), "Z".into()],
            Array2::eye(3) * 0.04,
            0.0,
        )
        .unwrap();
        assert!(matches!(
            Optimizer::default().max_sharpe(&mu, &cov),
            Err(OptimizeError::InvalidParameter(_))
        ));
    }
}
