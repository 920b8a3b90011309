//! Efficient frontier sweep.

use crate::{
    bounds::WeightBounds,
    error::OptimizeError,
    optimizer::{OptimizationResult, Optimizer, matching_symbols},
    solver,
};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tangent_risk::{CovarianceMatrix, ExpectedReturns};

/// Return ranges narrower than this collapse to a single frontier point.
const MIN_RETURN_RANGE: f64 = 1e-12;
const MAX_BISECTIONS: usize = 60;
const MAX_DOUBLINGS: usize = 64;

/// One portfolio on the efficient frontier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrontierPoint {
    /// Expected annual return
    pub expected_return: f64,
    /// Annual volatility
    pub volatility: f64,
    /// Sharpe ratio against the configured risk-free rate
    pub sharpe_ratio: f64,
    /// Cleaned weight per asset
    pub weights: BTreeMap<String, f64>,
}

impl From<OptimizationResult> for FrontierPoint {
    fn from(result: OptimizationResult) -> Self {
        Self {
            expected_return: result.expected_return,
            volatility: result.volatility,
            sharpe_ratio: result.sharpe_ratio,
            weights: result.weights,
        }
    }
}

impl Optimizer {
    /// Frontier under the configured uniform bounds.
    pub fn efficient_frontier(
        &self,
        expected: &ExpectedReturns,
        covariance: &CovarianceMatrix,
        points: usize,
    ) -> Result<Vec<FrontierPoint>, OptimizeError> {
        let bounds = self.default_bounds(expected.symbols().len());
        self.efficient_frontier_with_bounds(expected, covariance, &bounds, points)
    }

    /// `points` portfolios with evenly spaced target returns, from the
    /// minimum-volatility portfolio to the highest attainable return.
    ///
    /// Returns a single point when every feasible portfolio has the same
    /// expected return.
    pub fn efficient_frontier_with_bounds(
        &self,
        expected: &ExpectedReturns,
        covariance: &CovarianceMatrix,
        bounds: &WeightBounds,
        points: usize,
    ) -> Result<Vec<FrontierPoint>, OptimizeError> {
        if points < 2 {
            return Err(OptimizeError::InvalidParameter(format!(
                "frontier needs at least 2 points, got {points}"
            )));
        }
        let symbols = matching_symbols(expected, covariance)?;
        let mu = expected.values();
        let cov = covariance.values();
        let budget = self.config().budget;

        // Validates inputs and bounds before anything else runs
        let min_vol = self.min_volatility_weights(cov, bounds)?;
        let corner = bounds.greedy_corner(mu, budget);
        let r_min = min_vol.dot(mu);
        let r_max = corner.dot(mu);

        let point =
            |w: &Array1<f64>| self.summarize(symbols, w, mu, cov).map(FrontierPoint::from);

        if r_max - r_min <= MIN_RETURN_RANGE {
            return Ok(vec![point(&min_vol)?]);
        }

        let mut frontier = Vec::with_capacity(points);
        frontier.push(point(&min_vol)?);

        let mut warm = min_vol;
        let last = points - 1;
        for k in 1..last {
            let target = r_min + (r_max - r_min) * k as f64 / last as f64;
            warm = self.target_return_weights(mu, cov, bounds, target, warm);
            frontier.push(point(&warm)?);
        }
        frontier.push(point(&corner)?);

        tracing::debug!(points = frontier.len(), r_min, r_max, "computed efficient frontier");
        Ok(frontier)
    }

    /// Lowest-variance weights reaching `target`, found by bisecting the risk
    /// tolerance `t` in `max t * w.mu - w'Sw / 2`.
    fn target_return_weights(
        &self,
        mu: &Array1<f64>,
        cov: &Array2<f64>,
        bounds: &WeightBounds,
        target: f64,
        start: Array1<f64>,
    ) -> Array1<f64> {
        let budget = self.config().budget;
        let schedule = self.schedule();
        let solve = |t: f64, start: Array1<f64>| {
            solver::maximize(
                |w| t * w.dot(mu) - 0.5 * w.dot(&cov.dot(w)),
                |w| mu * t - cov.dot(w),
                start,
                bounds,
                budget,
                schedule,
            )
            .weights
        };
        let tolerance = 1e-9 * (1.0 + target.abs());

        let mut lo = 0.0;
        let mut hi = 1.0;
        let mut best = solve(hi, start);
        for _ in 0..MAX_DOUBLINGS {
            if best.dot(mu) >= target - tolerance {
                break;
            }
            lo = hi;
            hi *= 2.0;
            best = solve(hi, best);
        }

        for _ in 0..MAX_BISECTIONS {
            if (best.dot(mu) - target).abs() <= tolerance {
                break;
            }
            let mid = 0.5 * (lo + hi);
            let candidate = solve(mid, best.clone());
            if candidate.dot(mu) >= target {
                hi = mid;
                best = candidate;
            } else {
                lo = mid;
            }
        }
        best
    }
}
