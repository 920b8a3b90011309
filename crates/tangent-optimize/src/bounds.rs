//! Per-asset weight bounds and the feasible set they define.
//!
//! The feasible set is the polytope `{ w : lower <= w <= upper, sum(w) = budget }`.

use crate::error::OptimizeError;
use ndarray::Array1;

const FEASIBILITY_TOLERANCE: f64 = 1e-9;

/// Lower and upper weight bound for every asset.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightBounds {
    lower: Array1<f64>,
    upper: Array1<f64>,
}

impl WeightBounds {
    /// Per-asset bounds.
    pub fn new(lower: Vec<f64>, upper: Vec<f64>) -> Result<Self, OptimizeError> {
        if lower.len() != upper.len() {
            return Err(OptimizeError::DimensionMismatch {
                expected: lower.len(),
                actual: upper.len(),
            });
        }
        Ok(Self {
            lower: Array1::from(lower),
            upper: Array1::from(upper),
        })
    }

    /// The same bounds for all `n` assets.
    pub fn uniform(n: usize, lower: f64, upper: f64) -> Self {
        Self {
            lower: Array1::from_elem(n, lower),
            upper: Array1::from_elem(n, upper),
        }
    }

    /// Long-only bounds `[0, 1]`.
    pub fn long_only(n: usize) -> Self {
        Self::uniform(n, 0.0, 1.0)
    }

    /// Number of assets covered.
    pub fn len(&self) -> usize {
        self.lower.len()
    }

    /// Whether no asset is covered.
    pub fn is_empty(&self) -> bool {
        self.lower.is_empty()
    }

    /// Lower bounds.
    pub const fn lower(&self) -> &Array1<f64> {
        &self.lower
    }

    /// Upper bounds.
    pub const fn upper(&self) -> &Array1<f64> {
        &self.upper
    }

    /// Check that some allocation of `budget` across `n_assets` satisfies the bounds.
    ///
    /// # Errors
    /// * [`OptimizeError::DimensionMismatch`] if the bounds cover a different number of assets
    /// * [`OptimizeError::InfeasibleConstraints`] if a bound is non-finite, a lower bound
    ///   exceeds its upper bound, or the budget lies outside `[sum(lower), sum(upper)]`
    pub fn validate(&self, n_assets: usize, budget: f64) -> Result<(), OptimizeError> {
        if self.len() != n_assets {
            return Err(OptimizeError::DimensionMismatch {
                expected: n_assets,
                actual: self.len(),
            });
        }
        if !budget.is_finite() {
            return Err(OptimizeError::InvalidParameter(format!(
                "budget must be finite, got {budget}"
            )));
        }
        for (i, (&lo, &hi)) in self.lower.iter().zip(&self.upper).enumerate() {
            if !lo.is_finite() || !hi.is_finite() {
                return Err(OptimizeError::InfeasibleConstraints(format!(
                    "bounds for asset {i} are not finite"
                )));
            }
            if lo > hi {
                return Err(OptimizeError::InfeasibleConstraints(format!(
                    "lower bound {lo} exceeds upper bound {hi} for asset {i}"
                )));
            }
        }

        let min_total = self.lower.sum();
        let max_total = self.upper.sum();
        if min_total > budget + FEASIBILITY_TOLERANCE {
            return Err(OptimizeError::InfeasibleConstraints(format!(
                "lower bounds sum to {min_total}, above the budget {budget}"
            )));
        }
        if max_total < budget - FEASIBILITY_TOLERANCE {
            return Err(OptimizeError::InfeasibleConstraints(format!(
                "upper bounds sum to {max_total}, below the budget {budget}"
            )));
        }
        Ok(())
    }

    /// Whether `weights` lies inside the bounds within a small tolerance.
    pub fn contains(&self, weights: &Array1<f64>) -> bool {
        weights.len() == self.len()
            && weights
                .iter()
                .zip(self.lower.iter().zip(&self.upper))
                .all(|(&w, (&lo, &hi))| {
                    w >= lo - FEASIBILITY_TOLERANCE && w <= hi + FEASIBILITY_TOLERANCE
                })
    }

    /// Euclidean projection of `point` onto the feasible set for `budget`.
    ///
    /// The projection is `clamp(point - tau, lower, upper)` for the unique shift
    /// `tau` that meets the budget, found by bisection. Bounds must already be
    /// validated.
    pub fn project(&self, point: &Array1<f64>, budget: f64) -> Array1<f64> {
        let shifted = |tau: f64| -> Array1<f64> {
            Array1::from_iter(
                point
                    .iter()
                    .zip(self.lower.iter().zip(&self.upper))
                    .map(|(&x, (&lo, &hi))| (x - tau).max(lo).min(hi)),
            )
        };

        let mut lo = point
            .iter()
            .zip(&self.upper)
            .map(|(x, u)| x - u)
            .fold(f64::INFINITY, f64::min);
        let mut hi = point
            .iter()
            .zip(&self.lower)
            .map(|(x, l)| x - l)
            .fold(f64::NEG_INFINITY, f64::max);

        for _ in 0..200 {
            let mid = 0.5 * (lo + hi);
            if shifted(mid).sum() > budget {
                lo = mid;
            } else {
                hi = mid;
            }
            if hi - lo <= f64::EPSILON * (1.0 + mid.abs()) {
                break;
            }
        }

        let mut projected = shifted(0.5 * (lo + hi));

        // Bisection leaves a rounding-level residual; spread it over unclamped coordinates
        let residual = budget - projected.sum();
        let free: Vec<usize> = (0..projected.len())
            .filter(|&i| projected[i] > self.lower[i] && projected[i] < self.upper[i])
            .collect();
        if !free.is_empty() {
            let share = residual / free.len() as f64;
            for i in free {
                projected[i] += share;
            }
        }
        projected
    }

    /// Feasible allocation with the highest `w . scores`.
    ///
    /// Starts every asset at its lower bound and fills the remaining budget in
    /// descending score order.
    pub fn greedy_corner(&self, scores: &Array1<f64>, budget: f64) -> Array1<f64> {
        let mut weights = self.lower.clone();
        let mut remaining = budget - self.lower.sum();

        let mut order: Vec<usize> = (0..scores.len()).collect();
        order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

        for i in order {
            if remaining <= 0.0 {
                break;
            }
            let add = (self.upper[i] - self.lower[i]).min(remaining);
            weights[i] += add;
            remaining -= add;
        }
        weights
    }
}
