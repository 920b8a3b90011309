//! Projected-gradient ascent over the bounded budget polytope.

use crate::bounds::WeightBounds;
use ndarray::Array1;

/// Armijo sufficient-increase constant.
const ARMIJO: f64 = 1e-4;
/// Smallest step length tried before declaring convergence.
const MIN_STEP: f64 = 1e-20;

/// Stopping rules for [`maximize`].
#[derive(Debug, Clone, Copy)]
pub(crate) struct Schedule {
    pub(crate) max_iterations: usize,
    pub(crate) tolerance: f64,
}

/// Outcome of a projected ascent run.
#[derive(Debug)]
pub(crate) struct Ascent {
    pub(crate) weights: Array1<f64>,
    pub(crate) iterations: usize,
    pub(crate) converged: bool,
}

/// Maximize `objective` over `{ bounds, sum(w) = budget }` from a feasible start.
///
/// Each iteration steps along the gradient, projects back onto the feasible
/// set and backtracks until the Armijo condition holds. Accepted steps double
/// the trial length for the next iteration.
pub(crate) fn maximize<F, G>(
    objective: F,
    gradient: G,
    start: Array1<f64>,
    bounds: &WeightBounds,
    budget: f64,
    schedule: Schedule,
) -> Ascent
where
    F: Fn(&Array1<f64>) -> f64,
    G: Fn(&Array1<f64>) -> Array1<f64>,
{
    let mut weights = start;
    let mut value = objective(&weights);
    let mut step = 1.0;

    for iteration in 0..schedule.max_iterations {
        let grad = gradient(&weights);
        if grad.iter().any(|g| !g.is_finite()) {
            return Ascent {
                weights,
                iterations: iteration,
                converged: false,
            };
        }

        let (candidate, candidate_value) = loop {
            let candidate = bounds.project(&(&weights + &(&grad * step)), budget);
            let candidate_value = objective(&candidate);
            let predicted = grad.dot(&(&candidate - &weights));
            if candidate_value >= value + ARMIJO * predicted {
                break (candidate, candidate_value);
            }
            step *= 0.5;
            if step < MIN_STEP {
                return Ascent {
                    weights,
                    iterations: iteration,
                    converged: true,
                };
            }
        };

        let change = (&candidate - &weights)
            .iter()
            .fold(0.0_f64, |m, d| m.max(d.abs()));
        weights = candidate;
        value = candidate_value;
        step *= 2.0;

        if change < schedule.tolerance {
            return Ascent {
                weights,
                iterations: iteration + 1,
                converged: true,
            };
        }
    }

    Ascent {
        weights,
        iterations: schedule.max_iterations,
        converged: false,
    }
}
