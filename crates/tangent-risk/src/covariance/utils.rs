//! Dense matrix utilities for covariance matrices
//!
//! Cholesky factorization and solves, positive-definiteness checks, and a
//! Jacobi eigen-decomposition used for conditioning diagnostics. None of
//! these functions modify their input: a matrix that fails a check is
//! reported, never regularized.

use super::CovarianceError;
use ndarray::{Array1, Array2};

/// Result of eigenvalue decomposition
#[derive(Debug, Clone)]
pub struct EigenDecomposition {
    /// Eigenvalues (sorted in descending order)
    pub eigenvalues: Array1<f64>,
    /// Eigenvectors (columns are eigenvectors)
    pub eigenvectors: Array2<f64>,
}

fn ensure_square(matrix: &Array2<f64>) -> Result<usize, CovarianceError> {
    let n = matrix.nrows();
    if n != matrix.ncols() {
        return Err(CovarianceError::DimensionMismatch {
            expected: n,
            actual: matrix.ncols(),
        });
    }
    Ok(n)
}

/// Lower-triangular Cholesky factor `L` with `L Lᵀ = matrix`.
///
/// # Errors
/// [`CovarianceError::NotPositiveDefinite`] naming the first non-positive pivot.
pub fn cholesky(matrix: &Array2<f64>) -> Result<Array2<f64>, CovarianceError> {
    let n = ensure_square(matrix)?;
    let mut lower = Array2::<f64>::zeros((n, n));

    for j in 0..n {
        let pivot = matrix[[j, j]] - (0..j).map(|k| lower[[j, k]].powi(2)).sum::<f64>();
        if !pivot.is_finite() || pivot <= 0.0 {
            return Err(CovarianceError::NotPositiveDefinite { index: j });
        }
        let diag = pivot.sqrt();
        lower[[j, j]] = diag;
        for i in (j + 1)..n {
            let dot: f64 = (0..j).map(|k| lower[[i, k]] * lower[[j, k]]).sum();
            lower[[i, j]] = (matrix[[i, j]] - dot) / diag;
        }
    }

    Ok(lower)
}

/// Solve `A x = b` given the Cholesky factor `L` of `A`.
pub fn cholesky_solve(lower: &Array2<f64>, b: &Array1<f64>) -> Result<Array1<f64>, CovarianceError> {
    let n = ensure_square(lower)?;
    if b.len() != n {
        return Err(CovarianceError::DimensionMismatch {
            expected: n,
            actual: b.len(),
        });
    }

    // Forward: L y = b
    let mut y = Array1::<f64>::zeros(n);
    for i in 0..n {
        let dot: f64 = (0..i).map(|k| lower[[i, k]] * y[k]).sum();
        y[i] = (b[i] - dot) / lower[[i, i]];
    }

    // Backward: Lᵀ x = y
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let dot: f64 = ((i + 1)..n).map(|k| lower[[k, i]] * x[k]).sum();
        x[i] = (y[i] - dot) / lower[[i, i]];
    }

    Ok(x)
}

/// Check if a matrix is symmetric positive definite
pub fn is_positive_definite(cov: &Array2<f64>) -> bool {
    let n = cov.nrows();
    if n != cov.ncols() {
        return false;
    }
    let symmetric = (0..n).all(|i| {
        (0..i).all(|j| (cov[[i, j]] - cov[[j, i]]).abs() <= 1e-12 * (1.0 + cov[[i, j]].abs()))
    });
    symmetric && cholesky(cov).is_ok()
}

/// Compute the condition number of a matrix
///
/// The condition number is the ratio of the largest to smallest eigenvalue.
/// A large condition number indicates numerical instability.
///
/// # Returns
/// * Condition number (infinity if smallest eigenvalue is zero)
pub fn condition_number(cov: &Array2<f64>) -> f64 {
    match jacobi_eigendecomp(cov, 100, 1e-15) {
        Ok(decomp) => {
            let max_eig = decomp
                .eigenvalues
                .iter()
                .copied()
                .fold(f64::NEG_INFINITY, f64::max);
            let min_eig = decomp
                .eigenvalues
                .iter()
                .copied()
                .fold(f64::INFINITY, f64::min);

            if min_eig.abs() < 1e-15 {
                f64::INFINITY
            } else {
                max_eig / min_eig
            }
        }
        Err(_) => f64::INFINITY,
    }
}

/// Jacobi eigenvalue decomposition for symmetric matrices
///
/// # Arguments
/// * `matrix` - Symmetric matrix to decompose
/// * `max_sweeps` - Maximum number of rotations per off-diagonal element
/// * `tolerance` - Convergence tolerance for off-diagonal elements, relative to the largest diagonal entry
///
/// # Returns
/// * Eigenvalues and eigenvectors
pub fn jacobi_eigendecomp(
    matrix: &Array2<f64>,
    max_sweeps: usize,
    tolerance: f64,
) -> Result<EigenDecomposition, CovarianceError> {
    let n = ensure_square(matrix)?;

    let mut a = matrix.clone();
    let mut v = Array2::<f64>::eye(n);
    let scale = a
        .diag()
        .iter()
        .fold(0.0_f64, |m, d| m.max(d.abs()))
        .max(f64::MIN_POSITIVE);
    let max_rotations = max_sweeps * (n * n.saturating_sub(1) / 2).max(1);

    for _ in 0..max_rotations {
        let (p, q, max_val) = find_largest_off_diagonal(&a);
        if max_val.abs() <= tolerance * scale {
            break;
        }
        let (cos_theta, sin_theta) = compute_rotation(a[[p, p]], a[[q, q]], a[[p, q]]);
        apply_jacobi_rotation(&mut a, &mut v, p, q, cos_theta, sin_theta);
    }

    let mut indices: Vec<usize> = (0..n).collect();
    indices.sort_by(|&i, &j| a[[j, j]].total_cmp(&a[[i, i]]));

    let eigenvalues = indices.iter().map(|&i| a[[i, i]]).collect();
    let mut eigenvectors = Array2::<f64>::zeros((n, n));
    for (new_idx, &old_idx) in indices.iter().enumerate() {
        eigenvectors.column_mut(new_idx).assign(&v.column(old_idx));
    }

    Ok(EigenDecomposition {
        eigenvalues,
        eigenvectors,
    })
}

/// Find the largest off-diagonal element in a symmetric matrix
fn find_largest_off_diagonal(matrix: &Array2<f64>) -> (usize, usize, f64) {
    let n = matrix.nrows();
    let mut max_val = 0.0;
    let (mut p, mut q) = (0, 0);

    for i in 0..n {
        for j in (i + 1)..n {
            let val = matrix[[i, j]].abs();
            if val > max_val {
                max_val = val;
                p = i;
                q = j;
            }
        }
    }

    (p, q, max_val)
}

/// Rotation angle that zeroes `a[p][q]`, as `(cos, sin)`
fn compute_rotation(app: f64, aqq: f64, apq: f64) -> (f64, f64) {
    if apq == 0.0 {
        return (1.0, 0.0);
    }

    let tau = (aqq - app) / (2.0 * apq);
    let t = if tau >= 0.0 {
        1.0 / (tau + (1.0 + tau * tau).sqrt())
    } else {
        -1.0 / (-tau + (1.0 + tau * tau).sqrt())
    };

    let cos_theta = 1.0 / (1.0 + t * t).sqrt();
    (cos_theta, t * cos_theta)
}

fn apply_jacobi_rotation(
    a: &mut Array2<f64>,
    v: &mut Array2<f64>,
    p: usize,
    q: usize,
    c: f64,
    s: f64,
) {
    let n = a.nrows();
    let app = a[[p, p]];
    let aqq = a[[q, q]];
    let apq = a[[p, q]];

    a[[p, p]] = c * c * app - 2.0 * c * s * apq + s * s * aqq;
    a[[q, q]] = s * s * app + 2.0 * c * s * apq + c * c * aqq;
    a[[p, q]] = 0.0;
    a[[q, p]] = 0.0;

    for i in 0..n {
        if i != p && i != q {
            let aip = a[[i, p]];
            let aiq = a[[i, q]];
            a[[i, p]] = c * aip - s * aiq;
            a[[p, i]] = a[[i, p]];
            a[[i, q]] = s * aip + c * aiq;
            a[[q, i]] = a[[i, q]];
        }
    }

    for i in 0..n {
        let vip = v[[i, p]];
        let viq = v[[i, q]];
        v[[i, p]] = c * vip - s * viq;
        v[[i, q]] = s * vip + c * viq;
    }
}
