//! Nearest correlation matrix (Higham's alternating projections)
//!
//! Finds the correlation matrix closest (in the Frobenius norm) to a
//! symmetric input. The design core itself never repairs a non-positive-
//! definite target; callers that prefer repairing to aborting run their
//! matrix through [`nearcorr`] before handing it to the inducer.

use nalgebra::DMatrix;

use crate::error::CorrelationError;

const SYMMETRY_TOL: f64 = 1e-12;

/// Find the nearest correlation matrix to the symmetric matrix `a`.
///
/// `tol` defaults to `n * f64::EPSILON`; `weights` defines a diagonal
/// weight matrix and defaults to ones.
pub fn nearcorr(
    a: &DMatrix<f64>,
    tol: Option<f64>,
    max_iterations: usize,
    weights: Option<&[f64]>,
) -> Result<DMatrix<f64>, CorrelationError> {
    let n = a.nrows();
    if a.ncols() != n {
        return Err(CorrelationError::ShapeMismatch {
            matrix: n,
            data: a.ncols(),
        });
    }
    for i in 0..n {
        for j in 0..n {
            if (a[(i, j)] - a[(j, i)]).abs() > SYMMETRY_TOL {
                return Err(CorrelationError::NotSymmetric);
            }
        }
    }

    let tol = tol.unwrap_or(n as f64 * f64::EPSILON);
    let ones = vec![1.0; n];
    let weights = weights.unwrap_or(&ones);
    let whalf = DMatrix::from_fn(n, n, |i, j| (weights[i] * weights[j]).sqrt());

    let mut x = a.clone();
    let mut y = a.clone();
    let mut ds = DMatrix::zeros(n, n);

    for _ in 0..max_iterations {
        let r = &x - &ds;
        let r_wtd = whalf.component_mul(&r);
        let x_old = x.clone();
        x = proj_spd(&r_wtd).component_div(&whalf);
        ds = &x - &r;

        let y_old = y.clone();
        y = x.clone();
        y.fill_diagonal(1.0);

        let norm_y = y.norm();
        let rel_diff_x = (&x - &x_old).norm() / x.norm();
        let rel_diff_y = (&y - &y_old).norm() / norm_y;
        let rel_diff_xy = (&y - &x).norm() / norm_y;

        x = y.clone();

        if rel_diff_x.max(rel_diff_y).max(rel_diff_xy) <= tol {
            return Ok(x);
        }
    }

    Err(CorrelationError::NoConvergence {
        iterations: max_iterations,
    })
}

/// Project a symmetric matrix onto the positive-semidefinite cone by
/// clipping negative eigenvalues at zero.
fn proj_spd(a: &DMatrix<f64>) -> DMatrix<f64> {
    let eig = nalgebra::SymmetricEigen::new(a.clone());
    let clamped = eig.eigenvalues.map(|e| e.max(0.0));
    let projected = &eig.eigenvectors
        * DMatrix::from_diagonal(&clamped)
        * eig.eigenvectors.transpose();
    // Symmetrize against round-off
    (&projected + projected.transpose()) * 0.5
}
