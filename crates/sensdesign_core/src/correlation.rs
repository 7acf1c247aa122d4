//! Rank-correlation induction (Iman-Conover)
//!
//! Given independently drawn marginal samples and a target correlation
//! matrix, reassign samples to realizations so that the realized rank
//! correlation approximates the target. Each column keeps its exact
//! marginal multiset; only the row assignment changes.
//!
//! The achieved correlation is a best-effort approximation. It converges
//! for large sample counts but is never exact, so tests compare within a
//! tolerance rather than asserting equality.

use std::cmp::Ordering;

use nalgebra::DMatrix;
use statrs::distribution::{ContinuousCDF, Normal};

use crate::error::CorrelationError;

const SYMMETRY_TOL: f64 = 1e-9;

/// An Iman-Conover transform for one target correlation matrix.
#[derive(Debug)]
pub struct ImanConover {
    target_cholesky: DMatrix<f64>,
    order: usize,
}

impl ImanConover {
    /// Validate the target matrix and precompute its Cholesky factor.
    ///
    /// Fails with `NonPositiveDefinite` when the matrix admits no
    /// Cholesky factorization, including entries outside [-1, 1]. The
    /// matrix is never repaired here; callers that want a repair can use
    /// [`crate::nearest_correlation::nearcorr`] first.
    pub fn new(target: DMatrix<f64>) -> Result<Self, CorrelationError> {
        let (rows, cols) = target.shape();
        if rows != cols {
            return Err(CorrelationError::ShapeMismatch {
                matrix: rows,
                data: cols,
            });
        }
        for i in 0..rows {
            let d = target[(i, i)];
            if (d - 1.0).abs() > SYMMETRY_TOL {
                return Err(CorrelationError::UnitDiagonalViolated { index: i, value: d });
            }
            for j in 0..cols {
                let v = target[(i, j)];
                if !v.is_finite() || v.abs() > 1.0 + SYMMETRY_TOL {
                    return Err(CorrelationError::NonPositiveDefinite {
                        detail: format!("entry ({i}, {j}) = {v} is outside [-1, 1]"),
                    });
                }
                if (v - target[(j, i)]).abs() > SYMMETRY_TOL {
                    return Err(CorrelationError::NotSymmetric);
                }
            }
        }

        let chol = nalgebra::Cholesky::new(target).ok_or_else(|| {
            CorrelationError::NonPositiveDefinite {
                detail: "Cholesky factorization failed".to_string(),
            }
        })?;

        Ok(Self {
            target_cholesky: chol.l(),
            order: rows,
        })
    }

    /// Order of the target matrix.
    #[must_use]
    pub fn order(&self) -> usize {
        self.order
    }

    /// Reorder the sample assignment of `x` (rows = realizations,
    /// columns = variables) towards the target correlation.
    ///
    /// The output has byte-identical column multisets; only the
    /// realization-to-sample assignment changes.
    pub fn transform(&self, x: &DMatrix<f64>) -> Result<DMatrix<f64>, CorrelationError> {
        let (n, k) = x.shape();
        if k != self.order {
            return Err(CorrelationError::ShapeMismatch {
                matrix: self.order,
                data: k,
            });
        }
        if n <= k {
            return Err(CorrelationError::TooFewSamples {
                rows: n,
                columns: k,
            });
        }

        // Step 1: van der Waerden scores turn the data into an
        // approximately multivariate-normal sample with the same rank
        // correlation as the input.
        let gauss = Normal::standard();
        let mut scores = DMatrix::zeros(n, k);
        for j in 0..k {
            let ranks = column_ranks(x, j);
            for i in 0..n {
                let u = (ranks[i] as f64 + 1.0) / (n as f64 + 1.0);
                scores[(i, j)] = gauss.inverse_cdf(u);
            }
        }

        // Step 2: remove whatever correlation the scores already carry.
        let empirical = empirical_correlation(&scores);
        let emp_chol = nalgebra::Cholesky::new(empirical)
            .ok_or(CorrelationError::DegenerateRankCorrelation)?;
        let decorrelated = emp_chol
            .l()
            .solve_lower_triangular(&scores.transpose())
            .ok_or(CorrelationError::DegenerateRankCorrelation)?
            .transpose();

        // Step 3: induce the target correlation in normal space.
        let correlated = &decorrelated * self.target_cholesky.transpose();

        // Step 4: map back through ranks, preserving each marginal.
        let mut result = DMatrix::zeros(n, k);
        for j in 0..k {
            let mut sorted: Vec<f64> = x.column(j).iter().copied().collect();
            sorted.sort_by(total_cmp);
            let order = argsort(correlated.column(j).iter().copied());
            // order[r] is the row holding rank r in the correlated scores
            for (rank, &row) in order.iter().enumerate() {
                result[(row, j)] = sorted[rank];
            }
        }

        Ok(result)
    }
}

fn total_cmp(a: &f64, b: &f64) -> Ordering {
    a.partial_cmp(b).unwrap_or(Ordering::Equal)
}

/// Stable ascending argsort: element `r` of the result is the index
/// holding rank `r`. Ties keep input order, which keeps the transform
/// deterministic.
fn argsort(values: impl Iterator<Item = f64>) -> Vec<usize> {
    let values: Vec<f64> = values.collect();
    let mut idx: Vec<usize> = (0..values.len()).collect();
    idx.sort_by(|&a, &b| total_cmp(&values[a], &values[b]));
    idx
}

/// Ordinal rank of every entry in column `j` (0 = smallest).
fn column_ranks(x: &DMatrix<f64>, j: usize) -> Vec<usize> {
    let order = argsort(x.column(j).iter().copied());
    let mut ranks = vec![0usize; order.len()];
    for (rank, &row) in order.iter().enumerate() {
        ranks[row] = rank;
    }
    ranks
}

/// Pearson correlation matrix of the columns of `x`.
#[must_use]
pub fn empirical_correlation(x: &DMatrix<f64>) -> DMatrix<f64> {
    let (n, k) = x.shape();
    let mut centered = x.clone();
    for j in 0..k {
        let mean = x.column(j).sum() / n as f64;
        for i in 0..n {
            centered[(i, j)] -= mean;
        }
    }
    let cov = centered.transpose() * &centered / (n as f64 - 1.0);
    let mut corr = DMatrix::zeros(k, k);
    for i in 0..k {
        for j in 0..k {
            corr[(i, j)] = cov[(i, j)] / (cov[(i, i)] * cov[(j, j)]).sqrt();
        }
    }
    corr
}
