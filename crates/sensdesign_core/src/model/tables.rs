//! Lookup tables referenced by sensitivity specifications

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::error::CorrelationError;

/// A target correlation matrix keyed by parameter names.
///
/// `values[i][j]` is the target correlation between `parameters[i]` and
/// `parameters[j]`; the diagonal must be 1 and the matrix symmetric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CorrelationMatrix {
    pub parameters: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    /// Number of correlated parameters.
    #[must_use]
    pub fn order(&self) -> usize {
        self.parameters.len()
    }

    /// Convert to a dense matrix, checking only the shape; statistical
    /// validity (symmetry, unit diagonal, positive definiteness) is
    /// checked by the correlation inducer.
    pub fn to_dmatrix(&self) -> Result<DMatrix<f64>, CorrelationError> {
        let k = self.order();
        if self.values.len() != k || self.values.iter().any(|row| row.len() != k) {
            return Err(CorrelationError::ShapeMismatch {
                matrix: self.values.len(),
                data: k,
            });
        }
        Ok(DMatrix::from_fn(k, k, |i, j| self.values[i][j]))
    }
}

/// Per-mother-value lookup table driving dependent parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DependencyTable {
    /// The single discrete mother parameter
    pub mother: String,
    /// Dependent column names, in output order
    pub dependents: Vec<String>,
    pub rows: Vec<DependencyRow>,
}

/// One mapping row: a mother value and the dependent values it selects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DependencyRow {
    pub mother_value: f64,
    pub values: Vec<f64>,
}

/// A fixed external parameter table (rows = realizations).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExternTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

impl ExternTable {
    /// True when every row has one value per column.
    #[must_use]
    pub fn is_rectangular(&self) -> bool {
        self.rows.iter().all(|row| row.len() == self.columns.len())
    }
}
