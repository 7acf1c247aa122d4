//! The assembled design matrix

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// SENSCASE sentinel marking Monte Carlo realizations; downstream tornado
/// logic keys off this label.
pub const SENSCASE_MC: &str = "p10_p90";
/// SENSCASE sentinel for the reference realization.
pub const SENSCASE_REF: &str = "ref";
/// SENSCASE sentinel excluding a sensitivity from summaries.
pub const SENSCASE_SKIP: &str = "skip";

/// Scalar-vs-Monte-Carlo tag carried on every realization row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensType {
    Scalar,
    Mc,
}

impl fmt::Display for SensType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensType::Scalar => write!(f, "scalar"),
            SensType::Mc => write!(f, "mc"),
        }
    }
}

impl std::str::FromStr for SensType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scalar" => Ok(SensType::Scalar),
            "mc" => Ok(SensType::Mc),
            other => Err(format!("unknown senstype {other:?}")),
        }
    }
}

/// One realization: a full parameter assignment for a single run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignRow {
    pub real: usize,
    pub sensname: String,
    pub senscase: String,
    pub senstype: SensType,
    /// Every known parameter name maps to a concrete value; the assembler
    /// guarantees rectangularity
    pub values: BTreeMap<String, f64>,
}

/// Ordered, rectangular realization table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignMatrix {
    /// Parameter column order (metadata columns excluded)
    pub parameters: Vec<String>,
    pub rows: Vec<DesignRow>,
}

impl DesignMatrix {
    /// Number of realizations.
    #[must_use]
    pub fn num_realizations(&self) -> usize {
        self.rows.len()
    }

    /// Value of a parameter in a given row, if present.
    #[must_use]
    pub fn value(&self, row: usize, parameter: &str) -> Option<f64> {
        self.rows.get(row)?.values.get(parameter).copied()
    }

    /// True when every row carries a value for every parameter column.
    #[must_use]
    pub fn is_rectangular(&self) -> bool {
        self.rows.iter().all(|row| {
            row.values.len() == self.parameters.len()
                && self.parameters.iter().all(|p| row.values.contains_key(p))
        })
    }
}
