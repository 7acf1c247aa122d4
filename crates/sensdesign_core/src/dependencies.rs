//! Dependent-parameter propagation
//!
//! A discrete "mother" parameter is sampled first; its per-realization
//! values then select rows in a lookup table that fix one or more
//! dependent parameters. Exactly one mother is permitted per dependency
//! group; multi-parent topologies fail fast at validation time.

use crate::error::DependencyError;
use crate::model::DependencyTable;

/// Relative tolerance for matching a sampled mother value against table
/// keys. Discrete sampling copies values straight from the declared list,
/// so matches are normally exact; the tolerance only absorbs round-off in
/// hand-written tables.
const MATCH_TOL: f64 = 1e-9;

fn values_match(a: f64, b: f64) -> bool {
    a == b || (a - b).abs() <= MATCH_TOL * a.abs().max(b.abs()).max(1.0)
}

/// Resolve dependent columns for the sampled mother values.
///
/// Returns one value vector per entry of `table.dependents`, each the
/// same length as `mother_values`. Fails with `MissingMapping` when a
/// sampled value has no table row.
pub fn resolve(
    mother: &str,
    mother_values: &[f64],
    table: &DependencyTable,
) -> Result<Vec<Vec<f64>>, DependencyError> {
    for row in &table.rows {
        if row.values.len() != table.dependents.len() {
            return Err(DependencyError::UnsupportedDependency {
                reason: format!(
                    "dependency row for mother value {} has {} values but {} dependents",
                    row.mother_value,
                    row.values.len(),
                    table.dependents.len()
                ),
            });
        }
    }

    let mut columns: Vec<Vec<f64>> = table
        .dependents
        .iter()
        .map(|_| Vec::with_capacity(mother_values.len()))
        .collect();

    for &value in mother_values {
        let row = table
            .rows
            .iter()
            .find(|row| values_match(row.mother_value, value))
            .ok_or(DependencyError::MissingMapping {
                parameter: mother.to_string(),
                value,
            })?;
        for (column, dependent_value) in columns.iter_mut().zip(&row.values) {
            column.push(*dependent_value);
        }
    }

    Ok(columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tables::DependencyRow;

    fn table() -> DependencyTable {
        DependencyTable {
            mother: "CHANNEL_TYPE".to_string(),
            dependents: vec!["CHANNEL_WIDTH".to_string(), "CHANNEL_DEPTH".to_string()],
            rows: vec![
                DependencyRow {
                    mother_value: 1.0,
                    values: vec![150.0, 4.0],
                },
                DependencyRow {
                    mother_value: 2.0,
                    values: vec![400.0, 9.0],
                },
            ],
        }
    }

    #[test]
    fn mother_values_select_dependent_rows() {
        let columns = resolve("CHANNEL_TYPE", &[2.0, 1.0, 1.0], &table()).unwrap();
        assert_eq!(columns[0], vec![400.0, 150.0, 150.0]);
        assert_eq!(columns[1], vec![9.0, 4.0, 4.0]);
    }

    #[test]
    fn unmapped_value_is_an_error() {
        let err = resolve("CHANNEL_TYPE", &[3.0], &table()).unwrap_err();
        match err {
            DependencyError::MissingMapping { parameter, value } => {
                assert_eq!(parameter, "CHANNEL_TYPE");
                assert_eq!(value, 3.0);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
