//! Sensitivity expansion
//!
//! Each sensitivity becomes a contiguous block of realization rows. This
//! module produces the per-sensitivity blocks; the assembler stitches them
//! into the final rectangular matrix. All random draws for one block come
//! from the single shared RNG stream, with parameters sampled in
//! declaration order so a fixed seed reproduces the matrix exactly.

use std::collections::BTreeMap;

use nalgebra::DMatrix;
use rand::Rng;
use rustc_hash::FxHashMap;

use crate::correlation::ImanConover;
use crate::dependencies;
use crate::distributions::DistributionKind;
use crate::error::{DependencyError, DesignError, Result};
use crate::model::design::{SENSCASE_MC, SENSCASE_REF, SensType};
use crate::model::spec::{BackgroundSpec, GlobalPolicy, ParameterSpec, SeedMode, Sensitivity};
use crate::model::tables::{CorrelationMatrix, DependencyTable, ExternTable};

/// One realization row of a sensitivity block, before matrix assembly.
#[derive(Debug, Clone)]
pub struct BlockRow {
    pub senscase: String,
    pub senstype: SensType,
    pub values: BTreeMap<String, f64>,
}

/// A contiguous block of realizations produced by one sensitivity.
#[derive(Debug, Clone)]
pub struct SensBlock {
    pub sensname: String,
    pub rows: Vec<BlockRow>,
}

/// Shared lookup context for expansion: the global policy plus every
/// table a sensitivity may reference by name.
pub struct ExpandContext<'a> {
    pub policy: &'a GlobalPolicy,
    pub correlations: &'a BTreeMap<String, CorrelationMatrix>,
    pub dependencies: &'a BTreeMap<String, DependencyTable>,
    pub extern_tables: &'a BTreeMap<String, ExternTable>,
}

/// Number of realization rows a sensitivity will contribute.
///
/// Computed without sampling so the assembler can size the shared
/// background block before any sensitivity draws.
pub fn block_len(sens: &Sensitivity, ctx: &ExpandContext<'_>) -> usize {
    let default = ctx.policy.num_realizations;
    match sens {
        Sensitivity::Seed { numreal, .. }
        | Sensitivity::Dist { numreal, .. }
        | Sensitivity::Background { numreal, .. }
        | Sensitivity::Extern { numreal, .. } => numreal.unwrap_or(default),
        Sensitivity::Scenario { cases, .. } => cases.len(),
        Sensitivity::Ref { .. } => 1,
    }
}

/// Expand one sensitivity into its realization block.
pub fn expand<R: Rng + ?Sized>(
    sens: &Sensitivity,
    ctx: &ExpandContext<'_>,
    rng: &mut R,
) -> Result<SensBlock> {
    let sensname = sens.name().to_string();
    if sensname.is_empty() {
        return Err(DesignError::Config {
            message: "sensitivity name must not be empty".to_string(),
        });
    }

    let mut rows = match sens {
        Sensitivity::Seed { parameters, .. } => {
            if !matches!(ctx.policy.seed, SeedMode::Default { .. }) {
                return Err(DesignError::Config {
                    message: format!(
                        "seed sensitivity {sensname:?} requires the default seed mode"
                    ),
                });
            }
            if parameters.contains_key(&ctx.policy.seed_param) {
                return Err(DesignError::Config {
                    message: format!(
                        "seed sensitivity {sensname:?} pins the seed parameter {:?}",
                        ctx.policy.seed_param
                    ),
                });
            }
            let n = block_len(sens, ctx);
            (0..n)
                .map(|_| BlockRow {
                    senscase: SENSCASE_MC.to_string(),
                    senstype: SensType::Scalar,
                    values: parameters.clone(),
                })
                .collect()
        }
        Sensitivity::Scenario { cases, .. } => {
            if cases.is_empty() || cases.len() > 2 {
                return Err(DesignError::Config {
                    message: format!(
                        "scenario sensitivity {sensname:?} must declare 1 or 2 cases, got {}",
                        cases.len()
                    ),
                });
            }
            if cases.len() == 2 && cases[0].name == cases[1].name {
                return Err(DesignError::Config {
                    message: format!(
                        "scenario sensitivity {sensname:?} declares case {:?} twice",
                        cases[0].name
                    ),
                });
            }
            cases
                .iter()
                .map(|case| BlockRow {
                    senscase: case.name.clone(),
                    senstype: SensType::Scalar,
                    values: case.values.clone(),
                })
                .collect()
        }
        Sensitivity::Dist {
            parameters,
            correlations,
            dependencies,
            ..
        } => {
            let n = block_len(sens, ctx);
            let columns = sample_parameter_set(
                &sensname,
                parameters,
                correlations,
                dependencies,
                ctx,
                n,
                rng,
            )?;
            columns_to_rows(&columns, n, SENSCASE_MC, SensType::Mc)
        }
        Sensitivity::Ref { .. } => vec![BlockRow {
            senscase: SENSCASE_REF.to_string(),
            senstype: SensType::Scalar,
            values: BTreeMap::new(),
        }],
        Sensitivity::Background { .. } => {
            if ctx.policy.background.is_none() {
                return Err(DesignError::Config {
                    message: format!(
                        "background sensitivity {sensname:?} requires a background block \
                         in the global policy"
                    ),
                });
            }
            // Values come from the shared background samples, attached by
            // the assembler.
            let n = block_len(sens, ctx);
            (0..n)
                .map(|_| BlockRow {
                    senscase: SENSCASE_MC.to_string(),
                    senstype: SensType::Mc,
                    values: BTreeMap::new(),
                })
                .collect()
        }
        Sensitivity::Extern { table, .. } => {
            let spec = ctx
                .extern_tables
                .get(table)
                .ok_or_else(|| DesignError::Config {
                    message: format!(
                        "sensitivity {sensname:?} references undefined extern table {table:?}"
                    ),
                })?;
            if !spec.is_rectangular() {
                return Err(DesignError::Config {
                    message: format!("extern table {table:?} is not rectangular"),
                });
            }
            let n = block_len(sens, ctx);
            (0..n)
                .map(|r| {
                    // Rows past the end of the table fall back to defaults
                    // during assembly.
                    let values = match spec.rows.get(r) {
                        Some(row) => spec
                            .columns
                            .iter()
                            .cloned()
                            .zip(row.iter().copied())
                            .collect(),
                        None => BTreeMap::new(),
                    };
                    BlockRow {
                        senscase: SENSCASE_MC.to_string(),
                        senstype: SensType::Mc,
                        values,
                    }
                })
                .collect()
        }
    };

    assign_seeds(&mut rows, ctx.policy);

    Ok(SensBlock { sensname, rows })
}

/// Write the seed sequence into a block: row `r` gets `base + r`.
///
/// The policy owns the seed column, so an existing value (e.g. from an
/// extern table) is overwritten. The sequence restarts for every block.
fn assign_seeds(rows: &mut [BlockRow], policy: &GlobalPolicy) {
    if let SeedMode::Default { base } = policy.seed {
        for (r, row) in rows.iter_mut().enumerate() {
            row.values
                .insert(policy.seed_param.clone(), (base + r as u64) as f64);
        }
    }
}

/// Sample the background parameters once, for sharing across all blocks.
pub fn sample_background<R: Rng + ?Sized>(
    background: &BackgroundSpec,
    ctx: &ExpandContext<'_>,
    n: usize,
    rng: &mut R,
) -> Result<Vec<(String, Vec<f64>)>> {
    sample_parameter_set(
        "background",
        &background.parameters,
        &background.correlations,
        &background.dependencies,
        ctx,
        n,
        rng,
    )
}

/// Sample a declared parameter set: independent draws in declaration
/// order, then correlation induction per referenced matrix, then
/// dependent-column resolution, then output rounding.
///
/// Returns named columns in output order (declared parameters first,
/// dependent columns after, both in declaration order).
fn sample_parameter_set<R: Rng + ?Sized>(
    sensname: &str,
    parameters: &[ParameterSpec],
    correlations: &[String],
    dependency_tables: &[String],
    ctx: &ExpandContext<'_>,
    n: usize,
    rng: &mut R,
) -> Result<Vec<(String, Vec<f64>)>> {
    let mut columns: Vec<(String, Vec<f64>)> = Vec::with_capacity(parameters.len());
    let mut index: FxHashMap<String, usize> = FxHashMap::default();

    for param in parameters {
        if index.contains_key(&param.name) {
            return Err(DesignError::Config {
                message: format!(
                    "sensitivity {sensname:?} declares parameter {:?} twice",
                    param.name
                ),
            });
        }
        if let Some(group) = &param.corr_group {
            if !correlations.contains(group) {
                return Err(DesignError::Config {
                    message: format!(
                        "parameter {:?} names correlation matrix {group:?}, which \
                         sensitivity {sensname:?} does not declare",
                        param.name
                    ),
                });
            }
        }
        if let Some(group) = &param.depend_group {
            if !dependency_tables.contains(group) {
                return Err(DesignError::Config {
                    message: format!(
                        "parameter {:?} names dependency table {group:?}, which \
                         sensitivity {sensname:?} does not declare",
                        param.name
                    ),
                });
            }
        }
        let samples =
            param
                .distribution
                .sample(rng, n)
                .map_err(|source| DesignError::Distribution {
                    sensitivity: sensname.to_string(),
                    parameter: param.name.clone(),
                    source,
                })?;
        index.insert(param.name.clone(), columns.len());
        columns.push((param.name.clone(), samples));
    }

    for matrix_name in correlations {
        induce_correlation(sensname, matrix_name, parameters, ctx, &mut columns, &index)?;
    }

    for table_name in dependency_tables {
        resolve_dependencies(
            sensname,
            table_name,
            parameters,
            ctx,
            &mut columns,
            &mut index,
        )?;
    }

    // Rounding happens last so correlation and dependency resolution see
    // unrounded samples. Dependent columns are copied from the table
    // verbatim and never rounded.
    for param in parameters {
        if let Some(decimals) = param.decimals {
            let scale = 10f64.powi(decimals as i32);
            let column = &mut columns[index[&param.name]].1;
            for value in column.iter_mut() {
                *value = (*value * scale).round() / scale;
            }
        }
    }

    Ok(columns)
}

/// Run one declared correlation matrix through the Iman-Conover inducer,
/// rewriting the member columns in place.
fn induce_correlation(
    sensname: &str,
    matrix_name: &str,
    parameters: &[ParameterSpec],
    ctx: &ExpandContext<'_>,
    columns: &mut [(String, Vec<f64>)],
    index: &FxHashMap<String, usize>,
) -> Result<()> {
    let matrix = ctx
        .correlations
        .get(matrix_name)
        .ok_or_else(|| DesignError::Config {
            message: format!(
                "sensitivity {sensname:?} references undefined correlation matrix {matrix_name:?}"
            ),
        })?;

    let members: Vec<&ParameterSpec> = parameters
        .iter()
        .filter(|p| p.corr_group.as_deref() == Some(matrix_name))
        .collect();
    for name in &matrix.parameters {
        if !members.iter().any(|p| &p.name == name) {
            return Err(DesignError::Config {
                message: format!(
                    "correlation matrix {matrix_name:?} lists parameter {name:?}, which \
                     sensitivity {sensname:?} does not assign to that matrix"
                ),
            });
        }
    }
    for member in &members {
        if !matrix.parameters.contains(&member.name) {
            return Err(DesignError::Config {
                message: format!(
                    "parameter {:?} is assigned to correlation matrix {matrix_name:?} \
                     but the matrix does not list it",
                    member.name
                ),
            });
        }
    }
    if members.len() < 2 {
        return Err(DesignError::Config {
            message: format!(
                "correlation matrix {matrix_name:?} needs at least 2 member parameters"
            ),
        });
    }

    // Constant columns have no rank variation to reorder.
    for member in &members {
        if member.distribution.kind == DistributionKind::Const {
            return Err(DesignError::Correlation {
                sensitivity: sensname.to_string(),
                matrix: matrix_name.to_string(),
                source: crate::error::CorrelationError::DegenerateRankCorrelation,
            });
        }
    }

    let wrap = |source| DesignError::Correlation {
        sensitivity: sensname.to_string(),
        matrix: matrix_name.to_string(),
        source,
    };

    let target = matrix.to_dmatrix().map_err(wrap)?;
    let inducer = ImanConover::new(target).map_err(wrap)?;

    let n = columns.first().map_or(0, |(_, c)| c.len());
    let member_idx: Vec<usize> = matrix.parameters.iter().map(|name| index[name]).collect();
    let x = DMatrix::from_fn(n, member_idx.len(), |i, j| columns[member_idx[j]].1[i]);
    let transformed = inducer.transform(&x).map_err(wrap)?;

    for (j, &col) in member_idx.iter().enumerate() {
        for i in 0..n {
            columns[col].1[i] = transformed[(i, j)];
        }
    }

    Ok(())
}

/// Resolve one declared dependency table, appending its dependent columns.
fn resolve_dependencies(
    sensname: &str,
    table_name: &str,
    parameters: &[ParameterSpec],
    ctx: &ExpandContext<'_>,
    columns: &mut Vec<(String, Vec<f64>)>,
    index: &mut FxHashMap<String, usize>,
) -> Result<()> {
    let table = ctx
        .dependencies
        .get(table_name)
        .ok_or_else(|| DesignError::Config {
            message: format!(
                "sensitivity {sensname:?} references undefined dependency table {table_name:?}"
            ),
        })?;

    let dep_err = |source: DependencyError| DesignError::Dependency {
        sensitivity: sensname.to_string(),
        source,
    };

    let mothers: Vec<&ParameterSpec> = parameters
        .iter()
        .filter(|p| p.depend_group.as_deref() == Some(table_name))
        .collect();
    let mother = match mothers.as_slice() {
        [single] => *single,
        [] => {
            return Err(DesignError::Config {
                message: format!(
                    "dependency table {table_name:?} has no mother parameter in \
                     sensitivity {sensname:?}"
                ),
            });
        }
        many => {
            return Err(dep_err(DependencyError::UnsupportedDependency {
                reason: format!(
                    "dependency table {table_name:?} has {} mother parameters, expected 1",
                    many.len()
                ),
            }));
        }
    };
    if mother.name != table.mother {
        return Err(DesignError::Config {
            message: format!(
                "dependency table {table_name:?} names mother {:?} but parameter {:?} \
                 declares the group",
                table.mother, mother.name
            ),
        });
    }
    if !matches!(
        mother.distribution.kind,
        DistributionKind::Discrete | DistributionKind::Const
    ) {
        return Err(dep_err(DependencyError::UnsupportedDependency {
            reason: format!(
                "mother parameter {:?} must use a discrete distribution",
                mother.name
            ),
        }));
    }

    let mother_values = columns[index[&mother.name]].1.clone();
    let dependent_columns =
        dependencies::resolve(&mother.name, &mother_values, table).map_err(dep_err)?;

    for (name, values) in table.dependents.iter().zip(dependent_columns) {
        if index.contains_key(name) {
            return Err(DesignError::Config {
                message: format!(
                    "dependent parameter {name:?} collides with an existing column in \
                     sensitivity {sensname:?}"
                ),
            });
        }
        index.insert(name.clone(), columns.len());
        columns.push((name.clone(), values));
    }

    Ok(())
}

/// Transpose named columns into block rows.
fn columns_to_rows(
    columns: &[(String, Vec<f64>)],
    n: usize,
    senscase: &str,
    senstype: SensType,
) -> Vec<BlockRow> {
    (0..n)
        .map(|i| BlockRow {
            senscase: senscase.to_string(),
            senstype,
            values: columns
                .iter()
                .map(|(name, values)| (name.clone(), values[i]))
                .collect(),
        })
        .collect()
}
