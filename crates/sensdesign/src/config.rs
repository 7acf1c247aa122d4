//! Configuration loading and optional correlation-matrix repair

use std::fs;
use std::path::Path;

use color_eyre::eyre::eyre;
use sensdesign_core::correlation::ImanConover;
use sensdesign_core::model::{DesignConfig, Sensitivity};
use sensdesign_core::nearest_correlation::nearcorr;

const REPAIR_MAX_ITERATIONS: usize = 100;

/// Load a design configuration from a YAML file.
pub fn load_config(path: &Path) -> color_eyre::Result<DesignConfig> {
    let text = fs::read_to_string(path)
        .map_err(|e| eyre!("failed to read {}: {e}", path.display()))?;
    let config: DesignConfig = serde_saphyr::from_str(&text)
        .map_err(|e| eyre!("failed to parse {}: {e}", path.display()))?;
    validate_csv_names(&config)?;
    Ok(config)
}

/// Reject names that would corrupt the unquoted CSV output.
///
/// Covers every name that ends up in a matrix cell or header: sensitivity
/// and case names, parameter names from all sources, and the seed column.
fn validate_csv_names(config: &DesignConfig) -> color_eyre::Result<()> {
    let check = |kind: &str, name: &str| {
        if name.contains([',', '"', '\n', '\r']) {
            Err(eyre!("{kind} name {name:?} would break the CSV output"))
        } else {
            Ok(())
        }
    };

    check("seed parameter", &config.policy.seed_param)?;
    for name in config.policy.defaults.keys() {
        check("parameter", name)?;
    }
    if let Some(background) = &config.policy.background {
        for param in &background.parameters {
            check("parameter", &param.name)?;
        }
    }
    for sens in &config.sensitivities {
        check("sensitivity", sens.name())?;
        match sens {
            Sensitivity::Seed { parameters, .. } => {
                for name in parameters.keys() {
                    check("parameter", name)?;
                }
            }
            Sensitivity::Scenario { cases, .. } => {
                for case in cases {
                    check("case", &case.name)?;
                    for name in case.values.keys() {
                        check("parameter", name)?;
                    }
                }
            }
            Sensitivity::Dist { parameters, .. } => {
                for param in parameters {
                    check("parameter", &param.name)?;
                }
            }
            _ => {}
        }
    }
    for table in config.extern_tables.values() {
        for name in &table.columns {
            check("parameter", name)?;
        }
    }
    for table in config.dependencies.values() {
        for name in &table.dependents {
            check("parameter", name)?;
        }
    }
    Ok(())
}

/// Project declared correlation matrices that are not positive definite
/// onto the nearest valid correlation matrix.
///
/// The core never repairs a matrix on its own; this is an explicit,
/// logged opt-in. Matrices the repair cannot fix (e.g. asymmetric input)
/// are left for the core to reject with full context.
pub fn repair_correlations(config: &mut DesignConfig) -> color_eyre::Result<()> {
    for (name, matrix) in config.correlations.iter_mut() {
        let target = matrix
            .to_dmatrix()
            .map_err(|e| eyre!("correlation matrix {name:?}: {e}"))?;
        if ImanConover::new(target.clone()).is_ok() {
            continue;
        }

        let repaired = match nearcorr(&target, None, REPAIR_MAX_ITERATIONS, None) {
            Ok(repaired) => repaired,
            Err(e) => {
                tracing::warn!("could not repair correlation matrix {name:?}: {e}");
                continue;
            }
        };
        tracing::warn!(
            "correlation matrix {name:?} is not positive definite; \
             projected to the nearest valid matrix"
        );
        for i in 0..matrix.parameters.len() {
            for j in 0..matrix.parameters.len() {
                matrix.values[i][j] = repaired[(i, j)];
            }
        }
    }
    Ok(())
}
