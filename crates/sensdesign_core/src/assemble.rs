//! Design-matrix assembly
//!
//! Drives the full generation pipeline: validate the configuration,
//! sample the shared background block, expand every sensitivity in
//! declaration order, then stitch the blocks into one rectangular matrix
//! with contiguous realization numbering.

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rustc_hash::FxHashSet;

use crate::error::{DesignError, Result};
use crate::expand::{self, ExpandContext, SensBlock};
use crate::model::design::{DesignMatrix, DesignRow};
use crate::model::spec::{DesignConfig, GlobalPolicy, SeedMode};

/// Generate the design matrix for a configuration.
///
/// Uses the configured `rng_seed` when present, so identical
/// configurations produce identical matrices; otherwise seeds from the
/// operating system.
pub fn generate(config: &DesignConfig) -> Result<DesignMatrix> {
    match config.policy.rng_seed {
        Some(seed) => generate_with_rng(config, &mut StdRng::seed_from_u64(seed)),
        None => generate_with_rng(config, &mut StdRng::from_os_rng()),
    }
}

/// Generate the design matrix, drawing all samples from the given RNG.
///
/// Draw order is fixed: the background block first, then each sensitivity
/// in declaration order with parameters in declaration order.
pub fn generate_with_rng<R: Rng + ?Sized>(
    config: &DesignConfig,
    rng: &mut R,
) -> Result<DesignMatrix> {
    let policy = &config.policy;
    let ctx = ExpandContext {
        policy,
        correlations: &config.correlations,
        dependencies: &config.dependencies,
        extern_tables: &config.extern_tables,
    };

    let mut seen = FxHashSet::default();
    for sens in &config.sensitivities {
        if !seen.insert(sens.name()) {
            return Err(DesignError::DuplicateSensitivityName {
                name: sens.name().to_string(),
            });
        }
    }

    let lengths: Vec<usize> = config
        .sensitivities
        .iter()
        .map(|s| expand::block_len(s, &ctx))
        .collect();
    let max_len = lengths.iter().copied().max().unwrap_or(0);

    // The background is sampled once, before any sensitivity draws, and
    // attached offset-wise to every block.
    let background = match &policy.background {
        Some(spec) if max_len > 0 => expand::sample_background(spec, &ctx, max_len, rng)?,
        _ => Vec::new(),
    };

    let mut blocks: Vec<SensBlock> = Vec::with_capacity(config.sensitivities.len());
    for sens in &config.sensitivities {
        let mut block = expand::expand(sens, &ctx, rng)?;
        for (offset, row) in block.rows.iter_mut().enumerate() {
            for (name, values) in &background {
                // A sensitivity exploring a background parameter keeps its
                // own values for that column.
                row.values
                    .entry(name.clone())
                    .or_insert_with(|| values[offset]);
            }
        }
        blocks.push(block);
    }

    let parameters = column_order(policy, &blocks);

    let mut rows = Vec::with_capacity(lengths.iter().sum());
    let mut real = policy.real_base;
    for block in blocks {
        for block_row in block.rows {
            let mut values = block_row.values;
            for name in &parameters {
                if !values.contains_key(name) {
                    let default = policy.defaults.get(name).copied().ok_or_else(|| {
                        DesignError::UndefinedDefault {
                            sensitivity: block.sensname.clone(),
                            parameter: name.clone(),
                        }
                    })?;
                    values.insert(name.clone(), default);
                }
            }
            rows.push(DesignRow {
                real,
                sensname: block.sensname.clone(),
                senscase: block_row.senscase,
                senstype: block_row.senstype,
                values,
            });
            real += 1;
        }
    }

    Ok(DesignMatrix { parameters, rows })
}

/// Column order of the output matrix: the seed parameter first (when the
/// seed policy generates one), then every parameter in order of first
/// appearance across blocks, then remaining default-only parameters.
fn column_order(policy: &GlobalPolicy, blocks: &[SensBlock]) -> Vec<String> {
    let mut order: Vec<String> = Vec::new();
    let mut seen: FxHashSet<&str> = FxHashSet::default();

    if matches!(policy.seed, SeedMode::Default { .. }) {
        order.push(policy.seed_param.clone());
        seen.insert(&policy.seed_param);
    }

    for block in blocks {
        for row in &block.rows {
            for name in row.values.keys() {
                if seen.insert(name) {
                    order.push(name.clone());
                }
            }
        }
    }

    for name in policy.defaults.keys() {
        if seen.insert(name) {
            order.push(name.clone());
        }
    }

    order
}
