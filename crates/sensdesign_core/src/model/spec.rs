//! Declarative specification of a sensitivity design
//!
//! One `DesignConfig` describes a complete run: the global policy, an
//! ordered list of sensitivities, and the lookup tables they reference.
//! Unknown keys in the struct types are rejected at parse time rather
//! than deep inside sampling.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::distributions::DistributionSpec;
use crate::model::tables::{CorrelationMatrix, DependencyTable, ExternTable};

/// Seed-parameter column name used when the configuration does not
/// override it.
pub const DEFAULT_SEED_PARAM: &str = "RMS_SEED";

fn default_num_realizations() -> usize {
    10
}

fn default_seed_param() -> String {
    DEFAULT_SEED_PARAM.to_string()
}

fn default_seed_base() -> u64 {
    1000
}

/// One named parameter with its sampling specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParameterSpec {
    pub name: String,
    pub distribution: DistributionSpec,
    /// Decimal count for output rounding. Applied only when block values
    /// are written; correlation induction and dependency resolution see
    /// unrounded samples.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimals: Option<u32>,
    /// Correlation-matrix name this parameter belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corr_group: Option<String>,
    /// Dependency-table name for which this parameter is the mother
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depend_group: Option<String>,
}

impl ParameterSpec {
    #[must_use]
    pub fn new(name: impl Into<String>, distribution: DistributionSpec) -> Self {
        Self {
            name: name.into(),
            distribution,
            decimals: None,
            corr_group: None,
            depend_group: None,
        }
    }
}

/// A named case within a scenario sensitivity (e.g. "east"/"west").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioCase {
    pub name: String,
    pub values: BTreeMap<String, f64>,
}

/// One sensitivity specification; tagged by type so that required and
/// optional fields are validated at parse time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Sensitivity {
    /// Only the seed varies; declared parameters stay at fixed values.
    Seed {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        numreal: Option<usize>,
        /// Parameters pinned at fixed values for every realization
        #[serde(default)]
        parameters: BTreeMap<String, f64>,
    },
    /// One realization per declared case (1 or 2 cases).
    Scenario {
        name: String,
        cases: Vec<ScenarioCase>,
    },
    /// Monte Carlo sampling of the declared parameters.
    Dist {
        name: String,
        parameters: Vec<ParameterSpec>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        numreal: Option<usize>,
        /// Correlation-matrix names used by this sensitivity
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        correlations: Vec<String>,
        /// Dependency-table names used by this sensitivity
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        dependencies: Vec<String>,
    },
    /// A single reference realization at global defaults.
    Ref { name: String },
    /// Monte Carlo over the global background block.
    Background {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        numreal: Option<usize>,
    },
    /// Realizations read from an external parameter table.
    Extern {
        name: String,
        table: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        numreal: Option<usize>,
    },
}

impl Sensitivity {
    /// The SENSNAME this sensitivity contributes to the matrix.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Sensitivity::Seed { name, .. }
            | Sensitivity::Scenario { name, .. }
            | Sensitivity::Dist { name, .. }
            | Sensitivity::Ref { name }
            | Sensitivity::Background { name, .. }
            | Sensitivity::Extern { name, .. } => name,
        }
    }
}

/// Seed generation policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SeedMode {
    /// Deterministic increasing sequence: row `r` of every sensitivity
    /// block gets `base + r`. The sequence resets per sensitivity, not
    /// per case.
    Default {
        #[serde(default = "default_seed_base")]
        base: u64,
    },
    /// No seed column is generated.
    None,
}

impl Default for SeedMode {
    fn default() -> Self {
        SeedMode::Default {
            base: default_seed_base(),
        }
    }
}

/// Background parameters sampled once and shared identically across all
/// sensitivities in the design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BackgroundSpec {
    pub parameters: Vec<ParameterSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub correlations: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
}

/// Global policy applied across all sensitivities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GlobalPolicy {
    /// Default realization count for blocks without a `numreal` override
    #[serde(default = "default_num_realizations")]
    pub num_realizations: usize,
    #[serde(default)]
    pub seed: SeedMode,
    #[serde(default = "default_seed_param")]
    pub seed_param: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<BackgroundSpec>,
    /// Scalar fallback per parameter name, used to fill matrix cells a
    /// sensitivity does not set
    #[serde(default)]
    pub defaults: BTreeMap<String, f64>,
    /// Fixed RNG seed for reproducible runs; system-seeded when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rng_seed: Option<u64>,
    /// First realization index of the matrix
    #[serde(default)]
    pub real_base: usize,
}

impl Default for GlobalPolicy {
    fn default() -> Self {
        Self {
            num_realizations: default_num_realizations(),
            seed: SeedMode::default(),
            seed_param: default_seed_param(),
            background: None,
            defaults: BTreeMap::new(),
            rng_seed: None,
            real_base: 0,
        }
    }
}

/// Complete input for one design-matrix generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DesignConfig {
    pub policy: GlobalPolicy,
    /// Sensitivities in declaration order; this order fixes both the
    /// realization numbering and the RNG draw order
    pub sensitivities: Vec<Sensitivity>,
    #[serde(default)]
    pub correlations: BTreeMap<String, CorrelationMatrix>,
    #[serde(default)]
    pub dependencies: BTreeMap<String, DependencyTable>,
    #[serde(default)]
    pub extern_tables: BTreeMap<String, ExternTable>,
}
