//! Tests for design-matrix summarization
//!
//! These tests verify that:
//! - Contiguous realization ranges are reconstructed per sensitivity
//! - Scalar vs Monte Carlo classification ignores the seed column
//! - The "skip" sentinel drops cases without consuming a sensno
//! - The reference realization keeps its own classification
//! - Summarizing a freshly generated matrix matches its declaration

use std::collections::BTreeMap;

use crate::assemble::generate;
use crate::distributions::{DistributionKind, DistributionSpec};
use crate::error::DesignError;
use crate::model::design::{DesignMatrix, DesignRow, SensType};
use crate::model::{
    DesignConfig, GlobalPolicy, ParameterSpec, ScenarioCase, Sensitivity,
};
use crate::summary::{SummaryType, summarize};

fn row(
    real: usize,
    sensname: &str,
    senscase: &str,
    values: &[(&str, f64)],
) -> DesignRow {
    DesignRow {
        real,
        sensname: sensname.to_string(),
        senscase: senscase.to_string(),
        senstype: SensType::Scalar,
        values: values
            .iter()
            .map(|(name, value)| (name.to_string(), *value))
            .collect(),
    }
}

fn matrix(rows: Vec<DesignRow>) -> DesignMatrix {
    let parameters = rows
        .first()
        .map(|r| r.values.keys().cloned().collect())
        .unwrap_or_default();
    DesignMatrix { parameters, rows }
}

/// Test range reconstruction over a mixed matrix
#[test]
fn test_ranges_and_classification() {
    let m = matrix(vec![
        // Seed sensitivity: identical values apart from the seed column
        row(0, "rms_seed", "p10_p90", &[("RMS_SEED", 1000.0), ("PORO", 0.2)]),
        row(1, "rms_seed", "p10_p90", &[("RMS_SEED", 1001.0), ("PORO", 0.2)]),
        row(2, "rms_seed", "p10_p90", &[("RMS_SEED", 1002.0), ("PORO", 0.2)]),
        // Scenario sensitivity with two cases
        row(3, "faults", "east", &[("RMS_SEED", 1000.0), ("PORO", 0.25)]),
        row(4, "faults", "west", &[("RMS_SEED", 1000.0), ("PORO", 0.15)]),
        // Monte Carlo sensitivity: sampled values differ per row
        row(5, "poro", "p10_p90", &[("RMS_SEED", 1000.0), ("PORO", 0.21)]),
        row(6, "poro", "p10_p90", &[("RMS_SEED", 1001.0), ("PORO", 0.27)]),
    ]);

    let summaries = summarize(&m, Some("RMS_SEED")).unwrap();

    assert_eq!(summaries.len(), 3);

    let seed = &summaries[0];
    assert_eq!(seed.sensno, 1);
    assert_eq!(seed.sensname, "rms_seed");
    assert_eq!(seed.senstype, SummaryType::Scalar);
    assert_eq!((seed.startreal1, seed.endreal1), (0, 2));
    assert_eq!(seed.casename2, None);

    let faults = &summaries[1];
    assert_eq!(faults.senstype, SummaryType::Scalar);
    assert_eq!(faults.casename1, "east");
    assert_eq!((faults.startreal1, faults.endreal1), (3, 3));
    assert_eq!(faults.casename2.as_deref(), Some("west"));
    assert_eq!((faults.startreal2, faults.endreal2), (Some(4), Some(4)));

    let poro = &summaries[2];
    assert_eq!(poro.senstype, SummaryType::Mc);
    assert_eq!((poro.startreal1, poro.endreal1), (5, 6));
}

/// Test that seed-only variation still counts as Monte Carlo when no
/// seed column is named
#[test]
fn test_classification_without_seed_column() {
    let m = matrix(vec![
        row(0, "rms_seed", "p10_p90", &[("RMS_SEED", 1000.0)]),
        row(1, "rms_seed", "p10_p90", &[("RMS_SEED", 1001.0)]),
    ]);

    let with_seed = summarize(&m, Some("RMS_SEED")).unwrap();
    assert_eq!(with_seed[0].senstype, SummaryType::Scalar);

    let without = summarize(&m, None).unwrap();
    assert_eq!(without[0].senstype, SummaryType::Mc);
}

/// Test that "skip" cases are dropped and fully skipped sensitivities
/// consume no sensno
#[test]
fn test_skip_sentinel_is_excluded() {
    let m = matrix(vec![
        row(0, "dropped", "skip", &[("PORO", 0.2)]),
        row(1, "dropped", "skip", &[("PORO", 0.2)]),
        row(2, "faults", "east", &[("PORO", 0.25)]),
        row(3, "faults", "skip", &[("PORO", 0.3)]),
    ]);

    let summaries = summarize(&m, None).unwrap();

    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].sensno, 1);
    assert_eq!(summaries[0].sensname, "faults");
    assert_eq!(summaries[0].casename1, "east");
    assert_eq!(summaries[0].casename2, None);
}

/// Test the reference-realization classification
#[test]
fn test_ref_classification() {
    let m = matrix(vec![
        row(0, "ref", "ref", &[("PORO", 0.2)]),
        row(1, "poro", "p10_p90", &[("PORO", 0.21)]),
        row(2, "poro", "p10_p90", &[("PORO", 0.27)]),
    ]);

    let summaries = summarize(&m, None).unwrap();

    assert_eq!(summaries[0].senstype, SummaryType::Ref);
    assert_eq!(summaries[0].casename1, "ref");
    assert_eq!((summaries[0].startreal1, summaries[0].endreal1), (0, 0));
}

/// Test that more than two cases in one sensitivity is an error
#[test]
fn test_three_cases_are_rejected() {
    let m = matrix(vec![
        row(0, "faults", "east", &[("PORO", 0.1)]),
        row(1, "faults", "west", &[("PORO", 0.2)]),
        row(2, "faults", "north", &[("PORO", 0.3)]),
    ]);

    assert!(matches!(
        summarize(&m, None).unwrap_err(),
        DesignError::Config { .. }
    ));
}

/// Test that non-contiguous sensitivity blocks are rejected
#[test]
fn test_non_contiguous_blocks_are_rejected() {
    let m = matrix(vec![
        row(0, "a", "p10_p90", &[("PORO", 0.1)]),
        row(1, "b", "p10_p90", &[("PORO", 0.2)]),
        row(2, "a", "p10_p90", &[("PORO", 0.3)]),
    ]);

    assert!(matches!(
        summarize(&m, None).unwrap_err(),
        DesignError::Config { .. }
    ));
}

/// Test that summarizing a generated matrix reconstructs the declared
/// design
#[test]
fn test_generated_matrix_round_trips_through_summary() {
    let config = DesignConfig {
        policy: GlobalPolicy {
            rng_seed: Some(42),
            num_realizations: 3,
            defaults: BTreeMap::from([
                ("PORO".to_string(), 0.2),
                ("FAULT_POSITION".to_string(), 0.0),
            ]),
            ..GlobalPolicy::default()
        },
        sensitivities: vec![
            Sensitivity::Seed {
                name: "rms_seed".to_string(),
                numreal: None,
                parameters: BTreeMap::new(),
            },
            Sensitivity::Scenario {
                name: "faults".to_string(),
                cases: vec![
                    ScenarioCase {
                        name: "east".to_string(),
                        values: BTreeMap::from([("FAULT_POSITION".to_string(), 100.0)]),
                    },
                    ScenarioCase {
                        name: "west".to_string(),
                        values: BTreeMap::from([("FAULT_POSITION".to_string(), -100.0)]),
                    },
                ],
            },
            Sensitivity::Dist {
                name: "poro".to_string(),
                parameters: vec![ParameterSpec::new(
                    "PORO",
                    DistributionSpec::new(DistributionKind::Uniform, vec![0.1, 0.3]),
                )],
                numreal: None,
                correlations: Vec::new(),
                dependencies: Vec::new(),
            },
            Sensitivity::Ref {
                name: "ref".to_string(),
            },
        ],
        correlations: BTreeMap::new(),
        dependencies: BTreeMap::new(),
        extern_tables: BTreeMap::new(),
    };

    let m = generate(&config).unwrap();
    let summaries = summarize(&m, Some("RMS_SEED")).unwrap();

    assert_eq!(summaries.len(), 4);

    assert_eq!(summaries[0].sensname, "rms_seed");
    assert_eq!(summaries[0].senstype, SummaryType::Scalar);
    assert_eq!((summaries[0].startreal1, summaries[0].endreal1), (0, 2));

    assert_eq!(summaries[1].sensname, "faults");
    assert_eq!(summaries[1].senstype, SummaryType::Scalar);
    assert_eq!(summaries[1].casename1, "east");
    assert_eq!(summaries[1].casename2.as_deref(), Some("west"));

    assert_eq!(summaries[2].sensname, "poro");
    assert_eq!(summaries[2].senstype, SummaryType::Mc);
    assert_eq!((summaries[2].startreal1, summaries[2].endreal1), (5, 7));

    assert_eq!(summaries[3].sensname, "ref");
    assert_eq!(summaries[3].senstype, SummaryType::Ref);
    assert_eq!((summaries[3].startreal1, summaries[3].endreal1), (8, 8));
}
