//! Tests for the distribution catalog
//!
//! These tests verify that:
//! - Every canonical name and alias resolves, exhaustively
//! - Prefix resolution is deterministic and rejects ambiguity
//! - P10/P90 back-solving reproduces the requested quantiles
//! - Sampled values respect bounds, truncation and discrete weights

use rand::SeedableRng;
use rand::rngs::StdRng;
use statrs::distribution::{Beta as BetaCdf, ContinuousCDF, Normal as NormalCdf};

use crate::distributions::{
    DistributionKind, DistributionSpec, Parametrization, Truncation, resolve,
};
use crate::error::DistributionError;

fn p10_p90_spec(kind: DistributionKind, params: Vec<f64>) -> DistributionSpec {
    DistributionSpec {
        kind,
        params,
        weights: None,
        truncation: None,
        parametrization: Parametrization::P10P90,
    }
}

/// Test every registered name and alias, exhaustively
#[test]
fn test_all_aliases_resolve() {
    let expected = [
        ("normal", DistributionKind::Normal),
        ("norm", DistributionKind::Normal),
        ("gauss", DistributionKind::Normal),
        ("gaussian", DistributionKind::Normal),
        ("lognormal", DistributionKind::LogNormal),
        ("logn", DistributionKind::LogNormal),
        ("uniform", DistributionKind::Uniform),
        ("unif", DistributionKind::Uniform),
        ("loguniform", DistributionKind::LogUniform),
        ("logunif", DistributionKind::LogUniform),
        ("triangular", DistributionKind::Triangular),
        ("triang", DistributionKind::Triangular),
        ("tri", DistributionKind::Triangular),
        ("pert", DistributionKind::Pert),
        ("beta", DistributionKind::Beta),
        ("discrete", DistributionKind::Discrete),
        ("disc", DistributionKind::Discrete),
        ("const", DistributionKind::Const),
        ("constant", DistributionKind::Const),
        ("fixed", DistributionKind::Const),
    ];
    for (token, kind) in expected {
        assert_eq!(resolve(token).unwrap(), kind, "token {token:?}");
        // Case-insensitive
        assert_eq!(resolve(&token.to_uppercase()).unwrap(), kind);
    }
}

/// Test unique-prefix resolution and ambiguity rejection
#[test]
fn test_prefix_resolution() {
    assert_eq!(resolve("p").unwrap(), DistributionKind::Pert);
    assert_eq!(resolve("u").unwrap(), DistributionKind::Uniform);
    assert_eq!(resolve("di").unwrap(), DistributionKind::Discrete);

    match resolve("log").unwrap_err() {
        DistributionError::AmbiguousDistribution { candidates, .. } => {
            assert!(candidates.contains(&"lognormal"));
            assert!(candidates.contains(&"loguniform"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(matches!(
        resolve("weibull").unwrap_err(),
        DistributionError::UnknownDistribution { .. }
    ));
}

/// Test the normal P10/P90 back-solve: the canonical parameters must put
/// the requested mass at the requested quantiles
#[test]
fn test_normal_p10_p90_round_trip() {
    let spec = p10_p90_spec(DistributionKind::Normal, vec![3000.0, 2000.0]);
    let params = spec.canonical_params().unwrap();
    let dist = NormalCdf::new(params[0], params[1]).unwrap();

    assert!((dist.cdf(2000.0) - 0.10).abs() < 1e-9, "CDF(p90) must be 0.10");
    assert!((dist.cdf(3000.0) - 0.90).abs() < 1e-9, "CDF(p10) must be 0.90");
}

/// Test the uniform P10/P90 back-solve
#[test]
fn test_uniform_p10_p90_round_trip() {
    let spec = p10_p90_spec(DistributionKind::Uniform, vec![0.9, 0.1]);
    let params = spec.canonical_params().unwrap();
    let (min, max) = (params[0], params[1]);

    assert!((min + 0.1 * (max - min) - 0.1).abs() < 1e-9);
    assert!((min + 0.9 * (max - min) - 0.9).abs() < 1e-9);
}

/// Test the lognormal P10/P90 back-solve in log space
#[test]
fn test_lognormal_p10_p90_round_trip() {
    let spec = p10_p90_spec(DistributionKind::LogNormal, vec![500.0, 50.0]);
    let params = spec.canonical_params().unwrap();
    let z90 = NormalCdf::standard().inverse_cdf(0.9);

    // CDF(x) = Phi((ln x - mu) / sigma)
    let z_at = |x: f64| (x.ln() - params[0]) / params[1];
    assert!((z_at(50.0) + z90).abs() < 1e-9);
    assert!((z_at(500.0) - z90).abs() < 1e-9);
}

/// Test the triangular P10/P90 quantile fit with the mode held fixed
#[test]
fn test_triangular_p10_p90_fit() {
    let spec = p10_p90_spec(DistributionKind::Triangular, vec![400.0, 250.0, 100.0]);
    let params = spec.canonical_params().unwrap();
    let (min, mode, max) = (params[0], params[1], params[2]);

    assert_eq!(mode, 250.0, "mode is held fixed");
    assert!(min < 100.0 && max > 400.0);
    let dist = statrs::distribution::Triangular::new(min, max, mode).unwrap();
    assert!((dist.inverse_cdf(0.1) - 100.0).abs() < 1e-6);
    assert!((dist.inverse_cdf(0.9) - 400.0).abs() < 1e-6);
}

/// Test the PERT P10/P90 quantile fit
#[test]
fn test_pert_p10_p90_fit() {
    let spec = p10_p90_spec(DistributionKind::Pert, vec![400.0, 250.0, 100.0]);
    let params = spec.canonical_params().unwrap();
    let (min, mode, max) = (params[0], params[1], params[2]);

    assert_eq!(mode, 250.0);
    let span = max - min;
    let (alpha, beta) = (
        1.0 + 4.0 * (mode - min) / span,
        1.0 + 4.0 * (max - mode) / span,
    );
    let dist = BetaCdf::new(alpha, beta).unwrap();
    let q = |p: f64| min + span * dist.inverse_cdf(p);
    assert!((q(0.1) - 100.0).abs() < 1e-6);
    assert!((q(0.9) - 400.0).abs() < 1e-6);
}

/// Test that a degenerate or inverted percentile pair is rejected
#[test]
fn test_degenerate_percentile_pair_is_rejected() {
    let equal = p10_p90_spec(DistributionKind::Normal, vec![100.0, 100.0]);
    assert!(matches!(
        equal.canonical_params().unwrap_err(),
        DistributionError::InvalidParameter { .. }
    ));

    // p10 below p90 violates the high-side convention
    let inverted = p10_p90_spec(DistributionKind::Normal, vec![100.0, 200.0]);
    assert!(matches!(
        inverted.canonical_params().unwrap_err(),
        DistributionError::InvalidParameter { .. }
    ));
}

/// Test weighted discrete sampling frequencies at a fixed seed
#[test]
fn test_discrete_weighted_frequencies() {
    let spec = DistributionSpec {
        kind: DistributionKind::Discrete,
        params: vec![1.0, 2.0, 3.0],
        weights: Some(vec![0.1, 0.1, 0.8]),
        truncation: None,
        parametrization: Parametrization::Direct,
    };
    let n = 10_000;
    let mut rng = StdRng::seed_from_u64(42);
    let samples = spec.sample(&mut rng, n).unwrap();

    let freq = samples.iter().filter(|v| **v == 3.0).count() as f64 / n as f64;
    // 3 standard errors of a Bernoulli(0.8) proportion at n = 10,000
    let tolerance = 3.0 * (0.8f64 * 0.2 / n as f64).sqrt();
    assert!(
        (freq - 0.8).abs() <= tolerance,
        "frequency of value 3 was {freq}, expected 0.8 +/- {tolerance}"
    );
    assert!(samples.iter().all(|v| [1.0, 2.0, 3.0].contains(v)));
}

/// Test that truncation bounds are honored by rejection sampling
#[test]
fn test_truncated_normal_respects_bounds() {
    let spec = DistributionSpec {
        kind: DistributionKind::Normal,
        params: vec![0.0, 1.0],
        weights: None,
        truncation: Some(Truncation { min: -0.5, max: 0.5 }),
        parametrization: Parametrization::Direct,
    };
    let mut rng = StdRng::seed_from_u64(42);
    let samples = spec.sample(&mut rng, 1000).unwrap();
    assert!(samples.iter().all(|v| (-0.5..=0.5).contains(v)));
}

/// Test that an impossible truncation interval exhausts the retry budget
#[test]
fn test_empty_truncation_interval_is_rejected() {
    let spec = DistributionSpec {
        kind: DistributionKind::Normal,
        params: vec![0.0, 1.0],
        weights: None,
        truncation: Some(Truncation {
            min: 50.0,
            max: 51.0,
        }),
        parametrization: Parametrization::Direct,
    };
    let mut rng = StdRng::seed_from_u64(42);
    assert!(matches!(
        spec.sample(&mut rng, 10).unwrap_err(),
        DistributionError::InvalidParameter { .. }
    ));
}

/// Test that inconsistent truncation bounds fail validation
#[test]
fn test_inverted_truncation_bounds_are_rejected() {
    let spec = DistributionSpec {
        kind: DistributionKind::Normal,
        params: vec![0.0, 1.0],
        weights: None,
        truncation: Some(Truncation { min: 2.0, max: 1.0 }),
        parametrization: Parametrization::Direct,
    };
    assert!(matches!(
        spec.canonical_params().unwrap_err(),
        DistributionError::InvalidParameter { .. }
    ));
}

/// Test that uniform samples stay inside the declared bounds
#[test]
fn test_uniform_bounds() {
    let spec = DistributionSpec::new(DistributionKind::Uniform, vec![0.1, 0.3]);
    let mut rng = StdRng::seed_from_u64(42);
    let samples = spec.sample(&mut rng, 1000).unwrap();
    assert!(samples.iter().all(|v| (0.1..0.3).contains(v)));
}

/// Test that loguniform sampling is uniform in log space
#[test]
fn test_loguniform_bounds_and_median() {
    let spec = DistributionSpec::new(DistributionKind::LogUniform, vec![1.0, 10_000.0]);
    let mut rng = StdRng::seed_from_u64(42);
    let samples = spec.sample(&mut rng, 4000).unwrap();
    assert!(samples.iter().all(|v| (1.0..10_000.0).contains(v)));
    // Log-space midpoint is 100; about half the mass sits below it
    let below = samples.iter().filter(|v| **v < 100.0).count() as f64 / 4000.0;
    assert!((below - 0.5).abs() < 0.05, "fraction below log-midpoint was {below}");
}

/// Test that negative discrete weights are rejected
#[test]
fn test_negative_weights_are_rejected() {
    let spec = DistributionSpec {
        kind: DistributionKind::Discrete,
        params: vec![1.0, 2.0],
        weights: Some(vec![0.5, -0.5]),
        truncation: None,
        parametrization: Parametrization::Direct,
    };
    assert!(matches!(
        spec.canonical_params().unwrap_err(),
        DistributionError::InvalidParameter { .. }
    ));
}
