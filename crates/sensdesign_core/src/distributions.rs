//! Parametrized scalar distributions for design-matrix sampling
//!
//! Every distribution draws from a caller-supplied RNG so that a whole
//! design can be generated from one seeded stream in a fixed call order.
//! The `const` kind draws nothing at all, which keeps seeded streams
//! byte-stable when constants are mixed into a sensitivity.

use rand::Rng;
use rand_distr::Distribution;
use serde::{Deserialize, Serialize};
use statrs::distribution::{
    Beta as BetaCdf, ContinuousCDF, Normal as NormalCdf, Triangular as TriangularCdf,
};

use crate::error::DistributionError;

/// Retry budget for rejection-resampling a truncated draw. Exhausting it
/// means the truncation interval holds essentially no probability mass.
const MAX_REJECTION_ATTEMPTS: usize = 10_000;

/// Iteration cap for the P10/P90 quantile-matching back-solve of
/// triangular and PERT parameters.
const MAX_QUANTILE_FIT_ITERATIONS: usize = 200;

/// Registered distribution families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistributionKind {
    Normal,
    #[serde(rename = "lognormal")]
    LogNormal,
    Uniform,
    #[serde(rename = "loguniform")]
    LogUniform,
    Triangular,
    Pert,
    Beta,
    Discrete,
    Const,
}

/// Canonical names and aliases, in registry order. Resolution is
/// deterministic: exact matches win, then unique prefixes.
const REGISTRY: &[(DistributionKind, &str, &[&str])] = &[
    (DistributionKind::Normal, "normal", &["norm", "gauss", "gaussian"]),
    (DistributionKind::LogNormal, "lognormal", &["logn"]),
    (DistributionKind::Uniform, "uniform", &["unif"]),
    (DistributionKind::LogUniform, "loguniform", &["logunif"]),
    (DistributionKind::Triangular, "triangular", &["triang", "tri"]),
    (DistributionKind::Pert, "pert", &[]),
    (DistributionKind::Beta, "beta", &[]),
    (DistributionKind::Discrete, "discrete", &["disc"]),
    (DistributionKind::Const, "const", &["constant", "fixed"]),
];

impl DistributionKind {
    /// Canonical lower-case name of this kind.
    #[must_use]
    pub fn name(&self) -> &'static str {
        REGISTRY
            .iter()
            .find(|(kind, _, _)| kind == self)
            .map(|(_, name, _)| *name)
            .unwrap_or("unknown")
    }
}

impl std::fmt::Display for DistributionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Resolve a distribution-kind token, matched case-insensitively.
///
/// An exact match on a canonical name or alias wins outright. Otherwise the
/// token must be a prefix of exactly one registered kind's names; a prefix
/// matching several kinds (e.g. `"log"`) is rejected as ambiguous.
pub fn resolve(token: &str) -> Result<DistributionKind, DistributionError> {
    let token_lower = token.to_lowercase();

    for (kind, name, aliases) in REGISTRY {
        if *name == token_lower || aliases.contains(&token_lower.as_str()) {
            return Ok(*kind);
        }
    }

    let mut matches: Vec<(DistributionKind, &'static str)> = Vec::new();
    for (kind, name, aliases) in REGISTRY {
        let hit = name.starts_with(&token_lower)
            || aliases.iter().any(|a| a.starts_with(&token_lower));
        if hit && !matches.iter().any(|(k, _)| k == kind) {
            matches.push((*kind, name));
        }
    }

    match matches.as_slice() {
        [] => Err(DistributionError::UnknownDistribution {
            token: token.to_string(),
        }),
        [(kind, _)] => Ok(*kind),
        _ => Err(DistributionError::AmbiguousDistribution {
            token: token.to_string(),
            candidates: matches.iter().map(|(_, name)| *name).collect(),
        }),
    }
}

/// Truncation bounds applied by rejection resampling (normal and
/// lognormal families only).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Truncation {
    pub min: f64,
    pub max: f64,
}

/// How the parameter vector is to be interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parametrization {
    /// Canonical parameters for the kind (e.g. mean/stddev for normal)
    #[default]
    Direct,
    /// Subsurface percentile convention. P10 is the *high-side* value:
    /// CDF(P90) = 0.10 and CDF(P10) = 0.90. The inversion relative to
    /// common statistical usage is deliberate and preserved exactly.
    P10P90,
}

/// A fully parametrized scalar distribution.
///
/// Parameter layout per kind (`Direct`):
/// - `normal`: `[mean, stddev]`
/// - `lognormal`: `[mu, sigma]` (log-space)
/// - `uniform` / `loguniform`: `[min, max]`
/// - `triangular`: `[min, mode, max]`
/// - `pert`: `[min, mode, max]` or `[min, mode, max, shape]` (shape
///   defaults to 4)
/// - `beta`: `[alpha, beta]` or `[alpha, beta, min, max]` (scaled)
/// - `discrete`: the value list; weights go in `weights`
/// - `const`: `[value]`
///
/// Layout under `P10P90`: `[p10, p90]` for normal, lognormal, uniform and
/// loguniform; `[p10, mode, p90]` (optionally `+ shape` for pert) for the
/// mode-bearing kinds. P10 is the high-side value throughout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DistributionSpec {
    pub kind: DistributionKind,
    #[serde(default)]
    pub params: Vec<f64>,
    /// Discrete-kind weights; defaults to uniform when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weights: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub truncation: Option<Truncation>,
    #[serde(default)]
    pub parametrization: Parametrization,
}

impl DistributionSpec {
    /// Shorthand for a direct-parametrized spec without truncation.
    #[must_use]
    pub fn new(kind: DistributionKind, params: Vec<f64>) -> Self {
        Self {
            kind,
            params,
            weights: None,
            truncation: None,
            parametrization: Parametrization::Direct,
        }
    }

    fn invalid(&self, reason: impl Into<String>) -> DistributionError {
        DistributionError::InvalidParameter {
            kind: self.kind,
            reason: reason.into(),
        }
    }

    fn expect_param_count(&self, allowed: &[usize]) -> Result<(), DistributionError> {
        if allowed.contains(&self.params.len()) {
            return Ok(());
        }
        Err(self.invalid(format!(
            "expected {} parameters, got {}",
            allowed
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join(" or "),
            self.params.len()
        )))
    }

    fn validate_finite(&self) -> Result<(), DistributionError> {
        if let Some(bad) = self.params.iter().find(|p| !p.is_finite()) {
            return Err(self.invalid(format!("non-finite parameter value {bad}")));
        }
        Ok(())
    }

    fn validate_truncation(&self) -> Result<(), DistributionError> {
        let Some(t) = self.truncation else {
            return Ok(());
        };
        if !matches!(
            self.kind,
            DistributionKind::Normal | DistributionKind::LogNormal
        ) {
            return Err(self.invalid(format!(
                "truncation is only supported for normal and lognormal, not {}",
                self.kind
            )));
        }
        if t.min >= t.max {
            return Err(self.invalid(format!(
                "truncation bounds are inconsistent: min {} >= max {}",
                t.min, t.max
            )));
        }
        Ok(())
    }

    /// Resolve the parameter vector to canonical form, back-solving from
    /// the P10/P90 convention when requested.
    ///
    /// For the P10/P90 convention `CDF(p90) = 0.10` and `CDF(p10) = 0.90`,
    /// so `p10 > p90` is required (P10 is the high-side value). A
    /// degenerate pair `p10 == p90` is rejected.
    pub fn canonical_params(&self) -> Result<Vec<f64>, DistributionError> {
        self.validate_finite()?;
        self.validate_truncation()?;
        let params = match self.parametrization {
            Parametrization::Direct => self.params.clone(),
            Parametrization::P10P90 => self.params_from_p10_p90()?,
        };
        self.validate_canonical(&params)?;
        Ok(params)
    }

    fn params_from_p10_p90(&self) -> Result<Vec<f64>, DistributionError> {
        // Standard-normal 90th percentile, ~1.2816
        let z90 = NormalCdf::standard().inverse_cdf(0.9);

        match self.kind {
            DistributionKind::Normal => {
                self.expect_param_count(&[2])?;
                let (p10, p90) = (self.params[0], self.params[1]);
                self.check_p10_above_p90(p10, p90)?;
                let mean = (p10 + p90) / 2.0;
                let stddev = (p10 - p90) / (2.0 * z90);
                Ok(vec![mean, stddev])
            }
            DistributionKind::LogNormal => {
                self.expect_param_count(&[2])?;
                let (p10, p90) = (self.params[0], self.params[1]);
                if p90 <= 0.0 {
                    return Err(self.invalid(format!(
                        "lognormal percentiles must be positive, got p90 = {p90}"
                    )));
                }
                self.check_p10_above_p90(p10, p90)?;
                let mu = (p10.ln() + p90.ln()) / 2.0;
                let sigma = (p10.ln() - p90.ln()) / (2.0 * z90);
                Ok(vec![mu, sigma])
            }
            DistributionKind::Uniform => {
                self.expect_param_count(&[2])?;
                let (p10, p90) = (self.params[0], self.params[1]);
                self.check_p10_above_p90(p10, p90)?;
                let span = (p10 - p90) / 0.8;
                let min = p90 - 0.1 * span;
                Ok(vec![min, min + span])
            }
            DistributionKind::LogUniform => {
                self.expect_param_count(&[2])?;
                let (p10, p90) = (self.params[0], self.params[1]);
                if p90 <= 0.0 {
                    return Err(self.invalid(format!(
                        "loguniform percentiles must be positive, got p90 = {p90}"
                    )));
                }
                self.check_p10_above_p90(p10, p90)?;
                let lspan = (p10.ln() - p90.ln()) / 0.8;
                let lmin = p90.ln() - 0.1 * lspan;
                Ok(vec![lmin.exp(), (lmin + lspan).exp()])
            }
            DistributionKind::Triangular => {
                self.expect_param_count(&[3])?;
                let (p10, mode, p90) = (self.params[0], self.params[1], self.params[2]);
                self.check_p10_above_p90(p10, p90)?;
                let (min, max) = self.fit_quantiles(p10, p90, mode, |lo, hi| {
                    let dist = TriangularCdf::new(lo, hi, mode.clamp(lo, hi))
                        .map_err(|e| self.invalid(e.to_string()))?;
                    Ok((dist.inverse_cdf(0.1), dist.inverse_cdf(0.9)))
                })?;
                Ok(vec![min, mode, max])
            }
            DistributionKind::Pert => {
                self.expect_param_count(&[3, 4])?;
                let (p10, mode, p90) = (self.params[0], self.params[1], self.params[2]);
                let shape = self.params.get(3).copied().unwrap_or(4.0);
                if shape <= 0.0 {
                    return Err(self.invalid(format!("shape must be positive, got {shape}")));
                }
                self.check_p10_above_p90(p10, p90)?;
                let (min, max) = self.fit_quantiles(p10, p90, mode, |lo, hi| {
                    let (alpha, beta) = pert_shape_params(lo, mode.clamp(lo, hi), hi, shape);
                    let dist =
                        BetaCdf::new(alpha, beta).map_err(|e| self.invalid(e.to_string()))?;
                    let q = |p: f64| lo + (hi - lo) * dist.inverse_cdf(p);
                    Ok((q(0.1), q(0.9)))
                })?;
                Ok(vec![min, mode, max, shape])
            }
            DistributionKind::Beta | DistributionKind::Discrete | DistributionKind::Const => {
                Err(self.invalid(format!(
                    "p10/p90 parametrization is not supported for {}",
                    self.kind
                )))
            }
        }
    }

    fn check_p10_above_p90(&self, p10: f64, p90: f64) -> Result<(), DistributionError> {
        if p10 == p90 {
            return Err(self.invalid(format!("degenerate percentile pair p10 == p90 == {p10}")));
        }
        if p10 < p90 {
            return Err(self.invalid(format!(
                "p10 ({p10}) must exceed p90 ({p90}); p10 is the high-side value \
                 in the subsurface convention"
            )));
        }
        Ok(())
    }

    /// Fit (min, max) so the 0.10/0.90 quantiles hit (p90, p10), with the
    /// mode held fixed. Damped fixed-point iteration; the quantiles respond
    /// sub-linearly to the matching bound, so the update contracts.
    fn fit_quantiles<F>(
        &self,
        p10: f64,
        p90: f64,
        mode: f64,
        quantiles: F,
    ) -> Result<(f64, f64), DistributionError>
    where
        F: Fn(f64, f64) -> Result<(f64, f64), DistributionError>,
    {
        let span = p10 - p90;
        let margin = 1e-9 * span;
        let mut lo = (p90 - 0.25 * span).min(mode - margin);
        let mut hi = (p10 + 0.25 * span).max(mode + margin);

        for _ in 0..MAX_QUANTILE_FIT_ITERATIONS {
            let (q10, q90) = quantiles(lo, hi)?;
            let err = (q10 - p90).abs().max((q90 - p10).abs());
            if err <= 1e-10 * span {
                return Ok((lo, hi));
            }
            lo = (lo + (p90 - q10)).min(mode - margin);
            hi = (hi + (p10 - q90)).max(mode + margin);
        }
        Err(self.invalid(format!(
            "p10/p90 quantile fit did not converge for p10={p10}, mode={mode}, p90={p90}"
        )))
    }

    fn validate_canonical(&self, params: &[f64]) -> Result<(), DistributionError> {
        match self.kind {
            DistributionKind::Normal => {
                if self.parametrization == Parametrization::Direct {
                    self.expect_param_count(&[2])?;
                }
                let stddev = params[1];
                if stddev < 0.0 {
                    return Err(self.invalid(format!("stddev must be non-negative, got {stddev}")));
                }
                if self.truncation.is_some() && stddev == 0.0 {
                    return Err(self.invalid(
                        "zero variance combined with truncation bounds is degenerate",
                    ));
                }
            }
            DistributionKind::LogNormal => {
                if self.parametrization == Parametrization::Direct {
                    self.expect_param_count(&[2])?;
                }
                let sigma = params[1];
                if sigma <= 0.0 {
                    return Err(self.invalid(format!("sigma must be positive, got {sigma}")));
                }
            }
            DistributionKind::Uniform | DistributionKind::LogUniform => {
                if self.parametrization == Parametrization::Direct {
                    self.expect_param_count(&[2])?;
                }
                let (min, max) = (params[0], params[1]);
                if min >= max {
                    return Err(self.invalid(format!("min {min} must be below max {max}")));
                }
                if self.kind == DistributionKind::LogUniform && min <= 0.0 {
                    return Err(self.invalid(format!("bounds must be positive, got min {min}")));
                }
            }
            DistributionKind::Triangular => {
                if self.parametrization == Parametrization::Direct {
                    self.expect_param_count(&[3])?;
                }
                let (min, mode, max) = (params[0], params[1], params[2]);
                if !(min <= mode && mode <= max && min < max) {
                    return Err(self.invalid(format!(
                        "need min <= mode <= max with min < max, got [{min}, {mode}, {max}]"
                    )));
                }
            }
            DistributionKind::Pert => {
                if self.parametrization == Parametrization::Direct {
                    self.expect_param_count(&[3, 4])?;
                }
                let (min, mode, max) = (params[0], params[1], params[2]);
                let shape = params.get(3).copied().unwrap_or(4.0);
                if !(min <= mode && mode <= max && min < max) {
                    return Err(self.invalid(format!(
                        "need min <= mode <= max with min < max, got [{min}, {mode}, {max}]"
                    )));
                }
                if shape <= 0.0 {
                    return Err(self.invalid(format!("shape must be positive, got {shape}")));
                }
            }
            DistributionKind::Beta => {
                self.expect_param_count(&[2, 4])?;
                let (alpha, beta) = (params[0], params[1]);
                if alpha <= 0.0 || beta <= 0.0 {
                    return Err(self.invalid(format!(
                        "alpha and beta must be positive, got [{alpha}, {beta}]"
                    )));
                }
                if params.len() == 4 && params[2] >= params[3] {
                    return Err(self.invalid(format!(
                        "scale min {} must be below scale max {}",
                        params[2], params[3]
                    )));
                }
            }
            DistributionKind::Discrete => {
                if params.is_empty() {
                    return Err(self.invalid("discrete distribution needs at least one value"));
                }
                if let Some(weights) = &self.weights {
                    if weights.len() != params.len() {
                        return Err(self.invalid(format!(
                            "{} weights for {} values",
                            weights.len(),
                            params.len()
                        )));
                    }
                    if let Some(w) = weights.iter().find(|w| **w < 0.0 || !w.is_finite()) {
                        return Err(self.invalid(format!("negative or non-finite weight {w}")));
                    }
                    if weights.iter().sum::<f64>() <= 0.0 {
                        return Err(self.invalid("weights sum to zero"));
                    }
                }
            }
            DistributionKind::Const => {
                self.expect_param_count(&[1])?;
            }
        }
        Ok(())
    }

    /// Draw `n` independent samples from a shared RNG stream.
    ///
    /// Truncated families rejection-resample out-of-bound draws; `const`
    /// consumes zero draws.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        n: usize,
    ) -> Result<Vec<f64>, DistributionError> {
        let params = self.canonical_params()?;

        match self.kind {
            DistributionKind::Const => Ok(vec![params[0]; n]),
            DistributionKind::Normal => {
                let dist = rand_distr::Normal::new(params[0], params[1])
                    .map_err(|e| self.invalid(e.to_string()))?;
                self.sample_maybe_truncated(rng, n, |rng| dist.sample(rng))
            }
            DistributionKind::LogNormal => {
                let dist = rand_distr::LogNormal::new(params[0], params[1])
                    .map_err(|e| self.invalid(e.to_string()))?;
                self.sample_maybe_truncated(rng, n, |rng| dist.sample(rng))
            }
            DistributionKind::Uniform => {
                let dist = rand_distr::Uniform::new(params[0], params[1])
                    .map_err(|e| self.invalid(e.to_string()))?;
                Ok((0..n).map(|_| dist.sample(rng)).collect())
            }
            DistributionKind::LogUniform => {
                let (lmin, lmax) = (params[0].ln(), params[1].ln());
                Ok((0..n)
                    .map(|_| (lmin + rng.random::<f64>() * (lmax - lmin)).exp())
                    .collect())
            }
            DistributionKind::Triangular => {
                let dist = rand_distr::Triangular::new(params[0], params[2], params[1])
                    .map_err(|e| self.invalid(e.to_string()))?;
                Ok((0..n).map(|_| dist.sample(rng)).collect())
            }
            DistributionKind::Pert => {
                let (min, mode, max) = (params[0], params[1], params[2]);
                let shape = params.get(3).copied().unwrap_or(4.0);
                let (alpha, beta) = pert_shape_params(min, mode, max, shape);
                let dist = rand_distr::Beta::new(alpha, beta)
                    .map_err(|e| self.invalid(e.to_string()))?;
                Ok((0..n)
                    .map(|_| min + (max - min) * dist.sample(rng))
                    .collect())
            }
            DistributionKind::Beta => {
                let dist = rand_distr::Beta::new(params[0], params[1])
                    .map_err(|e| self.invalid(e.to_string()))?;
                let (min, max) = if params.len() == 4 {
                    (params[2], params[3])
                } else {
                    (0.0, 1.0)
                };
                Ok((0..n)
                    .map(|_| min + (max - min) * dist.sample(rng))
                    .collect())
            }
            DistributionKind::Discrete => {
                let weights = match &self.weights {
                    Some(w) => w.clone(),
                    None => vec![1.0; params.len()],
                };
                let total: f64 = weights.iter().sum();
                let mut out = Vec::with_capacity(n);
                for _ in 0..n {
                    // Cumulative-weight inverse transform, one draw per sample
                    let target = rng.random::<f64>() * total;
                    let mut acc = 0.0;
                    let mut chosen = params[params.len() - 1];
                    for (value, weight) in params.iter().zip(&weights) {
                        acc += weight;
                        if target < acc {
                            chosen = *value;
                            break;
                        }
                    }
                    out.push(chosen);
                }
                Ok(out)
            }
        }
    }

    fn sample_maybe_truncated<R: Rng + ?Sized, F: Fn(&mut R) -> f64>(
        &self,
        rng: &mut R,
        n: usize,
        draw: F,
    ) -> Result<Vec<f64>, DistributionError> {
        let Some(t) = self.truncation else {
            return Ok((0..n).map(|_| draw(rng)).collect());
        };
        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            let mut accepted = None;
            for _ in 0..MAX_REJECTION_ATTEMPTS {
                let v = draw(rng);
                if v >= t.min && v <= t.max {
                    accepted = Some(v);
                    break;
                }
            }
            match accepted {
                Some(v) => out.push(v),
                None => {
                    return Err(self.invalid(format!(
                        "truncation bounds [{}, {}] rejected {} consecutive draws; \
                         the interval holds almost no probability mass",
                        t.min, t.max, MAX_REJECTION_ATTEMPTS
                    )));
                }
            }
        }
        Ok(out)
    }
}

/// Beta shape parameters of a PERT distribution on [min, max] with the
/// given mode and shape (classic PERT uses shape = 4).
fn pert_shape_params(min: f64, mode: f64, max: f64, shape: f64) -> (f64, f64) {
    let span = max - min;
    let alpha = 1.0 + shape * (mode - min) / span;
    let beta = 1.0 + shape * (max - mode) / span;
    (alpha, beta)
}
