use std::fmt;

use crate::distributions::DistributionKind;

/// Errors from distribution resolution and sampling
#[derive(Debug, Clone)]
pub enum DistributionError {
    /// No registered distribution name or alias starts with the token
    UnknownDistribution { token: String },
    /// The token is a prefix of more than one registered distribution
    AmbiguousDistribution {
        token: String,
        candidates: Vec<&'static str>,
    },
    /// Malformed or inconsistent distribution parameters
    InvalidParameter {
        kind: DistributionKind,
        reason: String,
    },
}

impl fmt::Display for DistributionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistributionError::UnknownDistribution { token } => {
                write!(f, "unknown distribution token {token:?}")
            }
            DistributionError::AmbiguousDistribution { token, candidates } => {
                write!(
                    f,
                    "distribution token {token:?} is ambiguous, matches {}",
                    candidates.join(", ")
                )
            }
            DistributionError::InvalidParameter { kind, reason } => {
                write!(f, "invalid parameters for {kind} distribution: {reason}")
            }
        }
    }
}

impl std::error::Error for DistributionError {}

/// Errors from correlation-matrix validation and rank-correlation induction
#[derive(Debug, Clone)]
pub enum CorrelationError {
    /// The target matrix admits no Cholesky factor (includes off-diagonal
    /// entries outside [-1, 1]). Reported, never silently corrected.
    NonPositiveDefinite { detail: String },
    NotSymmetric,
    UnitDiagonalViolated { index: usize, value: f64 },
    /// Data column count does not match the correlation matrix order
    ShapeMismatch { matrix: usize, data: usize },
    /// Iman-Conover needs strictly more observations than variables
    TooFewSamples { rows: usize, columns: usize },
    /// The rank-transformed data has perfect correlations; its empirical
    /// correlation matrix is singular
    DegenerateRankCorrelation,
    /// Nearest-correlation projection did not converge
    NoConvergence { iterations: usize },
}

impl fmt::Display for CorrelationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorrelationError::NonPositiveDefinite { detail } => {
                write!(f, "correlation matrix is not positive definite: {detail}")
            }
            CorrelationError::NotSymmetric => {
                write!(f, "correlation matrix must be symmetric")
            }
            CorrelationError::UnitDiagonalViolated { index, value } => {
                write!(
                    f,
                    "correlation matrix diagonal entry {index} is {value}, must be 1.0"
                )
            }
            CorrelationError::ShapeMismatch { matrix, data } => {
                write!(
                    f,
                    "correlation matrix order {matrix} does not match {data} data columns"
                )
            }
            CorrelationError::TooFewSamples { rows, columns } => {
                write!(
                    f,
                    "need more than {columns} samples to correlate {columns} variables, got {rows}"
                )
            }
            CorrelationError::DegenerateRankCorrelation => {
                write!(
                    f,
                    "rank correlation of the sampled data is singular; \
                     supply more samples or sample differently"
                )
            }
            CorrelationError::NoConvergence { iterations } => {
                write!(
                    f,
                    "nearest-correlation projection did not converge after {iterations} iterations"
                )
            }
        }
    }
}

impl std::error::Error for CorrelationError {}

/// Errors from dependent-parameter propagation
#[derive(Debug, Clone)]
pub enum DependencyError {
    /// A sampled mother value has no entry in the lookup table
    MissingMapping { parameter: String, value: f64 },
    /// The dependency topology is not supported (e.g. multiple mothers)
    UnsupportedDependency { reason: String },
}

impl fmt::Display for DependencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DependencyError::MissingMapping { parameter, value } => {
                write!(
                    f,
                    "sampled value {value} of mother parameter {parameter:?} \
                     has no entry in the dependency table"
                )
            }
            DependencyError::UnsupportedDependency { reason } => {
                write!(f, "unsupported dependency: {reason}")
            }
        }
    }
}

impl std::error::Error for DependencyError {}

/// Top-level error for design-matrix generation.
///
/// All variants are terminal: generation aborts and no partial matrix is
/// produced. Each variant carries enough context (sensitivity name,
/// parameter name, offending value) to pinpoint the configuration defect.
#[derive(Debug, Clone)]
pub enum DesignError {
    Distribution {
        sensitivity: String,
        parameter: String,
        source: DistributionError,
    },
    Correlation {
        sensitivity: String,
        matrix: String,
        source: CorrelationError,
    },
    Dependency {
        sensitivity: String,
        source: DependencyError,
    },
    /// Two sensitivities share a SENSNAME
    DuplicateSensitivityName { name: String },
    /// A parameter needed for rectangular fill has no default value
    UndefinedDefault {
        sensitivity: String,
        parameter: String,
    },
    /// Structural configuration defect caught before sampling
    Config { message: String },
}

impl fmt::Display for DesignError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DesignError::Distribution {
                sensitivity,
                parameter,
                source,
            } => {
                write!(
                    f,
                    "sensitivity {sensitivity:?}, parameter {parameter:?}: {source}"
                )
            }
            DesignError::Correlation {
                sensitivity,
                matrix,
                source,
            } => {
                write!(
                    f,
                    "sensitivity {sensitivity:?}, correlation matrix {matrix:?}: {source}"
                )
            }
            DesignError::Dependency {
                sensitivity,
                source,
            } => {
                write!(f, "sensitivity {sensitivity:?}: {source}")
            }
            DesignError::DuplicateSensitivityName { name } => {
                write!(f, "sensitivity name {name:?} is declared more than once")
            }
            DesignError::UndefinedDefault {
                sensitivity,
                parameter,
            } => {
                write!(
                    f,
                    "parameter {parameter:?} has no value in sensitivity {sensitivity:?} \
                     and no entry in the default-value table"
                )
            }
            DesignError::Config { message } => {
                write!(f, "configuration error: {message}")
            }
        }
    }
}

impl std::error::Error for DesignError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DesignError::Distribution { source, .. } => Some(source),
            DesignError::Correlation { source, .. } => Some(source),
            DesignError::Dependency { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, DesignError>;
