//! Experimental-design matrix generation library
//!
//! This crate generates design matrices for one-factor-at-a-time and
//! Monte Carlo sensitivity studies. It supports:
//! - A catalog of scalar distributions (normal, lognormal, uniform,
//!   log-uniform, triangular, PERT, beta, discrete-weighted, constant)
//!   with optional truncation and P10/P90 parametrization
//! - Rank-correlation induction between sampled parameters (Iman-Conover)
//! - Dependent parameters driven by a discrete mother parameter
//! - Seed, scenario, dist, ref, background and extern sensitivities
//! - Deterministic regeneration from a fixed RNG seed
//!
//! # Generating a design
//!
//! ```ignore
//! use sensdesign_core::{generate, DesignConfig};
//!
//! let config: DesignConfig = parse_configuration()?;
//! let matrix = generate(&config)?;
//! for row in &matrix.rows {
//!     println!("{} {} {}", row.real, row.sensname, row.senscase);
//! }
//! ```

#![warn(clippy::all)]

// ============================================================================
// Core modules
// ============================================================================

pub mod assemble;
pub mod correlation;
pub mod dependencies;
pub mod distributions;
pub mod error;
pub mod expand;
pub mod nearest_correlation;
pub mod summary;

// ============================================================================
// Type definition modules
// ============================================================================

pub mod model;

// ============================================================================
// Test modules
// ============================================================================

#[cfg(test)]
mod tests;

// ============================================================================
// Public re-exports for convenience
// ============================================================================

pub use assemble::{generate, generate_with_rng};
pub use error::{DesignError, Result};
pub use model::{DesignConfig, DesignMatrix, GlobalPolicy, SensType, Sensitivity};
pub use summary::{SensitivitySummary, SummaryType, summarize};
