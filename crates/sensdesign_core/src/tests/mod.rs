//! Integration tests for design-matrix generation
//!
//! Tests are organized by topic:
//! - `correlation` - Iman-Conover induction and nearest-correlation repair
//! - `design` - End-to-end generation invariants (rectangularity,
//!   contiguity, determinism, seed sequencing)
//! - `distributions` - Catalog resolution, P10/P90 back-solving, sampling
//! - `summary` - Per-sensitivity summary reconstruction

mod distributions;
mod summary;
