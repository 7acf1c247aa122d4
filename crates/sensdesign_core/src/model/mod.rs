//! Type definitions for design-matrix generation
//!
//! Specs are parsed once from configuration and treated as read-only
//! inputs; the assembled `DesignMatrix` is the immutable output.

pub mod design;
pub mod spec;
pub mod tables;

pub use design::{DesignMatrix, DesignRow, SensType};
pub use spec::{
    BackgroundSpec, DesignConfig, GlobalPolicy, ParameterSpec, ScenarioCase, SeedMode, Sensitivity,
};
pub use tables::{CorrelationMatrix, DependencyTable, ExternTable};
