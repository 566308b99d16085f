//! Keg - a small Homebrew-style source package builder
//!
//! This crate provides the library functionality behind the `keg` binary:
//! formula loading, source acquisition and verification, source-tree
//! preparation, build-variant resolution, and the install pipeline that
//! drives a package's own build tooling (for Boost: `bootstrap.sh` and
//! `bjam`).

pub mod core;
pub mod inspect;
pub mod ops;
pub mod prepare;
pub mod resolver;
pub mod sources;
pub mod toolchain;
pub mod util;

/// Test utilities and mocks for keg unit tests.
///
/// Provides mock implementations of the architecture inspector and process
/// runner, plus tap/formula fixtures.
#[cfg(test)]
pub mod test_support;

pub use core::{
    cellar::Cellar, env::EnvironmentFacts, formula::Formula, formula::Tap, options::BuildOptions,
};

pub use resolver::{ArgumentPlan, Resolution, ValidationIssue, VariantResolver};
pub use util::context::GlobalContext;
