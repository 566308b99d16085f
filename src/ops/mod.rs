//! High-level operations.
//!
//! This module contains the implementation of keg commands.

pub mod fetch;
pub mod install;
pub mod plan;

pub use fetch::{fetch, stage_source, staging_dir, FetchOptions, FetchOutcome};
pub use install::{install, InstallContext, InstallOptions, InstallOutcome};
pub use plan::{
    format_plan, load_formula, plan, preflight, resolve_checked, PlanOptions, PlannedBuild,
    Preflight,
};
