//! Build-variant resolution.
//!
//! The resolver is pure and deterministic. All I/O except the single
//! architecture-inspection call happens before or after resolution, never
//! inside it, so two runs with the same inputs produce byte-identical
//! plans.

pub mod args;
pub mod issue;
pub mod resolve;

pub use args::{ArgumentPlan, Stage, StagedArgs, USER_CONFIG_FILE};
pub use issue::{IssueKind, Severity, ValidationIssue};
pub use resolve::{Resolution, VariantResolver};
