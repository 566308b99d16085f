//! Core data structures for keg.
//!
//! This module contains the foundational types used throughout keg:
//! - Formula files and the tap they are read from
//! - Requested build options
//! - The immutable environment snapshot resolution runs against
//! - The cellar of installed kegs

pub mod cellar;
pub mod env;
pub mod formula;
pub mod options;

pub use cellar::Cellar;
pub use env::EnvironmentFacts;
pub use formula::{Formula, FormulaError, Tap};
pub use options::BuildOptions;
