//! Command implementations

pub mod completions;
pub mod fetch;
pub mod info;
pub mod install;
pub mod plan;
