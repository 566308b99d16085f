//! Immutable build environment snapshot.

use std::path::PathBuf;

use serde::Serialize;

use crate::toolchain::CompilerFamily;

/// Everything resolution is allowed to know about the machine and the
/// destination, captured once before any argument assembly.
///
/// Nothing here reads the process environment after construction; the
/// install pipeline gathers the snapshot up front and the resolver treats
/// it as read-only input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvironmentFacts {
    /// Active C++ compiler
    pub cxx: PathBuf,

    /// Detected compiler family; drives toolset naming
    pub family: CompilerFamily,

    /// Installation prefix for this keg
    pub prefix: PathBuf,

    /// Library directory under the prefix
    pub libdir: PathBuf,

    /// Parallel jobs for the build invocation
    pub jobs: usize,

    /// ICU installation prefix, when one is resolvable
    pub icu_prefix: Option<PathBuf>,

    /// Compiler flag overrides for the selected language mode
    pub cxxflags: Vec<String>,

    /// Linker flag overrides for the selected language mode
    pub ldflags: Vec<String>,

    /// Python interpreter command the build would link against
    pub python: String,
}

impl EnvironmentFacts {
    /// Facts for installing into a prefix, with no optional extras set.
    ///
    /// The library directory defaults to `<prefix>/lib` and the Python
    /// command to `python`; callers fill in ICU and mode flags as the
    /// requested options demand.
    pub fn new(
        cxx: impl Into<PathBuf>,
        family: CompilerFamily,
        prefix: impl Into<PathBuf>,
        jobs: usize,
    ) -> Self {
        let prefix = prefix.into();
        let libdir = prefix.join("lib");
        EnvironmentFacts {
            cxx: cxx.into(),
            family,
            prefix,
            libdir,
            jobs,
            icu_prefix: None,
            cxxflags: Vec::new(),
            ldflags: Vec::new(),
            python: "python".to_string(),
        }
    }
}
