//! Ordered argument assembly.
//!
//! The build tool is sensitive to flag order and later flags can override
//! earlier ones, so arguments are accumulated under named insertion points
//! and flattened in one fixed stage order instead of being concatenated ad
//! hoc at each call site.

use serde::Serialize;

/// File name the generated toolset configuration is written under, relative
/// to the unpacked source tree.
pub const USER_CONFIG_FILE: &str = "user-config.jam";

/// Named insertion points, flattened in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Install destinations: prefix and libdir.
    Paths,
    /// Invocation behavior such as parallelism.
    Execution,
    /// Output layout and the toolset-configuration reference.
    Layout,
    /// Build properties: threading, toolset, flags, architectures.
    Properties,
    /// Flags that remove whole libraries from the build.
    Exclusions,
    /// Build targets, always last.
    Targets,
}

const STAGE_COUNT: usize = 6;

/// Accumulator for one invocation's arguments.
#[derive(Debug, Default)]
pub struct StagedArgs {
    stages: [Vec<String>; STAGE_COUNT],
}

impl StagedArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, stage: Stage, arg: impl Into<String>) -> &mut Self {
        self.stages[stage as usize].push(arg.into());
        self
    }

    /// Flatten into the final ordered list: stages in declaration order,
    /// insertion order within each stage.
    pub fn into_args(self) -> Vec<String> {
        self.stages.into_iter().flatten().collect()
    }
}

/// Everything needed to drive the two build-tool invocations, constructed
/// fresh per resolution and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArgumentPlan {
    /// Arguments for the configuration script run first.
    pub bootstrap_args: Vec<String>,

    /// Arguments for the main build invocation.
    pub build_args: Vec<String>,

    /// Body of the generated toolset-configuration file. Writing it next to
    /// the source tree is the caller's job.
    pub user_config: String,
}
