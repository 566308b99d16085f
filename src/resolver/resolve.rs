//! The variant resolver.

use crate::core::{BuildOptions, EnvironmentFacts};
use crate::inspect::ArchInspector;

use super::args::{ArgumentPlan, Stage, StagedArgs, USER_CONFIG_FILE};
use super::issue::ValidationIssue;

/// A successful resolution: the plan plus any advisory findings.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub plan: ArgumentPlan,
    pub advisories: Vec<ValidationIssue>,
}

/// Maps requested build options and environment facts to a validated,
/// ordered argument plan.
///
/// Resolution is a pure computation over its two inputs; the one external
/// call is the architecture inspection, injected so tests can answer it
/// without a real interpreter on PATH.
pub struct VariantResolver<'a> {
    inspector: &'a dyn ArchInspector,
}

impl<'a> VariantResolver<'a> {
    pub fn new(inspector: &'a dyn ArchInspector) -> Self {
        VariantResolver { inspector }
    }

    /// Validate the option set, then assemble the plan.
    ///
    /// Every blocking issue is collected before giving up, so the user
    /// learns everything wrong with the request in one pass. Advisory
    /// findings ride along with a still-valid plan.
    pub fn resolve(
        &self,
        options: &BuildOptions,
        env: &EnvironmentFacts,
    ) -> Result<Resolution, Vec<ValidationIssue>> {
        let mut blocking = Vec::new();
        let mut advisories = Vec::new();

        // The python check runs only while python is still in the build.
        // Nothing re-validates later, so --without-python both skips the
        // check and removes the library the check was protecting.
        if options.universal && !options.without_python {
            match self.inspector.is_universal(&env.python) {
                Ok(true) => {}
                Ok(false) => blocking.push(ValidationIssue::non_universal_python(&env.python)),
                Err(err) => {
                    blocking.push(ValidationIssue::python_not_inspectable(&env.python, &err))
                }
            }
        }

        if options.with_icu && env.icu_prefix.is_none() {
            blocking.push(ValidationIssue::missing_icu_prefix());
        }

        if options.cxx11 {
            advisories.push(ValidationIssue::cxx11_link_compatibility());
        }

        if options.with_log {
            advisories.push(ValidationIssue::provisional_log_addon());
        }

        if !blocking.is_empty() {
            return Err(blocking);
        }

        Ok(Resolution {
            plan: assemble(options, env),
            advisories,
        })
    }
}

/// Deterministic argument assembly. Runs only after validation has passed.
fn assemble(options: &BuildOptions, env: &EnvironmentFacts) -> ArgumentPlan {
    let prefix_arg = format!("--prefix={}", env.prefix.display());
    let libdir_arg = format!("--libdir={}", env.libdir.display());

    let mut bootstrap = StagedArgs::new();
    bootstrap.push(Stage::Paths, &prefix_arg);
    bootstrap.push(Stage::Paths, &libdir_arg);
    if options.with_icu {
        if let Some(icu) = &env.icu_prefix {
            // Bootstrap-stage flag: the configuration script resolves ICU,
            // the build invocation never sees it.
            bootstrap.push(Stage::Properties, format!("--with-icu={}", icu.display()));
        }
    }

    let mut build = StagedArgs::new();
    build.push(Stage::Paths, &prefix_arg);
    build.push(Stage::Paths, &libdir_arg);
    build.push(Stage::Execution, format!("-j{}", env.jobs));
    build.push(Stage::Layout, "--layout=tagged");
    build.push(Stage::Layout, format!("--user-config={USER_CONFIG_FILE}"));
    build.push(Stage::Properties, "threading=multi");
    build.push(
        Stage::Properties,
        format!("toolset={}", env.family.b2_toolset()),
    );
    if options.cxx11 {
        if !env.cxxflags.is_empty() {
            build.push(
                Stage::Properties,
                format!("cxxflags={}", env.cxxflags.join(" ")),
            );
        }
        if !env.ldflags.is_empty() {
            build.push(
                Stage::Properties,
                format!("linkflags={}", env.ldflags.join(" ")),
            );
        }
    }
    if options.universal {
        build.push(Stage::Properties, "address-model=32_64");
        build.push(Stage::Properties, "architecture=x86");
        // precompiled headers cannot serve two architectures at once
        build.push(Stage::Properties, "pch=off");
    }
    if options.without_python {
        build.push(Stage::Exclusions, "--without-python");
    }
    build.push(Stage::Targets, "install");

    let mut user_config = format!(
        "using {} : : {} ;\n",
        env.family.jam_declaration(),
        env.cxx.display()
    );
    if options.with_mpi {
        user_config.push_str("using mpi ;\n");
    }

    ArgumentPlan {
        bootstrap_args: bootstrap.into_args(),
        build_args: build.into_args(),
        user_config,
    }
}
