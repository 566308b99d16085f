//! Implementation of `keg install`: fetch, prepare, resolve, build.
//!
//! The pipeline runs in a fixed order. Cheap, doomed-anyway checks come
//! first (unknown options, a compiler the formula refuses); source staging
//! and tree preparation happen next; resolution runs against the prepared
//! tree; only then do `bootstrap.sh` and `bjam` spawn. A failed build
//! leaves the staged tree in place for inspection.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};

use crate::core::options::{BuildOptions, WITH_LOG};
use crate::inspect::ArchInspector;
use crate::ops::fetch::stage_source;
use crate::ops::plan::{load_formula, preflight, resolve_checked};
use crate::prepare;
use crate::resolver::USER_CONFIG_FILE;
use crate::sources::PackageFetcher;
use crate::util::context::GlobalContext;
use crate::util::fs::write_string;
use crate::util::process::ProcessRunner;
use crate::util::shell::{format_duration, Shell, Status};

/// Collaborators the install pipeline drives.
///
/// All seams are trait objects so tests can watch fetches and process
/// invocations without a network or a compiler.
pub struct InstallContext<'a> {
    pub gctx: &'a GlobalContext,
    pub shell: &'a Shell,
    pub fetcher: &'a dyn PackageFetcher,
    pub runner: &'a dyn ProcessRunner,
    pub inspector: &'a dyn ArchInspector,
}

/// Options for the install command.
#[derive(Debug, Clone, Default)]
pub struct InstallOptions {
    /// Formula to install
    pub formula: String,

    /// Requested build variant
    pub build: BuildOptions,
}

/// What a completed install produced.
#[derive(Debug, Clone)]
pub struct InstallOutcome {
    pub name: String,
    pub version: String,

    /// Keg the package now lives under
    pub prefix: PathBuf,
}

/// Build a formula from source and install it into the cellar.
pub fn install(ctx: &InstallContext<'_>, opts: &InstallOptions) -> Result<InstallOutcome> {
    let started = Instant::now();
    let shell = ctx.shell;

    let pre = preflight(ctx.gctx, &opts.formula, &opts.build)?;
    let name = pre.formula.package.name.clone();

    if pre.facts.prefix.exists() {
        bail!(
            "{} {} is already installed at {}\n\
             hint: remove that directory to build it again",
            name,
            pre.version,
            pre.facts.prefix.display()
        );
    }

    let stage = stage_source(ctx.gctx, shell, ctx.fetcher, &pre.formula, opts.build.head)?;

    if opts.build.with_log {
        let Some(dep) = pre.formula.dependency_for_option(WITH_LOG) else {
            bail!("formula '{name}' declares no with-log dependency");
        };
        let log_formula = load_formula(ctx.gctx, &dep.name)?;
        let log_stage = stage_source(ctx.gctx, shell, ctx.fetcher, &log_formula, false)?;

        shell.status(Status::Patching, format!("merging {} into {}", dep.name, name));
        prepare::merge_logging_library(&log_stage, &stage)?;
    }

    shell.status(Status::Patching, "library install names");
    prepare::brand_install_names(&stage, &pre.facts.libdir)?;

    let requested = opts.build.requested();
    shell.status(
        Status::Resolving,
        if requested.is_empty() {
            "default variant".to_string()
        } else {
            requested.join(" ")
        },
    );
    let resolution = resolve_checked(ctx.inspector, &opts.build, &pre.facts)?;
    for issue in &resolution.advisories {
        shell.warn(&issue.summary);
    }

    write_string(&stage.join(USER_CONFIG_FILE), &resolution.plan.user_config)?;

    shell.status(Status::Configuring, "./bootstrap.sh");
    ctx.runner
        .run(
            &stage.join("bootstrap.sh"),
            &resolution.plan.bootstrap_args,
            &stage,
        )
        .with_context(|| format!("bootstrap failed; staged tree kept at {}", stage.display()))?;

    shell.status(Status::Building, format!("./bjam (-j{})", pre.facts.jobs));
    ctx.runner
        .run(&stage.join("bjam"), &resolution.plan.build_args, &stage)
        .with_context(|| format!("build failed; staged tree kept at {}", stage.display()))?;

    shell.status(
        Status::Installed,
        format!("{} {} to {}", name, pre.version, pre.facts.prefix.display()),
    );
    shell.status(Status::Finished, format_duration(started.elapsed()));

    Ok(InstallOutcome {
        name,
        version: pre.version,
        prefix: pre.facts.prefix,
    })
}
