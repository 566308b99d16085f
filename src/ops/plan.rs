//! Implementation of `keg plan`: resolve a formula's build without fetching.
//!
//! `plan` runs the same preflight and resolution the install pipeline uses,
//! then stops. It answers, before anything is downloaded: which arguments
//! would `bootstrap.sh` and `bjam` receive, what would `user-config.jam`
//! declare, and would the requested variant be refused.

use anyhow::{bail, Result};
use serde::Serialize;

use crate::core::cellar::Cellar;
use crate::core::env::EnvironmentFacts;
use crate::core::formula::{Formula, Tap};
use crate::core::options::{BuildOptions, WITH_ICU};
use crate::inspect::ArchInspector;
use crate::resolver::{ArgumentPlan, Resolution, ValidationIssue, VariantResolver, USER_CONFIG_FILE};
use crate::toolchain::{self, CompilerIdentity};
use crate::util::context::GlobalContext;

/// Everything the pipeline knows before any source is fetched.
#[derive(Debug, Clone)]
pub struct Preflight {
    pub formula: Formula,

    /// Version the keg would install under; `HEAD` for head builds.
    pub version: String,

    pub identity: CompilerIdentity,
    pub facts: EnvironmentFacts,
}

/// Load a formula from the configured tap, listing what is available when
/// the name is unknown.
pub fn load_formula(gctx: &GlobalContext, name: &str) -> Result<Formula> {
    let tap = Tap::new(gctx.tap_dir());
    let path = tap.formula_path(name);
    if !path.is_file() {
        let known = tap.list().unwrap_or_default();
        bail!(
            "no formula named `{}` in {}\n\
             available formulas: {}",
            name,
            tap.root().display(),
            if known.is_empty() {
                "(none)".to_string()
            } else {
                known.join(", ")
            }
        );
    }
    Ok(tap.load(name)?)
}

/// Gather everything resolution needs: the formula, the probed compiler,
/// and the environment facts.
///
/// Undeclared options and formula-declared compiler incompatibilities
/// abort here. Both doom the build and cost nothing to detect, so they are
/// checked before any download starts.
pub fn preflight(gctx: &GlobalContext, name: &str, options: &BuildOptions) -> Result<Preflight> {
    let formula = load_formula(gctx, name)?;

    if let Err(err) = options.check_declared(&formula) {
        let declared: Vec<&str> = formula.options.iter().map(|o| o.name.as_str()).collect();
        bail!(
            "{err}\n\
             declared options: {}",
            if declared.is_empty() {
                "(none)".to_string()
            } else {
                declared.join(", ")
            }
        );
    }

    let identity = toolchain::detect(gctx.cxx_override())?;
    toolchain::check_fails_with(&formula.package.name, &identity, &formula.fails_with)?;

    let version = if options.head {
        "HEAD".to_string()
    } else {
        formula.package.version.clone()
    };

    let cellar = Cellar::new(gctx.cellar_dir());
    let prefix = cellar.keg_prefix(&formula.package.name, &version);
    let mut facts =
        EnvironmentFacts::new(identity.path.clone(), identity.family, prefix, gctx.jobs());

    if options.cxx11 {
        let (cxxflags, ldflags) = toolchain::cxx11_flags(identity.family)?;
        facts.cxxflags = cxxflags;
        facts.ldflags = ldflags;
    }

    if options.with_icu {
        facts.icu_prefix = formula
            .dependency_for_option(WITH_ICU)
            .and_then(|dep| cellar.installed_prefix(&dep.name));
    }

    tracing::debug!(
        "preflight for {} {}: {:?} at {}",
        formula.package.name,
        version,
        identity.family,
        facts.prefix.display()
    );

    Ok(Preflight {
        formula,
        version,
        identity,
        facts,
    })
}

/// Run resolution, folding blocking issues into one error that lists every
/// problem found rather than just the first.
pub fn resolve_checked(
    inspector: &dyn ArchInspector,
    options: &BuildOptions,
    facts: &EnvironmentFacts,
) -> Result<Resolution> {
    VariantResolver::new(inspector)
        .resolve(options, facts)
        .map_err(|issues| {
            let mut message = String::from("the requested variant cannot be built:");
            for issue in &issues {
                message.push_str(&format!("\n  - {}", issue.summary));
                if let Some(detail) = &issue.detail {
                    message.push_str(&format!("\n    {detail}"));
                }
            }
            anyhow::anyhow!(message)
        })
}

/// Options for the plan command.
#[derive(Debug, Clone, Default)]
pub struct PlanOptions {
    /// Formula to plan an install of
    pub formula: String,

    /// Requested build variant
    pub build: BuildOptions,
}

/// A fully resolved build, ready to print or execute.
#[derive(Debug, Clone, Serialize)]
pub struct PlannedBuild {
    /// Formula name
    pub formula: String,

    /// Version that would be installed (`HEAD` for head builds)
    pub version: String,

    /// Compiler the build would use
    pub compiler: CompilerIdentity,

    /// Ordered stage arguments and the generated user-config body
    pub plan: ArgumentPlan,

    /// Non-fatal findings worth surfacing
    pub advisories: Vec<ValidationIssue>,
}

/// Resolve what `keg install` would do for a formula, fetching nothing and
/// running no build tool.
pub fn plan(
    gctx: &GlobalContext,
    inspector: &dyn ArchInspector,
    opts: &PlanOptions,
) -> Result<PlannedBuild> {
    let pre = preflight(gctx, &opts.formula, &opts.build)?;
    let resolution = resolve_checked(inspector, &opts.build, &pre.facts)?;

    Ok(PlannedBuild {
        formula: pre.formula.package.name.clone(),
        version: pre.version,
        compiler: pre.identity,
        plan: resolution.plan,
        advisories: resolution.advisories,
    })
}

/// Render a planned build the way `keg plan` prints it.
pub fn format_plan(planned: &PlannedBuild) -> String {
    use std::fmt::Write;

    let mut out = String::new();

    writeln!(out, "{} {}", planned.formula, planned.version).unwrap();
    writeln!(out, "compiler: {}", planned.compiler.version_line).unwrap();
    writeln!(out, "          {}", planned.compiler.path.display()).unwrap();
    writeln!(out).unwrap();

    writeln!(out, "bootstrap.sh:").unwrap();
    for arg in &planned.plan.bootstrap_args {
        writeln!(out, "  {arg}").unwrap();
    }
    writeln!(out).unwrap();

    writeln!(out, "bjam:").unwrap();
    for arg in &planned.plan.build_args {
        writeln!(out, "  {arg}").unwrap();
    }
    writeln!(out).unwrap();

    writeln!(out, "{USER_CONFIG_FILE}:").unwrap();
    for line in planned.plan.user_config.lines() {
        writeln!(out, "  {line}").unwrap();
    }

    if !planned.advisories.is_empty() {
        writeln!(out).unwrap();
        writeln!(out, "advisories:").unwrap();
        for issue in &planned.advisories {
            writeln!(out, "  - {}", issue.summary).unwrap();
        }
    }

    out
}
