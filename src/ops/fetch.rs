//! Implementation of `keg fetch`: acquire and stage a formula's source.
//!
//! Staging always starts from a clean directory. A tree that went through
//! a previous install attempt has been patched in place, and re-applying
//! those patches would fail on their own output.

use std::path::PathBuf;

use anyhow::{bail, Result};

use crate::core::formula::Formula;
use crate::ops::plan::load_formula;
use crate::sources::{HeadSource, PackageFetcher};
use crate::util::context::GlobalContext;
use crate::util::fs::remove_dir_all_if_exists;
use crate::util::shell::{Shell, Status};

/// Where a formula's source tree is staged for building.
pub fn staging_dir(gctx: &GlobalContext, name: &str, version: &str) -> PathBuf {
    gctx.cache_dir().join("build").join(format!("{name}-{version}"))
}

/// Clear and repopulate the staging directory for a formula's source.
///
/// Archive sources go through the injected fetcher; head builds clone or
/// refresh the formula's repository instead.
pub fn stage_source(
    gctx: &GlobalContext,
    shell: &Shell,
    fetcher: &dyn PackageFetcher,
    formula: &Formula,
    head: bool,
) -> Result<PathBuf> {
    let name = &formula.package.name;
    let version = if head {
        "HEAD"
    } else {
        formula.package.version.as_str()
    };
    let stage = staging_dir(gctx, name, version);
    remove_dir_all_if_exists(&stage)?;

    if head {
        let Some(spec) = &formula.head else {
            bail!(
                "formula '{name}' declares no head repository\n\
                 hint: drop --head or add a [head] table to the formula"
            );
        };
        shell.status(Status::Fetching, format!("{} (head)", spec.url));
        HeadSource::new(gctx.cache_dir()).stage(name, spec, &stage)?;
    } else {
        shell.status(Status::Fetching, &formula.source.url);
        fetcher.stage(formula, &stage)?;
    }

    tracing::debug!("staged {} {} at {}", name, version, stage.display());
    Ok(stage)
}

/// Options for the fetch command.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// Formula to stage
    pub formula: String,

    /// Stage the head repository instead of the release archive
    pub head: bool,
}

/// Where a fetch landed.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub name: String,
    pub version: String,

    /// Directory holding the verified, unpacked source tree
    pub staged: PathBuf,
}

/// Stage a formula's source tree without building anything.
pub fn fetch(
    gctx: &GlobalContext,
    shell: &Shell,
    fetcher: &dyn PackageFetcher,
    opts: &FetchOptions,
) -> Result<FetchOutcome> {
    let formula = load_formula(gctx, &opts.formula)?;
    let staged = stage_source(gctx, shell, fetcher, &formula, opts.head)?;

    let version = if opts.head {
        "HEAD".to_string()
    } else {
        formula.package.version.clone()
    };
    Ok(FetchOutcome {
        name: formula.package.name,
        version,
        staged,
    })
}
