//! `keg fetch` command

use anyhow::Result;

use keg::ops::{self, FetchOptions};
use keg::sources::ArchiveSource;
use keg::util::shell::Status;

use crate::cli::FetchArgs;
use crate::GlobalOptions;

pub fn execute(args: FetchArgs, global_opts: &GlobalOptions) -> Result<()> {
    let shell = &global_opts.shell;
    let gctx = &global_opts.gctx;
    gctx.ensure_layout()?;

    let fetcher =
        ArchiveSource::new(gctx.cache_dir().join("archives")).with_shell(shell.clone());
    let opts = FetchOptions {
        formula: args.formula,
        head: args.head,
    };
    let outcome = ops::fetch(gctx, shell, &fetcher, &opts)?;

    shell.status(
        Status::Finished,
        format!("{} {} staged", outcome.name, outcome.version),
    );
    // The staged path goes to stdout so scripts can capture it
    println!("{}", outcome.staged.display());
    Ok(())
}
