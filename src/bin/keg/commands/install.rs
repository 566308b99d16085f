//! `keg install` command

use anyhow::Result;

use keg::inspect::BinaryArchInspector;
use keg::ops::{self, InstallContext, InstallOptions};
use keg::sources::ArchiveSource;
use keg::util::config::{BuildConfig, Config, PathsConfig};
use keg::util::process::StreamingRunner;

use crate::cli::InstallArgs;
use crate::GlobalOptions;

pub fn execute(args: InstallArgs, global_opts: &GlobalOptions) -> Result<()> {
    let shell = &global_opts.shell;

    let mut gctx = global_opts.gctx.clone();
    if args.jobs.is_some() {
        gctx.apply_overrides(Config {
            build: BuildConfig {
                jobs: args.jobs,
                cxx: None,
            },
            paths: PathsConfig::default(),
        });
    }
    gctx.ensure_layout()?;

    let fetcher =
        ArchiveSource::new(gctx.cache_dir().join("archives")).with_shell(shell.clone());
    let runner = StreamingRunner;
    let inspector = BinaryArchInspector::new();

    let ctx = InstallContext {
        gctx: &gctx,
        shell,
        fetcher: &fetcher,
        runner: &runner,
        inspector: &inspector,
    };
    let opts = InstallOptions {
        formula: args.formula,
        build: args.variant.to_build_options(args.head),
    };

    ops::install(&ctx, &opts)?;
    Ok(())
}
