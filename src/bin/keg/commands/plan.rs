//! `keg plan` command

use anyhow::Result;

use keg::inspect::BinaryArchInspector;
use keg::ops::{self, PlanOptions};
use keg::util::config::{BuildConfig, Config, PathsConfig};

use crate::cli::PlanArgs;
use crate::GlobalOptions;

pub fn execute(args: PlanArgs, global_opts: &GlobalOptions) -> Result<()> {
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

    let inspector = BinaryArchInspector::new();
    let opts = PlanOptions {
        formula: args.formula,
        build: args.variant.to_build_options(args.head),
    };
    let planned = ops::plan(&gctx, &inspector, &opts)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&planned)?);
    } else {
        print!("{}", ops::format_plan(&planned));
    }
    Ok(())
}
