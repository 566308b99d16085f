//! `keg info` command

use anyhow::Result;

use keg::ops;
use keg::{Cellar, Tap};

use crate::cli::InfoArgs;
use crate::GlobalOptions;

pub fn execute(args: InfoArgs, global_opts: &GlobalOptions) -> Result<()> {
    let gctx = &global_opts.gctx;
    let formula = ops::load_formula(gctx, &args.formula)?;

    println!("{}: {}", formula.package.name, formula.package.version);
    if let Some(homepage) = &formula.package.homepage {
        println!("{homepage}");
    }
    println!(
        "from: {}",
        Tap::new(gctx.tap_dir())
            .formula_path(&formula.package.name)
            .display()
    );

    let cellar = Cellar::new(gctx.cellar_dir());
    match cellar.installed_prefix(&formula.package.name) {
        Some(prefix) => println!("installed: {}", prefix.display()),
        None => println!("not installed"),
    }

    if !formula.options.is_empty() || formula.head.is_some() {
        println!();
        println!("options:");
        for opt in &formula.options {
            println!("  --{}", opt.name);
            println!("      {}", opt.description);
        }
        if formula.head.is_some() {
            println!("  --head");
            println!("      build from the development repository");
        }
    }

    for rule in &formula.fails_with {
        let build = rule
            .build
            .map(|b| format!(" build {b}"))
            .unwrap_or_default();
        println!();
        println!("known not to build with {}{}", rule.compiler, build);
        if let Some(cause) = &rule.cause {
            println!("    {cause}");
        }
    }

    Ok(())
}
