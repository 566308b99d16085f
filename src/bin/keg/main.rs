//! Keg CLI - a small Homebrew-style source package builder

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use keg::util::shell::Shell;
use keg::GlobalContext;

mod cli;
mod commands;

use cli::{Cli, Commands};

/// Flags and handles every command receives.
pub struct GlobalOptions {
    pub shell: Shell,
    pub gctx: GlobalContext,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // Parse CLI
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("keg=debug")
    } else {
        EnvFilter::new("keg=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    let global_opts = GlobalOptions {
        shell: Shell::from_flags(cli.quiet, cli.verbose, cli.no_color),
        gctx: cli.global_context()?,
    };

    // Execute command
    match cli.command {
        Commands::Install(args) => commands::install::execute(args, &global_opts),
        Commands::Plan(args) => commands::plan::execute(args, &global_opts),
        Commands::Fetch(args) => commands::fetch::execute(args, &global_opts),
        Commands::Info(args) => commands::info::execute(args, &global_opts),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
