//! CLI definitions using clap.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use keg::util::config::{BuildConfig, Config, PathsConfig};
use keg::{BuildOptions, GlobalContext};

/// Keg - build formulas from source, Homebrew style
#[derive(Parser)]
#[command(name = "keg")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Cellar directory kegs install into
    #[arg(long, global = true, env = "KEG_CELLAR", value_name = "DIR")]
    pub cellar: Option<PathBuf>,

    /// Cache directory for downloads and staged sources
    #[arg(long, global = true, env = "KEG_CACHE", value_name = "DIR")]
    pub cache: Option<PathBuf>,

    /// Tap directory formulas are read from
    #[arg(long, global = true, env = "KEG_TAP", value_name = "DIR")]
    pub tap: Option<PathBuf>,

    /// C++ compiler to build with
    #[arg(long, global = true, env = "KEG_CXX", value_name = "PATH")]
    pub cxx: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Build the global context: the config file, overlaid with these flags.
    pub fn global_context(&self) -> Result<GlobalContext> {
        let mut gctx = GlobalContext::new()?;
        gctx.apply_overrides(Config {
            build: BuildConfig {
                jobs: None,
                cxx: self.cxx.clone(),
            },
            paths: PathsConfig {
                cellar: self.cellar.clone(),
                cache: self.cache.clone(),
                tap: self.tap.clone(),
            },
        });
        Ok(gctx)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build a formula from source and install it into the cellar
    Install(InstallArgs),

    /// Show what an install would do, fetching and building nothing
    Plan(PlanArgs),

    /// Download and stage a formula's source without building
    Fetch(FetchArgs),

    /// Show a formula's metadata, options, and install status
    Info(InfoArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Variant switches shared by install and plan.
#[derive(Args, Debug, Clone, Default)]
pub struct VariantArgs {
    /// Build a universal (dual-architecture) binary
    #[arg(long)]
    pub universal: bool,

    /// Compile in C++11 mode
    #[arg(long)]
    pub cxx11: bool,

    /// Build the MPI bindings
    #[arg(long)]
    pub with_mpi: bool,

    /// Skip the Python bindings
    #[arg(long)]
    pub without_python: bool,

    /// Build the regexp engine with ICU support
    #[arg(long)]
    pub with_icu: bool,

    /// Merge the logging add-on into the tree before building
    #[arg(long)]
    pub with_log: bool,
}

impl VariantArgs {
    pub fn to_build_options(&self, head: bool) -> BuildOptions {
        BuildOptions {
            universal: self.universal,
            cxx11: self.cxx11,
            with_mpi: self.with_mpi,
            without_python: self.without_python,
            with_icu: self.with_icu,
            with_log: self.with_log,
            head,
        }
    }
}

#[derive(Args)]
pub struct InstallArgs {
    /// Formula to install
    pub formula: String,

    #[command(flatten)]
    pub variant: VariantArgs,

    /// Build from the head repository instead of the release archive
    #[arg(long)]
    pub head: bool,

    /// Number of parallel build jobs
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,
}

#[derive(Args)]
pub struct PlanArgs {
    /// Formula to plan
    pub formula: String,

    #[command(flatten)]
    pub variant: VariantArgs,

    /// Plan a head build
    #[arg(long)]
    pub head: bool,

    /// Number of parallel build jobs
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Print the plan as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct FetchArgs {
    /// Formula to stage
    pub formula: String,

    /// Stage the head repository instead of the release archive
    #[arg(long)]
    pub head: bool,
}

#[derive(Args)]
pub struct InfoArgs {
    /// Formula to describe
    pub formula: String,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
