//! Global context for keg operations.
//!
//! Built once per invocation from `~/.keg/config.toml` plus CLI and
//! environment overrides. Everything downstream reads resolved paths from
//! here instead of consulting ambient state.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::util::config::{self, Config};

/// Global context containing configuration and resolved paths.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Home directory for global keg data (~/.keg/)
    home: PathBuf,

    /// Merged configuration (file, then overrides)
    config: Config,
}

impl GlobalContext {
    /// Create a context rooted at the default home directory.
    pub fn new() -> Result<Self> {
        let home = config::keg_home().context("failed to locate home directory")?;
        Ok(Self::with_home(home))
    }

    /// Create a context rooted at an explicit home directory.
    pub fn with_home(home: PathBuf) -> Self {
        let config = Config::load_or_default(&home.join("config.toml"));
        GlobalContext { home, config }
    }

    /// Layer CLI/environment overrides over the file config.
    pub fn apply_overrides(&mut self, overrides: Config) {
        self.config.merge(overrides);
    }

    /// Get the keg home directory (~/.keg/).
    pub fn home(&self) -> &Path {
        &self.home
    }

    /// Where kegs are installed.
    pub fn cellar_dir(&self) -> PathBuf {
        self.config
            .paths
            .cellar
            .clone()
            .unwrap_or_else(|| self.home.join("cellar"))
    }

    /// Where downloads and extracted sources live.
    pub fn cache_dir(&self) -> PathBuf {
        self.config
            .paths
            .cache
            .clone()
            .unwrap_or_else(|| self.home.join("cache"))
    }

    /// Where formula files are read from.
    pub fn tap_dir(&self) -> PathBuf {
        self.config
            .paths
            .tap
            .clone()
            .unwrap_or_else(|| self.home.join("tap"))
    }

    /// Parallel job count for build invocations.
    pub fn jobs(&self) -> usize {
        self.config.build.jobs.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }

    /// Configured C++ compiler override, if any.
    pub fn cxx_override(&self) -> Option<&Path> {
        self.config.build.cxx.as_deref()
    }

    /// Create the writable directories keg needs.
    pub fn ensure_layout(&self) -> Result<()> {
        crate::util::fs::ensure_dir(&self.cellar_dir())?;
        crate::util::fs::ensure_dir(&self.cache_dir())?;
        Ok(())
    }
}
