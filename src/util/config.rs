//! Configuration file support for keg.
//!
//! Keg reads one global file, `~/.keg/config.toml`. Command-line switches
//! and `KEG_*` environment variables take precedence over anything set
//! there; the merge happens once when the global context is built.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Keg configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Build settings
    pub build: BuildConfig,

    /// Directory overrides
    pub paths: PathsConfig,
}

/// Build-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Default number of parallel jobs (None = auto-detect)
    pub jobs: Option<usize>,

    /// Path to the C++ compiler (e.g., /usr/bin/clang++)
    pub cxx: Option<PathBuf>,
}

/// Directory layout overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Where kegs are installed (default ~/.keg/cellar)
    pub cellar: Option<PathBuf>,

    /// Where downloads and extracted sources live (default ~/.keg/cache)
    pub cache: Option<PathBuf>,

    /// Where formula files are read from (default ~/.keg/tap)
    pub tap: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if the file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.build.jobs.is_some() {
            self.build.jobs = other.build.jobs;
        }
        if other.build.cxx.is_some() {
            self.build.cxx = other.build.cxx;
        }
        if other.paths.cellar.is_some() {
            self.paths.cellar = other.paths.cellar;
        }
        if other.paths.cache.is_some() {
            self.paths.cache = other.paths.cache;
        }
        if other.paths.tap.is_some() {
            self.paths.tap = other.paths.tap;
        }
    }
}

/// Get the global keg home directory (~/.keg).
pub fn keg_home() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".keg"))
}

/// Get the global config file path (~/.keg/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    keg_home().map(|dir| dir.join("config.toml"))
}
