//! The cellar: where kegs live once installed.
//!
//! Layout is `<root>/<name>/<version>`, one keg per installed version.
//! Lookups answer "where is the newest installed copy of this package",
//! which is how the resolver finds an ICU to point the bootstrap script at.

use std::path::{Path, PathBuf};

/// Installation root for kegs.
#[derive(Debug, Clone)]
pub struct Cellar {
    root: PathBuf,
}

impl Cellar {
    /// Open a cellar rooted at a directory. The directory need not exist
    /// yet; installs create it.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Cellar { root: root.into() }
    }

    /// Root directory of the cellar.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Prefix a fresh install of `name`/`version` goes into.
    pub fn keg_prefix(&self, name: &str, version: &str) -> PathBuf {
        self.root.join(name).join(version)
    }

    /// Installed versions of a package, ascending. Directory names that are
    /// not semver versions are ignored.
    pub fn installed_versions(&self, name: &str) -> Vec<semver::Version> {
        let dir = self.root.join(name);
        let Ok(entries) = std::fs::read_dir(&dir) else {
            return Vec::new();
        };

        let mut versions: Vec<semver::Version> = entries
            .flatten()
            .filter(|e| e.path().is_dir())
            .filter_map(|e| e.file_name().to_str().and_then(|s| s.parse().ok()))
            .collect();
        versions.sort();
        versions
    }

    /// Prefix of the newest installed version of a package, if any. A
    /// head-only install counts, but a versioned keg always wins over it.
    pub fn installed_prefix(&self, name: &str) -> Option<PathBuf> {
        if let Some(newest) = self.installed_versions(name).into_iter().next_back() {
            return Some(self.keg_prefix(name, &newest.to_string()));
        }
        let head = self.keg_prefix(name, "HEAD");
        head.is_dir().then_some(head)
    }

    /// Whether any version of a package is installed.
    pub fn is_installed(&self, name: &str) -> bool {
        self.installed_prefix(name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_keg_prefix_layout() {
        let cellar = Cellar::new("/opt/keg/cellar");
        assert_eq!(
            cellar.keg_prefix("boost", "1.51.0"),
            PathBuf::from("/opt/keg/cellar/boost/1.51.0")
        );
    }

    #[test]
    fn test_installed_prefix_picks_newest() {
        let tmp = TempDir::new().unwrap();
        let cellar = Cellar::new(tmp.path());

        std::fs::create_dir_all(tmp.path().join("icu4c/4.4.1")).unwrap();
        std::fs::create_dir_all(tmp.path().join("icu4c/50.1.0")).unwrap();
        // Not a version; must be ignored
        std::fs::create_dir_all(tmp.path().join("icu4c/.metadata")).unwrap();

        assert_eq!(
            cellar.installed_prefix("icu4c"),
            Some(tmp.path().join("icu4c/50.1.0"))
        );
        assert_eq!(
            cellar
                .installed_versions("icu4c")
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>(),
            vec!["4.4.1", "50.1.0"]
        );
    }

    #[test]
    fn test_missing_package() {
        let tmp = TempDir::new().unwrap();
        let cellar = Cellar::new(tmp.path());

        assert_eq!(cellar.installed_prefix("icu4c"), None);
        assert!(!cellar.is_installed("icu4c"));
    }

    #[test]
    fn test_head_only_install_is_found() {
        let tmp = TempDir::new().unwrap();
        let cellar = Cellar::new(tmp.path());
        std::fs::create_dir_all(tmp.path().join("boost/HEAD")).unwrap();

        assert_eq!(
            cellar.installed_prefix("boost"),
            Some(tmp.path().join("boost/HEAD"))
        );
        assert!(cellar.is_installed("boost"));
        assert!(cellar.installed_versions("boost").is_empty());
    }
}
