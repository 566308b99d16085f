//! Formula file parsing.
//!
//! A formula is a declarative TOML file describing how to obtain and build
//! one package: where the source archive lives and its checksum, an optional
//! head repository for building straight from version control, the options a
//! user may request, and any compilers the package is known not to build
//! with. Formulas live in a tap directory, one `<name>.toml` per package.

use std::path::{Path, PathBuf};

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::util::hash::DigestKind;

/// Problems reading or validating a formula file.
#[derive(Debug, Error, Diagnostic)]
pub enum FormulaError {
    #[error("failed to read formula file: {path}")]
    #[diagnostic(code(keg::formula::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse formula file: {path}")]
    #[diagnostic(code(keg::formula::parse))]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid formula name '{name}'")]
    #[diagnostic(
        code(keg::formula::name),
        help("formula names are lowercase [a-z0-9_-] and start with a letter")
    )]
    InvalidName { name: String },

    #[error("invalid version '{version}'")]
    #[diagnostic(code(keg::formula::version))]
    InvalidVersion {
        version: String,
        #[source]
        source: semver::Error,
    },

    #[error("formula must declare exactly one source checksum, found {found}")]
    #[diagnostic(
        code(keg::formula::checksum_count),
        help("declare one of sha256, sha1, or md5 under [source]")
    )]
    ChecksumCount { found: usize },

    #[error("{kind} checksum must be {expected} hex characters, got '{value}'")]
    #[diagnostic(code(keg::formula::checksum_format))]
    MalformedChecksum {
        kind: DigestKind,
        expected: usize,
        value: String,
    },

    #[error("invalid URL '{url}'")]
    #[diagnostic(code(keg::formula::url))]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("dependency '{name}' is gated on '{when}', which is not a declared option")]
    #[diagnostic(code(keg::formula::dependency_gate))]
    UnknownDependencyGate { name: String, when: String },

    #[error("no formula named '{name}' in tap {tap}")]
    #[diagnostic(
        code(keg::tap::unknown_formula),
        help("point --tap (or KEG_TAP) at a directory containing {name}.toml")
    )]
    UnknownFormula { name: String, tap: PathBuf },
}

/// A parsed formula file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Formula {
    /// Package metadata
    pub package: FormulaPackage,

    /// Source archive specification
    pub source: SourceSpec,

    /// Repository to build from with `--head`
    #[serde(default)]
    pub head: Option<HeadSpec>,

    /// Options a user may request for this formula
    #[serde(default)]
    pub options: Vec<OptionSpec>,

    /// Compilers this package is known not to build with
    #[serde(default)]
    pub fails_with: Vec<FailsWith>,

    /// Other formulas this one needs installed, possibly gated on an option
    #[serde(default)]
    pub dependencies: Vec<DependencySpec>,
}

/// Package metadata in a formula file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormulaPackage {
    /// Formula name (lowercase [a-z0-9_-])
    pub name: String,

    /// Exact upstream version
    pub version: String,

    /// Upstream homepage
    #[serde(default)]
    pub homepage: Option<String>,
}

/// Source archive specification: a URL plus exactly one checksum.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSpec {
    /// Download URL
    pub url: String,

    #[serde(default)]
    pub sha256: Option<String>,

    #[serde(default)]
    pub sha1: Option<String>,

    #[serde(default)]
    pub md5: Option<String>,

    /// Leading directory to strip on extraction (e.g. "boost_1_51_0")
    #[serde(default)]
    pub strip_prefix: Option<String>,
}

/// Head repository specification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadSpec {
    /// Git repository URL
    pub url: String,

    /// Branch to track; the remote default when absent
    #[serde(default)]
    pub branch: Option<String>,
}

/// An option a user may request with `--<name>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionSpec {
    pub name: String,
    pub description: String,
}

/// A compiler this package is known not to build with.
///
/// An entry with a `build` number matches only that exact vendor build; an
/// entry without one matches the compiler name alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailsWith {
    /// Compiler name as the toolchain probe reports it (e.g. "llvm-gcc")
    pub compiler: String,

    /// Vendor build number, if the failure is build-specific
    #[serde(default)]
    pub build: Option<u32>,

    /// Why the combination fails, shown to the user on abort
    #[serde(default)]
    pub cause: Option<String>,
}

/// A dependency on another formula.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencySpec {
    /// Formula name of the dependency
    pub name: String,

    /// Only required when this option is requested
    #[serde(default)]
    pub when: Option<String>,
}

/// A declared checksum, ready for verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checksum {
    pub kind: DigestKind,
    pub value: String,
}

impl Formula {
    /// Load and parse a formula file from the given path.
    pub fn load(path: &Path) -> Result<Self, FormulaError> {
        let content = std::fs::read_to_string(path).map_err(|source| FormulaError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse(&content, path)
    }

    /// Parse a formula from TOML content.
    pub fn parse(content: &str, path: &Path) -> Result<Self, FormulaError> {
        let formula: Formula = toml::from_str(content).map_err(|source| FormulaError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        formula.validate()?;
        Ok(formula)
    }

    /// Validate the formula contents.
    pub fn validate(&self) -> Result<(), FormulaError> {
        validate_formula_name(&self.package.name)?;

        semver::Version::parse(&self.package.version).map_err(|source| {
            FormulaError::InvalidVersion {
                version: self.package.version.clone(),
                source,
            }
        })?;

        self.source.validate()?;

        if let Some(head) = &self.head {
            url::Url::parse(&head.url).map_err(|source| FormulaError::InvalidUrl {
                url: head.url.clone(),
                source,
            })?;
        }

        // A dependency gated on an option the formula never declares can
        // never be requested; treat it as an authoring mistake.
        for dep in &self.dependencies {
            if let Some(when) = &dep.when {
                if !self.has_option(when) {
                    return Err(FormulaError::UnknownDependencyGate {
                        name: dep.name.clone(),
                        when: when.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    /// The declared source checksum.
    pub fn checksum(&self) -> Checksum {
        self.source.checksum()
    }

    /// Check whether an option name is declared by this formula.
    pub fn has_option(&self, name: &str) -> bool {
        self.options.iter().any(|o| o.name == name)
    }

    /// The dependency gated on a given option, if the formula declares one.
    pub fn dependency_for_option(&self, option: &str) -> Option<&DependencySpec> {
        self.dependencies
            .iter()
            .find(|dep| dep.when.as_deref() == Some(option))
    }

    /// File name the source archive should be stored under, derived from
    /// the URL's last path segment.
    pub fn archive_file_name(&self) -> String {
        self.source
            .url
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}-{}.tar", self.package.name, self.package.version))
    }
}

impl SourceSpec {
    fn declared(&self) -> Vec<(DigestKind, &String)> {
        let mut found = Vec::new();
        if let Some(v) = &self.sha256 {
            found.push((DigestKind::Sha256, v));
        }
        if let Some(v) = &self.sha1 {
            found.push((DigestKind::Sha1, v));
        }
        if let Some(v) = &self.md5 {
            found.push((DigestKind::Md5, v));
        }
        found
    }

    fn validate(&self) -> Result<(), FormulaError> {
        url::Url::parse(&self.url).map_err(|source| FormulaError::InvalidUrl {
            url: self.url.clone(),
            source,
        })?;

        let declared = self.declared();
        if declared.len() != 1 {
            return Err(FormulaError::ChecksumCount {
                found: declared.len(),
            });
        }

        let (kind, value) = &declared[0];
        if value.len() != kind.hex_len() || !value.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(FormulaError::MalformedChecksum {
                kind: *kind,
                expected: kind.hex_len(),
                value: (*value).clone(),
            });
        }

        Ok(())
    }

    /// The declared checksum. Formulas are validated on parse, so exactly
    /// one digest is present.
    pub fn checksum(&self) -> Checksum {
        let declared = self.declared();
        match declared.as_slice() {
            [(kind, value)] => Checksum {
                kind: *kind,
                value: (*value).clone(),
            },
            _ => unreachable!("validated formula must have exactly one checksum"),
        }
    }
}

/// Validate a formula name.
///
/// Names must be non-empty, lowercase, start with [a-z], and contain only
/// [a-z0-9_-].
pub fn validate_formula_name(name: &str) -> Result<(), FormulaError> {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_lowercase() => {}
        _ => {
            return Err(FormulaError::InvalidName {
                name: name.to_string(),
            })
        }
    }

    if !name
        .chars()
        .all(|c| matches!(c, 'a'..='z' | '0'..='9' | '_' | '-'))
    {
        return Err(FormulaError::InvalidName {
            name: name.to_string(),
        });
    }

    Ok(())
}

/// A directory of formula files.
#[derive(Debug, Clone)]
pub struct Tap {
    root: PathBuf,
}

impl Tap {
    /// Open a tap rooted at a directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Tap { root: root.into() }
    }

    /// Root directory of this tap.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path a formula of the given name would live at.
    pub fn formula_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.toml"))
    }

    /// Load a formula by name.
    pub fn load(&self, name: &str) -> Result<Formula, FormulaError> {
        validate_formula_name(name)?;

        let path = self.formula_path(name);
        if !path.is_file() {
            return Err(FormulaError::UnknownFormula {
                name: name.to_string(),
                tap: self.root.clone(),
            });
        }
        Formula::load(&path)
    }

    /// Names of every formula in the tap, sorted.
    pub fn list(&self) -> std::io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().is_some_and(|e| e == "toml") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const BOOST_FORMULA: &str = r#"
[package]
name = "boost"
version = "1.51.0"
homepage = "http://www.boost.org"

[source]
url = "http://downloads.sourceforge.net/project/boost/boost/1.51.0/boost_1_51_0.tar.bz2"
sha1 = "52ef06895b97cc9981b8abf1997c375ca79f30c5"
strip_prefix = "boost_1_51_0"

[head]
url = "https://github.com/boostorg/boost.git"

[[options]]
name = "with-icu"
description = "Build regexp engine with icu support"

[[options]]
name = "universal"
description = "Build a universal binary"

[[fails_with]]
compiler = "llvm-gcc"
build = 2335
cause = "Dropped arguments to functions when linking with boost"

[[dependencies]]
name = "icu4c"
when = "with-icu"
"#;

    #[test]
    fn test_parse_boost_formula() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("boost.toml");

        let formula = Formula::parse(BOOST_FORMULA, &path).unwrap();
        assert_eq!(formula.package.name, "boost");
        assert_eq!(formula.package.version, "1.51.0");
        assert_eq!(
            formula.package.homepage.as_deref(),
            Some("http://www.boost.org")
        );

        let checksum = formula.checksum();
        assert_eq!(checksum.kind, DigestKind::Sha1);
        assert_eq!(checksum.value, "52ef06895b97cc9981b8abf1997c375ca79f30c5");

        assert_eq!(
            formula.source.strip_prefix.as_deref(),
            Some("boost_1_51_0")
        );
        assert_eq!(formula.archive_file_name(), "boost_1_51_0.tar.bz2");

        assert!(formula.has_option("with-icu"));
        assert!(!formula.has_option("with-mpi"));

        let icu = formula.dependency_for_option("with-icu").unwrap();
        assert_eq!(icu.name, "icu4c");
        assert!(formula.dependency_for_option("with-log").is_none());

        let fails = &formula.fails_with[0];
        assert_eq!(fails.compiler, "llvm-gcc");
        assert_eq!(fails.build, Some(2335));
    }

    #[test]
    fn test_md5_checksum_accepted() {
        let content = r#"
[package]
name = "boost-log"
version = "1.1.0"

[source]
url = "http://downloads.sourceforge.net/project/boost-log/boost-log-1.1.zip"
md5 = "d42fc71d0ead0d413b997c0e678722ca"
"#;
        let tmp = TempDir::new().unwrap();
        let formula = Formula::parse(content, &tmp.path().join("boost-log.toml")).unwrap();
        assert_eq!(formula.checksum().kind, DigestKind::Md5);
        assert_eq!(formula.archive_file_name(), "boost-log-1.1.zip");
    }

    #[test]
    fn test_rejects_zero_or_two_checksums() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("f.toml");

        let none = r#"
[package]
name = "f"
version = "1.0.0"

[source]
url = "http://example.com/f.tar.gz"
"#;
        let err = Formula::parse(none, &path).unwrap_err();
        assert!(matches!(err, FormulaError::ChecksumCount { found: 0 }));

        let two = r#"
[package]
name = "f"
version = "1.0.0"

[source]
url = "http://example.com/f.tar.gz"
sha1 = "52ef06895b97cc9981b8abf1997c375ca79f30c5"
md5 = "d42fc71d0ead0d413b997c0e678722ca"
"#;
        let err = Formula::parse(two, &path).unwrap_err();
        assert!(matches!(err, FormulaError::ChecksumCount { found: 2 }));
    }

    #[test]
    fn test_rejects_malformed_checksum() {
        let content = r#"
[package]
name = "f"
version = "1.0.0"

[source]
url = "http://example.com/f.tar.gz"
sha1 = "abc123"
"#;
        let tmp = TempDir::new().unwrap();
        let err = Formula::parse(content, &tmp.path().join("f.toml")).unwrap_err();
        match err {
            FormulaError::MalformedChecksum { kind, expected, .. } => {
                assert_eq!(kind, DigestKind::Sha1);
                assert_eq!(expected, 40);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_rejects_bad_url() {
        let content = r#"
[package]
name = "f"
version = "1.0.0"

[source]
url = "not a url"
sha1 = "52ef06895b97cc9981b8abf1997c375ca79f30c5"
"#;
        let tmp = TempDir::new().unwrap();
        let err = Formula::parse(content, &tmp.path().join("f.toml")).unwrap_err();
        assert!(matches!(err, FormulaError::InvalidUrl { .. }));
    }

    #[test]
    fn test_rejects_unknown_dependency_gate() {
        let content = r#"
[package]
name = "f"
version = "1.0.0"

[source]
url = "http://example.com/f.tar.gz"
sha1 = "52ef06895b97cc9981b8abf1997c375ca79f30c5"

[[dependencies]]
name = "icu4c"
when = "with-icu"
"#;
        let tmp = TempDir::new().unwrap();
        let err = Formula::parse(content, &tmp.path().join("f.toml")).unwrap_err();
        assert!(matches!(err, FormulaError::UnknownDependencyGate { .. }));
    }

    #[test]
    fn test_validate_formula_name() {
        assert!(validate_formula_name("boost").is_ok());
        assert!(validate_formula_name("boost-log").is_ok());
        assert!(validate_formula_name("icu4c").is_ok());

        assert!(validate_formula_name("").is_err());
        assert!(validate_formula_name("Boost").is_err());
        assert!(validate_formula_name("4cu").is_err());
        assert!(validate_formula_name("boost log").is_err());
    }

    #[test]
    fn test_tap_load_and_list() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("boost.toml"), BOOST_FORMULA).unwrap();
        std::fs::write(tmp.path().join("notes.txt"), "not a formula").unwrap();

        let tap = Tap::new(tmp.path());
        let formula = tap.load("boost").unwrap();
        assert_eq!(formula.package.name, "boost");

        assert_eq!(tap.list().unwrap(), vec!["boost".to_string()]);

        let err = tap.load("zlib").unwrap_err();
        assert!(matches!(err, FormulaError::UnknownFormula { .. }));
    }
}
