//! C++ toolchain probing.
//!
//! Keg never compiles anything itself, but it has to know which compiler
//! the package's build tool is going to pick up: the toolset name in the
//! argument plan, the declaration in the generated configuration file, the
//! C++11 mode flags, and the formula's known-bad-compiler gate all depend
//! on it.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use thiserror::Error;

use crate::core::formula::FailsWith;
use crate::util::process::{find_executable, ProcessBuilder};

static LLVM_BUILD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)LLVM build (\d+)").expect("valid regex"));

/// Compiler families keg can drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CompilerFamily {
    Gcc,
    Clang,
    AppleClang,
    /// Apple's discontinued gcc front end over an LLVM back end.
    LlvmGcc,
}

impl CompilerFamily {
    /// Name used in the build-stage `toolset=` argument.
    pub fn b2_toolset(self) -> &'static str {
        match self {
            CompilerFamily::Gcc => "gcc",
            CompilerFamily::Clang | CompilerFamily::AppleClang => "clang",
            CompilerFamily::LlvmGcc => "darwin",
        }
    }

    /// Module name declared in the generated toolset-configuration file.
    ///
    /// Apple toolchains declare themselves through the `darwin` module even
    /// though the build argument still says `clang`; the pair is kept here
    /// so the two spellings cannot drift apart.
    pub fn jam_declaration(self) -> &'static str {
        match self {
            CompilerFamily::Gcc => "gcc",
            CompilerFamily::Clang => "clang",
            CompilerFamily::AppleClang | CompilerFamily::LlvmGcc => "darwin",
        }
    }

    /// Name the probe reports, used for `fails_with` matching.
    pub fn probe_name(self) -> &'static str {
        match self {
            CompilerFamily::Gcc => "gcc",
            CompilerFamily::Clang | CompilerFamily::AppleClang => "clang",
            CompilerFamily::LlvmGcc => "llvm-gcc",
        }
    }
}

/// What the probe learned about the active C++ compiler.
#[derive(Debug, Clone, Serialize)]
pub struct CompilerIdentity {
    pub path: PathBuf,
    pub family: CompilerFamily,

    /// First line of `--version` output, kept for display.
    pub version_line: String,

    /// Apple vendor build number, when the version line carries one
    /// (e.g. `LLVM build 2336`).
    pub apple_build: Option<u32>,
}

/// Toolchain problems. All fatal; keg does not fall back to another
/// compiler once one has been selected.
#[derive(Debug, Error)]
pub enum ToolchainError {
    #[error("no C++ compiler found; set CXX, pass --cxx, or install clang++ or g++")]
    NotFound,

    #[error("failed to probe `{path}`")]
    Probe {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{package} does not build with {toolchain}: {cause}")]
    Incompatible {
        package: String,
        toolchain: String,
        cause: String,
    },

    #[error("{compiler} does not support C++11 mode")]
    Cxx11Unsupported { compiler: &'static str },
}

/// Resolve the active C++ compiler and classify it.
///
/// Resolution order: the explicit override, then `CXX`, then the first of
/// `c++`/`clang++`/`g++` found on PATH.
pub fn detect(cxx_override: Option<&Path>) -> Result<CompilerIdentity, ToolchainError> {
    let path = resolve_cxx(cxx_override)?;
    probe(&path)
}

fn resolve_cxx(cxx_override: Option<&Path>) -> Result<PathBuf, ToolchainError> {
    if let Some(path) = cxx_override {
        return Ok(path.to_path_buf());
    }

    if let Ok(env) = std::env::var("CXX") {
        if !env.is_empty() {
            return Ok(PathBuf::from(env));
        }
    }

    for name in ["c++", "clang++", "g++"] {
        if let Some(path) = find_executable(name) {
            return Ok(path);
        }
    }

    Err(ToolchainError::NotFound)
}

/// Run `--version` once and classify the compiler.
pub fn probe(path: &Path) -> Result<CompilerIdentity, ToolchainError> {
    let output = ProcessBuilder::new(path)
        .arg("--version")
        .exec()
        .map_err(|source| ToolchainError::Probe {
            path: path.to_path_buf(),
            source,
        })?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let version_line = stdout.lines().next().unwrap_or("").to_string();
    let family = classify(path, &stdout);
    let apple_build = parse_apple_build(&stdout);

    tracing::debug!(
        "probed {}: {:?}, \"{}\"",
        path.display(),
        family,
        version_line
    );

    Ok(CompilerIdentity {
        path: path.to_path_buf(),
        family,
        version_line,
        apple_build,
    })
}

/// Classify a compiler from its binary name and `--version` output.
fn classify(path: &Path, version_output: &str) -> CompilerFamily {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("")
        .to_lowercase();
    let output = version_output.to_lowercase();

    // llvm-gcc first: its name and output both also contain "gcc"
    if name.contains("llvm-g") || output.contains("llvm-gcc") {
        return CompilerFamily::LlvmGcc;
    }

    if name.contains("clang") || output.contains("clang") {
        if output.contains("apple") {
            CompilerFamily::AppleClang
        } else {
            CompilerFamily::Clang
        }
    } else {
        CompilerFamily::Gcc
    }
}

/// Extract the Apple `LLVM build NNNN` number from `--version` output.
fn parse_apple_build(version_output: &str) -> Option<u32> {
    LLVM_BUILD_RE
        .captures(version_output)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Compiler and linker flag overrides that switch a family into C++11 mode.
///
/// Returns `(cxxflags, ldflags)`. Both compile and link steps need the
/// libc++ selection on clang, or the build links the wrong standard
/// library.
pub fn cxx11_flags(family: CompilerFamily) -> Result<(Vec<String>, Vec<String>), ToolchainError> {
    match family {
        CompilerFamily::Clang | CompilerFamily::AppleClang => Ok((
            vec!["-std=c++11".to_string(), "-stdlib=libc++".to_string()],
            vec!["-stdlib=libc++".to_string()],
        )),
        CompilerFamily::Gcc => Ok((vec!["-std=c++11".to_string()], Vec::new())),
        CompilerFamily::LlvmGcc => Err(ToolchainError::Cxx11Unsupported {
            compiler: "llvm-gcc",
        }),
    }
}

/// Abort when the formula declares the probed toolchain broken.
///
/// An entry with a `build` number matches only that exact vendor build; an
/// entry without one matches on the compiler name alone.
pub fn check_fails_with(
    package: &str,
    identity: &CompilerIdentity,
    rules: &[FailsWith],
) -> Result<(), ToolchainError> {
    for rule in rules {
        if rule.compiler != identity.family.probe_name() {
            continue;
        }
        if let Some(build) = rule.build {
            if identity.apple_build != Some(build) {
                continue;
            }
        }

        let toolchain = match rule.build {
            Some(build) => format!("{} build {}", rule.compiler, build),
            None => rule.compiler.clone(),
        };
        return Err(ToolchainError::Incompatible {
            package: package.to_string(),
            toolchain,
            cause: rule
                .cause
                .clone()
                .unwrap_or_else(|| "declared incompatible by the formula".to_string()),
        });
    }
    Ok(())
}
