//! Binary architecture inspection.
//!
//! Universal builds need every language runtime they link against to be
//! universal as well. The resolver asks one narrow question here, which
//! keeps the seam small enough to substitute a canned answer in tests.

use std::path::{Path, PathBuf};

use goblin::mach::Mach;
use goblin::Object;
use thiserror::Error;

use crate::util::process::find_executable;

#[derive(Debug, Error)]
pub enum InspectError {
    #[error("`{program}` not found on PATH")]
    NotFound { program: String },

    #[error("failed to read `{path}`")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("`{path}` is not a recognized executable: {message}")]
    Unreadable { path: PathBuf, message: String },
}

/// Answers whether an executable carries more than one architecture.
pub trait ArchInspector {
    fn is_universal(&self, program: &str) -> Result<bool, InspectError>;
}

/// Inspector that parses the real binary found on PATH.
#[derive(Debug, Default)]
pub struct BinaryArchInspector;

impl BinaryArchInspector {
    pub fn new() -> Self {
        Self
    }

    fn inspect_file(&self, path: &Path) -> Result<bool, InspectError> {
        let bytes = std::fs::read(path).map_err(|source| InspectError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        match Object::parse(&bytes) {
            // Only a fat Mach-O carrying several slices counts as universal.
            Ok(Object::Mach(Mach::Fat(multi))) => Ok(multi.narches > 1),
            Ok(Object::Mach(Mach::Binary(_))) | Ok(Object::Elf(_)) | Ok(Object::PE(_)) => Ok(false),
            Ok(_) => Err(InspectError::Unreadable {
                path: path.to_path_buf(),
                message: "unsupported object format".to_string(),
            }),
            Err(err) => Err(InspectError::Unreadable {
                path: path.to_path_buf(),
                message: err.to_string(),
            }),
        }
    }
}

impl ArchInspector for BinaryArchInspector {
    fn is_universal(&self, program: &str) -> Result<bool, InspectError> {
        // An explicit path bypasses the PATH lookup so callers can point at
        // a specific interpreter.
        let path = if program.contains(std::path::MAIN_SEPARATOR) {
            let path = PathBuf::from(program);
            if !path.is_file() {
                return Err(InspectError::NotFound {
                    program: program.to_string(),
                });
            }
            path
        } else {
            find_executable(program).ok_or_else(|| InspectError::NotFound {
                program: program.to_string(),
            })?
        };

        tracing::debug!("inspecting {} at {}", program, path.display());
        self.inspect_file(&path)
    }
}
