//! In-place textual substitution.

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PatchError {
    #[error("failed to patch `{path}`")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("`{path}` does not contain `{needle}`")]
    TextNotFound { path: PathBuf, needle: String },
}

/// Replace every occurrence of `old` with `new` in the named file and
/// return how many were replaced.
///
/// Missing text is an error: a substitution that no longer matches means
/// the upstream tree changed and the recipe needs updating, not silence.
pub fn inreplace(path: &Path, old: &str, new: &str) -> Result<usize, PatchError> {
    let content = std::fs::read_to_string(path).map_err(|source| PatchError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let count = content.matches(old).count();
    if count == 0 {
        return Err(PatchError::TextNotFound {
            path: path.to_path_buf(),
            needle: old.to_string(),
        });
    }

    let patched = content.replace(old, new);
    std::fs::write(path, patched).map_err(|source| PatchError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!(
        "replaced {} occurrence(s) of `{}` in {}",
        count,
        old,
        path.display()
    );
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_replaces_every_occurrence() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("backend.cpp");
        std::fs::write(&path, "a();\nget_cat();\nx = get_cat();\n").unwrap();

        let count = inreplace(&path, "get_cat", "cat").unwrap();
        assert_eq!(count, 2);

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "a();\ncat();\nx = cat();\n");
    }

    #[test]
    fn test_missing_text_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("backend.cpp");
        std::fs::write(&path, "nothing relevant here\n").unwrap();

        let err = inreplace(&path, "get_cat", "cat").unwrap_err();
        assert!(matches!(err, PatchError::TextNotFound { .. }));
        // the file is untouched on failure
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "nothing relevant here\n"
        );
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let err = inreplace(Path::new("/nonexistent/backend.cpp"), "a", "b").unwrap_err();
        assert!(matches!(err, PatchError::Io { .. }));
    }
}
