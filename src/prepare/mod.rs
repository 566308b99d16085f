//! Source-tree preparation.
//!
//! Steps that edit the unpacked tree before any build tool runs: merging
//! the historical logging add-on and branding install names into the jam
//! toolchain file. These run strictly before resolution output is
//! consumed, never interleaved with it.

pub mod patch;

pub use patch::{inreplace, PatchError};

use std::path::Path;

use anyhow::{Context, Result};

use crate::util::fs::copy_dir_all;

/// Subdirectories the logging add-on contributes to the main tree.
const LOG_MERGE_DIRS: [&str; 2] = ["boost/log", "libs/log"];

/// Relative path of the add-on source file carrying the deprecated
/// platform API call.
const TEXT_FILE_BACKEND: &str = "libs/log/src/text_file_backend.cpp";

/// Merge the logging add-on tree into the main source tree.
///
/// The add-on predates the platform's category-accessor rename, so the
/// file still calling the deprecated spelling is patched before its
/// directories are copied over.
pub fn merge_logging_library(log_tree: &Path, boost_tree: &Path) -> Result<()> {
    inreplace(
        &log_tree.join(TEXT_FILE_BACKEND),
        "get_generic_category",
        "generic_category",
    )?;

    for dir in LOG_MERGE_DIRS {
        copy_dir_all(&log_tree.join(dir), &boost_tree.join(dir))
            .with_context(|| format!("failed to merge {dir} into the source tree"))?;
    }
    Ok(())
}

/// Point shared-library install names at the final library directory.
///
/// The stock jam toolchain file bakes bare file names into install names;
/// installed libraries then resolve only from the build directory.
pub fn brand_install_names(boost_tree: &Path, libdir: &Path) -> Result<()> {
    let jam = boost_tree.join("tools/build/v2/tools/darwin.jam");
    if !jam.is_file() {
        // head trees have reorganized the build system layout
        tracing::debug!(
            "no jam toolchain file at {}, skipping install-name branding",
            jam.display()
        );
        return Ok(());
    }

    inreplace(
        &jam,
        "-install_name \"",
        &format!("-install_name \"{}/", libdir.display()),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{boost_log_source_tree, boost_source_tree};
    use tempfile::TempDir;

    #[test]
    fn test_merge_patches_then_copies() {
        let tmp = TempDir::new().unwrap();
        let boost = tmp.path().join("boost");
        let log = tmp.path().join("boost-log");
        boost_source_tree(&boost);
        boost_log_source_tree(&log);

        merge_logging_library(&log, &boost).unwrap();

        assert!(boost.join("boost/log/core/core.hpp").is_file());
        assert!(boost.join("libs/log/src/core.cpp").is_file());

        let backend =
            std::fs::read_to_string(boost.join("libs/log/src/text_file_backend.cpp")).unwrap();
        assert!(backend.contains("generic_category"));
        assert!(!backend.contains("get_generic_category"));
    }

    #[test]
    fn test_merge_fails_when_the_add_on_changed_shape() {
        let tmp = TempDir::new().unwrap();
        let boost = tmp.path().join("boost");
        let log = tmp.path().join("boost-log");
        boost_source_tree(&boost);
        boost_log_source_tree(&log);
        std::fs::write(
            log.join("libs/log/src/text_file_backend.cpp"),
            "already modernized\n",
        )
        .unwrap();

        assert!(merge_logging_library(&log, &boost).is_err());
    }

    #[test]
    fn test_branding_rewrites_the_jam_file() {
        let tmp = TempDir::new().unwrap();
        let boost = tmp.path().join("boost");
        boost_source_tree(&boost);

        brand_install_names(&boost, Path::new("/opt/keg/cellar/boost/1.51.0/lib")).unwrap();

        let jam =
            std::fs::read_to_string(boost.join("tools/build/v2/tools/darwin.jam")).unwrap();
        assert!(jam.contains("-install_name \"/opt/keg/cellar/boost/1.51.0/lib/"));
    }

    #[test]
    fn test_branding_skips_trees_without_the_jam_file() {
        let tmp = TempDir::new().unwrap();
        let boost = tmp.path().join("boost");
        std::fs::create_dir_all(&boost).unwrap();

        brand_install_names(&boost, Path::new("/opt/keg/lib")).unwrap();
    }
}
