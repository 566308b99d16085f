//! Head checkouts for formulas that track upstream.
//!
//! A head build compiles whatever the formula's repository currently
//! points at. The clone lives in the cache and is refreshed on each
//! request; the staging directory gets a clean copy without the `.git`
//! bookkeeping.

use std::path::{Path, PathBuf};

use git2::{Repository, ResetType};
use walkdir::WalkDir;

use crate::core::formula::HeadSpec;
use crate::util::hash::sha256_str;

use super::archive::FetchError;

pub struct HeadSource {
    cache_dir: PathBuf,
}

impl HeadSource {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        HeadSource {
            cache_dir: cache_dir.into(),
        }
    }

    /// Where the cached checkout for a formula lives.
    ///
    /// The directory name carries a short hash of the head spec, so a
    /// formula that moves to a different repository or branch gets a
    /// fresh clone instead of refreshing the stale one.
    pub fn checkout_path(&self, name: &str, head: &HeadSpec) -> PathBuf {
        let fingerprint = sha256_str(&format!("{:?}", head))[..8].to_string();
        self.cache_dir
            .join("head")
            .join(format!("{}-{}", name, fingerprint))
    }

    /// Clone or refresh the cached checkout, then copy the working tree
    /// into `dest`.
    pub fn stage(&self, name: &str, head: &HeadSpec, dest: &Path) -> Result<(), FetchError> {
        let checkout = self.checkout_path(name, head);

        if checkout.join(".git").exists() {
            self.refresh(&checkout, head)?;
        } else {
            self.clone(&checkout, head)?;
        }

        copy_working_tree(&checkout, dest)
    }

    fn clone(&self, checkout: &Path, head: &HeadSpec) -> Result<(), FetchError> {
        tracing::info!("cloning {}", head.url);

        if let Some(parent) = checkout.parent() {
            std::fs::create_dir_all(parent).map_err(|source| FetchError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let git_err = |source: git2::Error| FetchError::Git {
            url: head.url.clone(),
            source,
        };

        match &head.branch {
            Some(branch) => {
                git2::build::RepoBuilder::new()
                    .branch(branch)
                    .clone(&head.url, checkout)
                    .map_err(git_err)?;
            }
            None => {
                Repository::clone(&head.url, checkout).map_err(git_err)?;
            }
        }
        Ok(())
    }

    fn refresh(&self, checkout: &Path, head: &HeadSpec) -> Result<(), FetchError> {
        tracing::info!("updating {}", head.url);

        let git_err = |source: git2::Error| FetchError::Git {
            url: head.url.clone(),
            source,
        };

        let repo = Repository::open(checkout).map_err(git_err)?;
        let mut remote = repo.find_remote("origin").map_err(git_err)?;
        remote
            .fetch(&["refs/heads/*:refs/heads/*"], None, None)
            .map_err(git_err)?;

        let commit = match &head.branch {
            Some(branch) => repo
                .find_branch(branch, git2::BranchType::Local)
                .map_err(git_err)?
                .get()
                .peel_to_commit()
                .map_err(git_err)?,
            None => repo.head().map_err(git_err)?.peel_to_commit().map_err(git_err)?,
        };
        repo.reset(commit.as_object(), ResetType::Hard, None)
            .map_err(git_err)?;
        Ok(())
    }
}

/// Copy a checkout into `dest`, leaving the `.git` directory behind.
fn copy_working_tree(src: &Path, dest: &Path) -> Result<(), FetchError> {
    let io_err = |path: &Path, source: std::io::Error| FetchError::Io {
        path: path.to_path_buf(),
        source,
    };

    let walker = WalkDir::new(src)
        .into_iter()
        .filter_entry(|entry| entry.file_name() != ".git");

    for entry in walker {
        let entry = entry.map_err(|err| FetchError::Io {
            path: src.to_path_buf(),
            source: std::io::Error::other(err),
        })?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .expect("walked path is under its root");
        let target = dest.join(rel);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target).map_err(|source| io_err(&target, source))?;
        } else {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent).map_err(|source| io_err(parent, source))?;
            }
            std::fs::copy(entry.path(), &target).map_err(|source| io_err(&target, source))?;
        }
    }
    Ok(())
}
