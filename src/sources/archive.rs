//! Verified archive acquisition.
//!
//! Downloads a formula's source archive into the cache, verifies the
//! declared digest, and unpacks it into a staging directory. A cached
//! archive is reused only after it verifies again; one that stops
//! verifying is discarded and refetched.

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Component, Path, PathBuf};

use bzip2::read::BzDecoder;
use flate2::read::GzDecoder;
use tar::Archive;
use thiserror::Error;

use crate::core::Formula;
use crate::util::hash::{digest_bytes, digest_file, DigestKind};
use crate::util::shell::{ColorChoice, Progress, Shell, Status, Verbosity};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to download `{url}`")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("`{url}` answered HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("{kind} mismatch for `{file}`:\n  expected: {expected}\n  actual:   {actual}")]
    ChecksumMismatch {
        file: String,
        kind: DigestKind,
        expected: String,
        actual: String,
    },

    #[error("failed to access `{path}`")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("`{file}` is not a supported archive format")]
    UnsupportedArchive { file: String },

    #[error("failed to extract `{file}`: {message}")]
    Archive { file: String, message: String },

    #[error("git operation on `{url}` failed")]
    Git {
        url: String,
        #[source]
        source: git2::Error,
    },
}

/// Archive formats the fetcher can unpack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    TarGz,
    TarBz2,
    Zip,
}

impl ArchiveFormat {
    pub fn from_file_name(name: &str) -> Option<Self> {
        let name = name.to_ascii_lowercase();
        if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Some(ArchiveFormat::TarGz)
        } else if name.ends_with(".tar.bz2") || name.ends_with(".tbz") || name.ends_with(".tbz2") {
            Some(ArchiveFormat::TarBz2)
        } else if name.ends_with(".zip") {
            Some(ArchiveFormat::Zip)
        } else {
            None
        }
    }
}

/// Retrieves a formula's verified source and unpacks it at `dest`.
pub trait PackageFetcher {
    fn stage(&self, formula: &Formula, dest: &Path) -> Result<(), FetchError>;
}

/// Fetcher backed by HTTP downloads and a local archive cache.
pub struct ArchiveSource {
    cache_dir: PathBuf,
    shell: Shell,
}

impl ArchiveSource {
    /// Create a fetcher with no visible progress. Interactive callers hand
    /// over their shell with [`with_shell`](Self::with_shell).
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        ArchiveSource {
            cache_dir: cache_dir.into(),
            shell: Shell::new(Verbosity::Quiet, ColorChoice::Never),
        }
    }

    /// Route download progress and extraction status through `shell`.
    pub fn with_shell(mut self, shell: Shell) -> Self {
        self.shell = shell;
        self
    }

    /// Where the formula's archive lands in the cache.
    pub fn cached_archive(&self, formula: &Formula) -> PathBuf {
        self.cache_dir.join(formula.archive_file_name())
    }

    /// Download the formula's archive, or reuse the cached copy when it
    /// still verifies. The returned path always holds verified bytes.
    pub fn download(&self, formula: &Formula) -> Result<PathBuf, FetchError> {
        let checksum = formula.checksum();
        let file_name = formula.archive_file_name();
        let target = self.cache_dir.join(&file_name);

        if target.is_file() {
            let actual = digest_file(checksum.kind, &target).map_err(|err| FetchError::Io {
                path: target.clone(),
                source: std::io::Error::other(err),
            })?;
            if actual.eq_ignore_ascii_case(&checksum.value) {
                tracing::debug!("using cached archive {}", target.display());
                return Ok(target);
            }
            tracing::warn!(
                "cached archive {} no longer verifies, refetching",
                target.display()
            );
            std::fs::remove_file(&target).map_err(|source| FetchError::Io {
                path: target.clone(),
                source,
            })?;
        }

        let url = &formula.source.url;
        tracing::info!("downloading {}", url);
        let mut response = reqwest::blocking::get(url).map_err(|source| FetchError::Http {
            url: url.clone(),
            source,
        })?;
        if !response.status().is_success() {
            return Err(FetchError::Status {
                url: url.clone(),
                status: response.status(),
            });
        }

        let total = response.content_length().unwrap_or(0);
        let mut progress = self.shell.byte_progress(&file_name, total);
        // the declared length is only the server's claim; never allocate from it
        let mut sink = ProgressSink {
            buffer: Vec::new(),
            progress: &mut progress,
        };
        response
            .copy_to(&mut sink)
            .map_err(|source| FetchError::Http {
                url: url.clone(),
                source,
            })?;
        let bytes = sink.buffer;
        progress.finish();

        let actual = digest_bytes(checksum.kind, &bytes);
        if !actual.eq_ignore_ascii_case(&checksum.value) {
            return Err(FetchError::ChecksumMismatch {
                file: file_name,
                kind: checksum.kind,
                expected: checksum.value,
                actual,
            });
        }

        std::fs::create_dir_all(&self.cache_dir).map_err(|source| FetchError::Io {
            path: self.cache_dir.clone(),
            source,
        })?;
        std::fs::write(&target, &bytes).map_err(|source| FetchError::Io {
            path: target.clone(),
            source,
        })?;

        tracing::debug!("cached {} ({} bytes)", target.display(), bytes.len());
        Ok(target)
    }

    /// Unpack an archive into `dest`, stripping the named top-level
    /// directory when the formula declares one.
    pub fn extract(
        &self,
        archive: &Path,
        dest: &Path,
        strip_prefix: Option<&str>,
    ) -> Result<(), FetchError> {
        let file_name = archive
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| archive.display().to_string());
        let format = ArchiveFormat::from_file_name(&file_name)
            .ok_or_else(|| FetchError::UnsupportedArchive {
                file: file_name.clone(),
            })?;

        std::fs::create_dir_all(dest).map_err(|source| FetchError::Io {
            path: dest.to_path_buf(),
            source,
        })?;
        let file = File::open(archive).map_err(|source| FetchError::Io {
            path: archive.to_path_buf(),
            source,
        })?;

        tracing::debug!("extracting {} to {}", file_name, dest.display());
        match format {
            ArchiveFormat::TarGz => unpack_tar(GzDecoder::new(file), dest, strip_prefix, &file_name),
            ArchiveFormat::TarBz2 => {
                unpack_tar(BzDecoder::new(file), dest, strip_prefix, &file_name)
            }
            ArchiveFormat::Zip => unpack_zip(file, dest, strip_prefix, &file_name),
        }
    }
}

impl PackageFetcher for ArchiveSource {
    fn stage(&self, formula: &Formula, dest: &Path) -> Result<(), FetchError> {
        let archive = self.download(formula)?;
        self.shell
            .status(Status::Extracting, formula.archive_file_name());
        self.extract(&archive, dest, formula.source.strip_prefix.as_deref())
    }
}

/// Write adapter that accumulates the response body and advances the
/// download bar as chunks arrive.
struct ProgressSink<'a> {
    buffer: Vec<u8>,
    progress: &'a mut Progress,
}

impl Write for ProgressSink<'_> {
    fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
        self.buffer.extend_from_slice(data);
        self.progress.inc(data.len() as u64);
        Ok(data.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Strip the archive's top-level directory from an entry path. Returns
/// `None` for the directory entry itself; entries outside the prefix pass
/// through unchanged.
fn strip_entry_path(raw: &Path, strip_prefix: Option<&str>) -> Option<PathBuf> {
    match strip_prefix {
        None => Some(raw.to_path_buf()),
        Some(prefix) => match raw.strip_prefix(prefix) {
            Ok(rest) if rest.as_os_str().is_empty() => None,
            Ok(rest) => Some(rest.to_path_buf()),
            Err(_) => Some(raw.to_path_buf()),
        },
    }
}

/// Reject entry paths that would land outside the extraction directory.
fn guard_entry(rel: &Path, file: &str) -> Result<(), FetchError> {
    let escapes = rel.is_absolute()
        || rel
            .components()
            .any(|c| matches!(c, Component::ParentDir));
    if escapes {
        return Err(FetchError::Archive {
            file: file.to_string(),
            message: format!("entry `{}` escapes the extraction directory", rel.display()),
        });
    }
    Ok(())
}

fn unpack_tar<R: Read>(
    reader: R,
    dest: &Path,
    strip_prefix: Option<&str>,
    file: &str,
) -> Result<(), FetchError> {
    let archive_err = |err: std::io::Error| FetchError::Archive {
        file: file.to_string(),
        message: err.to_string(),
    };

    let mut archive = Archive::new(reader);
    for entry in archive.entries().map_err(archive_err)? {
        let mut entry = entry.map_err(archive_err)?;
        let raw = entry.path().map_err(archive_err)?.into_owned();

        let Some(rel) = strip_entry_path(&raw, strip_prefix) else {
            continue;
        };
        guard_entry(&rel, file)?;

        let output = dest.join(&rel);
        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent).map_err(|source| FetchError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        entry.unpack(&output).map_err(archive_err)?;
    }
    Ok(())
}

fn unpack_zip(
    file: File,
    dest: &Path,
    strip_prefix: Option<&str>,
    label: &str,
) -> Result<(), FetchError> {
    let mut archive = zip::ZipArchive::new(file).map_err(|err| FetchError::Archive {
        file: label.to_string(),
        message: err.to_string(),
    })?;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).map_err(|err| FetchError::Archive {
            file: label.to_string(),
            message: err.to_string(),
        })?;

        // enclosed_name already refuses absolute and `..`-laden names
        let Some(raw) = entry.enclosed_name() else {
            return Err(FetchError::Archive {
                file: label.to_string(),
                message: format!("entry `{}` escapes the extraction directory", entry.name()),
            });
        };
        let Some(rel) = strip_entry_path(&raw, strip_prefix) else {
            continue;
        };
        let output = dest.join(&rel);

        if entry.is_dir() {
            std::fs::create_dir_all(&output).map_err(|source| FetchError::Io {
                path: output.clone(),
                source,
            })?;
            continue;
        }

        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent).map_err(|source| FetchError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let mut out = File::create(&output).map_err(|source| FetchError::Io {
            path: output.clone(),
            source,
        })?;
        std::io::copy(&mut entry, &mut out).map_err(|source| FetchError::Io {
            path: output.clone(),
            source,
        })?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&output, std::fs::Permissions::from_mode(mode)).map_err(
                |source| FetchError::Io {
                    path: output.clone(),
                    source,
                },
            )?;
        }
    }
    Ok(())
}
