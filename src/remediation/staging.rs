//! Staging directory lifecycle and hash-verified artifact staging.

use crate::error::{DeskprovError, Result};
use crate::remediation::download::Downloader;
use crate::remediation::hashing::{matches_hash, sha256_file};
use crate::shell::EnvFn;
use std::path::{Path, PathBuf};

/// Staging area removed on drop, on every exit path.
#[derive(Debug)]
pub struct StagingDir {
    path: PathBuf,
}

impl StagingDir {
    /// Create (or reuse) the directory at `path`.
    pub fn create(path: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&path)?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StagingDir {
    fn drop(&mut self) {
        match std::fs::remove_dir_all(&self.path) {
            Ok(()) => tracing::debug!("Removed staging directory {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                "Could not remove staging directory {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}

/// Default root under which per-run staging directories are created.
///
/// `%ProgramData%` is readable by the interactive user a delegated install
/// runs as; the system temp directory of the SYSTEM account is not.
pub fn default_staging_root(env_fn: EnvFn<'_>) -> PathBuf {
    match env_fn("ProgramData") {
        Some(data) => PathBuf::from(data).join("deskprov"),
        None => std::env::temp_dir().join("deskprov"),
    }
}

/// Outcome of staging one artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub path: PathBuf,
    /// Whether the file was fetched during this run
    pub downloaded: bool,
}

/// Place `file_name` from `url` in `dir`, verified against `expected`.
///
/// A file without an expected hash is refused before anything is fetched.
/// A staged copy with a matching hash is reused without a download. Any
/// download error or a hash mismatch after download is returned as-is.
pub fn stage_file(
    downloader: &dyn Downloader,
    dir: &Path,
    file_name: &str,
    url: &str,
    expected: Option<&str>,
) -> Result<StagedFile> {
    let expected = expected.ok_or_else(|| DeskprovError::UnpinnedArtifact {
        file: file_name.to_string(),
    })?;
    let path = dir.join(file_name);

    if matches_hash(&path, expected) {
        tracing::info!("{} already staged with matching hash", file_name);
        return Ok(StagedFile {
            path,
            downloaded: false,
        });
    }

    downloader.download(url, &path)?;

    let actual = sha256_file(&path)?;
    if !actual.eq_ignore_ascii_case(expected) {
        let _ = std::fs::remove_file(&path);
        return Err(DeskprovError::HashMismatch {
            file: file_name.to_string(),
            expected: expected.to_ascii_lowercase(),
            actual,
        });
    }
    tracing::debug!("{} verified", file_name);

    Ok(StagedFile {
        path,
        downloaded: true,
    })
}
