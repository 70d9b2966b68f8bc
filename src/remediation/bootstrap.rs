//! Package manager bootstrap.
//!
//! Stages the latest package manager bundle and its shared-library
//! dependencies, installs them in one package-add transaction through an
//! [`IdentityRunner`], then removes everything it staged.
//!
//! Nothing is downloaded until every file has a SHA-256 to be checked
//! against, either pinned in the profile or published by the release feed.

use crate::config::{DependencyArtifact, RemediationConfig};
use crate::error::DeskprovError;
use crate::remediation::archive::extract_member;
use crate::remediation::download::{Downloader, ReleaseInfo};
use crate::remediation::error::RemediationError;
use crate::remediation::identity::{DelegatedOutcome, IdentityRunner};
use crate::remediation::staging::{stage_file, StagingDir};
use crate::shell::ps_quote;
use std::path::{Path, PathBuf};

/// File name of the generated install script.
pub const INSTALL_SCRIPT: &str = "install-package-manager.ps1";

/// What a successful bootstrap did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapReport {
    /// Tag of the installed release
    pub release_tag: String,
    /// Number of files fetched during this run
    pub downloads: usize,
    /// Package file names in install order, bundle last
    pub packages: Vec<String>,
}

/// A file to stage, with its source and pin resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PlannedFile<'c> {
    file_name: &'c str,
    url: String,
    sha256: String,
    extract: Option<&'c str>,
}

fn unpinned(file: &str) -> RemediationError {
    DeskprovError::UnpinnedArtifact {
        file: file.to_string(),
    }
    .into()
}

fn plan_artifact<'c>(
    artifact: &'c DependencyArtifact,
    release: &ReleaseInfo,
) -> Result<PlannedFile<'c>, RemediationError> {
    let (url, published) = match &artifact.release_asset {
        Some(name) => {
            let asset = release
                .asset_named(name)
                .ok_or_else(|| RemediationError::MissingAsset {
                    tag: release.tag_name.clone(),
                    name: name.clone(),
                })?;
            (asset.browser_download_url.clone(), asset.sha256())
        }
        None => (artifact.source_url.clone(), None),
    };
    let sha256 = artifact
        .expected_sha256
        .clone()
        .or(published)
        .ok_or_else(|| unpinned(&artifact.file_name))?;

    Ok(PlannedFile {
        file_name: &artifact.file_name,
        url,
        sha256,
        extract: artifact.extract.as_deref(),
    })
}

/// Runs the package manager bootstrap.
pub struct Remediator<'a> {
    config: &'a RemediationConfig,
    downloader: &'a dyn Downloader,
    identity: &'a dyn IdentityRunner,
    staging_dir: PathBuf,
}

impl<'a> Remediator<'a> {
    pub fn new(
        config: &'a RemediationConfig,
        downloader: &'a dyn Downloader,
        identity: &'a dyn IdentityRunner,
        staging_dir: PathBuf,
    ) -> Self {
        Self {
            config,
            downloader,
            identity,
            staging_dir,
        }
    }

    /// Stage, verify, install and clean up.
    pub fn bootstrap(&self) -> Result<BootstrapReport, RemediationError> {
        let feed = &self.config.release_feed;
        let release = self
            .downloader
            .fetch_release(feed)
            .map_err(|e| RemediationError::Feed {
                url: feed.clone(),
                message: e.to_string(),
            })?;
        tracing::info!("Latest package manager release is {}", release.tag_name);

        let asset = release
            .asset_with_suffix(&self.config.bundle_suffix)
            .ok_or_else(|| RemediationError::MissingBundle {
                tag: release.tag_name.clone(),
                suffix: self.config.bundle_suffix.clone(),
            })?;
        if !is_plain_file_name(&asset.name) {
            return Err(RemediationError::Feed {
                url: feed.clone(),
                message: format!("asset name '{}' is not a plain file name", asset.name),
            });
        }
        let bundle_hash = asset.sha256().ok_or_else(|| unpinned(&asset.name))?;
        let planned = self
            .config
            .artifacts
            .iter()
            .map(|artifact| plan_artifact(artifact, &release))
            .collect::<Result<Vec<_>, _>>()?;

        let staging = StagingDir::create(self.staging_dir.clone())?;
        let mut downloads = 0;

        let mut dependencies = Vec::with_capacity(planned.len());
        for file in &planned {
            let staged = stage_file(
                self.downloader,
                staging.path(),
                file.file_name,
                &file.url,
                Some(file.sha256.as_str()),
            )?;
            downloads += usize::from(staged.downloaded);

            let package = match file.extract {
                Some(member) => extract_member(&staged.path, member, staging.path())?,
                None => staged.path,
            };
            dependencies.push(package);
        }

        let bundle = stage_file(
            self.downloader,
            staging.path(),
            &asset.name,
            &asset.browser_download_url,
            Some(bundle_hash.as_str()),
        )?;
        downloads += usize::from(bundle.downloaded);

        let script = staging.path().join(INSTALL_SCRIPT);
        std::fs::write(&script, render_install_script(&bundle.path, &dependencies))?;

        let step = "package manager install";
        match self.identity.run_script(&script)? {
            outcome if outcome.succeeded() => {
                tracing::info!("Installed package manager {}", release.tag_name);
            }
            DelegatedOutcome::Completed { exit_code } => {
                return Err(RemediationError::InstallFailed {
                    step: step.to_string(),
                    code: exit_code,
                });
            }
            DelegatedOutcome::TimedOut => {
                return Err(RemediationError::TimedOut {
                    step: step.to_string(),
                    seconds: self.identity.timeout().as_secs(),
                });
            }
        }

        let mut packages: Vec<String> = dependencies.iter().map(|p| file_name_of(p)).collect();
        packages.push(file_name_of(&bundle.path));

        Ok(BootstrapReport {
            release_tag: release.tag_name.clone(),
            downloads,
            packages,
        })
    }
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', ':'])
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// PowerShell that adds the bundle with its dependencies in one call.
pub fn render_install_script(bundle: &Path, dependencies: &[PathBuf]) -> String {
    let mut add = format!(
        "Add-AppxPackage -Path {}",
        ps_quote(&bundle.display().to_string())
    );
    if !dependencies.is_empty() {
        let deps: Vec<String> = dependencies
            .iter()
            .map(|d| ps_quote(&d.display().to_string()))
            .collect();
        add.push_str(" -DependencyPath ");
        add.push_str(&deps.join(","));
    }

    format!(
        "$ErrorActionPreference = 'Stop'\r\n\
         try {{\r\n    {}\r\n    exit 0\r\n}} catch {{\r\n    Write-Output $_.Exception.Message\r\n    exit 1\r\n}}\r\n",
        add
    )
}
