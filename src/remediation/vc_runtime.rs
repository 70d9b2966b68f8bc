//! Visual C++ runtime installation.

use crate::config::VcRuntimeConfig;
use crate::remediation::download::Downloader;
use crate::remediation::error::RemediationError;
use crate::remediation::staging::{stage_file, StagingDir};
use crate::shell::{CommandOptions, ProcessRunner};
use std::path::PathBuf;

/// Arguments for an unattended redistributable install.
pub const QUIET_INSTALL_ARGS: [&str; 3] = ["/install", "/quiet", "/norestart"];

/// Downloads and runs the VC++ redistributable.
pub struct VcRuntimeInstaller<'a> {
    config: &'a VcRuntimeConfig,
    downloader: &'a dyn Downloader,
    runner: &'a dyn ProcessRunner,
    staging_dir: PathBuf,
    timeout_secs: Option<u64>,
}

impl<'a> VcRuntimeInstaller<'a> {
    pub fn new(
        config: &'a VcRuntimeConfig,
        downloader: &'a dyn Downloader,
        runner: &'a dyn ProcessRunner,
        staging_dir: PathBuf,
    ) -> Self {
        Self {
            config,
            downloader,
            runner,
            staging_dir,
            timeout_secs: None,
        }
    }

    /// Kill the installer after `secs` seconds.
    pub fn with_timeout(mut self, secs: Option<u64>) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Install the runtime, returning the installer's exit code.
    pub fn install(&self) -> Result<i32, RemediationError> {
        let installer = &self.config.installer;
        let staging = StagingDir::create(self.staging_dir.clone())?;
        let staged = stage_file(
            self.downloader,
            staging.path(),
            &installer.file_name,
            &installer.source_url,
            installer.expected_sha256.as_deref(),
        )?;

        let args: Vec<String> = QUIET_INSTALL_ARGS.iter().map(|a| a.to_string()).collect();
        let options = CommandOptions {
            timeout: self.timeout_secs,
            ..CommandOptions::captured()
        };
        tracing::info!("Running {} {}", installer.file_name, args.join(" "));
        let result = self.runner.run(&staged.path, &args, &options)?;

        let step = format!("{} installer", self.config.name);
        if result.timed_out {
            return Err(RemediationError::TimedOut {
                step,
                seconds: self.timeout_secs.unwrap_or_default(),
            });
        }

        match result.exit_code {
            Some(code) if self.config.success_exit_codes.contains(&code) => {
                if code != 0 {
                    tracing::info!("{} returned {} (reboot required)", step, code);
                }
                Ok(code)
            }
            code => Err(RemediationError::InstallFailed { step, code }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DeskprovError, Result};
    use crate::remediation::download::ReleaseInfo;
    use crate::shell::testing::{exit, ok, ScriptedRunner};
    use std::cell::Cell;
    use std::path::Path;
    use tempfile::TempDir;

    #[derive(Default)]
    struct FileDownloader {
        calls: Cell<usize>,
    }

    impl Downloader for FileDownloader {
        fn fetch_release(&self, url: &str) -> Result<ReleaseInfo> {
            Err(DeskprovError::Download {
                url: url.to_string(),
                message: "unused".to_string(),
            })
        }

        fn download(&self, _url: &str, dest: &Path) -> Result<()> {
            self.calls.set(self.calls.get() + 1);
            std::fs::write(dest, "MZ")?;
            Ok(())
        }
    }

    fn pinned_config() -> VcRuntimeConfig {
        use sha2::{Digest, Sha256};
        let mut config = VcRuntimeConfig::default();
        config.installer.expected_sha256 = Some(hex::encode(Sha256::digest(b"MZ")));
        config
    }

    #[test]
    fn runs_installer_quietly_and_cleans_up() {
        let temp = TempDir::new().unwrap();
        let staging = temp.path().join("vc-runtime");
        let config = pinned_config();
        let runner = ScriptedRunner::new(|_, _| ok(""));

        let code = VcRuntimeInstaller::new(&config, &FileDownloader::default(), &runner, staging.clone())
            .install()
            .unwrap();

        assert_eq!(code, 0);
        let calls = runner.calls();
        assert!(calls[0].contains("vc_redist.x64.exe /install /quiet /norestart"));
        assert!(!staging.exists());
    }

    #[test]
    fn reboot_required_counts_as_success() {
        let temp = TempDir::new().unwrap();
        let config = pinned_config();
        let runner = ScriptedRunner::new(|_, _| exit(3010, ""));

        let code = VcRuntimeInstaller::new(&config, &FileDownloader::default(), &runner, temp.path().join("s"))
            .install()
            .unwrap();
        assert_eq!(code, 3010);
    }

    #[test]
    fn other_exit_codes_fail() {
        let temp = TempDir::new().unwrap();
        let config = pinned_config();
        let runner = ScriptedRunner::new(|_, _| exit(1638, ""));

        let err = VcRuntimeInstaller::new(&config, &FileDownloader::default(), &runner, temp.path().join("s"))
            .install()
            .unwrap_err();
        assert!(matches!(err, RemediationError::InstallFailed { code: Some(1638), .. }));
    }

    #[test]
    fn hash_mismatch_never_runs_installer() {
        let temp = TempDir::new().unwrap();
        let mut config = VcRuntimeConfig::default();
        config.installer.expected_sha256 = Some("f".repeat(64));
        let runner = ScriptedRunner::new(|_, _| ok(""));

        let result = VcRuntimeInstaller::new(&config, &FileDownloader::default(), &runner, temp.path().join("s"))
            .install();

        assert!(result.is_err());
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn unpinned_installer_is_never_downloaded_or_run() {
        let temp = TempDir::new().unwrap();
        let config = VcRuntimeConfig::default();
        let downloader = FileDownloader::default();
        let runner = ScriptedRunner::new(|_, _| ok(""));

        let err = VcRuntimeInstaller::new(&config, &downloader, &runner, temp.path().join("s"))
            .install()
            .unwrap_err();

        assert!(matches!(
            err,
            RemediationError::Operation(DeskprovError::UnpinnedArtifact { ref file })
                if file == "vc_redist.x64.exe"
        ));
        assert_eq!(downloader.calls.get(), 0);
        assert!(runner.calls().is_empty());
    }
}
