//! Non-interactive package manager install of the target application.

use crate::config::InstallConfig;
use crate::shell::{display_command, CommandOptions, ProcessRunner};
use std::path::Path;

/// Result of one install attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    /// The package manager installed the application.
    Installed,
    /// Nothing to do; the package manager reported this no-op code.
    AlreadyCurrent { code: i32 },
    /// The install failed. `code` is `None` when the process never ran.
    Failed { code: Option<i32>, output: String },
}

impl InstallOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, InstallOutcome::Failed { .. })
    }
}

/// Render an exit code the way the package manager documents it.
pub fn format_exit_code(code: i32) -> String {
    if code < 0 {
        format!("{} (0x{:08X})", code, code as u32)
    } else {
        code.to_string()
    }
}

/// Drives the package manager.
pub struct InstallOrchestrator<'a> {
    config: &'a InstallConfig,
    runner: &'a dyn ProcessRunner,
}

impl<'a> InstallOrchestrator<'a> {
    pub fn new(config: &'a InstallConfig, runner: &'a dyn ProcessRunner) -> Self {
        Self { config, runner }
    }

    /// Arguments of the install invocation.
    pub fn install_args(&self, app_id: &str) -> Vec<String> {
        [
            "install",
            "--id",
            app_id,
            "--exact",
            "--silent",
            "--scope",
            self.config.scope.as_str(),
            "--accept-package-agreements",
            "--accept-source-agreements",
            "--force",
            "--disable-interactivity",
        ]
        .iter()
        .map(|a| a.to_string())
        .collect()
    }

    /// Install `app_id` with the package manager at `package_manager`.
    ///
    /// Blocks until the process exits. Both output streams go to a
    /// temporary capture file that is removed afterwards.
    pub fn install(&self, package_manager: &Path, app_id: &str) -> InstallOutcome {
        let args = self.install_args(app_id);
        tracing::info!("Running {}", display_command(package_manager, &args));

        let capture = match tempfile::Builder::new()
            .prefix("deskprov-install-")
            .suffix(".log")
            .tempfile()
        {
            Ok(file) => file,
            Err(e) => {
                return InstallOutcome::Failed {
                    code: None,
                    output: format!("could not create capture file: {}", e),
                }
            }
        };

        let options = CommandOptions {
            output_file: Some(capture.path().to_path_buf()),
            timeout: self.config.timeout_secs,
            ..Default::default()
        };

        let result = match self.runner.run(package_manager, &args, &options) {
            Ok(result) => result,
            Err(e) => {
                return InstallOutcome::Failed {
                    code: None,
                    output: e.to_string(),
                }
            }
        };
        let output = result.combined_output();

        if result.timed_out {
            return InstallOutcome::Failed {
                code: None,
                output: format!(
                    "timed out after {}s\n{}",
                    self.config.timeout_secs.unwrap_or_default(),
                    output
                ),
            };
        }

        match result.exit_code {
            Some(0) => InstallOutcome::Installed,
            Some(code) if self.config.no_op_exit_codes.contains(&code) => {
                tracing::info!("Package manager reported no-op code {}", format_exit_code(code));
                InstallOutcome::AlreadyCurrent { code }
            }
            code => {
                tracing::warn!("Install output:\n{}", output);
                InstallOutcome::Failed { code, output }
            }
        }
    }
}
