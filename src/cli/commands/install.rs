//! Install command implementation.
//!
//! The `deskprov install` command runs the staged install workflow.

use std::path::{Path, PathBuf};

use crate::cli::args::InstallArgs;
use crate::error::Result;
use crate::ui::UserInterface;
use crate::workflow::run_install;

use super::dispatcher::{Command, CommandResult};
use super::system::{load_or_report, with_system_host};

/// The install command implementation.
pub struct InstallCommand {
    config_path: Option<PathBuf>,
    args: InstallArgs,
}

impl InstallCommand {
    /// Create a new install command.
    pub fn new(config_path: Option<&Path>, args: InstallArgs) -> Self {
        Self {
            config_path: config_path.map(Path::to_path_buf),
            args,
        }
    }

    /// Get the command arguments.
    pub fn args(&self) -> &InstallArgs {
        &self.args
    }
}

impl Command for InstallCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let profile = match load_or_report(self.config_path.as_deref(), self.args.app_id.as_deref(), ui) {
            Ok(profile) => profile,
            Err(result) => return Ok(result),
        };

        tracing::info!("Installing {}", profile.app.id);
        let summary = with_system_host(&profile, |host| run_install(&profile, host, ui))?;
        Ok(CommandResult::from_summary(summary))
    }
}
