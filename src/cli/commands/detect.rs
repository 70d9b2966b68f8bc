//! Detect command implementation.
//!
//! The `deskprov detect` command reports whether the application is
//! installed and, when it is not, what an install would be missing.

use std::path::{Path, PathBuf};

use crate::cli::args::DetectArgs;
use crate::error::Result;
use crate::ui::UserInterface;
use crate::workflow::run_detect;

use super::dispatcher::{Command, CommandResult};
use super::system::{load_or_report, with_system_host};

/// The detect command implementation.
pub struct DetectCommand {
    config_path: Option<PathBuf>,
    args: DetectArgs,
}

impl DetectCommand {
    /// Create a new detect command.
    pub fn new(config_path: Option<&Path>, args: DetectArgs) -> Self {
        Self {
            config_path: config_path.map(Path::to_path_buf),
            args,
        }
    }

    /// Get the command arguments.
    pub fn args(&self) -> &DetectArgs {
        &self.args
    }
}

impl Command for DetectCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let profile = match load_or_report(self.config_path.as_deref(), None, ui) {
            Ok(profile) => profile,
            Err(result) => return Ok(result),
        };

        tracing::info!("Detecting {}", profile.app.id);
        let summary = with_system_host(&profile, |host| run_detect(&profile, host, ui))?;
        Ok(CommandResult::from_summary(summary))
    }
}
