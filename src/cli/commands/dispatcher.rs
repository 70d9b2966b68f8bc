//! Command dispatching.
//!
//! This module provides the core command infrastructure:
//! - [`Command`] trait for implementing commands
//! - [`CommandResult`] for uniform result reporting
//! - [`CommandDispatcher`] for routing CLI subcommands

use std::path::{Path, PathBuf};

use crate::cli::args::{Cli, Commands};
use crate::error::Result;
use crate::ui::UserInterface;
use crate::workflow::ExecutionSummary;

/// Trait for command implementations.
///
/// Each CLI subcommand implements this trait to provide its execution logic.
pub trait Command {
    /// Execute the command.
    ///
    /// # Arguments
    ///
    /// * `ui` - User interface for the running log
    ///
    /// # Returns
    ///
    /// A [`CommandResult`] carrying the exit code and, for workflow
    /// commands, the summary behind the final line.
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult>;
}

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult {
    /// Summary to print as the final line, if the command ran a workflow.
    pub summary: Option<ExecutionSummary>,

    /// Process exit code.
    pub exit_code: u8,
}

impl CommandResult {
    /// A successful result without a final line.
    pub fn success() -> Self {
        Self {
            summary: None,
            exit_code: 0,
        }
    }

    /// A result whose exit code follows the workflow summary.
    pub fn from_summary(summary: ExecutionSummary) -> Self {
        Self {
            exit_code: summary.status().code(),
            summary: Some(summary),
        }
    }
}

/// Dispatches CLI commands to their implementations.
pub struct CommandDispatcher {
    config_path: Option<PathBuf>,
}

impl CommandDispatcher {
    /// Create a dispatcher reading the profile at `config_path`, if any.
    pub fn new(config_path: Option<PathBuf>) -> Self {
        Self { config_path }
    }

    /// Get the profile path.
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Dispatch and execute a command.
    pub fn dispatch(&self, cli: &Cli, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        match &cli.command {
            Commands::Detect(args) => {
                let cmd = super::detect::DetectCommand::new(self.config_path(), args.clone());
                cmd.execute(ui)
            }
            Commands::Install(args) => {
                let cmd = super::install::InstallCommand::new(self.config_path(), args.clone());
                cmd.execute(ui)
            }
            Commands::Profile(args) => {
                let cmd = super::profile::ProfileCommand::new(self.config_path(), args.clone());
                cmd.execute(ui)
            }
        }
    }
}
