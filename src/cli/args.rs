//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// deskprov - Detect and install desktop applications on managed devices.
#[derive(Debug, Parser)]
#[command(name = "deskprov")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to an application profile (defaults to the built-in profile)
    #[arg(short, long, global = true, env = "DESKPROV_CONFIG")]
    pub config: Option<PathBuf>,

    /// Show verbose output, including child process output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only warnings, errors and the final line
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Check whether the application is installed
    Detect(DetectArgs),

    /// Install the application, remediating prerequisites as needed
    Install(InstallArgs),

    /// Show the resolved application profile
    Profile(ProfileArgs),
}

/// Arguments for the `detect` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct DetectArgs {}

/// Arguments for the `install` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct InstallArgs {
    /// Package identifier passed to the package manager
    #[arg(long, value_name = "ID", env = "DESKPROV_APP_ID")]
    pub app_id: Option<String>,
}

/// Arguments for the `profile` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ProfileArgs {
    /// Print the profile's JSON Schema instead of its values
    #[arg(long)]
    pub schema: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_install_with_app_id() {
        let cli = Cli::try_parse_from(["deskprov", "install", "--app-id", "Contoso.Editor"]).unwrap();
        match cli.command {
            Commands::Install(args) => assert_eq!(args.app_id.as_deref(), Some("Contoso.Editor")),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["deskprov", "detect", "--quiet", "--config", "p.yml"]).unwrap();
        assert!(cli.quiet);
        assert_eq!(cli.config, Some(PathBuf::from("p.yml")));
    }

    #[test]
    fn profile_schema_flag() {
        let cli = Cli::try_parse_from(["deskprov", "profile", "--schema"]).unwrap();
        assert!(matches!(cli.command, Commands::Profile(ProfileArgs { schema: true })));
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Cli::try_parse_from(["deskprov"]).is_err());
    }
}
