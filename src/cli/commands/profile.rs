//! Profile command implementation.
//!
//! The `deskprov profile` command prints the resolved profile as YAML, or
//! the profile's JSON Schema with `--schema`.

use std::path::{Path, PathBuf};

use crate::cli::args::ProfileArgs;
use crate::config::AppProfile;
use crate::error::{DeskprovError, Result};
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};
use super::system::load_or_report;

/// The profile command implementation.
pub struct ProfileCommand {
    config_path: Option<PathBuf>,
    args: ProfileArgs,
}

impl ProfileCommand {
    /// Create a new profile command.
    pub fn new(config_path: Option<&Path>, args: ProfileArgs) -> Self {
        Self {
            config_path: config_path.map(Path::to_path_buf),
            args,
        }
    }

    /// Get the command arguments.
    pub fn args(&self) -> &ProfileArgs {
        &self.args
    }
}

/// JSON Schema of [`AppProfile`], pretty-printed.
pub fn profile_schema() -> Result<String> {
    let schema = schemars::schema_for!(AppProfile);
    serde_json::to_string_pretty(&schema).map_err(|e| DeskprovError::Other(e.into()))
}

/// The profile serialized as YAML.
pub fn render_profile(profile: &AppProfile) -> Result<String> {
    serde_yaml::to_string(profile).map_err(|e| DeskprovError::Other(e.into()))
}

impl Command for ProfileCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        if self.args.schema {
            println!("{}", profile_schema()?);
            return Ok(CommandResult::success());
        }

        let profile = match load_or_report(self.config_path.as_deref(), None, ui) {
            Ok(profile) => profile,
            Err(result) => return Ok(result),
        };
        print!("{}", render_profile(&profile)?);
        Ok(CommandResult::success())
    }
}
