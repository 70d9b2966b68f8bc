//! Child process execution and platform environment helpers.

pub mod command;
pub mod platform;
#[cfg(test)]
pub mod testing;

pub use command::{
    display_command, execute, CommandOptions, CommandResult, ProcessRunner, SystemRunner,
};
pub use platform::{
    expand_env_vars, is_system_account, powershell_command_args, powershell_file_args,
    powershell_path, ps_quote, system_env, EnvFn,
};
