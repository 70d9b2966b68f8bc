//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait, which provides a uniform
//! interface for executing commands and reporting results.
//!
//! # Architecture
//!
//! Commands are dispatched via [`CommandDispatcher`], which routes CLI
//! subcommands to their implementations. The workflow commands share the
//! production host wiring in [`system`].

pub mod detect;
pub mod dispatcher;
pub mod install;
pub mod profile;
pub mod system;

pub use dispatcher::{Command, CommandDispatcher, CommandResult};
