//! Application install through the package manager.

pub mod orchestrator;

pub use orchestrator::{format_exit_code, InstallOrchestrator, InstallOutcome};
