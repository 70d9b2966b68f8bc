//! Workflow drivers.
//!
//! - [`detect`] - Presence check with a prerequisite diagnostic on a miss
//! - [`install`] - Staged install with remediation
//! - [`summary`] - Accumulated diagnostics and the final status line
//! - [`host`] - Collaborators a workflow runs against

pub mod detect;
pub mod host;
pub mod install;
pub mod summary;

pub use detect::{describe_connectivity, describe_prerequisites, run_detect};
pub use host::Host;
pub use install::{run_install, InstallWorkflow, Resolution, Stage};
pub use summary::{ExecutionSummary, ExitStatus, ReportClass};
