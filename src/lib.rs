//! deskprov - Application detection and install for managed Windows devices.
//!
//! deskprov is run by a device-management agent. It reports whether a
//! desktop application is installed, or installs it through the winget
//! package manager, repairing missing prerequisites on the way. Every run
//! ends with exactly one machine-readable status line on stdout.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Application profile loading, parsing, and validation
//! - [`detection`] - Application presence and installed-software metadata
//! - [`error`] - Error types and result aliases
//! - [`install`] - Package manager install orchestration
//! - [`network`] - Endpoint reachability
//! - [`remediation`] - Package manager and runtime bootstrap
//! - [`requirements`] - Prerequisite checks and package manager discovery
//! - [`shell`] - Child process execution
//! - [`ui`] - Running log output
//! - [`workflow`] - Detect and install drivers and the final summary
//!
//! # Example
//!
//! ```
//! use deskprov::workflow::{ExecutionSummary, ExitStatus};
//!
//! let mut summary = ExecutionSummary::new();
//! summary.push("Mozilla Firefox 128.0.3 installed");
//! assert_eq!(summary.status(), ExitStatus::Success);
//! assert!(summary.final_line().starts_with("OK "));
//! ```

pub mod cli;
pub mod config;
pub mod detection;
pub mod error;
pub mod install;
pub mod network;
pub mod remediation;
pub mod requirements;
pub mod shell;
pub mod ui;
pub mod workflow;

pub use error::{DeskprovError, Result};
