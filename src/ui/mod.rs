//! Running log written while a workflow executes.
//!
//! This module provides:
//! - [`UserInterface`] trait for UI abstraction
//! - [`NonInteractiveUI`] writing plain lines to stdout
//! - [`MockUI`] capturing interactions in tests
//!
//! The final summary line is not part of the running log; `main` prints
//! it directly so it appears exactly once in every output mode.
//!
//! # Example
//!
//! ```
//! use deskprov::ui::{NonInteractiveUI, OutputMode, UserInterface};
//!
//! let mut ui = NonInteractiveUI::new(OutputMode::Quiet);
//! ui.show_header("Detect");
//! ui.success("Mozilla Firefox 128.0.3 installed");
//! ```

pub mod mock;
pub mod non_interactive;
pub mod output;

pub use mock::MockUI;
pub use non_interactive::NonInteractiveUI;
pub use output::OutputMode;

/// Trait for user interface interactions.
///
/// This trait allows mocking the UI in tests.
pub trait UserInterface {
    /// Get the current output mode.
    fn output_mode(&self) -> OutputMode;

    /// Display a message to the user.
    fn message(&mut self, msg: &str);

    /// Display a success message.
    fn success(&mut self, msg: &str);

    /// Display a warning message.
    fn warning(&mut self, msg: &str);

    /// Display an error message.
    fn error(&mut self, msg: &str);

    /// Show a header/banner.
    fn show_header(&mut self, title: &str);

    /// Show captured child process output (verbose mode only).
    fn command_output(&mut self, output: &str);
}
