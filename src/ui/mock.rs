//! Mock UI implementation for testing.
//!
//! `MockUI` implements the `UserInterface` trait and captures all
//! interactions for later assertion.
//!
//! # Example
//!
//! ```
//! use deskprov::ui::{MockUI, UserInterface};
//!
//! let mut ui = MockUI::new();
//! ui.message("Probing canonical paths");
//! ui.success("Found");
//!
//! assert!(ui.messages().contains(&"Probing canonical paths".to_string()));
//! assert!(ui.has_success("Found"));
//! ```

use super::{OutputMode, UserInterface};

/// Mock UI implementation for testing.
#[derive(Debug, Default)]
pub struct MockUI {
    mode: OutputMode,
    messages: Vec<String>,
    successes: Vec<String>,
    warnings: Vec<String>,
    errors: Vec<String>,
    headers: Vec<String>,
    command_output: Vec<String>,
}

impl MockUI {
    /// Create a new MockUI with Normal output mode.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new MockUI with a specific output mode.
    pub fn with_mode(mode: OutputMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn successes(&self) -> &[String] {
        &self.successes
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn command_output(&self) -> &[String] {
        &self.command_output
    }

    /// Check whether any success message contains `needle`.
    pub fn has_success(&self, needle: &str) -> bool {
        self.successes.iter().any(|m| m.contains(needle))
    }

    /// Check whether any warning contains `needle`.
    pub fn has_warning(&self, needle: &str) -> bool {
        self.warnings.iter().any(|m| m.contains(needle))
    }

    /// Check whether any error contains `needle`.
    pub fn has_error(&self, needle: &str) -> bool {
        self.errors.iter().any(|m| m.contains(needle))
    }
}

impl UserInterface for MockUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        self.messages.push(msg.to_string());
    }

    fn success(&mut self, msg: &str) {
        self.successes.push(msg.to_string());
    }

    fn warning(&mut self, msg: &str) {
        self.warnings.push(msg.to_string());
    }

    fn error(&mut self, msg: &str) {
        self.errors.push(msg.to_string());
    }

    fn show_header(&mut self, title: &str) {
        self.headers.push(title.to_string());
    }

    fn command_output(&mut self, output: &str) {
        self.command_output.push(output.to_string());
    }
}
