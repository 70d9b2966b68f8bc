//! Plain stdout running log.

use super::{OutputMode, UserInterface};

/// Writes the running log to stdout, one plain line per event.
///
/// Management agents capture stdout verbatim, so nothing here uses color
/// or cursor control.
pub struct NonInteractiveUI {
    mode: OutputMode,
}

impl NonInteractiveUI {
    pub fn new(mode: OutputMode) -> Self {
        Self { mode }
    }
}

impl UserInterface for NonInteractiveUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        if self.mode.shows_status() {
            println!("  {}", msg);
        }
    }

    fn success(&mut self, msg: &str) {
        if self.mode.shows_status() {
            println!("  [ok] {}", msg);
        }
    }

    fn warning(&mut self, msg: &str) {
        println!("  [warn] {}", msg);
    }

    fn error(&mut self, msg: &str) {
        println!("  [error] {}", msg);
    }

    fn show_header(&mut self, title: &str) {
        if self.mode.shows_status() {
            println!("== {} ==", title);
        }
    }

    fn command_output(&mut self, output: &str) {
        if self.mode.shows_command_output() && !output.trim().is_empty() {
            for line in output.lines() {
                println!("    | {}", line);
            }
        }
    }
}
