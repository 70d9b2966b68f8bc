//! Scripted process runner for unit tests.

use crate::error::Result;
use crate::shell::command::{display_command, CommandOptions, CommandResult, ProcessRunner};
use std::cell::RefCell;
use std::path::Path;
use std::time::Duration;

type Responder = Box<dyn Fn(&Path, &[String]) -> Result<CommandResult>>;

/// Records every invocation and answers from a closure.
pub struct ScriptedRunner {
    calls: RefCell<Vec<String>>,
    respond: Responder,
}

impl ScriptedRunner {
    pub fn new(respond: impl Fn(&Path, &[String]) -> Result<CommandResult> + 'static) -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            respond: Box::new(respond),
        }
    }

    /// Rendered command lines, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl ProcessRunner for ScriptedRunner {
    fn run(&self, program: &Path, args: &[String], _options: &CommandOptions) -> Result<CommandResult> {
        self.calls.borrow_mut().push(display_command(program, args));
        (self.respond)(program, args)
    }
}

/// A zero exit with `stdout`.
pub fn ok(stdout: &str) -> Result<CommandResult> {
    Ok(CommandResult::success(
        stdout.to_string(),
        String::new(),
        Duration::ZERO,
    ))
}

/// A non-zero exit with `stdout`.
pub fn exit(code: i32, stdout: &str) -> Result<CommandResult> {
    Ok(CommandResult::failure(
        Some(code),
        stdout.to_string(),
        String::new(),
        Duration::ZERO,
    ))
}
