//! Child process execution.
//!
//! Every component that spawns a process goes through [`ProcessRunner`] so
//! tests can substitute scripted results for real package managers,
//! installers and PowerShell.

use crate::error::{DeskprovError, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// Result of executing a child process.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Exit code (None if killed or timed out).
    pub exit_code: Option<i32>,

    /// Standard output.
    pub stdout: String,

    /// Standard error.
    pub stderr: String,

    /// Execution duration.
    pub duration: Duration,

    /// Whether the process succeeded (exit code 0).
    pub success: bool,

    /// Whether the process was killed after exceeding its timeout.
    pub timed_out: bool,
}

impl CommandResult {
    /// Create a success result.
    pub fn success(stdout: String, stderr: String, duration: Duration) -> Self {
        Self {
            exit_code: Some(0),
            stdout,
            stderr,
            duration,
            success: true,
            timed_out: false,
        }
    }

    /// Create a failure result.
    pub fn failure(
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
        duration: Duration,
    ) -> Self {
        Self {
            exit_code,
            stdout,
            stderr,
            duration,
            success: false,
            timed_out: false,
        }
    }

    /// Create a result for a process killed at its deadline.
    pub fn timeout(stdout: String, stderr: String, duration: Duration) -> Self {
        Self {
            timed_out: true,
            ..Self::failure(None, stdout, stderr, duration)
        }
    }

    /// Standard output followed by standard error, trimmed.
    pub fn combined_output(&self) -> String {
        let mut out = self.stdout.trim_end().to_string();
        let err = self.stderr.trim_end();
        if !err.is_empty() {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(err);
        }
        out
    }
}

/// Options for process execution.
#[derive(Debug, Clone, Default)]
pub struct CommandOptions {
    /// Working directory.
    pub cwd: Option<PathBuf>,

    /// Environment variables (merged with system env).
    pub env: HashMap<String, String>,

    /// Capture stdout (if false, discarded).
    pub capture_stdout: bool,

    /// Capture stderr (if false, discarded).
    pub capture_stderr: bool,

    /// Redirect stdout and stderr into this file instead of pipes.
    /// The file content is returned as `stdout`.
    pub output_file: Option<PathBuf>,

    /// Timeout in seconds (None = no timeout).
    pub timeout: Option<u64>,
}

impl CommandOptions {
    /// Options capturing both streams.
    pub fn captured() -> Self {
        Self {
            capture_stdout: true,
            capture_stderr: true,
            ..Default::default()
        }
    }
}

/// Spawns child processes.
pub trait ProcessRunner {
    /// Run `program` with `args` to completion.
    ///
    /// Returns `Err` only when the process could not be spawned or waited
    /// on; a non-zero exit is a normal `CommandResult`.
    fn run(&self, program: &Path, args: &[String], options: &CommandOptions)
        -> Result<CommandResult>;
}

/// [`ProcessRunner`] backed by `std::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(
        &self,
        program: &Path,
        args: &[String],
        options: &CommandOptions,
    ) -> Result<CommandResult> {
        execute(program, args, options)
    }
}

/// Render a program and its arguments for logs and errors.
pub fn display_command(program: &Path, args: &[String]) -> String {
    let mut rendered = program.display().to_string();
    for arg in args {
        rendered.push(' ');
        if arg.contains(' ') {
            rendered.push('"');
            rendered.push_str(arg);
            rendered.push('"');
        } else {
            rendered.push_str(arg);
        }
    }
    rendered
}

/// Execute a program directly (no shell).
pub fn execute(program: &Path, args: &[String], options: &CommandOptions) -> Result<CommandResult> {
    let start = Instant::now();
    let rendered = display_command(program, args);
    tracing::debug!("Executing: {}", rendered);

    let mut cmd = Command::new(program);
    cmd.args(args);
    cmd.stdin(Stdio::null());

    if let Some(cwd) = &options.cwd {
        cmd.current_dir(cwd);
    }

    for (key, value) in &options.env {
        cmd.env(key, value);
    }

    if let Some(path) = &options.output_file {
        let file = File::create(path)?;
        cmd.stderr(Stdio::from(file.try_clone()?));
        cmd.stdout(Stdio::from(file));
    } else {
        cmd.stdout(if options.capture_stdout {
            Stdio::piped()
        } else {
            Stdio::null()
        });
        cmd.stderr(if options.capture_stderr {
            Stdio::piped()
        } else {
            Stdio::null()
        });
    }

    let mut child = cmd.spawn().map_err(|source| {
        tracing::debug!("Spawn failed for {}: {}", rendered, source);
        DeskprovError::CommandFailed {
            command: rendered.clone(),
            source,
        }
    })?;

    let stdout_reader = child.stdout.take().map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            String::from_utf8_lossy(&buf).to_string()
        })
    });
    let stderr_reader = child.stderr.take().map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            String::from_utf8_lossy(&buf).to_string()
        })
    });

    let status = wait_with_timeout(&mut child, options.timeout.map(Duration::from_secs))
        .map_err(|source| DeskprovError::CommandFailed {
            command: rendered.clone(),
            source,
        })?;

    let mut stdout = stdout_reader
        .and_then(|h| h.join().ok())
        .unwrap_or_default();
    let stderr = stderr_reader
        .and_then(|h| h.join().ok())
        .unwrap_or_default();

    if let Some(path) = &options.output_file {
        stdout = std::fs::read(path)
            .map(|bytes| String::from_utf8_lossy(&bytes).to_string())
            .unwrap_or_default();
    }

    let duration = start.elapsed();

    match status {
        None => {
            tracing::warn!("{} exceeded its timeout and was killed", rendered);
            Ok(CommandResult::timeout(stdout, stderr, duration))
        }
        Some(status) if status.success() => Ok(CommandResult::success(stdout, stderr, duration)),
        Some(status) => Ok(CommandResult::failure(
            status.code(),
            stdout,
            stderr,
            duration,
        )),
    }
}

/// Wait for the child, killing it once `timeout` elapses.
///
/// Returns `Ok(None)` when the child was killed.
fn wait_with_timeout(child: &mut Child, timeout: Option<Duration>) -> std::io::Result<Option<ExitStatus>> {
    let Some(timeout) = timeout else {
        return child.wait().map(Some);
    };

    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Ok(None);
        }
        thread::sleep(Duration::from_millis(50));
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> Vec<String> {
        vec!["-c".to_string(), script.to_string()]
    }

    #[test]
    fn execute_successful_command() {
        let result = execute(Path::new("sh"), &sh("echo hello"), &CommandOptions::captured()).unwrap();

        assert!(result.success);
        assert_eq!(result.exit_code, Some(0));
        assert!(result.stdout.contains("hello"));
    }

    #[test]
    fn execute_failing_command() {
        let result = execute(Path::new("sh"), &sh("exit 7"), &CommandOptions::captured()).unwrap();

        assert!(!result.success);
        assert_eq!(result.exit_code, Some(7));
        assert!(!result.timed_out);
    }

    #[test]
    fn execute_with_env() {
        let mut options = CommandOptions::captured();
        options
            .env
            .insert("MY_VAR".to_string(), "my_value".to_string());

        let result = execute(Path::new("sh"), &sh("echo $MY_VAR"), &options).unwrap();

        assert!(result.stdout.contains("my_value"));
    }

    #[test]
    fn execute_redirects_into_output_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let capture = temp.path().join("capture.log");
        let options = CommandOptions {
            output_file: Some(capture.clone()),
            ..Default::default()
        };

        let result = execute(Path::new("sh"), &sh("echo out; echo err >&2"), &options).unwrap();

        assert!(result.stdout.contains("out"));
        assert!(result.stdout.contains("err"));
        assert!(capture.exists());
    }

    #[test]
    fn execute_kills_after_timeout() {
        let options = CommandOptions {
            timeout: Some(1),
            ..CommandOptions::captured()
        };

        let result = execute(Path::new("sh"), &sh("sleep 10"), &options).unwrap();

        assert!(result.timed_out);
        assert!(!result.success);
        assert!(result.duration < Duration::from_secs(5));
    }

    #[test]
    fn execute_reports_spawn_failure() {
        let result = execute(
            Path::new("/nonexistent/definitely-not-a-program"),
            &[],
            &CommandOptions::captured(),
        );

        match result {
            Err(err @ DeskprovError::CommandFailed { .. }) => {
                let msg = err.to_string();
                assert!(msg.contains("definitely-not-a-program"), "{}", msg);
                assert!(!msg.contains("exit code"), "{}", msg);
                assert!(std::error::Error::source(&err).is_some());
            }
            other => panic!("expected a spawn failure, got {:?}", other),
        }
    }

    #[test]
    fn combined_output_joins_streams() {
        let result = CommandResult::failure(
            Some(1),
            "line one\n".to_string(),
            "line two\n".to_string(),
            Duration::ZERO,
        );
        assert_eq!(result.combined_output(), "line one\nline two");
    }

    #[test]
    fn display_command_quotes_spaced_args() {
        let rendered = display_command(
            Path::new("winget"),
            &["install".to_string(), "Some App".to_string()],
        );
        assert_eq!(rendered, "winget install \"Some App\"");
    }
}
