//! Running an install script as a particular identity.
//!
//! Per-user package registration must happen in the interactive user's
//! context. When the process already runs as that user, [`DirectRunner`]
//! runs the script itself. When it runs as SYSTEM, [`ScheduledTaskRunner`]
//! registers a one-shot task bound to the interactive user, triggers it and
//! polls its state until it finishes or the ceiling passes.

use crate::error::{DeskprovError, Result};
use crate::shell::{
    display_command, powershell_command_args, powershell_file_args, CommandOptions,
    CommandResult, EnvFn, ProcessRunner,
};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::{Duration, Instant};

/// `SCHED_S_TASK_RUNNING`
const TASK_RUNNING: i64 = 0x41301;
/// `SCHED_S_TASK_HAS_NOT_RUN`
const TASK_HAS_NOT_RUN: i64 = 0x41303;

/// One quoted CSV field.
static CSV_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""((?:[^"]|"")*)""#).expect("CSV_FIELD must compile")
});

/// `user` or `DOMAIN\user`.
static ACCOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\\\s/]+(\\[^\\\s/]+)?$").expect("ACCOUNT must compile")
});

/// How a delegated script ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelegatedOutcome {
    /// The script finished with this exit code.
    Completed { exit_code: Option<i32> },
    /// The ceiling passed before the script finished.
    TimedOut,
}

impl DelegatedOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(self, DelegatedOutcome::Completed { exit_code: Some(0) })
    }
}

/// Runs a PowerShell script file as some identity.
pub trait IdentityRunner {
    /// Run `script` to completion or until the runner's ceiling.
    fn run_script(&self, script: &Path) -> Result<DelegatedOutcome>;

    /// The ceiling applied to a script run.
    fn timeout(&self) -> Duration;
}

/// Runs the script in the current process identity.
pub struct DirectRunner<'a> {
    runner: &'a dyn ProcessRunner,
    powershell: PathBuf,
    timeout: Duration,
}

impl<'a> DirectRunner<'a> {
    pub fn new(runner: &'a dyn ProcessRunner, powershell: PathBuf, timeout: Duration) -> Self {
        Self {
            runner,
            powershell,
            timeout,
        }
    }
}

impl IdentityRunner for DirectRunner<'_> {
    fn run_script(&self, script: &Path) -> Result<DelegatedOutcome> {
        let options = CommandOptions {
            timeout: Some(self.timeout.as_secs().max(1)),
            ..CommandOptions::captured()
        };
        let result = self
            .runner
            .run(&self.powershell, &powershell_file_args(script), &options)?;

        if result.timed_out {
            return Ok(DelegatedOutcome::TimedOut);
        }
        if !result.success {
            tracing::warn!("Install script output:\n{}", result.combined_output());
        }
        Ok(DelegatedOutcome::Completed {
            exit_code: result.exit_code,
        })
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Resolves the account of the interactive console user.
pub trait ActiveUserResolver {
    /// `DOMAIN\user`, or `None` when nobody is logged on.
    fn active_user(&self) -> Option<String>;
}

/// Resolves the active user through CIM queries.
///
/// The owner of the console session (`Win32_ComputerSystem.UserName`) is
/// authoritative. When it is empty (RDP sessions, some kiosk setups), the
/// owner of the most recently started `explorer.exe` is used instead. That
/// fallback is a heuristic: with several interactive sessions it picks the
/// newest one, which is not necessarily the console.
pub struct CimUserResolver<'a> {
    runner: &'a dyn ProcessRunner,
    powershell: PathBuf,
}

const CONSOLE_USER_QUERY: &str = "(Get-CimInstance -ClassName Win32_ComputerSystem).UserName";

const EXPLORER_OWNER_QUERY: &str = "Get-CimInstance -ClassName Win32_Process -Filter \"Name='explorer.exe'\" | \
Sort-Object CreationDate -Descending | ForEach-Object { \
$o = Invoke-CimMethod -InputObject $_ -MethodName GetOwner; \
if ($o.User) { \"$($o.Domain)\\$($o.User)\" } } | Select-Object -First 1";

impl<'a> CimUserResolver<'a> {
    pub fn new(runner: &'a dyn ProcessRunner, powershell: PathBuf) -> Self {
        Self { runner, powershell }
    }

    fn query(&self, command: &str) -> Option<String> {
        let args = powershell_command_args(command);
        match self.runner.run(&self.powershell, &args, &CommandOptions::captured()) {
            Ok(result) if result.success => parse_account_name(&result.stdout),
            Ok(result) => {
                tracing::debug!("User query exited with {:?}", result.exit_code);
                None
            }
            Err(e) => {
                tracing::debug!("User query could not run: {}", e);
                None
            }
        }
    }
}

impl ActiveUserResolver for CimUserResolver<'_> {
    fn active_user(&self) -> Option<String> {
        if let Some(user) = self.query(CONSOLE_USER_QUERY) {
            tracing::debug!("Console session owner is {}", user);
            return Some(user);
        }
        let user = self.query(EXPLORER_OWNER_QUERY);
        if let Some(user) = &user {
            tracing::info!("No console owner; using newest explorer.exe owner {}", user);
        }
        user
    }
}

/// First line of `output` that looks like an account name.
pub fn parse_account_name(output: &str) -> Option<String> {
    output
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .filter(|line| ACCOUNT.is_match(line))
        .map(String::from)
}

/// Path to `schtasks.exe`.
pub fn schtasks_path(env_fn: EnvFn<'_>) -> PathBuf {
    match env_fn("SystemRoot") {
        Some(root) => PathBuf::from(root).join("System32").join("schtasks.exe"),
        None => PathBuf::from("schtasks.exe"),
    }
}

/// Scheduled task state read from `schtasks /Query /FO CSV /V`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskState {
    pub status: String,
    pub last_result: Option<i64>,
}

impl TaskState {
    /// Whether the task has run and is no longer running.
    pub fn is_terminal(&self) -> bool {
        let active = self.status.eq_ignore_ascii_case("Running")
            || self.status.eq_ignore_ascii_case("Queued");
        let pending = matches!(self.last_result, Some(TASK_RUNNING) | Some(TASK_HAS_NOT_RUN));
        !active && !pending && self.last_result.is_some()
    }
}

/// Parse the first data row of verbose CSV query output.
///
/// Columns: HostName, TaskName, Next Run Time, Status, Logon Mode,
/// Last Run Time, Last Result, ...
pub fn parse_task_state(output: &str) -> Option<TaskState> {
    let row = output
        .lines()
        .map(str::trim)
        .filter(|l| l.starts_with('"'))
        .find(|l| !l.starts_with("\"HostName\""))?;

    let fields: Vec<String> = CSV_FIELD
        .captures_iter(row)
        .map(|c| c[1].replace("\"\"", "\""))
        .collect();

    let status = fields.get(3)?.trim().to_string();
    let last_result = fields.get(6).and_then(|v| v.trim().parse::<i64>().ok());
    Some(TaskState {
        status,
        last_result,
    })
}

/// Delegates through a transient scheduled task bound to the active user.
pub struct ScheduledTaskRunner<'a> {
    runner: &'a dyn ProcessRunner,
    users: &'a dyn ActiveUserResolver,
    schtasks: PathBuf,
    powershell: PathBuf,
    task_name: String,
    timeout: Duration,
    poll_interval: Duration,
}

impl<'a> ScheduledTaskRunner<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        runner: &'a dyn ProcessRunner,
        users: &'a dyn ActiveUserResolver,
        schtasks: PathBuf,
        powershell: PathBuf,
        task_name: &str,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Self {
        Self {
            runner,
            users,
            schtasks,
            powershell,
            task_name: task_name.to_string(),
            timeout,
            poll_interval,
        }
    }

    fn schtasks(&self, args: &[&str]) -> Result<CommandResult> {
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        self.runner
            .run(&self.schtasks, &args, &CommandOptions::captured())
    }

    fn require_success(&self, args: &[&str]) -> Result<()> {
        let result = self.schtasks(args)?;
        if result.success {
            Ok(())
        } else {
            let rendered = display_command(
                &self.schtasks,
                &args.iter().map(|a| a.to_string()).collect::<Vec<_>>(),
            );
            Err(DeskprovError::Delegation {
                message: format!(
                    "{} exited with {:?}: {}",
                    rendered,
                    result.exit_code,
                    result.combined_output()
                ),
            })
        }
    }

    fn query_state(&self) -> Option<TaskState> {
        match self.schtasks(&["/Query", "/TN", self.task_name.as_str(), "/FO", "CSV", "/V"]) {
            Ok(result) if result.success => parse_task_state(&result.stdout),
            Ok(result) => {
                tracing::debug!("Task query exited with {:?}", result.exit_code);
                None
            }
            Err(e) => {
                tracing::debug!("Task query could not run: {}", e);
                None
            }
        }
    }

    fn poll(&self) -> DelegatedOutcome {
        let deadline = Instant::now() + self.timeout;
        loop {
            if let Some(state) = self.query_state() {
                tracing::debug!("Task {} state: {:?}", self.task_name, state);
                if state.is_terminal() {
                    return DelegatedOutcome::Completed {
                        exit_code: state.last_result.and_then(|r| i32::try_from(r).ok()),
                    };
                }
            }
            if Instant::now() >= deadline {
                tracing::warn!(
                    "Task {} still running after {}s",
                    self.task_name,
                    self.timeout.as_secs()
                );
                return DelegatedOutcome::TimedOut;
            }
            std::thread::sleep(self.poll_interval);
        }
    }
}

impl IdentityRunner for ScheduledTaskRunner<'_> {
    fn run_script(&self, script: &Path) -> Result<DelegatedOutcome> {
        let user = self
            .users
            .active_user()
            .ok_or_else(|| DeskprovError::Delegation {
                message: "no interactive user is logged on".to_string(),
            })?;
        tracing::info!("Delegating install to {} via task {}", user, self.task_name);

        let action = format!(
            "\"{}\" {}",
            self.powershell.display(),
            powershell_file_args(script)
                .iter()
                .map(|a| if a.contains(' ') { format!("\"{}\"", a) } else { a.clone() })
                .collect::<Vec<_>>()
                .join(" ")
        );

        let _guard = TaskGuard {
            task: self,
            script: script.to_path_buf(),
        };

        self.require_success(&[
            "/Create",
            "/TN",
            self.task_name.as_str(),
            "/TR",
            action.as_str(),
            "/SC",
            "ONCE",
            "/ST",
            "00:00",
            "/RU",
            user.as_str(),
            "/IT",
            "/RL",
            "HIGHEST",
            "/F",
        ])?;
        self.require_success(&["/Run", "/TN", self.task_name.as_str()])?;

        Ok(self.poll())
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Deletes the task and its script on every exit path.
struct TaskGuard<'r, 'a> {
    task: &'r ScheduledTaskRunner<'a>,
    script: PathBuf,
}

impl Drop for TaskGuard<'_, '_> {
    fn drop(&mut self) {
        match self.task.schtasks(&["/Delete", "/TN", self.task.task_name.as_str(), "/F"]) {
            Ok(result) if result.success => {
                tracing::debug!("Deleted task {}", self.task.task_name)
            }
            Ok(result) => tracing::debug!(
                "Task {} delete exited with {:?}",
                self.task.task_name,
                result.exit_code
            ),
            Err(e) => tracing::warn!("Could not delete task {}: {}", self.task.task_name, e),
        }
        if let Err(e) = std::fs::remove_file(&self.script) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("Could not remove {}: {}", self.script.display(), e);
            }
        }
    }
}
