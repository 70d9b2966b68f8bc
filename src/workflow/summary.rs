//! Execution summary owned by the workflow driver.
//!
//! Stages append entries as they run. The summary renders as the single
//! final line the management agent parses:
//!
//! ```text
//! <OK|FAIL|NOTE> <YYYY-MM-DD HH:MM:SS> : <entries joined by "; ">
//! ```

use chrono::{DateTime, Local};
use std::fmt;

/// Class of the final report line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportClass {
    Ok,
    /// The main action succeeded but something is unconfirmed.
    Note,
    Fail,
}

impl fmt::Display for ReportClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ReportClass::Ok => "OK",
            ReportClass::Note => "NOTE",
            ReportClass::Fail => "FAIL",
        })
    }
}

/// Process exit codes. Stable; the management agent keys off them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// Success, including NOTE outcomes whose main action succeeded (0)
    Success,
    /// Application missing on detect, or install failed (1)
    Failure,
    /// Unsupported processor architecture (2)
    UnsupportedArchitecture,
    /// VC runtime bootstrap failed (3)
    VcRuntimeFailed,
    /// Package manager bootstrap failed (4)
    BootstrapFailed,
    /// Package manager not found after bootstrap (5)
    PackageManagerMissing,
    /// Profile invalid (6)
    ConfigInvalid,
}

impl ExitStatus {
    pub fn code(self) -> u8 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::Failure => 1,
            ExitStatus::UnsupportedArchitecture => 2,
            ExitStatus::VcRuntimeFailed => 3,
            ExitStatus::BootstrapFailed => 4,
            ExitStatus::PackageManagerMissing => 5,
            ExitStatus::ConfigInvalid => 6,
        }
    }
}

/// Accumulated diagnostics of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionSummary {
    entries: Vec<String>,
    class: ReportClass,
    status: ExitStatus,
}

impl Default for ExecutionSummary {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutionSummary {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            class: ReportClass::Ok,
            status: ExitStatus::Success,
        }
    }

    /// Append a diagnostic entry.
    pub fn push(&mut self, entry: impl Into<String>) {
        self.entries.push(entry.into());
    }

    /// Append an entry and downgrade an OK report to NOTE.
    pub fn note(&mut self, entry: impl Into<String>) {
        self.push(entry);
        if self.class == ReportClass::Ok {
            self.class = ReportClass::Note;
        }
    }

    /// Append an entry and mark the run failed with `status`.
    ///
    /// The first failure's status is kept.
    pub fn fail(&mut self, status: ExitStatus, entry: impl Into<String>) {
        self.push(entry);
        if self.class != ReportClass::Fail {
            self.class = ReportClass::Fail;
            self.status = status;
        }
    }

    pub fn class(&self) -> ReportClass {
        self.class
    }

    pub fn status(&self) -> ExitStatus {
        self.status
    }

    pub fn is_failed(&self) -> bool {
        self.class == ReportClass::Fail
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Entries joined into one line.
    pub fn text(&self) -> String {
        let text = self
            .entries
            .iter()
            .map(|e| e.replace(['\r', '\n'], " "))
            .collect::<Vec<_>>()
            .join("; ");
        if text.is_empty() {
            "no diagnostics".to_string()
        } else {
            text
        }
    }

    /// Final line stamped with the current local time.
    pub fn final_line(&self) -> String {
        self.final_line_at(Local::now())
    }

    pub fn final_line_at(&self, at: DateTime<Local>) -> String {
        format!(
            "{} {} : {}",
            self.class,
            at.format("%Y-%m-%d %H:%M:%S"),
            self.text()
        )
    }
}
