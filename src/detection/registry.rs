//! Installed-software metadata store.
//!
//! [`MetadataStore`] is the read-only view of the OS records the detector
//! and prerequisite checker query: classic uninstall records and the list
//! of installed Appx packages. Failures reading the store are logged and
//! treated as "no records", because absence is a normal outcome.

use glob::{MatchOptions, Pattern, PatternError};
use std::cell::OnceCell;
use std::path::PathBuf;

/// One uninstall record (an `...\CurrentVersion\Uninstall\<key>` entry).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UninstallRecord {
    /// Registry key name
    pub key: String,
    /// `DisplayName` value
    pub display_name: String,
    /// `DisplayVersion` value
    pub display_version: Option<String>,
    /// `InstallLocation` value
    pub install_location: Option<PathBuf>,
    /// `DisplayIcon` value, used as the direct default path
    pub display_icon: Option<String>,
}

impl UninstallRecord {
    /// Create a record with only a display name.
    pub fn named(display_name: &str) -> Self {
        Self {
            key: display_name.to_string(),
            display_name: display_name.to_string(),
            ..Default::default()
        }
    }

    /// The install directory, if the record declares a non-empty one.
    pub fn install_dir(&self) -> Option<PathBuf> {
        self.install_location
            .as_ref()
            .filter(|p| !p.as_os_str().is_empty())
            .cloned()
    }

    /// The direct default path declared by `DisplayIcon`.
    ///
    /// Strips surrounding quotes and a trailing `,<icon index>`.
    pub fn default_path(&self) -> Option<PathBuf> {
        let raw = self.display_icon.as_deref()?.trim();
        let raw = match raw.rsplit_once(',') {
            Some((path, index)) if index.trim().trim_start_matches('-').parse::<i32>().is_ok() => {
                path
            }
            _ => raw,
        };
        let raw = raw.trim().trim_matches('"');
        if raw.is_empty() {
            None
        } else {
            Some(PathBuf::from(raw))
        }
    }
}

/// Read-only access to installed-software records.
pub trait MetadataStore {
    /// All uninstall records, machine-wide and per-user.
    fn uninstall_records(&self) -> Vec<UninstallRecord>;

    /// Full names of installed Appx packages.
    fn appx_packages(&self) -> Vec<String>;

    /// Uninstall records whose display name matches any pattern.
    fn find_uninstall_records(&self, patterns: &[String]) -> Vec<UninstallRecord> {
        self.uninstall_records()
            .into_iter()
            .filter(|r| patterns.iter().any(|p| matches_pattern(&r.display_name, p)))
            .collect()
    }

    /// Whether any uninstall record matches the pattern.
    fn has_uninstall_record(&self, pattern: &str) -> bool {
        self.uninstall_records()
            .iter()
            .any(|r| matches_pattern(&r.display_name, pattern))
    }

    /// Whether any installed Appx package matches the pattern.
    fn has_appx_package(&self, pattern: &str) -> bool {
        self.appx_packages()
            .iter()
            .any(|p| matches_pattern(p, pattern))
    }
}

const NAME_MATCH: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Escape glob metacharacters other than `*`.
pub fn escape_wildcard(pattern: &str) -> String {
    pattern
        .split('*')
        .map(Pattern::escape)
        .collect::<Vec<_>>()
        .join("*")
}

/// Compile a `*` wildcard into a glob pattern; `?` and `[` stay literal.
pub fn wildcard_pattern(pattern: &str) -> Result<Pattern, PatternError> {
    Pattern::new(&escape_wildcard(pattern))
}

/// Case-insensitive wildcard matching (`*` matches any run of characters).
pub fn matches_pattern(name: &str, pattern: &str) -> bool {
    match wildcard_pattern(pattern) {
        Ok(compiled) => compiled.matches_with(name, NAME_MATCH),
        Err(e) => {
            tracing::debug!("Invalid name pattern '{}': {}", pattern, e);
            false
        }
    }
}

/// In-memory store with fixed contents.
#[derive(Debug, Clone, Default)]
pub struct StaticStore {
    /// Uninstall records returned by the store
    pub records: Vec<UninstallRecord>,
    /// Appx package names returned by the store
    pub packages: Vec<String>,
}

impl StaticStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an uninstall record.
    pub fn with_record(mut self, record: UninstallRecord) -> Self {
        self.records.push(record);
        self
    }

    /// Add an Appx package name.
    pub fn with_package(mut self, name: &str) -> Self {
        self.packages.push(name.to_string());
        self
    }
}

impl MetadataStore for StaticStore {
    fn uninstall_records(&self) -> Vec<UninstallRecord> {
        self.records.clone()
    }

    fn appx_packages(&self) -> Vec<String> {
        self.packages.clone()
    }
}

/// The host's real store.
///
/// On Windows, uninstall records come from the registry and Appx packages
/// from `Get-AppxPackage`. The registry is read on every query so a
/// re-detection after an install sees the new record; the package list is
/// read once per run. Elsewhere the store is empty.
pub struct SystemStore<'a> {
    #[cfg_attr(not(windows), allow(dead_code))]
    runner: &'a dyn crate::shell::ProcessRunner,
    #[cfg_attr(not(windows), allow(dead_code))]
    env_fn: crate::shell::EnvFn<'a>,
    packages: OnceCell<Vec<String>>,
}

impl<'a> SystemStore<'a> {
    /// Create a store that spawns PowerShell through `runner`.
    pub fn new(runner: &'a dyn crate::shell::ProcessRunner, env_fn: crate::shell::EnvFn<'a>) -> Self {
        Self {
            runner,
            env_fn,
            packages: OnceCell::new(),
        }
    }
}

impl MetadataStore for SystemStore<'_> {
    fn uninstall_records(&self) -> Vec<UninstallRecord> {
        read_uninstall_records()
    }

    fn appx_packages(&self) -> Vec<String> {
        self.packages
            .get_or_init(|| self.read_appx_packages())
            .clone()
    }
}

impl SystemStore<'_> {
    #[cfg(windows)]
    fn read_appx_packages(&self) -> Vec<String> {
        use crate::shell::{powershell_command_args, powershell_path, CommandOptions};

        let program = powershell_path(self.env_fn);
        let args = powershell_command_args(
            "Get-AppxPackage -AllUsers | ForEach-Object { $_.PackageFullName }",
        );
        match self.runner.run(&program, &args, &CommandOptions::captured()) {
            Ok(result) if result.success => parse_package_list(&result.stdout),
            Ok(result) => {
                tracing::debug!("Get-AppxPackage exited with {:?}", result.exit_code);
                Vec::new()
            }
            Err(e) => {
                tracing::debug!("Get-AppxPackage could not run: {}", e);
                Vec::new()
            }
        }
    }

    #[cfg(not(windows))]
    fn read_appx_packages(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Split PowerShell list output into trimmed, non-empty lines.
pub fn parse_package_list(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(windows)]
fn read_uninstall_records() -> Vec<UninstallRecord> {
    use winreg::enums::{HKEY_CURRENT_USER, HKEY_LOCAL_MACHINE, KEY_READ, KEY_WOW64_64KEY};
    use winreg::RegKey;

    const UNINSTALL: &str = r"SOFTWARE\Microsoft\Windows\CurrentVersion\Uninstall";
    const UNINSTALL_WOW: &str = r"SOFTWARE\WOW6432Node\Microsoft\Windows\CurrentVersion\Uninstall";

    let roots = [
        (RegKey::predef(HKEY_LOCAL_MACHINE), UNINSTALL, KEY_READ | KEY_WOW64_64KEY),
        (RegKey::predef(HKEY_LOCAL_MACHINE), UNINSTALL_WOW, KEY_READ),
        (RegKey::predef(HKEY_CURRENT_USER), UNINSTALL, KEY_READ),
    ];

    let mut records = Vec::new();
    for (hive, path, flags) in &roots {
        let Ok(parent) = hive.open_subkey_with_flags(path, *flags) else {
            tracing::debug!("Uninstall root {} not readable", path);
            continue;
        };
        for name in parent.enum_keys().flatten() {
            let Ok(key) = parent.open_subkey_with_flags(&name, *flags) else {
                continue;
            };
            let Ok(display_name) = key.get_value::<String, _>("DisplayName") else {
                continue;
            };
            records.push(UninstallRecord {
                key: name,
                display_name,
                display_version: key.get_value::<String, _>("DisplayVersion").ok(),
                install_location: key
                    .get_value::<String, _>("InstallLocation")
                    .ok()
                    .map(PathBuf::from),
                display_icon: key.get_value::<String, _>("DisplayIcon").ok(),
            });
        }
    }
    records
}

#[cfg(not(windows))]
fn read_uninstall_records() -> Vec<UninstallRecord> {
    Vec::new()
}
