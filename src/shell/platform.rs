//! Platform facts read from the process environment.
//!
//! Functions take an `env_fn` lookup so tests never touch real
//! environment variables.

use std::path::PathBuf;

/// Environment lookup used by platform probes.
pub type EnvFn<'a> = &'a dyn Fn(&str) -> Option<String>;

/// Look up a variable in the real process environment.
pub fn system_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Expand `%VAR%` references.
///
/// Unknown variables are left in place so the resulting path simply
/// fails to exist rather than collapsing to a different directory.
pub fn expand_env_vars(input: &str, env_fn: EnvFn<'_>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find('%') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('%') {
            Some(end) if end > 0 => {
                let name = &after[..end];
                match env_fn(name) {
                    Some(value) => out.push_str(&value),
                    None => {
                        out.push('%');
                        out.push_str(name);
                        out.push('%');
                    }
                }
                rest = &after[end + 1..];
            }
            _ => {
                out.push('%');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Whether the process runs as the LocalSystem account.
///
/// The SYSTEM account reports the machine account (`HOST$`) or `SYSTEM`
/// as its user name and has no interactive profile to install into.
pub fn is_system_account(env_fn: EnvFn<'_>) -> bool {
    match env_fn("USERNAME") {
        Some(user) => user.eq_ignore_ascii_case("SYSTEM") || user.ends_with('$'),
        None => false,
    }
}

/// Path to Windows PowerShell.
pub fn powershell_path(env_fn: EnvFn<'_>) -> PathBuf {
    match env_fn("SystemRoot") {
        Some(root) => PathBuf::from(root)
            .join("System32")
            .join("WindowsPowerShell")
            .join("v1.0")
            .join("powershell.exe"),
        None => PathBuf::from("powershell.exe"),
    }
}

/// Standard arguments for running a PowerShell script file.
pub fn powershell_file_args(script: &std::path::Path) -> Vec<String> {
    vec![
        "-NoProfile".to_string(),
        "-NonInteractive".to_string(),
        "-ExecutionPolicy".to_string(),
        "Bypass".to_string(),
        "-File".to_string(),
        script.display().to_string(),
    ]
}

/// Standard arguments for running an inline PowerShell command.
pub fn powershell_command_args(command: &str) -> Vec<String> {
    vec![
        "-NoProfile".to_string(),
        "-NonInteractive".to_string(),
        "-Command".to_string(),
        command.to_string(),
    ]
}

/// Quote a value as a single-quoted PowerShell string literal.
pub fn ps_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
