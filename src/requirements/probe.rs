//! Execution-path lookup for tools.
//!
//! Resolution walks PATH entries directly instead of shelling out to
//! `where`/`which`, whose behavior varies across hosts.

use std::path::{Path, PathBuf};

/// Check whether a file has executable permission bits set.
#[cfg(unix)]
pub fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

/// Windows has no execute bit; any present file is runnable.
#[cfg(not(unix))]
pub fn is_executable(_path: &Path) -> bool {
    true
}

/// Whether a file or app execution alias exists at `path`.
///
/// App execution aliases (as under `WindowsApps`) are reparse points that
/// `is_file` may not follow, so link metadata is accepted too.
pub fn path_present(path: &Path) -> bool {
    path.is_file()
        || std::fs::symlink_metadata(path)
            .map(|m| !m.is_dir())
            .unwrap_or(false)
}

/// Resolve a tool's binary path by iterating over PATH entries.
///
/// Returns the first match that exists and is executable.
pub fn resolve_tool_path(tool: &str, path_entries: &[PathBuf]) -> Option<PathBuf> {
    for dir in path_entries {
        let candidate = dir.join(tool);
        if path_present(&candidate) && is_executable(&candidate) {
            return Some(candidate);
        }
    }
    None
}

/// Parse the system PATH environment variable into a list of directories.
pub fn parse_system_path() -> Vec<PathBuf> {
    std::env::var_os("PATH")
        .map(|path| std::env::split_paths(&path).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    /// Create a fake binary at a path (creates parent dirs as needed).
    fn create_fake_binary(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, "#!/bin/sh\n").unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
        }
    }

    #[test]
    fn resolve_tool_path_finds_first_match() {
        let temp = TempDir::new().unwrap();
        let dir_a = temp.path().join("a");
        let dir_b = temp.path().join("b");
        create_fake_binary(&dir_a.join("winget.exe"));
        create_fake_binary(&dir_b.join("winget.exe"));

        let result = resolve_tool_path("winget.exe", &[dir_a.clone(), dir_b]);
        assert_eq!(result, Some(dir_a.join("winget.exe")));
    }

    #[test]
    fn resolve_tool_path_returns_none_when_not_found() {
        let temp = TempDir::new().unwrap();
        let result = resolve_tool_path("winget.exe", &[temp.path().to_path_buf()]);
        assert!(result.is_none());
    }

    #[cfg(unix)]
    #[test]
    fn resolve_tool_path_skips_non_executable() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let dir_a = temp.path().join("a");
        let dir_b = temp.path().join("b");
        fs::create_dir_all(&dir_a).unwrap();
        fs::write(dir_a.join("winget.exe"), "data").unwrap();
        fs::set_permissions(dir_a.join("winget.exe"), fs::Permissions::from_mode(0o644)).unwrap();
        create_fake_binary(&dir_b.join("winget.exe"));

        let result = resolve_tool_path("winget.exe", &[dir_a, dir_b.clone()]);
        assert_eq!(result, Some(dir_b.join("winget.exe")));
    }

    #[test]
    fn directories_are_not_present_files() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("winget.exe")).unwrap();
        assert!(!path_present(&temp.path().join("winget.exe")));
    }
}
