//! Package manager discovery outside the execution path.
//!
//! Candidates are tried in declared order. A candidate may contain `%VAR%`
//! references and `*` wildcards (versioned package directories); when a
//! wildcard matches several directories the newest version is tried first.

use crate::config::PackageManagerConfig;
use crate::requirements::probe::path_present;
use crate::shell::{expand_env_vars, EnvFn};
use crate::detection::escape_wildcard;
use glob::MatchOptions;
use std::cmp::Reverse;
use std::path::{Path, PathBuf};

/// Searches candidate directories for the package manager executable.
pub struct PackageManagerLocator<'a> {
    config: &'a PackageManagerConfig,
    env_fn: EnvFn<'a>,
}

impl<'a> PackageManagerLocator<'a> {
    pub fn new(config: &'a PackageManagerConfig, env_fn: EnvFn<'a>) -> Self {
        Self { config, env_fn }
    }

    /// Full path of the first candidate containing the executable.
    pub fn locate(&self) -> Option<PathBuf> {
        for candidate in &self.config.candidate_dirs {
            let expanded = expand_env_vars(candidate, self.env_fn);
            let dirs = expand_candidate(&expanded);
            if dirs.is_empty() {
                tracing::debug!("Candidate '{}' matched nothing", expanded);
                continue;
            }
            for dir in dirs {
                let exe = dir.join(&self.config.executable);
                if path_present(&exe) {
                    tracing::info!("Located {} at {}", self.config.executable, exe.display());
                    return Some(exe);
                }
                tracing::debug!("No {} in {}", self.config.executable, dir.display());
            }
        }
        None
    }
}

/// Expand one candidate into existing directories, newest version first.
pub fn expand_candidate(candidate: &str) -> Vec<PathBuf> {
    if !candidate.contains('*') {
        let dir = PathBuf::from(candidate);
        return if dir.is_dir() { vec![dir] } else { Vec::new() };
    }

    let pattern = escape_wildcard(candidate);
    let options = MatchOptions {
        case_sensitive: false,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };

    let mut dirs: Vec<PathBuf> = match glob::glob_with(&pattern, options) {
        Ok(paths) => paths.flatten().filter(|p| p.is_dir()).collect(),
        Err(e) => {
            tracing::debug!("Invalid candidate pattern '{}': {}", candidate, e);
            return Vec::new();
        }
    };

    dirs.sort_by_key(|dir| Reverse(version_key(dir)));
    dirs
}

/// Digit groups of the final path component, for version ordering.
fn version_key(dir: &Path) -> Vec<u64> {
    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    name.split(|c: char| !c.is_ascii_digit())
        .filter(|group| !group.is_empty())
        .filter_map(|group| group.parse().ok())
        .collect()
}
