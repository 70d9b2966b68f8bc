//! Presence detection for the target application.
//!
//! Lookup order, first verified executable wins:
//!
//! 1. Canonical install directories from the profile
//! 2. Uninstall records matching the display-name patterns, via their
//!    install location plus the executable subpath, then their direct
//!    default path
//!
//! A location is only accepted when the executable file exists on disk.

use crate::config::ApplicationConfig;
use crate::detection::registry::MetadataStore;
use crate::detection::version::read_file_version;
use crate::shell::{expand_env_vars, EnvFn};
use std::path::{Path, PathBuf};

/// Version reported when the executable exists but carries no version.
pub const UNKNOWN_VERSION: &str = "unknown";

/// A verified installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallationRecord {
    /// Path to the application's executable
    pub install_path: PathBuf,
    /// Version string read from the binary or its uninstall record
    pub display_version: String,
}

impl InstallationRecord {
    /// Whether the version could not be determined.
    pub fn version_unknown(&self) -> bool {
        self.display_version == UNKNOWN_VERSION
    }
}

/// Outcome of a presence lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Presence {
    /// The application is installed.
    Found(InstallationRecord),
    /// No verified executable was found.
    NotFound,
}

impl Presence {
    /// Whether the application was found.
    pub fn is_found(&self) -> bool {
        matches!(self, Presence::Found(_))
    }

    /// The record, if found.
    pub fn record(&self) -> Option<&InstallationRecord> {
        match self {
            Presence::Found(record) => Some(record),
            Presence::NotFound => None,
        }
    }
}

/// Where a verified executable was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    CanonicalPath,
    UninstallRecord,
}

/// Detects the target application.
pub struct PresenceDetector<'a> {
    app: &'a ApplicationConfig,
    store: &'a dyn MetadataStore,
    env_fn: EnvFn<'a>,
}

impl<'a> PresenceDetector<'a> {
    /// Create a detector for `app`.
    pub fn new(app: &'a ApplicationConfig, store: &'a dyn MetadataStore, env_fn: EnvFn<'a>) -> Self {
        Self { app, store, env_fn }
    }

    /// Locate the application. Read-only.
    pub fn detect(&self) -> Presence {
        if let Some(path) = self.probe_canonical_dirs() {
            tracing::debug!("Found {} at canonical path {}", self.app.display_name, path.display());
            return Presence::Found(self.record_for(path, None, Source::CanonicalPath));
        }

        let records = self
            .store
            .find_uninstall_records(&self.app.display_name_patterns);

        for record in &records {
            let candidate = record
                .install_dir()
                .map(|dir| join_relative(&dir, &self.app.executable_subpath))
                .or_else(|| record.default_path());

            let Some(candidate) = candidate else {
                tracing::debug!("Uninstall record '{}' declares no location", record.key);
                continue;
            };

            if candidate.is_file() {
                tracing::debug!(
                    "Found {} via uninstall record '{}' at {}",
                    self.app.display_name,
                    record.key,
                    candidate.display()
                );
                return Presence::Found(self.record_for(
                    candidate,
                    record.display_version.clone(),
                    Source::UninstallRecord,
                ));
            }

            tracing::debug!(
                "Uninstall record '{}' points at missing file {}",
                record.key,
                candidate.display()
            );
        }

        Presence::NotFound
    }

    fn probe_canonical_dirs(&self) -> Option<PathBuf> {
        self.app
            .install_dirs
            .iter()
            .map(|dir| PathBuf::from(expand_env_vars(dir, self.env_fn)))
            .map(|dir| join_relative(&dir, &self.app.executable))
            .find(|candidate| candidate.is_file())
    }

    fn record_for(
        &self,
        path: PathBuf,
        record_version: Option<String>,
        source: Source,
    ) -> InstallationRecord {
        let binary_version = match read_file_version(&path) {
            Ok(version) => version,
            Err(e) => {
                tracing::debug!("Could not read version of {}: {}", path.display(), e);
                None
            }
        };

        let display_version = match source {
            Source::CanonicalPath => binary_version,
            Source::UninstallRecord => binary_version.or(record_version),
        }
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| UNKNOWN_VERSION.to_string());

        InstallationRecord {
            install_path: path,
            display_version,
        }
    }
}

/// Join a relative path written with either separator onto `base`.
pub fn join_relative(base: &Path, relative: &str) -> PathBuf {
    relative
        .split(['/', '\\'])
        .filter(|part| !part.is_empty())
        .fold(base.to_path_buf(), |acc, part| acc.join(part))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::registry::{StaticStore, UninstallRecord};
    use crate::detection::version::fixed_file_info_bytes;
    use std::fs;
    use tempfile::TempDir;

    fn app_in(dir: &Path) -> ApplicationConfig {
        ApplicationConfig {
            id: "Contoso.Editor".to_string(),
            display_name: "Contoso Editor".to_string(),
            executable: "editor.exe".to_string(),
            install_dirs: vec![dir.display().to_string()],
            display_name_patterns: vec!["Contoso Editor*".to_string()],
            executable_subpath: r"bin\editor.exe".to_string(),
        }
    }

    fn write_versioned_exe(path: &Path, version: (u16, u16, u16, u16)) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let mut bytes = b"MZ".to_vec();
        bytes.extend(fixed_file_info_bytes(version.0, version.1, version.2, version.3));
        fs::write(path, bytes).unwrap();
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn canonical_path_hit_reads_binary_version() {
        let temp = TempDir::new().unwrap();
        let canonical = temp.path().join("canonical");
        write_versioned_exe(&canonical.join("editor.exe"), (5, 2, 0, 17));
        let app = app_in(&canonical);
        let store = StaticStore::new();

        let presence = PresenceDetector::new(&app, &store, &no_env).detect();

        let record = presence.record().unwrap();
        assert_eq!(record.install_path, canonical.join("editor.exe"));
        assert_eq!(record.display_version, "5.2.0.17");
    }

    #[test]
    fn canonical_dirs_expand_environment() {
        let temp = TempDir::new().unwrap();
        write_versioned_exe(&temp.path().join("Editor").join("editor.exe"), (1, 0, 0, 0));
        let mut app = app_in(temp.path());
        app.install_dirs = vec!["%APPROOT%/Editor".to_string()];
        let root = temp.path().display().to_string();
        let env = move |key: &str| (key == "APPROOT").then(|| root.clone());
        let store = StaticStore::new();

        let presence = PresenceDetector::new(&app, &store, &env).detect();
        assert!(presence.is_found());
    }

    #[test]
    fn record_install_location_resolves_subpath() {
        let temp = TempDir::new().unwrap();
        let location = temp.path().join("custom");
        write_versioned_exe(&location.join("bin").join("editor.exe"), (2, 1, 0, 0));
        let app = app_in(&temp.path().join("absent"));
        let store = StaticStore::new().with_record(UninstallRecord {
            install_location: Some(location.clone()),
            display_version: Some("2.1".to_string()),
            ..UninstallRecord::named("Contoso Editor 2.1 (x64)")
        });

        let presence = PresenceDetector::new(&app, &store, &no_env).detect();

        let record = presence.record().unwrap();
        assert_eq!(record.install_path, location.join("bin").join("editor.exe"));
        assert_eq!(record.display_version, "2.1.0.0");
    }

    #[test]
    fn record_pointing_at_missing_file_continues_search() {
        let temp = TempDir::new().unwrap();
        let real = temp.path().join("real").join("editor.exe");
        fs::create_dir_all(real.parent().unwrap()).unwrap();
        fs::write(&real, b"MZ").unwrap();
        let app = app_in(&temp.path().join("absent"));
        let store = StaticStore::new()
            .with_record(UninstallRecord {
                install_location: Some(temp.path().join("stale")),
                ..UninstallRecord::named("Contoso Editor (stale)")
            })
            .with_record(UninstallRecord {
                display_icon: Some(format!("\"{}\",0", real.display())),
                display_version: Some("3.0.1".to_string()),
                ..UninstallRecord::named("Contoso Editor")
            });

        let presence = PresenceDetector::new(&app, &store, &no_env).detect();

        let record = presence.record().unwrap();
        assert_eq!(record.install_path, real);
        assert_eq!(record.display_version, "3.0.1");
    }

    #[test]
    fn records_with_only_missing_files_yield_not_found() {
        let temp = TempDir::new().unwrap();
        let app = app_in(&temp.path().join("absent"));
        let store = StaticStore::new()
            .with_record(UninstallRecord {
                install_location: Some(temp.path().join("gone")),
                ..UninstallRecord::named("Contoso Editor")
            })
            .with_record(UninstallRecord {
                display_icon: Some(temp.path().join("gone.exe").display().to_string()),
                ..UninstallRecord::named("Contoso Editor Beta")
            });

        let presence = PresenceDetector::new(&app, &store, &no_env).detect();
        assert_eq!(presence, Presence::NotFound);
    }

    #[test]
    fn unrelated_records_are_ignored() {
        let temp = TempDir::new().unwrap();
        let exe = temp.path().join("other.exe");
        fs::write(&exe, b"MZ").unwrap();
        let app = app_in(&temp.path().join("absent"));
        let store = StaticStore::new().with_record(UninstallRecord {
            display_icon: Some(exe.display().to_string()),
            ..UninstallRecord::named("Fabrikam Viewer")
        });

        let presence = PresenceDetector::new(&app, &store, &no_env).detect();
        assert!(!presence.is_found());
    }

    #[test]
    fn unversioned_binary_reports_unknown() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("editor.exe"), b"MZ").unwrap();
        let app = app_in(temp.path());
        let store = StaticStore::new();

        let presence = PresenceDetector::new(&app, &store, &no_env).detect();

        let record = presence.record().unwrap();
        assert!(record.version_unknown());
    }

    #[test]
    fn join_relative_accepts_both_separators() {
        let joined = join_relative(Path::new("/base"), r"bin\sub/editor.exe");
        assert_eq!(joined, Path::new("/base").join("bin").join("sub").join("editor.exe"));
    }
}
