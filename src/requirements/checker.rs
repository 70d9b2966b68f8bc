//! Prerequisite checker for the package manager and its runtime components.
//!
//! The `PrerequisiteChecker` never short-circuits: every check runs and
//! each failure adds one member to the resulting [`PrerequisiteStatus`].

use crate::config::{DependencySource, PackageManagerConfig, RuntimeDependency};
use crate::detection::MetadataStore;
use crate::requirements::probe::resolve_tool_path;
use crate::requirements::status::{Prerequisite, PrerequisiteStatus};
use std::path::PathBuf;

/// Checks whether the package manager and its dependencies are present.
pub struct PrerequisiteChecker<'a> {
    package_manager: &'a PackageManagerConfig,
    dependencies: &'a [RuntimeDependency],
    store: &'a dyn MetadataStore,
    path_entries: Vec<PathBuf>,
}

impl<'a> PrerequisiteChecker<'a> {
    /// Create a checker over the given execution path entries.
    pub fn new(
        package_manager: &'a PackageManagerConfig,
        dependencies: &'a [RuntimeDependency],
        store: &'a dyn MetadataStore,
        path_entries: Vec<PathBuf>,
    ) -> Self {
        Self {
            package_manager,
            dependencies,
            store,
            path_entries,
        }
    }

    /// Run every check and collect the missing items.
    pub fn check(&self) -> PrerequisiteStatus {
        let mut status = PrerequisiteStatus::new();

        if self.package_manager_on_path().is_none() {
            tracing::warn!("{} not found on PATH", self.package_manager.executable);
            status.insert(Prerequisite::PackageManager {
                executable: self.package_manager.executable.clone(),
                tag: self.package_manager.tag,
            });
        }

        for dep in self.dependencies {
            if self.is_installed(dep) {
                tracing::debug!("{} present", dep.name);
            } else {
                tracing::warn!("{} missing (pattern '{}')", dep.name, dep.pattern);
                status.insert(Prerequisite::Runtime(dep.clone()));
            }
        }

        status
    }

    /// The package manager executable resolved on the execution path.
    pub fn package_manager_on_path(&self) -> Option<PathBuf> {
        resolve_tool_path(&self.package_manager.executable, &self.path_entries)
    }

    /// Whether a single runtime dependency is installed.
    pub fn is_installed(&self, dep: &RuntimeDependency) -> bool {
        match dep.source {
            DependencySource::UninstallRegistry => self.store.has_uninstall_record(&dep.pattern),
            DependencySource::AppxPackage => self.store.has_appx_package(&dep.pattern),
        }
    }
}
