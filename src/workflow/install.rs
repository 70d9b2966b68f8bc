//! Install variant.
//!
//! Stages run strictly in order and the first failure ends the run:
//!
//! 1. architecture gate
//! 2. Visual C++ runtime
//! 3. package manager resolution, with bootstrap as a last resort
//! 4. package install, followed by a re-detection

use crate::config::AppProfile;
use crate::detection::{Presence, PresenceDetector};
use crate::install::{format_exit_code, InstallOrchestrator, InstallOutcome};
use crate::remediation::{Remediator, VcRuntimeInstaller};
use crate::requirements::{
    is_supported, native_architecture, PackageManagerLocator, Prerequisite, PrerequisiteChecker,
};
use crate::ui::UserInterface;
use crate::workflow::host::Host;
use crate::workflow::summary::{ExecutionSummary, ExitStatus};
use std::path::PathBuf;

/// Where the workflow currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    EnsureArchitecture,
    EnsureVcRuntime,
    ResolvePackageManager,
    Install(PathBuf),
    Done,
}

/// How the package manager executable was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    DirectPath,
    Located,
    Remediated,
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Resolution::DirectPath => write!(f, "direct-path"),
            Resolution::Located => write!(f, "located"),
            Resolution::Remediated => write!(f, "remediated"),
        }
    }
}

/// Drives the install stages against a host.
pub struct InstallWorkflow<'a, 'h> {
    profile: &'a AppProfile,
    host: &'a Host<'h>,
}

impl<'a, 'h> InstallWorkflow<'a, 'h> {
    pub fn new(profile: &'a AppProfile, host: &'a Host<'h>) -> Self {
        Self { profile, host }
    }

    /// Run every stage and return the accumulated summary.
    pub fn run(&self, ui: &mut dyn UserInterface) -> ExecutionSummary {
        let mut summary = ExecutionSummary::new();
        ui.show_header(&format!("Installing {}", self.profile.app.display_name));

        let mut stage = Stage::EnsureArchitecture;
        loop {
            tracing::debug!("Entering stage {:?}", stage);
            stage = match stage {
                Stage::EnsureArchitecture => {
                    if self.ensure_architecture(ui, &mut summary) {
                        Stage::EnsureVcRuntime
                    } else {
                        Stage::Done
                    }
                }
                Stage::EnsureVcRuntime => {
                    if self.ensure_vc_runtime(ui, &mut summary) {
                        Stage::ResolvePackageManager
                    } else {
                        Stage::Done
                    }
                }
                Stage::ResolvePackageManager => match self.resolve_package_manager(ui, &mut summary) {
                    Some(path) => Stage::Install(path),
                    None => Stage::Done,
                },
                Stage::Install(path) => {
                    self.install(&path, ui, &mut summary);
                    Stage::Done
                }
                Stage::Done => break,
            };
        }

        summary
    }

    fn ensure_architecture(&self, ui: &mut dyn UserInterface, summary: &mut ExecutionSummary) -> bool {
        let arch = native_architecture(self.host.env_fn);
        if is_supported(&arch, &self.profile.supported_architectures) {
            ui.success(&format!("Architecture {} supported", arch));
            summary.push(format!("architecture {}", arch));
            true
        } else {
            ui.error(&format!("Architecture {} is not supported", arch));
            summary.fail(
                ExitStatus::UnsupportedArchitecture,
                format!(
                    "unsupported architecture {} (expected one of {})",
                    arch,
                    self.profile.supported_architectures.join(", ")
                ),
            );
            false
        }
    }

    fn ensure_vc_runtime(&self, ui: &mut dyn UserInterface, summary: &mut ExecutionSummary) -> bool {
        let vc = &self.profile.vc_runtime;
        let checker = self.checker();
        if checker.is_installed(&vc.as_dependency()) {
            ui.success(&format!("{} present", vc.name));
            return true;
        }

        ui.message(&format!("{} missing, installing", vc.name));
        let installer = VcRuntimeInstaller::new(
            vc,
            self.host.downloader,
            self.host.runner,
            self.host.staging_root.join("vc-runtime"),
        )
        .with_timeout(self.profile.install.timeout_secs);

        match installer.install() {
            Ok(code) => {
                ui.success(&format!("{} installed", vc.name));
                summary.push(format!("{} installed (exit code {})", vc.name, code));
                true
            }
            Err(e) => {
                ui.error(&format!("{} install failed: {}", vc.name, e));
                summary.fail(
                    ExitStatus::VcRuntimeFailed,
                    format!("{} install failed: {}", vc.name, e),
                );
                false
            }
        }
    }

    fn resolve_package_manager(
        &self,
        ui: &mut dyn UserInterface,
        summary: &mut ExecutionSummary,
    ) -> Option<PathBuf> {
        let checker = self.checker();
        let status = checker.check();
        let runtime_missing: Vec<&str> = status
            .missing()
            .iter()
            .filter_map(|p| match p {
                Prerequisite::Runtime(dep) => Some(dep.name.as_str()),
                Prerequisite::PackageManager { .. } => None,
            })
            .collect();
        if !runtime_missing.is_empty() {
            ui.warning(&format!("Missing runtime packages: {}", runtime_missing.join(", ")));
            summary.push(format!(
                "missing runtime dependencies [{}]: {}",
                status.legacy_code(),
                runtime_missing.join(", ")
            ));
        }

        let locator = PackageManagerLocator::new(&self.profile.package_manager, self.host.env_fn);

        if let Some(path) = checker.package_manager_on_path() {
            return Some(self.resolved(Resolution::DirectPath, path, ui, summary));
        }
        if let Some(path) = locator.locate() {
            return Some(self.resolved(Resolution::Located, path, ui, summary));
        }

        ui.warning(&format!(
            "{} not found, bootstrapping",
            self.profile.package_manager.executable
        ));
        let remediator = Remediator::new(
            &self.profile.remediation,
            self.host.downloader,
            self.host.identity,
            self.host.staging_root.join("bootstrap"),
        );
        let confirmed = match remediator.bootstrap() {
            Ok(report) => {
                summary.push(format!(
                    "package manager {} bootstrapped ({} downloads)",
                    report.release_tag, report.downloads
                ));
                true
            }
            Err(e) if e.is_ambiguous() => {
                ui.warning(&format!("Bootstrap outcome unknown: {}", e));
                false
            }
            Err(e) => {
                ui.error(&format!("Bootstrap failed: {}", e));
                summary.fail(
                    ExitStatus::BootstrapFailed,
                    format!("package manager bootstrap failed: {}", e),
                );
                return None;
            }
        };

        match locator.locate().or_else(|| checker.package_manager_on_path()) {
            Some(path) => {
                if !confirmed {
                    summary.note("package manager bootstrap timed out but the executable is present");
                }
                Some(self.resolved(Resolution::Remediated, path, ui, summary))
            }
            None => {
                ui.error("Package manager still missing after bootstrap");
                summary.fail(
                    ExitStatus::PackageManagerMissing,
                    format!(
                        "{} not found after bootstrap",
                        self.profile.package_manager.executable
                    ),
                );
                None
            }
        }
    }

    fn resolved(
        &self,
        how: Resolution,
        path: PathBuf,
        ui: &mut dyn UserInterface,
        summary: &mut ExecutionSummary,
    ) -> PathBuf {
        tracing::info!("Package manager resolved ({}): {}", how, path.display());
        ui.success(&format!("Package manager {} at {}", how, path.display()));
        summary.push(format!("package manager {} at {}", how, path.display()));
        path
    }

    fn install(&self, package_manager: &std::path::Path, ui: &mut dyn UserInterface, summary: &mut ExecutionSummary) {
        let app = &self.profile.app;
        ui.message(&format!("Installing {}", app.id));
        let orchestrator = InstallOrchestrator::new(&self.profile.install, self.host.runner);

        match orchestrator.install(package_manager, &app.id) {
            InstallOutcome::Installed => {
                ui.success(&format!("{} installed", app.id));
                summary.push(format!("{} installed", app.id));
            }
            InstallOutcome::AlreadyCurrent { code } => {
                ui.success(&format!("{} already current", app.id));
                summary.push(format!(
                    "{} already current (exit code {})",
                    app.id,
                    format_exit_code(code)
                ));
            }
            InstallOutcome::Failed { code, output } => {
                ui.command_output(&output);
                let code_text = code.map(format_exit_code).unwrap_or_else(|| "none".to_string());
                ui.error(&format!("Install of {} failed with exit code {}", app.id, code_text));
                let mut entry = format!("install of {} failed with exit code {}", app.id, code_text);
                if let Some(last) = output.lines().rev().find(|l| !l.trim().is_empty()) {
                    entry.push_str(&format!(": {}", last.trim()));
                }
                summary.fail(ExitStatus::Failure, entry);
                return;
            }
        }

        self.verify(ui, summary);
    }

    fn verify(&self, ui: &mut dyn UserInterface, summary: &mut ExecutionSummary) {
        let app = &self.profile.app;
        match PresenceDetector::new(app, self.host.store, self.host.env_fn).detect() {
            Presence::Found(record) => {
                ui.success(&format!(
                    "{} {} detected at {}",
                    app.display_name,
                    record.display_version,
                    record.install_path.display()
                ));
                summary.push(format!(
                    "{} {} installed at {}",
                    app.display_name,
                    record.display_version,
                    record.install_path.display()
                ));
            }
            Presence::NotFound => {
                ui.warning(&format!("{} not detected after install", app.display_name));
                summary.note(format!(
                    "{} not detected after install",
                    app.display_name
                ));
            }
        }
    }

    fn checker(&self) -> PrerequisiteChecker<'a> {
        PrerequisiteChecker::new(
            &self.profile.package_manager,
            &self.profile.runtime_dependencies,
            self.host.store,
            self.host.path_entries.clone(),
        )
    }
}

/// Run the install variant.
pub fn run_install(profile: &AppProfile, host: &Host<'_>, ui: &mut dyn UserInterface) -> ExecutionSummary {
    InstallWorkflow::new(profile, host).run(ui)
}
