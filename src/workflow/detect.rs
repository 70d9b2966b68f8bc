//! Detection variant.
//!
//! A hit ends the run successfully. A miss fails the run and appends a
//! diagnostic of the environment an install would need.

use crate::config::AppProfile;
use crate::detection::{Presence, PresenceDetector};
use crate::network::{ConnectivityChecker, ConnectivityStatus};
use crate::requirements::{PackageManagerLocator, PrerequisiteChecker, PrerequisiteStatus};
use crate::ui::UserInterface;
use crate::workflow::host::Host;
use crate::workflow::summary::{ExecutionSummary, ExitStatus};
use std::time::Duration;

/// Run the detection variant.
pub fn run_detect(profile: &AppProfile, host: &Host<'_>, ui: &mut dyn UserInterface) -> ExecutionSummary {
    let mut summary = ExecutionSummary::new();
    let app = &profile.app;
    ui.show_header(&format!("Detecting {}", app.display_name));

    match PresenceDetector::new(app, host.store, host.env_fn).detect() {
        Presence::Found(record) => {
            let location = record.install_path.display();
            if record.version_unknown() {
                ui.warning(&format!("{} found at {} without version", app.display_name, location));
                summary.note(format!(
                    "{} installed at {}, version unknown",
                    app.display_name, location
                ));
            } else {
                ui.success(&format!("{} {} at {}", app.display_name, record.display_version, location));
                summary.push(format!(
                    "{} {} installed at {}",
                    app.display_name, record.display_version, location
                ));
            }
        }
        Presence::NotFound => {
            ui.error(&format!("{} is not installed", app.display_name));
            summary.fail(ExitStatus::Failure, format!("{} not installed", app.display_name));
            diagnose(profile, host, ui, &mut summary);
        }
    }

    summary
}

fn diagnose(profile: &AppProfile, host: &Host<'_>, ui: &mut dyn UserInterface, summary: &mut ExecutionSummary) {
    ui.message("Checking install prerequisites");
    let dependencies = profile.prerequisite_dependencies();
    let checker = PrerequisiteChecker::new(
        &profile.package_manager,
        &dependencies,
        host.store,
        host.path_entries.clone(),
    );
    let prerequisites = checker.check();
    for label in prerequisites.labels() {
        ui.warning(&format!("{} missing", label));
    }
    summary.push(describe_prerequisites(&prerequisites));

    if checker.package_manager_on_path().is_none() {
        if let Some(found) = PackageManagerLocator::new(&profile.package_manager, host.env_fn).locate() {
            summary.push(format!("package manager located at {}", found.display()));
        }
    }

    ui.message("Checking connectivity");
    let timeout = Duration::from_millis(profile.network.connect_timeout_ms);
    let connectivity = ConnectivityChecker::new(host.reachability, timeout).check(&profile.network.endpoints);
    for label in connectivity.labels() {
        ui.warning(&format!("{} unreachable", label));
    }
    summary.push(describe_connectivity(&connectivity, profile));
}

/// One summary entry for a prerequisite check.
pub fn describe_prerequisites(status: &PrerequisiteStatus) -> String {
    if status.is_ok() {
        format!("prerequisites present [{}]", status.legacy_code())
    } else {
        format!(
            "missing prerequisites [{}]: {}",
            status.legacy_code(),
            status.labels().join(", ")
        )
    }
}

/// One summary entry for a connectivity check.
pub fn describe_connectivity(status: &ConnectivityStatus, profile: &AppProfile) -> String {
    if status.is_ok() {
        let names: Vec<&str> = profile
            .network
            .endpoints
            .iter()
            .map(|e| e.name.as_str())
            .collect();
        format!(
            "endpoints reachable [{}]: {}",
            status.legacy_code(),
            names.join(", ")
        )
    } else {
        format!(
            "unreachable endpoints [{}]: {}",
            status.legacy_code(),
            status.labels().join(", ")
        )
    }
}
