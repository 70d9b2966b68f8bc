//! Production wiring shared by the workflow commands.

use std::path::Path;
use std::time::Duration;

use crate::config::{load_profile, AppProfile};
use crate::detection::SystemStore;
use crate::error::Result;
use crate::network::TcpReachability;
use crate::remediation::{
    default_staging_root, schtasks_path, CimUserResolver, DirectRunner, HttpDownloader,
    IdentityRunner, ScheduledTaskRunner,
};
use crate::requirements::parse_system_path;
use crate::shell::{is_system_account, powershell_path, system_env, EnvFn, SystemRunner};
use crate::ui::UserInterface;
use crate::workflow::{ExecutionSummary, ExitStatus, Host};

use super::dispatcher::CommandResult;

/// Load the run's profile, or the result reporting why it is unusable.
pub fn load_or_report(
    path: Option<&Path>,
    app_id: Option<&str>,
    ui: &mut dyn UserInterface,
) -> std::result::Result<AppProfile, CommandResult> {
    load_profile(path, app_id).map_err(|e| {
        tracing::error!("Profile rejected: {}", e);
        ui.error(&e.to_string());
        let mut summary = ExecutionSummary::new();
        summary.fail(ExitStatus::ConfigInvalid, e.to_string());
        CommandResult::from_summary(summary)
    })
}

/// Build the real host collaborators and run `f` against them.
///
/// When running as LocalSystem the package manager bootstrap is delegated
/// to the interactive user through a one-shot scheduled task.
pub fn with_system_host<R>(profile: &AppProfile, f: impl FnOnce(&Host<'_>) -> R) -> Result<R> {
    let env_fn: EnvFn<'_> = &system_env;
    let runner = SystemRunner;
    let store = SystemStore::new(&runner, env_fn);
    let downloader = HttpDownloader::new(
        Duration::from_millis(profile.network.connect_timeout_ms),
        Duration::from_secs(profile.network.http_timeout_secs),
    )?;
    let reachability = TcpReachability;

    let powershell = powershell_path(env_fn);
    let task_timeout = Duration::from_secs(profile.remediation.task_timeout_secs);
    let users = CimUserResolver::new(&runner, powershell.clone());
    let scheduled;
    let direct;
    let identity: &dyn IdentityRunner = if is_system_account(env_fn) {
        tracing::debug!("Running as SYSTEM, delegating bootstrap to the active user");
        scheduled = ScheduledTaskRunner::new(
            &runner,
            &users,
            schtasks_path(env_fn),
            powershell,
            &profile.remediation.task_name,
            task_timeout,
            Duration::from_secs(profile.remediation.poll_interval_secs),
        );
        &scheduled
    } else {
        direct = DirectRunner::new(&runner, powershell, task_timeout);
        &direct
    };

    let staging_root = profile
        .remediation
        .staging_dir
        .clone()
        .unwrap_or_else(|| default_staging_root(env_fn));

    let host = Host {
        store: &store,
        runner: &runner,
        downloader: &downloader,
        reachability: &reachability,
        identity,
        env_fn,
        path_entries: parse_system_path(),
        staging_root,
    };
    Ok(f(&host))
}
