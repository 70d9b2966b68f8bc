use crate::detection::MetadataStore;
use crate::network::Reachability;
use crate::remediation::{Downloader, IdentityRunner};
use crate::shell::{EnvFn, ProcessRunner};
use std::path::PathBuf;

/// The host-facing collaborators a workflow runs against.
///
/// Production wiring lives in the CLI commands; tests substitute fakes for
/// every field.
pub struct Host<'a> {
    /// Uninstall records and installed packages
    pub store: &'a dyn MetadataStore,
    /// Child process spawning
    pub runner: &'a dyn ProcessRunner,
    /// Release metadata and artifact downloads
    pub downloader: &'a dyn Downloader,
    /// Endpoint probes
    pub reachability: &'a dyn Reachability,
    /// Identity the package manager bootstrap installs as
    pub identity: &'a dyn IdentityRunner,
    /// Environment lookup
    pub env_fn: EnvFn<'a>,
    /// Execution path entries
    pub path_entries: Vec<PathBuf>,
    /// Root for per-stage staging directories
    pub staging_root: PathBuf,
}
