//! Self-healing of missing prerequisites.
//!
//! - [`bootstrap`] - Package manager bootstrap from the upstream release feed
//! - [`vc_runtime`] - Visual C++ runtime install
//! - [`identity`] - Running the install step as the interactive user
//! - [`staging`], [`download`], [`hashing`], [`archive`] - Artifact handling

pub mod archive;
pub mod bootstrap;
pub mod download;
pub mod error;
pub mod hashing;
pub mod identity;
pub mod staging;
pub mod vc_runtime;

pub use bootstrap::{BootstrapReport, Remediator};
pub use download::{Downloader, HttpDownloader, ReleaseAsset, ReleaseInfo};
pub use error::RemediationError;
pub use identity::{
    schtasks_path, ActiveUserResolver, CimUserResolver, DelegatedOutcome, DirectRunner,
    IdentityRunner, ScheduledTaskRunner,
};
pub use staging::{default_staging_root, StagingDir};
pub use vc_runtime::VcRuntimeInstaller;
