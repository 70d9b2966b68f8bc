//! Target application detection.
//!
//! - [`presence`] - Canonical-path and uninstall-record lookup
//! - [`registry`] - Installed-software metadata store
//! - [`version`] - Version resource parsing

pub mod presence;
pub mod registry;
pub mod version;

pub use presence::{InstallationRecord, Presence, PresenceDetector, UNKNOWN_VERSION};
pub use registry::{
    escape_wildcard, matches_pattern, wildcard_pattern, MetadataStore, StaticStore, SystemStore,
    UninstallRecord,
};
pub use version::read_file_version;
