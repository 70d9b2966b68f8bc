//! Environment prerequisites for the install workflow.
//!
//! # Modules
//!
//! - [`architecture`] - Native processor architecture
//! - [`checker`] - Package manager and runtime dependency checks
//! - [`locator`] - Package manager discovery in candidate directories
//! - [`probe`] - Execution-path lookup
//! - [`status`] - Composite status sets and legacy tags

pub mod architecture;
pub mod checker;
pub mod locator;
pub mod probe;
pub mod status;

pub use architecture::{is_supported, native_architecture};
pub use checker::PrerequisiteChecker;
pub use locator::PackageManagerLocator;
pub use probe::{parse_system_path, resolve_tool_path};
pub use status::{Prerequisite, PrerequisiteStatus, StatusSet, Tagged, SUCCESS_SENTINEL};
