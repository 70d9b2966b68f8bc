//! Application profile loading, parsing, and validation.
//!
//! - Schema definitions and built-in defaults in [`schema`]
//! - File loading in [`loader`]
//! - Validation in [`validator`]
//!
//! # Example
//!
//! ```
//! use deskprov::config::{load_profile, validate};
//!
//! let profile = load_profile(None, Some("Contoso.Editor")).unwrap();
//! validate(&profile).unwrap();
//! assert_eq!(profile.app.id, "Contoso.Editor");
//! ```

pub mod loader;
pub mod schema;
pub mod validator;

pub use loader::{load_profile, load_profile_file, parse_profile};
pub use schema::{
    AppProfile, ApplicationConfig, DependencyArtifact, DependencySource, Endpoint, InstallConfig,
    NetworkConfig, PackageManagerConfig, RemediationConfig, RuntimeDependency, VcRuntimeConfig,
    DEPENDENCY_ARCHIVE,
};
pub use validator::{validate, validate_profile, ValidationError};
