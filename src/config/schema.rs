//! Application profile schema.
//!
//! The profile describes the single target application together with
//! everything the preflight and install workflows need to know about the
//! host: where the package manager lives, which runtime components it
//! depends on, which endpoints must be reachable and which artifacts the
//! bootstrap stages. Every section has built-in defaults so an empty YAML
//! document is a valid profile.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root profile structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AppProfile {
    /// Target application
    pub app: ApplicationConfig,

    /// Package manager discovery
    pub package_manager: PackageManagerConfig,

    /// Runtime components the package manager depends on
    pub runtime_dependencies: Vec<RuntimeDependency>,

    /// Visual C++ runtime prerequisite of the target application
    pub vc_runtime: VcRuntimeConfig,

    /// Outbound reachability checks
    pub network: NetworkConfig,

    /// Package manager bootstrap
    pub remediation: RemediationConfig,

    /// Install invocation
    pub install: InstallConfig,

    /// Processor architectures the install variant accepts
    pub supported_architectures: Vec<String>,
}

/// The application being detected and installed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ApplicationConfig {
    /// Package identifier passed to the package manager
    pub id: String,

    /// Human-readable application name
    pub display_name: String,

    /// File name of the main executable
    pub executable: String,

    /// Canonical install directories, probed in order
    pub install_dirs: Vec<String>,

    /// Display-name patterns matched against uninstall records (`*` wildcards)
    pub display_name_patterns: Vec<String>,

    /// Executable path relative to a record's install location
    pub executable_subpath: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            id: "Mozilla.Firefox".to_string(),
            display_name: "Mozilla Firefox".to_string(),
            executable: "firefox.exe".to_string(),
            install_dirs: vec![
                r"%ProgramFiles%\Mozilla Firefox".to_string(),
                r"%ProgramFiles(x86)%\Mozilla Firefox".to_string(),
            ],
            display_name_patterns: vec!["Mozilla Firefox*".to_string()],
            executable_subpath: "firefox.exe".to_string(),
        }
    }
}

/// Where to look for the package manager executable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PackageManagerConfig {
    /// Executable name, resolved on PATH first
    pub executable: String,

    /// Legacy tag reported when the package manager is missing
    pub tag: char,

    /// Candidate directories in priority order; may contain `*` wildcards
    /// and `%VAR%` environment references
    pub candidate_dirs: Vec<String>,
}

impl Default for PackageManagerConfig {
    fn default() -> Self {
        Self {
            executable: "winget.exe".to_string(),
            tag: 'W',
            candidate_dirs: vec![
                r"%ProgramFiles%\WindowsApps\Microsoft.DesktopAppInstaller_*_x64__8wekyb3d8bbwe"
                    .to_string(),
                r"%ProgramFiles%\WindowsApps\Microsoft.DesktopAppInstaller_*_arm64__8wekyb3d8bbwe"
                    .to_string(),
                r"%LOCALAPPDATA%\Microsoft\WindowsApps".to_string(),
                r"%SystemDrive%\Users\*\AppData\Local\Microsoft\WindowsApps".to_string(),
            ],
        }
    }
}

/// Where a runtime dependency is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DependencySource {
    /// Classic uninstall records (`...\CurrentVersion\Uninstall`)
    UninstallRegistry,
    /// Installed Appx/MSIX packages
    AppxPackage,
}

/// A named runtime component matched by name pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RuntimeDependency {
    /// Display name used in summaries
    pub name: String,

    /// Single-character legacy tag
    pub tag: char,

    /// Name pattern (`*` wildcards)
    pub pattern: String,

    /// Which store to query
    pub source: DependencySource,
}

fn default_runtime_dependencies() -> Vec<RuntimeDependency> {
    vec![
        RuntimeDependency {
            name: "VCLibs".to_string(),
            tag: 'V',
            pattern: "Microsoft.VCLibs.140.00.UWPDesktop_*".to_string(),
            source: DependencySource::AppxPackage,
        },
        RuntimeDependency {
            name: "UI.Xaml".to_string(),
            tag: 'X',
            pattern: "Microsoft.UI.Xaml.2.8_*".to_string(),
            source: DependencySource::AppxPackage,
        },
    ]
}

/// The Visual C++ runtime checked by the install variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct VcRuntimeConfig {
    /// Display name used in summaries
    pub name: String,

    /// Single-character legacy tag
    pub tag: char,

    /// Display-name pattern matched against uninstall records
    pub pattern: String,

    /// Redistributable installer
    pub installer: DependencyArtifact,

    /// Installer exit codes treated as success
    pub success_exit_codes: Vec<i32>,
}

impl VcRuntimeConfig {
    /// The runtime as a prerequisite entry.
    pub fn as_dependency(&self) -> RuntimeDependency {
        RuntimeDependency {
            name: self.name.clone(),
            tag: self.tag,
            pattern: self.pattern.clone(),
            source: DependencySource::UninstallRegistry,
        }
    }
}

impl Default for VcRuntimeConfig {
    fn default() -> Self {
        Self {
            name: "VCRuntime".to_string(),
            tag: 'C',
            pattern: "Microsoft Visual C++ 2015-2022 Redistributable (x64)*".to_string(),
            // The evergreen redistributable has no fixed digest; a deployment
            // pins the build it ships or the install is refused.
            installer: DependencyArtifact {
                file_name: "vc_redist.x64.exe".to_string(),
                source_url: "https://aka.ms/vs/17/release/vc_redist.x64.exe".to_string(),
                release_asset: None,
                expected_sha256: None,
                extract: None,
            },
            // 3010: success, reboot required
            success_exit_codes: vec![0, 3010],
        }
    }
}

/// A named outbound endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Endpoint {
    /// Display name used in summaries
    pub name: String,

    /// Host name or address
    pub host: String,

    /// TCP port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Single-character legacy tag
    pub tag: char,
}

fn default_port() -> u16 {
    443
}

/// Connectivity settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct NetworkConfig {
    /// Endpoints probed in order
    pub endpoints: Vec<Endpoint>,

    /// Per-endpoint handshake timeout in milliseconds
    pub connect_timeout_ms: u64,

    /// Deadline for the release metadata request in seconds; artifact
    /// downloads are bounded by the connect timeout only
    pub http_timeout_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            endpoints: vec![
                Endpoint {
                    name: "distribution".to_string(),
                    host: "download-installer.cdn.mozilla.net".to_string(),
                    port: 443,
                    tag: 'D',
                },
                Endpoint {
                    name: "registry".to_string(),
                    host: "cdn.winget.microsoft.com".to_string(),
                    port: 443,
                    tag: 'R',
                },
            ],
            connect_timeout_ms: 3000,
            http_timeout_secs: 120,
        }
    }
}

/// A file the bootstrap downloads and stages.
///
/// Every artifact must be verifiable: either `expected_sha256` is set or
/// the file is a `release_asset` whose digest the release feed publishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DependencyArtifact {
    /// File name inside the staging directory
    pub file_name: String,

    /// Download URL, unused for release assets
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source_url: String,

    /// Name of the package manager release asset providing the file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_asset: Option<String>,

    /// Lowercase hex SHA-256 of the downloaded file; overrides a release
    /// asset's published digest
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_sha256: Option<String>,

    /// Archive member to extract after download (`*` wildcards, zip
    /// archives only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extract: Option<String>,
}

/// Release asset bundling the package manager's framework dependencies.
pub const DEPENDENCY_ARCHIVE: &str = "DesktopAppInstaller_Dependencies.zip";

fn dependency_from_archive(member: &str) -> DependencyArtifact {
    DependencyArtifact {
        file_name: DEPENDENCY_ARCHIVE.to_string(),
        source_url: String::new(),
        release_asset: Some(DEPENDENCY_ARCHIVE.to_string()),
        expected_sha256: None,
        extract: Some(member.to_string()),
    }
}

/// Package manager bootstrap settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct RemediationConfig {
    /// Release metadata feed (GitHub releases API format)
    pub release_feed: String,

    /// Suffix identifying the main bundle among the release assets
    pub bundle_suffix: String,

    /// Shared-library dependencies, installed in this order
    pub artifacts: Vec<DependencyArtifact>,

    /// Staging directory (defaults to `%ProgramData%\deskprov`, or the
    /// system temp dir when `ProgramData` is unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub staging_dir: Option<PathBuf>,

    /// Name of the transient scheduled task
    pub task_name: String,

    /// Ceiling for the delegated install in seconds
    pub task_timeout_secs: u64,

    /// Task state polling interval in seconds
    pub poll_interval_secs: u64,
}

impl Default for RemediationConfig {
    fn default() -> Self {
        Self {
            release_feed: "https://api.github.com/repos/microsoft/winget-cli/releases/latest"
                .to_string(),
            bundle_suffix: ".msixbundle".to_string(),
            artifacts: vec![
                dependency_from_archive("*Microsoft.VCLibs.140.00.UWPDesktop_*_x64.appx"),
                dependency_from_archive("*Microsoft.UI.Xaml.2.8_*_x64.appx"),
            ],
            staging_dir: None,
            task_name: "deskprov-bootstrap".to_string(),
            task_timeout_secs: 300,
            poll_interval_secs: 5,
        }
    }
}

/// Install invocation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct InstallConfig {
    /// Install scope passed with `--scope`
    pub scope: String,

    /// Exit codes meaning "already installed / nothing to upgrade"
    pub no_op_exit_codes: Vec<i32>,

    /// Ceiling for the install process in seconds (none when absent)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            scope: "machine".to_string(),
            no_op_exit_codes: vec![
                // APPINSTALLER_CLI_ERROR_UPDATE_NOT_APPLICABLE (0x8A15002B)
                0x8A15_002Bu32 as i32,
                // APPINSTALLER_CLI_ERROR_PACKAGE_ALREADY_INSTALLED (0x8A150061)
                0x8A15_0061u32 as i32,
            ],
            timeout_secs: None,
        }
    }
}

// The default artifacts and VC runtime are x64 builds.
fn default_architectures() -> Vec<String> {
    vec!["AMD64".to_string()]
}

impl Default for AppProfile {
    fn default() -> Self {
        Self {
            app: ApplicationConfig::default(),
            package_manager: PackageManagerConfig::default(),
            runtime_dependencies: default_runtime_dependencies(),
            vc_runtime: VcRuntimeConfig::default(),
            network: NetworkConfig::default(),
            remediation: RemediationConfig::default(),
            install: InstallConfig::default(),
            supported_architectures: default_architectures(),
        }
    }
}

impl AppProfile {
    /// Runtime dependencies plus the VC runtime, in reporting order.
    pub fn prerequisite_dependencies(&self) -> Vec<RuntimeDependency> {
        let mut deps = self.runtime_dependencies.clone();
        deps.push(self.vc_runtime.as_dependency());
        deps
    }
}
