//! Profile validation rules.
//!
//! - The application needs an id, an executable and a subpath
//! - Legacy tags must be unique across every reported check
//! - Artifact URLs must be `https`
//! - Recorded hashes must be 64 hex digits
//! - Bootstrap artifacts need a pinned hash unless they are release assets
//! - Timeouts and the polling interval must be non-zero

use crate::config::schema::{AppProfile, DependencyArtifact};
use crate::error::{DeskprovError, Result};
use crate::remediation::hashing::is_sha256_hex;
use std::collections::HashMap;

/// Validation error with context.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Rule identifier
    pub rule: String,
    /// Human-readable error message
    pub message: String,
}

impl ValidationError {
    fn new(rule: &str, message: String) -> Self {
        Self {
            rule: rule.to_string(),
            message,
        }
    }
}

/// Validate a profile and return all errors.
///
/// Collects every error rather than stopping at the first one.
pub fn validate_profile(profile: &AppProfile) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    errors.extend(validate_application(profile));
    errors.extend(validate_tags(profile));
    errors.extend(validate_artifacts(profile));

    if profile.package_manager.executable.trim().is_empty() {
        errors.push(ValidationError::new(
            "missing-package-manager",
            "package_manager.executable must not be empty".to_string(),
        ));
    }

    errors.extend(validate_timeouts(profile));

    errors
}

fn validate_timeouts(profile: &AppProfile) -> Vec<ValidationError> {
    let durations = [
        ("network.connect_timeout_ms", profile.network.connect_timeout_ms),
        ("network.http_timeout_secs", profile.network.http_timeout_secs),
        ("remediation.task_timeout_secs", profile.remediation.task_timeout_secs),
        ("remediation.poll_interval_secs", profile.remediation.poll_interval_secs),
    ];

    durations
        .into_iter()
        .filter(|(_, value)| *value == 0)
        .map(|(field, _)| {
            ValidationError::new("zero-timeout", format!("{} must be greater than zero", field))
        })
        .collect()
}

fn validate_application(profile: &AppProfile) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let app = &profile.app;

    if app.id.trim().is_empty() {
        errors.push(ValidationError::new(
            "missing-app-id",
            "app.id must not be empty".to_string(),
        ));
    }
    if app.executable.trim().is_empty() {
        errors.push(ValidationError::new(
            "missing-executable",
            "app.executable must not be empty".to_string(),
        ));
    }
    if app.executable_subpath.trim().is_empty() {
        errors.push(ValidationError::new(
            "missing-subpath",
            "app.executable_subpath must not be empty".to_string(),
        ));
    }

    errors
}

fn validate_tags(profile: &AppProfile) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut seen: HashMap<char, String> = HashMap::new();

    let mut tagged: Vec<(char, String)> = vec![(
        profile.package_manager.tag,
        "package manager".to_string(),
    )];
    tagged.extend(
        profile
            .prerequisite_dependencies()
            .into_iter()
            .map(|d| (d.tag, d.name)),
    );
    tagged.extend(
        profile
            .network
            .endpoints
            .iter()
            .map(|e| (e.tag, e.name.clone())),
    );

    for (tag, owner) in tagged {
        if tag == '0' || !tag.is_ascii_alphanumeric() {
            errors.push(ValidationError::new(
                "invalid-tag",
                format!("Tag '{}' of {} must be an ASCII letter or digit other than '0'", tag, owner),
            ));
            continue;
        }
        if let Some(previous) = seen.insert(tag, owner.clone()) {
            errors.push(ValidationError::new(
                "duplicate-tag",
                format!("Tag '{}' is used by both {} and {}", tag, previous, owner),
            ));
        }
    }

    errors
}

fn validate_artifacts(profile: &AppProfile) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for artifact in &profile.remediation.artifacts {
        errors.extend(validate_artifact(artifact));
        if artifact.release_asset.is_none() && artifact.expected_sha256.is_none() {
            errors.push(ValidationError::new(
                "unpinned-artifact",
                format!(
                    "Artifact '{}' needs expected_sha256 or a release_asset with a published digest",
                    artifact.file_name
                ),
            ));
        }
    }

    let installer = &profile.vc_runtime.installer;
    errors.extend(validate_artifact(installer));
    if installer.release_asset.is_some() {
        errors.push(ValidationError::new(
            "invalid-release-asset",
            format!(
                "Installer '{}' is not part of the package manager release",
                installer.file_name
            ),
        ));
    }

    errors
}

fn validate_artifact(artifact: &DependencyArtifact) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let needs_url = artifact.release_asset.is_none() || !artifact.source_url.is_empty();
    if needs_url && !artifact.source_url.starts_with("https://") {
        errors.push(ValidationError::new(
            "insecure-url",
            format!(
                "Artifact '{}' must be downloaded over https: {}",
                artifact.file_name, artifact.source_url
            ),
        ));
    }

    if let Some(hash) = &artifact.expected_sha256 {
        if !is_sha256_hex(hash) {
            errors.push(ValidationError::new(
                "invalid-hash",
                format!(
                    "Artifact '{}' has a malformed SHA-256: {}",
                    artifact.file_name, hash
                ),
            ));
        }
    }

    if artifact.file_name.contains(['/', '\\']) {
        errors.push(ValidationError::new(
            "invalid-file-name",
            format!("Artifact file name '{}' must not contain a path", artifact.file_name),
        ));
    }

    errors
}

/// Validate and return Result (for convenience).
///
/// # Errors
///
/// Returns `ConfigValidationError` if any validation rules fail.
pub fn validate(profile: &AppProfile) -> Result<()> {
    let errors = validate_profile(profile);

    if errors.is_empty() {
        Ok(())
    } else {
        let messages: Vec<_> = errors.iter().map(|e| e.message.clone()).collect();
        Err(DeskprovError::ConfigValidationError {
            message: messages.join("; "),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::Endpoint;

    #[test]
    fn default_profile_is_valid() {
        assert!(validate_profile(&AppProfile::default()).is_empty());
    }

    #[test]
    fn rejects_empty_app_id() {
        let mut profile = AppProfile::default();
        profile.app.id = String::new();

        let errors = validate_profile(&profile);
        assert!(errors.iter().any(|e| e.rule == "missing-app-id"));
    }

    #[test]
    fn rejects_duplicate_tags() {
        let mut profile = AppProfile::default();
        profile.network.endpoints.push(Endpoint {
            name: "mirror".to_string(),
            host: "mirror.example.com".to_string(),
            port: 443,
            tag: 'W',
        });

        let errors = validate_profile(&profile);
        let dup = errors.iter().find(|e| e.rule == "duplicate-tag").unwrap();
        assert!(dup.message.contains("package manager"));
        assert!(dup.message.contains("mirror"));
    }

    #[test]
    fn rejects_success_sentinel_as_tag() {
        let mut profile = AppProfile::default();
        profile.package_manager.tag = '0';

        let errors = validate_profile(&profile);
        assert!(errors.iter().any(|e| e.rule == "invalid-tag"));
    }

    fn direct_artifact(expected_sha256: Option<String>) -> DependencyArtifact {
        DependencyArtifact {
            file_name: "Contoso.Runtime.appx".to_string(),
            source_url: "https://downloads.example.com/Contoso.Runtime.appx".to_string(),
            release_asset: None,
            expected_sha256,
            extract: None,
        }
    }

    #[test]
    fn rejects_plain_http_artifacts() {
        let mut profile = AppProfile::default();
        profile.remediation.artifacts[0].source_url = "http://example.com/a.appx".to_string();

        let errors = validate_profile(&profile);
        assert!(errors.iter().any(|e| e.rule == "insecure-url"));
    }

    #[test]
    fn rejects_unpinned_download_artifact() {
        let mut profile = AppProfile::default();
        profile.remediation.artifacts = vec![direct_artifact(None)];

        let errors = validate_profile(&profile);
        let unpinned = errors.iter().find(|e| e.rule == "unpinned-artifact").unwrap();
        assert!(unpinned.message.contains("Contoso.Runtime.appx"));
    }

    #[test]
    fn accepts_pinned_download_artifact() {
        let mut profile = AppProfile::default();
        profile.remediation.artifacts = vec![direct_artifact(Some("a".repeat(64)))];

        assert!(validate_profile(&profile).is_empty());
    }

    #[test]
    fn release_asset_needs_no_url() {
        let profile = AppProfile::default();
        assert!(profile.remediation.artifacts[0].source_url.is_empty());
        assert!(!validate_profile(&profile).iter().any(|e| e.rule == "insecure-url"));
    }

    #[test]
    fn rejects_zero_connect_and_http_timeouts() {
        let mut profile = AppProfile::default();
        profile.network.connect_timeout_ms = 0;
        profile.network.http_timeout_secs = 0;

        let errors = validate_profile(&profile);
        let zero: Vec<&str> = errors
            .iter()
            .filter(|e| e.rule == "zero-timeout")
            .map(|e| e.message.as_str())
            .collect();
        assert_eq!(zero.len(), 2);
        assert!(zero[0].contains("network.connect_timeout_ms"));
        assert!(zero[1].contains("network.http_timeout_secs"));
    }

    #[test]
    fn rejects_zero_poll_interval() {
        let mut profile = AppProfile::default();
        profile.remediation.poll_interval_secs = 0;

        let errors = validate_profile(&profile);
        assert!(errors
            .iter()
            .any(|e| e.rule == "zero-timeout" && e.message.contains("poll_interval_secs")));
    }

    #[test]
    fn rejects_malformed_hash() {
        let mut profile = AppProfile::default();
        profile.remediation.artifacts[0].expected_sha256 = Some("abc".to_string());

        let errors = validate_profile(&profile);
        assert!(errors.iter().any(|e| e.rule == "invalid-hash"));
    }

    #[test]
    fn collects_every_error() {
        let mut profile = AppProfile::default();
        profile.app.id = String::new();
        profile.app.executable = String::new();
        profile.remediation.task_timeout_secs = 0;

        let errors = validate_profile(&profile);
        assert!(errors.len() >= 3);
    }

    #[test]
    fn validate_joins_messages() {
        let mut profile = AppProfile::default();
        profile.app.id = String::new();
        profile.app.executable = String::new();

        let err = validate(&profile).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("app.id"));
        assert!(msg.contains("app.executable"));
    }
}
