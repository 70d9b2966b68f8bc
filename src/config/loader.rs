//! Profile discovery and loading.
//!
//! A run uses exactly one profile: the file named by `--config` (or
//! `DESKPROV_CONFIG`) when given, otherwise the built-in defaults.

use crate::config::schema::AppProfile;
use crate::config::validator::validate;
use crate::error::{DeskprovError, Result};
use std::fs;
use std::path::Path;

/// Load a single profile file and parse it into [`AppProfile`].
///
/// # Errors
///
/// Returns `ConfigNotFound` if the file doesn't exist.
/// Returns `ConfigParseError` if the YAML is invalid.
pub fn load_profile_file(path: &Path) -> Result<AppProfile> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            DeskprovError::ConfigNotFound {
                path: path.to_path_buf(),
            }
        } else {
            DeskprovError::Io(e)
        }
    })?;

    parse_profile(&content, path)
}

/// Parse YAML content into [`AppProfile`].
///
/// An empty document yields the built-in defaults.
pub fn parse_profile(content: &str, source_path: &Path) -> Result<AppProfile> {
    if content.trim().is_empty() {
        return Ok(AppProfile::default());
    }
    serde_yaml::from_str(content).map_err(|e| DeskprovError::ConfigParseError {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Load and validate the profile for this run.
///
/// `app_id` overrides the profile's package identifier.
pub fn load_profile(path: Option<&Path>, app_id: Option<&str>) -> Result<AppProfile> {
    let mut profile = match path {
        Some(path) => {
            tracing::debug!("Loading profile from {}", path.display());
            load_profile_file(path)?
        }
        None => AppProfile::default(),
    };

    if let Some(id) = app_id {
        profile.app.id = id.to_string();
    }

    validate(&profile)?;
    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn load_profile_file_parses_valid_yaml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("profile.yml");
        fs::write(&path, "app:\n  id: Contoso.Editor\n  executable: editor.exe\n").unwrap();

        let profile = load_profile_file(&path).unwrap();
        assert_eq!(profile.app.id, "Contoso.Editor");
        assert_eq!(profile.app.executable, "editor.exe");
    }

    #[test]
    fn load_profile_file_reports_missing_file() {
        let temp = TempDir::new().unwrap();
        let result = load_profile_file(&temp.path().join("absent.yml"));
        assert!(matches!(result, Err(DeskprovError::ConfigNotFound { .. })));
    }

    #[test]
    fn parse_profile_reports_invalid_yaml() {
        let result = parse_profile("app: [unterminated", Path::new("bad.yml"));
        match result {
            Err(DeskprovError::ConfigParseError { path, .. }) => {
                assert_eq!(path, Path::new("bad.yml"));
            }
            other => panic!("Expected ConfigParseError, got {:?}", other),
        }
    }

    #[test]
    fn parse_profile_accepts_empty_content() {
        let profile = parse_profile("  \n", Path::new("empty.yml")).unwrap();
        assert_eq!(profile, AppProfile::default());
    }

    #[test]
    fn load_profile_without_path_uses_defaults() {
        let profile = load_profile(None, None).unwrap();
        assert_eq!(profile.app.id, "Mozilla.Firefox");
    }

    #[test]
    fn load_profile_applies_app_id_override() {
        let profile = load_profile(None, Some("Contoso.Editor")).unwrap();
        assert_eq!(profile.app.id, "Contoso.Editor");
    }

    #[test]
    fn load_profile_rejects_invalid_override() {
        let result = load_profile(None, Some("  "));
        assert!(matches!(
            result,
            Err(DeskprovError::ConfigValidationError { .. })
        ));
    }
}
