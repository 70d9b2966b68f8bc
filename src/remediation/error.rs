//! Remediation failure classification.
//!
//! Only a timed-out delegated install is ambiguous: the package may still
//! land, so the caller re-checks before reporting failure.

use crate::error::DeskprovError;
use thiserror::Error;

/// Failure of a bootstrap or runtime install.
#[derive(Debug, Error)]
pub enum RemediationError {
    /// The release feed could not be fetched or parsed.
    #[error("Release feed {url} unusable: {message}")]
    Feed { url: String, message: String },

    /// No release asset carries the bundle suffix.
    #[error("Release {tag} has no asset ending in {suffix}")]
    MissingBundle { tag: String, suffix: String },

    /// A profile-named asset is absent from the release.
    #[error("Release {tag} has no asset named {name}")]
    MissingAsset { tag: String, name: String },

    /// Staging, verification, extraction or delegation failed.
    #[error(transparent)]
    Operation(#[from] DeskprovError),

    /// The package install ran but reported failure.
    #[error("{step} failed with exit code {code:?}")]
    InstallFailed { step: String, code: Option<i32> },

    /// The delegated install did not reach a terminal state in time.
    #[error("{step} did not finish within {seconds} seconds")]
    TimedOut { step: String, seconds: u64 },
}

impl From<std::io::Error> for RemediationError {
    fn from(e: std::io::Error) -> Self {
        RemediationError::Operation(DeskprovError::Io(e))
    }
}

impl RemediationError {
    /// Whether the outcome is unknown rather than a definite failure.
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, RemediationError::TimedOut { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_timeouts_are_ambiguous() {
        let timeout = RemediationError::TimedOut {
            step: "package install".to_string(),
            seconds: 300,
        };
        let failed = RemediationError::InstallFailed {
            step: "package install".to_string(),
            code: Some(1),
        };
        assert!(timeout.is_ambiguous());
        assert!(!failed.is_ambiguous());
        assert!(timeout.to_string().contains("300 seconds"));
    }

    #[test]
    fn hash_mismatch_passes_through_display() {
        let err: RemediationError = DeskprovError::HashMismatch {
            file: "bundle.msixbundle".to_string(),
            expected: "aa".to_string(),
            actual: "bb".to_string(),
        }
        .into();
        assert!(err.to_string().contains("bundle.msixbundle"));
    }
}
