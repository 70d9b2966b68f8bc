//! Error types for deskprov operations.
//!
//! This module defines [`DeskprovError`], the primary error type used
//! throughout the crate, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Expected absence (application or package manager not found) is never
//!   an error; components return `Option` or a status value instead
//! - Use `DeskprovError` for operational faults that a stage converts into
//!   a reported status
//! - Use `anyhow::Error` (via `DeskprovError::Other`) for unexpected errors

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for deskprov operations.
#[derive(Debug, Error)]
pub enum DeskprovError {
    /// Profile file not found at the requested location.
    #[error("Profile not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Failed to parse a profile file.
    #[error("Failed to parse profile at {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// Invalid profile structure or values.
    #[error("Invalid profile: {message}")]
    ConfigValidationError { message: String },

    /// A child process could not be spawned or waited on.
    #[error("Could not run {command}: {source}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// An HTTP request failed or returned a non-success status.
    #[error("Download of {url} failed: {message}")]
    Download { url: String, message: String },

    /// A downloaded artifact does not match its recorded hash.
    #[error("Hash mismatch for {file}: expected {expected}, got {actual}")]
    HashMismatch {
        file: String,
        expected: String,
        actual: String,
    },

    /// An artifact has no SHA-256 to be verified against.
    #[error("{file} has no pinned SHA-256; refusing to stage it unverified")]
    UnpinnedArtifact { file: String },

    /// An archive could not be read or did not contain the expected member.
    #[error("Archive error: {message}")]
    Archive { message: String },

    /// Running a step under another identity failed.
    #[error("Delegated execution failed: {message}")]
    Delegation { message: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for deskprov operations.
pub type Result<T> = std::result::Result<T, DeskprovError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_parse_error_displays_path_and_message() {
        let err = DeskprovError::ConfigParseError {
            path: PathBuf::from("/profile.yml"),
            message: "invalid syntax".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("/profile.yml"));
        assert!(msg.contains("invalid syntax"));
    }

    #[test]
    fn hash_mismatch_displays_both_digests() {
        let err = DeskprovError::HashMismatch {
            file: "bundle.msixbundle".into(),
            expected: "aa".into(),
            actual: "bb".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("bundle.msixbundle"));
        assert!(msg.contains("expected aa"));
        assert!(msg.contains("got bb"));
    }

    #[test]
    fn command_failed_displays_command_and_cause() {
        let err = DeskprovError::CommandFailed {
            command: "winget install".into(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied"),
        };
        let msg = err.to_string();
        assert!(msg.contains("winget install"));
        assert!(msg.contains("access denied"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn io_error_converts_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: DeskprovError = io_err.into();
        assert!(matches!(err, DeskprovError::Io(_)));
    }
}
