//! SHA-256 verification of staged artifacts.

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Lowercase hex SHA-256 of a file's content.
pub fn sha256_file(path: &Path) -> std::io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Whether `value` is a bare SHA-256 hex digest.
pub fn is_sha256_hex(value: &str) -> bool {
    value.len() == 64 && value.chars().all(|c| c.is_ascii_hexdigit())
}

/// Normalize a digest such as `sha256:ABCD...` to bare lowercase hex.
///
/// Returns `None` for digests of other algorithms and malformed values.
pub fn normalize_digest(digest: &str) -> Option<String> {
    let digest = digest.trim();
    let hex_part = match digest.split_once(':') {
        Some((algo, rest)) if algo.eq_ignore_ascii_case("sha256") => rest,
        Some(_) => return None,
        None => digest,
    };
    is_sha256_hex(hex_part).then(|| hex_part.to_ascii_lowercase())
}

/// Whether the file at `path` exists and hashes to `expected`.
pub fn matches_hash(path: &Path, expected: &str) -> bool {
    if !path.is_file() {
        return false;
    }
    match sha256_file(path) {
        Ok(actual) => actual.eq_ignore_ascii_case(expected),
        Err(e) => {
            tracing::debug!("Could not hash {}: {}", path.display(), e);
            false
        }
    }
}
