//! Member extraction from zip-format dependency archives (`.nupkg`, `.zip`).

use crate::detection::matches_pattern;
use crate::error::{DeskprovError, Result};
use std::fs::File;
use std::path::{Path, PathBuf};

/// Extract the single member matching `member` from the zip archive at
/// `archive` into `dest_dir`.
///
/// `member` is a stored path with optional `*` wildcards, matched without
/// regard to case. No match and several matches are both errors. The
/// member is written under its file name only. Members whose stored path
/// escapes the archive root are rejected.
pub fn extract_member(archive: &Path, member: &str, dest_dir: &Path) -> Result<PathBuf> {
    let archive_err = |message: String| DeskprovError::Archive { message };

    let file = File::open(archive)?;
    let mut zip = zip::ZipArchive::new(file)
        .map_err(|e| archive_err(format!("{} is not a zip archive: {}", archive.display(), e)))?;

    let matching: Vec<String> = zip
        .file_names()
        .filter(|name| matches_pattern(name, member))
        .map(str::to_string)
        .collect();
    let stored = match matching.as_slice() {
        [one] => one.clone(),
        [] => {
            return Err(archive_err(format!(
                "{} has no member matching {}",
                archive.display(),
                member
            )))
        }
        many => {
            return Err(archive_err(format!(
                "{} has {} members matching {}: {}",
                archive.display(),
                many.len(),
                member,
                many.join(", ")
            )))
        }
    };

    let mut entry = zip
        .by_name(&stored)
        .map_err(|e| archive_err(format!("{} unreadable: {}", stored, e)))?;

    let enclosed = entry
        .enclosed_name()
        .ok_or_else(|| archive_err(format!("member {} has an unsafe path", stored)))?;
    let file_name = enclosed
        .file_name()
        .ok_or_else(|| archive_err(format!("member {} is not a file", stored)))?;

    let dest = dest_dir.join(file_name);
    let mut out = File::create(&dest)?;
    std::io::copy(&mut entry, &mut out)?;

    tracing::debug!("Extracted {} to {}", stored, dest.display());
    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        for (name, content) in entries {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .unwrap();
            writer.write_all(content).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn extracts_nested_member_by_file_name() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("ui.nupkg");
        write_zip(
            &archive,
            &[
                ("tools/AppX/x64/Release/Microsoft.UI.Xaml.2.8.appx", b"appx"),
                ("tools/AppX/arm64/Release/Microsoft.UI.Xaml.2.8.appx", b"arm"),
            ],
        );

        let out = extract_member(
            &archive,
            "tools/AppX/x64/Release/Microsoft.UI.Xaml.2.8.appx",
            temp.path(),
        )
        .unwrap();

        assert_eq!(out, temp.path().join("Microsoft.UI.Xaml.2.8.appx"));
        assert_eq!(std::fs::read(&out).unwrap(), b"appx");
    }

    #[test]
    fn wildcard_selects_the_architecture_member() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("DesktopAppInstaller_Dependencies.zip");
        write_zip(
            &archive,
            &[
                ("arm64/Microsoft.VCLibs.140.00.UWPDesktop_14.0.33728.0_arm64.appx", b"arm"),
                ("x64/Microsoft.VCLibs.140.00.UWPDesktop_14.0.33728.0_x64.appx", b"vclibs"),
                ("x64/Microsoft.UI.Xaml.2.8_8.2310.30001.0_x64.appx", b"xaml"),
            ],
        );

        let out = extract_member(&archive, "*Microsoft.VCLibs.140.00.UWPDesktop_*_x64.appx", temp.path())
            .unwrap();

        assert_eq!(
            out,
            temp.path().join("Microsoft.VCLibs.140.00.UWPDesktop_14.0.33728.0_x64.appx")
        );
        assert_eq!(std::fs::read(&out).unwrap(), b"vclibs");
    }

    #[test]
    fn ambiguous_member_pattern_is_an_archive_error() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("deps.zip");
        write_zip(&archive, &[("x64/a.appx", b"a"), ("x64/b.appx", b"b")]);

        let err = extract_member(&archive, "x64/*.appx", temp.path()).unwrap_err();
        assert!(err.to_string().contains("2 members"), "{}", err);
    }

    #[test]
    fn missing_member_is_an_archive_error() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("a.zip");
        write_zip(&archive, &[("one.txt", b"1")]);

        let err = extract_member(&archive, "two.txt", temp.path()).unwrap_err();
        assert!(matches!(err, DeskprovError::Archive { .. }));
    }

    #[test]
    fn traversal_member_is_rejected() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("evil.zip");
        write_zip(&archive, &[("../escape.appx", b"x")]);
        let dest = temp.path().join("out");
        std::fs::create_dir_all(&dest).unwrap();

        let result = extract_member(&archive, "../escape.appx", &dest);
        assert!(result.is_err());
        assert!(!temp.path().join("escape.appx").exists());
    }

    #[test]
    fn non_zip_input_is_an_archive_error() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("plain.nupkg");
        std::fs::write(&archive, "not a zip").unwrap();

        let err = extract_member(&archive, "x", temp.path()).unwrap_err();
        assert!(matches!(err, DeskprovError::Archive { .. }));
    }
}
