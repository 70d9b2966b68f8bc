//! Version metadata embedded in Windows executables.
//!
//! Reads the `VS_FIXEDFILEINFO` block of the binary's version resource and
//! renders its file version as `major.minor.build.revision`. Parsing is done
//! on the raw bytes so it behaves the same on every host.

use std::path::Path;

/// `VS_FIXEDFILEINFO.dwSignature`, little-endian.
const FIXED_INFO_SIGNATURE: [u8; 4] = [0xBD, 0x04, 0xEF, 0xFE];

/// `dwStrucVersion` of every version resource written since Windows 3.1.
const FIXED_INFO_STRUCT_VERSION: u32 = 0x0001_0000;

/// Read the file version of the executable at `path`.
///
/// Returns `Ok(None)` when the file has no version resource.
pub fn read_file_version(path: &Path) -> std::io::Result<Option<String>> {
    let bytes = std::fs::read(path)?;
    Ok(parse_fixed_file_info(&bytes))
}

/// Find the first well-formed `VS_FIXEDFILEINFO` in `bytes`.
pub fn parse_fixed_file_info(bytes: &[u8]) -> Option<String> {
    let mut offset = 0;
    while let Some(found) = find_signature(&bytes[offset..]) {
        let start = offset + found;
        if let Some(version) = decode_at(bytes, start) {
            return Some(version);
        }
        offset = start + 1;
    }
    None
}

fn find_signature(haystack: &[u8]) -> Option<usize> {
    haystack
        .windows(FIXED_INFO_SIGNATURE.len())
        .position(|w| w == FIXED_INFO_SIGNATURE)
}

fn decode_at(bytes: &[u8], start: usize) -> Option<String> {
    // signature, struct version, file version MS, file version LS
    let block = bytes.get(start..start + 16)?;
    let struct_version = read_u32(&block[4..8]);
    if struct_version != FIXED_INFO_STRUCT_VERSION {
        return None;
    }
    let ms = read_u32(&block[8..12]);
    let ls = read_u32(&block[12..16]);
    Some(format!(
        "{}.{}.{}.{}",
        ms >> 16,
        ms & 0xFFFF,
        ls >> 16,
        ls & 0xFFFF
    ))
}

fn read_u32(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// Build a minimal `VS_FIXEDFILEINFO` block for the given version.
///
/// Used to fabricate versioned executables in tests.
pub fn fixed_file_info_bytes(major: u16, minor: u16, build: u16, revision: u16) -> Vec<u8> {
    let ms = (u32::from(major) << 16) | u32::from(minor);
    let ls = (u32::from(build) << 16) | u32::from(revision);
    let mut out = Vec::with_capacity(52);
    out.extend_from_slice(&FIXED_INFO_SIGNATURE);
    out.extend_from_slice(&FIXED_INFO_STRUCT_VERSION.to_le_bytes());
    out.extend_from_slice(&ms.to_le_bytes());
    out.extend_from_slice(&ls.to_le_bytes());
    // product version, flags mask, flags, OS, type, subtype, date
    out.extend_from_slice(&ms.to_le_bytes());
    out.extend_from_slice(&ls.to_le_bytes());
    out.extend_from_slice(&[0u8; 28]);
    out
}
