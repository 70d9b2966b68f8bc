//! Processor architecture of the host.

use crate::shell::EnvFn;

/// Native processor architecture in Windows naming (`AMD64`, `ARM64`, `x86`).
///
/// A 32-bit process on a 64-bit OS sees `PROCESSOR_ARCHITECTURE=x86`; the
/// native value is then in `PROCESSOR_ARCHITEW6432`.
pub fn native_architecture(env_fn: EnvFn<'_>) -> String {
    env_fn("PROCESSOR_ARCHITEW6432")
        .or_else(|| env_fn("PROCESSOR_ARCHITECTURE"))
        .unwrap_or_else(|| from_target_arch(std::env::consts::ARCH).to_string())
}

fn from_target_arch(arch: &str) -> &str {
    match arch {
        "x86_64" => "AMD64",
        "aarch64" => "ARM64",
        "x86" => "x86",
        other => other,
    }
}

/// Whether `arch` is in the supported list (case-insensitive).
pub fn is_supported(arch: &str, supported: &[String]) -> bool {
    supported.iter().any(|s| s.eq_ignore_ascii_case(arch))
}
