//! Pre-flight sanity checks for the runtime environment
//!
//! Verified before anything is asked or changed:
//! - Running with root privileges (EUID 0)
//! - Account-management binaries are on PATH
//!
//! Failure prints a diagnostic to stderr and returns the matching error,
//! which `main` turns into exit status 1.

use crate::error::{AdminSwapError, Result};
use crate::platform::PlatformProfile;

/// Result of environment verification
#[derive(Debug)]
pub struct SanityCheckResult {
    pub missing_binaries: Vec<String>,
    pub is_root: bool,
}

impl SanityCheckResult {
    pub fn is_ok(&self) -> bool {
        self.missing_binaries.is_empty() && self.is_root
    }
}

/// Binaries used regardless of platform
const REQUIRED_BINARIES: &[&str] = &["useradd", "usermod", "passwd", "who", "pkill"];

/// Search PATH for an executable named `name`
fn binary_exists(name: &str) -> bool {
    use std::os::unix::fs::PermissionsExt;

    let Some(path) = std::env::var_os("PATH") else {
        return false;
    };
    std::env::split_paths(&path).any(|dir| {
        std::fs::metadata(dir.join(name))
            .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
    })
}

/// Check if running as root (EUID 0)
pub fn is_running_as_root() -> bool {
    nix::unistd::geteuid().is_root()
}

/// Binaries `profile` needs that are not on PATH
pub fn missing_binaries(profile: &PlatformProfile) -> Vec<String> {
    REQUIRED_BINARIES
        .iter()
        .copied()
        .chain(std::iter::once(profile.delete_mechanism.program()))
        .filter(|binary| !binary_exists(binary))
        .map(str::to_string)
        .collect()
}

/// Skip root check (for development/testing)
/// Set ADMINSWAP_SKIP_ROOT_CHECK=1 to skip
pub fn should_skip_root_check() -> bool {
    std::env::var("ADMINSWAP_SKIP_ROOT_CHECK")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Root check alone. Runs before the OS identification file is read.
pub fn ensure_root() -> Result<()> {
    if should_skip_root_check() {
        tracing::warn!("Root check skipped (ADMINSWAP_SKIP_ROOT_CHECK=1)");
        return Ok(());
    }
    if !is_running_as_root() {
        print_diagnostic(&SanityCheckResult {
            missing_binaries: vec![],
            is_root: false,
        });
        return Err(AdminSwapError::NotRoot);
    }
    Ok(())
}

/// Full check once the platform is known
pub fn verify_environment(profile: &PlatformProfile) -> SanityCheckResult {
    SanityCheckResult {
        missing_binaries: missing_binaries(profile),
        is_root: is_running_as_root() || should_skip_root_check(),
    }
}

/// Explain a failed check on stderr
pub fn print_diagnostic(result: &SanityCheckResult) {
    eprintln!();
    eprintln!("adminswap: pre-flight check failed");
    eprintln!();

    if !result.is_root {
        eprintln!("  ERROR: root privileges required");
        eprintln!("  Creating and removing accounts needs root. Run:");
        eprintln!("    sudo adminswap");
        eprintln!();
    }

    if !result.missing_binaries.is_empty() {
        eprintln!("  ERROR: missing required binaries");
        for binary in &result.missing_binaries {
            eprintln!("    - {} (package: {})", binary, package_for_binary(binary));
        }
        eprintln!();
    }
}

/// Package providing `binary` on Debian / RHEL families
fn package_for_binary(binary: &str) -> &'static str {
    match binary {
        "useradd" | "usermod" | "userdel" | "passwd" => "passwd / shadow-utils",
        "deluser" => "adduser",
        "who" => "coreutils",
        "pkill" => "procps / procps-ng",
        _ => "unknown",
    }
}

/// Run the full check
pub fn run_preflight_checks(profile: &PlatformProfile) -> Result<()> {
    tracing::debug!("Running pre-flight sanity checks...");

    let result = verify_environment(profile);
    if !result.is_ok() {
        print_diagnostic(&result);
        return Err(if result.is_root {
            AdminSwapError::MissingBinaries(result.missing_binaries)
        } else {
            AdminSwapError::NotRoot
        });
    }

    tracing::info!("Pre-flight checks passed");
    Ok(())
}
