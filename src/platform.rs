//! Platform profile resolution
//!
//! Reads the OS identification file (`/etc/os-release`) once at startup and
//! classifies the host into an [`OsFamily`]. The family decides which group
//! grants sudo rights and which tool removes accounts. The result is an
//! immutable [`PlatformProfile`] passed down explicitly to every component.
//!
//! # Family Table
//!
//! | Family  | Admin group | Deletion  |
//! |---------|-------------|-----------|
//! | Debian  | `sudo`      | `deluser` |
//! | RHEL    | `wheel`     | `userdel` |
//! | Unknown | `sudo`      | `userdel` |
//!
//! Neither deletion tool removes the home directory unless asked to, and
//! adminswap never asks.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use serde::Serialize;
use strum::{Display, EnumString};
use tracing::{debug, info, warn};

use crate::error::{AdminSwapError, Result};

/// Conventional location of the OS identification file.
pub const OS_RELEASE_PATH: &str = "/etc/os-release";

/// Default account assumed when no session hint is available.
pub const FALLBACK_DEFAULT_ACCOUNT: &str = "ubuntu";

/// Environment variable naming the account that invoked sudo.
pub const SESSION_HINT_VAR: &str = "SUDO_USER";

const DEBIAN_IDS: &[&str] = &["debian", "ubuntu"];
const RHEL_IDS: &[&str] = &["rhel", "fedora", "centos", "rocky", "almalinux", "amzn", "ol"];

/// Broad OS family, as far as account management is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OsFamily {
    /// Debian, Ubuntu and derivatives
    Debian,
    /// RHEL, Fedora, CentOS, Rocky, Alma, Amazon Linux, Oracle Linux
    Rhel,
    /// Anything else; conservative fallbacks apply
    Unknown,
}

/// Tool used to remove an account from the account database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DeleteMechanism {
    /// Debian's `deluser`; keeps the home directory without `--remove-home`
    Deluser,
    /// shadow-utils `userdel`; keeps the home directory without `-r`
    Userdel,
}

impl DeleteMechanism {
    /// Binary invoked for this mechanism.
    pub fn program(self) -> &'static str {
        match self {
            Self::Deluser => "deluser",
            Self::Userdel => "userdel",
        }
    }

    /// Command the operator can run later to finish a skipped removal.
    pub fn manual_command(self, username: &str) -> String {
        format!("sudo pkill -u {username}; sudo {} {username}", self.program())
    }
}

/// Immutable description of how this host manages accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformProfile {
    /// Value of `ID` in the identification file (empty if absent)
    pub distro_id: String,
    pub family: OsFamily,
    /// Group whose members may use sudo
    pub admin_group: String,
    pub delete_mechanism: DeleteMechanism,
}

impl PlatformProfile {
    /// Profile for a known family.
    pub fn for_family(family: OsFamily, distro_id: impl Into<String>) -> Self {
        let (admin_group, delete_mechanism) = match family {
            OsFamily::Debian => ("sudo", DeleteMechanism::Deluser),
            OsFamily::Rhel => ("wheel", DeleteMechanism::Userdel),
            OsFamily::Unknown => ("sudo", DeleteMechanism::Userdel),
        };
        Self {
            distro_id: distro_id.into(),
            family,
            admin_group: admin_group.to_string(),
            delete_mechanism,
        }
    }

    /// Resolve a profile from the contents of an os-release file.
    pub fn from_os_release(content: &str) -> Self {
        let fields = parse_os_release(content);
        let id = fields.get("ID").map(String::as_str).unwrap_or_default();
        let id_like = fields.get("ID_LIKE").map(String::as_str).unwrap_or_default();
        let family = classify(id, id_like);

        debug!("os-release ID={:?} ID_LIKE={:?} -> {}", id, id_like, family);
        Self::for_family(family, id)
    }

    /// Read and resolve the identification file at `path`.
    ///
    /// A missing file is fatal: without it there are no safe defaults for
    /// the group or the deletion tool. An unrecognized distribution is not.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(AdminSwapError::PlatformSourceMissing(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        let profile = Self::from_os_release(&content);

        if profile.family == OsFamily::Unknown {
            warn!(
                "Unrecognized distribution {:?}; falling back to group '{}' and {}",
                profile.distro_id,
                profile.admin_group,
                profile.delete_mechanism.program()
            );
        } else {
            info!("Platform profile: {}", profile);
        }
        Ok(profile)
    }
}

impl fmt::Display for PlatformProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}), admin group '{}', removal via {}",
            if self.distro_id.is_empty() { "unknown" } else { self.distro_id.as_str() },
            self.family,
            self.admin_group,
            self.delete_mechanism.program()
        )
    }
}

/// Parse `KEY=value` lines, stripping one level of single or double quotes.
///
/// Comments and malformed lines are ignored.
pub fn parse_os_release(content: &str) -> HashMap<String, String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim().to_string(), unquote(value.trim()).to_string()))
        .collect()
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

/// Classify by `ID` first, then by each token of `ID_LIKE`.
pub fn classify(id: &str, id_like: &str) -> OsFamily {
    std::iter::once(id)
        .chain(id_like.split_whitespace())
        .map(str::to_ascii_lowercase)
        .find_map(|token| {
            if DEBIAN_IDS.contains(&token.as_str()) {
                Some(OsFamily::Debian)
            } else if RHEL_IDS.contains(&token.as_str()) {
                Some(OsFamily::Rhel)
            } else {
                None
            }
        })
        .unwrap_or(OsFamily::Unknown)
}

/// Pick the account to decommission.
///
/// An explicit override wins, then the session hint, then
/// [`FALLBACK_DEFAULT_ACCOUNT`]. A hint naming `root` is ignored so the
/// workflow never offers to remove root.
pub fn resolve_default_account(explicit: Option<&str>, session_hint: Option<&str>) -> String {
    let usable = |name: &&str| !name.trim().is_empty() && name.trim() != "root";

    if let Some(name) = explicit.filter(usable) {
        return name.trim().to_string();
    }
    match session_hint.filter(usable) {
        Some(name) => name.trim().to_string(),
        None => {
            debug!(
                "No usable {} hint, assuming default account '{}'",
                SESSION_HINT_VAR, FALLBACK_DEFAULT_ACCOUNT
            );
            FALLBACK_DEFAULT_ACCOUNT.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const UBUNTU: &str = r#"PRETTY_NAME="Ubuntu 22.04.4 LTS"
NAME="Ubuntu"
VERSION_ID="22.04"
ID=ubuntu
ID_LIKE=debian
"#;

    const AMAZON: &str = r#"NAME="Amazon Linux"
VERSION="2023"
ID="amzn"
ID_LIKE="fedora"
"#;

    #[test]
    fn test_debian_like_profile() {
        let profile = PlatformProfile::from_os_release(UBUNTU);
        assert_eq!(profile.family, OsFamily::Debian);
        assert_eq!(profile.admin_group, "sudo");
        assert_eq!(profile.delete_mechanism, DeleteMechanism::Deluser);
        assert_eq!(profile.distro_id, "ubuntu");
    }

    #[test]
    fn test_rhel_like_profile() {
        let profile = PlatformProfile::from_os_release(AMAZON);
        assert_eq!(profile.family, OsFamily::Rhel);
        assert_eq!(profile.admin_group, "wheel");
        assert_eq!(profile.delete_mechanism, DeleteMechanism::Userdel);
    }

    #[test]
    fn test_id_like_fallback() {
        assert_eq!(classify("linuxmint", "ubuntu debian"), OsFamily::Debian);
        assert_eq!(classify("fancyos", "rhel centos fedora"), OsFamily::Rhel);
        assert_eq!(classify("arch", ""), OsFamily::Unknown);
    }

    #[test]
    fn test_unknown_profile_is_conservative() {
        let profile = PlatformProfile::from_os_release("ID=alpine\n");
        assert_eq!(profile.family, OsFamily::Unknown);
        assert_eq!(profile.admin_group, "sudo");
        assert_eq!(profile.delete_mechanism, DeleteMechanism::Userdel);
    }

    #[test]
    fn test_parse_strips_quotes_and_comments() {
        let fields = parse_os_release("# comment\nNAME='Rocky Linux'\nID=\"rocky\"\ngarbage\n");
        assert_eq!(fields.get("NAME").map(String::as_str), Some("Rocky Linux"));
        assert_eq!(fields.get("ID").map(String::as_str), Some("rocky"));
        assert_eq!(fields.len(), 2);
    }

    #[test]
    fn test_load_missing_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = PlatformProfile::load(&dir.path().join("os-release")).unwrap_err();
        assert!(matches!(err, AdminSwapError::PlatformSourceMissing(_)));
    }

    #[test]
    fn test_load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(UBUNTU.as_bytes()).unwrap();
        let profile = PlatformProfile::load(file.path()).unwrap();
        assert_eq!(profile.family, OsFamily::Debian);
    }

    #[test]
    fn test_default_account_resolution() {
        assert_eq!(resolve_default_account(None, Some("ec2-user")), "ec2-user");
        assert_eq!(resolve_default_account(None, None), FALLBACK_DEFAULT_ACCOUNT);
        assert_eq!(resolve_default_account(None, Some("")), FALLBACK_DEFAULT_ACCOUNT);
        assert_eq!(resolve_default_account(None, Some("root")), FALLBACK_DEFAULT_ACCOUNT);
        assert_eq!(resolve_default_account(Some("admin"), Some("ec2-user")), "admin");
    }

    #[test]
    fn test_manual_command_mentions_mechanism() {
        assert_eq!(
            DeleteMechanism::Deluser.manual_command("ubuntu"),
            "sudo pkill -u ubuntu; sudo deluser ubuntu"
        );
        assert!(DeleteMechanism::Userdel.manual_command("ec2-user").ends_with("userdel ec2-user"));
    }

    #[test]
    fn test_family_display_and_parse() {
        assert_eq!(OsFamily::Rhel.to_string(), "rhel");
        assert_eq!("debian".parse::<OsFamily>().unwrap(), OsFamily::Debian);
        assert_eq!("userdel".parse::<DeleteMechanism>().unwrap(), DeleteMechanism::Userdel);
    }
}
