//! Type-safe OS command contracts.
//!
//! Every account-management facility adminswap touches is described by a
//! struct implementing [`CommandArgs`]. The struct definition IS the
//! contract: flag spelling lives in exactly one place, and the execution
//! layer ([`crate::command_runner`]) never builds argument vectors by hand.
//!
//! | Struct                  | Command                              |
//! |-------------------------|--------------------------------------|
//! | `CreateUserArgs`        | `useradd -m -s <shell> <user>`       |
//! | `SetPasswordArgs`       | `passwd <user>` (interactive)        |
//! | `AddToGroupArgs`        | `usermod -aG <group> <user>`         |
//! | `KillUserProcessesArgs` | `pkill -KILL -u <user>`              |
//! | `DeleteUserArgs`        | `deluser <user>` / `userdel <user>`  |
//! | `WhoArgs`               | `who`                                |

use crate::platform::DeleteMechanism;

/// Trait for typed OS command arguments.
///
/// # Contract
///
/// - `program()`: binary name, resolved through PATH at execution time.
/// - `to_cli_args()`: arguments exactly as the binary expects them.
/// - `get_env_vars()`: extra environment for the child.
/// - `is_destructive()`: mutates the host; skipped in dry-run mode.
/// - `is_interactive()`: needs the operator's terminal.
pub trait CommandArgs {
    fn program(&self) -> &'static str;

    fn to_cli_args(&self) -> Vec<String>;

    fn get_env_vars(&self) -> Vec<(String, String)> {
        vec![]
    }

    fn is_destructive(&self) -> bool {
        false
    }

    fn is_interactive(&self) -> bool {
        false
    }

    /// Human-readable command line, for logs and dry-run output.
    fn display(&self) -> String {
        let mut parts = vec![self.program().to_string()];
        parts.extend(self.to_cli_args());
        parts.join(" ")
    }
}

// ============================================================================
// Create User
// ============================================================================

/// Create an account with a fresh home directory and a login shell.
#[derive(Debug, Clone)]
pub struct CreateUserArgs {
    pub username: String,
    pub shell: String,
}

impl CommandArgs for CreateUserArgs {
    fn program(&self) -> &'static str {
        "useradd"
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec![
            "-m".to_string(),
            "-s".to_string(),
            self.shell.clone(),
            self.username.clone(),
        ]
    }

    fn is_destructive(&self) -> bool {
        true
    }
}

// ============================================================================
// Set Password
// ============================================================================

/// Interactive password change; the operator types the password into passwd.
#[derive(Debug, Clone)]
pub struct SetPasswordArgs {
    pub username: String,
}

impl CommandArgs for SetPasswordArgs {
    fn program(&self) -> &'static str {
        "passwd"
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec![self.username.clone()]
    }

    fn is_destructive(&self) -> bool {
        true
    }

    fn is_interactive(&self) -> bool {
        true
    }
}

// ============================================================================
// Add To Group
// ============================================================================

/// Append a supplementary group. `-a` keeps existing memberships.
#[derive(Debug, Clone)]
pub struct AddToGroupArgs {
    pub username: String,
    pub group: String,
}

impl CommandArgs for AddToGroupArgs {
    fn program(&self) -> &'static str {
        "usermod"
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec![
            "-aG".to_string(),
            self.group.clone(),
            self.username.clone(),
        ]
    }

    fn is_destructive(&self) -> bool {
        true
    }
}

// ============================================================================
// Kill User Processes
// ============================================================================

/// SIGKILL every process owned by an account.
///
/// pkill exits 1 when nothing matched; callers treat this step as best-effort.
#[derive(Debug, Clone)]
pub struct KillUserProcessesArgs {
    pub username: String,
}

impl CommandArgs for KillUserProcessesArgs {
    fn program(&self) -> &'static str {
        "pkill"
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec![
            "-KILL".to_string(),
            "-u".to_string(),
            self.username.clone(),
        ]
    }

    fn is_destructive(&self) -> bool {
        true
    }
}

// ============================================================================
// Delete User
// ============================================================================

/// Remove an account, keeping its home directory.
///
/// Neither `deluser` nor `userdel` touches the home directory unless given
/// `--remove-home` / `-r`, so no flag is passed at all.
#[derive(Debug, Clone)]
pub struct DeleteUserArgs {
    pub username: String,
    pub mechanism: DeleteMechanism,
}

impl CommandArgs for DeleteUserArgs {
    fn program(&self) -> &'static str {
        self.mechanism.program()
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec![self.username.clone()]
    }

    fn is_destructive(&self) -> bool {
        true
    }
}

// ============================================================================
// Who
// ============================================================================

/// List current login sessions.
#[derive(Debug, Clone, Default)]
pub struct WhoArgs;

impl CommandArgs for WhoArgs {
    fn program(&self) -> &'static str {
        "who"
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec![]
    }

    fn get_env_vars(&self) -> Vec<(String, String)> {
        // Stable column layout regardless of the operator's locale.
        vec![("LC_ALL".to_string(), "C".to_string())]
    }
}
