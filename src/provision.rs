//! Account provisioning.
//!
//! Creates the replacement administrator:
//!
//! 1. Ask for a username until it validates
//! 2. `useradd` with a fresh home and login shell
//! 3. `passwd`, interactively
//! 4. Add to the platform's admin group
//! 5. Copy the default account's `~/.ssh` (best-effort)
//!
//! Steps 2-4 are fatal on failure and nothing is rolled back.

use tracing::info;

use crate::commands::{AddToGroupArgs, CreateUserArgs, SetPasswordArgs};
use crate::error::{AdminSwapError, Result};
use crate::platform::PlatformProfile;
use crate::ssh::{SshMigration, migrate_ssh_dir};
use crate::step::{StepExt, StepPolicy, StepResult};
use crate::validation::prompt_for_username;
use crate::workflow::Host;

const SSH_STEP: &str = "SSH key migration";

/// How the SSH step ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SshOutcome {
    Migrated { files: usize },
    /// The default account had no `.ssh` directory.
    NoSource,
    /// Dry-run mode; nothing copied.
    DryRun,
    /// Best-effort failure, already reported.
    Failed(String),
}

/// What provisioning produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionReport {
    pub username: String,
    pub admin_group: String,
    pub ssh: SshOutcome,
}

/// Prompt for a username, then create and configure the account.
pub fn provision(
    host: &mut Host<'_>,
    profile: &PlatformProfile,
    default_account: &str,
    shell: &str,
) -> Result<ProvisionReport> {
    let username = prompt_for_username(host.prompter, host.accounts)?;
    if let Err(failure) = create_admin(host, profile, &username, shell) {
        failure.absorb()?;
    }

    let ssh = match migrate_ssh(host, default_account, &username) {
        Ok(outcome) => outcome,
        Err(failure) => {
            let reason = failure.error.to_string();
            failure.absorb()?;
            host.prompter.say(&format!(
                "Warning: could not copy SSH keys from '{default_account}': {reason}"
            ));
            SshOutcome::Failed(reason)
        }
    };

    Ok(ProvisionReport {
        username,
        admin_group: profile.admin_group.clone(),
        ssh,
    })
}

/// Create `username`, set its password and grant admin group membership.
///
/// Every step is tagged [`StepPolicy::Fatal`].
pub fn create_admin(
    host: &mut Host<'_>,
    profile: &PlatformProfile,
    username: &str,
    shell: &str,
) -> StepResult<()> {
    host.prompter.say(&format!("Creating user '{username}'..."));
    host.runner
        .run(&CreateUserArgs {
            username: username.to_string(),
            shell: shell.to_string(),
        })
        .and_then(|output| output.ensure_success("useradd"))
        .step("create account", StepPolicy::Fatal)?;

    host.prompter
        .say(&format!("Set a password for '{username}':"));
    host.runner
        .run(&SetPasswordArgs {
            username: username.to_string(),
        })
        .and_then(|output| output.ensure_success("passwd"))
        .step("set password", StepPolicy::Fatal)?;

    host.prompter.say(&format!(
        "Adding '{username}' to the '{}' group...",
        profile.admin_group
    ));
    host.runner
        .run(&AddToGroupArgs {
            username: username.to_string(),
            group: profile.admin_group.clone(),
        })
        .and_then(|output| output.ensure_success("usermod"))
        .step("grant admin group", StepPolicy::Fatal)?;

    info!("Provisioned '{}' in group '{}'", username, profile.admin_group);
    Ok(())
}

/// Copy SSH keys from the default account's home to `username`.
///
/// The source home comes from the account database, or `/home/<name>` if
/// the default account is unknown.
pub fn migrate_ssh(
    host: &mut Host<'_>,
    default_account: &str,
    username: &str,
) -> StepResult<SshOutcome> {
    let source_home = host.accounts.home_of(default_account);

    if host.runner.is_dry_run() {
        host.prompter.say(&format!(
            "[dry run] would copy {}/.ssh to '{username}'",
            source_home.display()
        ));
        return Ok(SshOutcome::DryRun);
    }

    let target = host
        .accounts
        .lookup(username)
        .and_then(|account| {
            account.ok_or_else(|| {
                AdminSwapError::account_lookup(username, "not found after useradd")
            })
        })
        .step(SSH_STEP, StepPolicy::BestEffort)?;

    match migrate_ssh_dir(&source_home, &target).step(SSH_STEP, StepPolicy::BestEffort)? {
        SshMigration::NoSource { source } => {
            host.prompter.say(&format!(
                "No SSH directory at {}; skipping key migration.",
                source.display()
            ));
            Ok(SshOutcome::NoSource)
        }
        SshMigration::Copied { destination, files } => {
            host.prompter.say(&format!(
                "Copied SSH keys to {} ({} file(s)).",
                destination.display(),
                files
            ));
            Ok(SshOutcome::Migrated { files })
        }
    }
}
