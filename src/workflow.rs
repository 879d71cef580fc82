//! Top-level sequencing.
//!
//! ```text
//! PlatformProfile (resolved by the caller)
//!     ↓
//! provision: username prompt → useradd → passwd → usermod → ~/.ssh copy
//!     ↓
//! Decommissioner: confirmations → safety checks → session wait → removal
//! ```
//!
//! Provisioning and decommissioning are independent phases: a refusal or
//! failure while decommissioning never undoes the account just created.

use tracing::{debug, info};

use crate::accounts::AccountDatabase;
use crate::command_runner::CommandRunner;
use crate::decommission::{DecommissionOutcome, Decommissioner};
use crate::error::Result;
use crate::platform::PlatformProfile;
use crate::prompt::Prompter;
use crate::provision::{ProvisionReport, provision};

/// Default login shell for the new administrator.
pub const DEFAULT_SHELL: &str = "/bin/bash";

/// The host-facing collaborators every step works through.
pub struct Host<'a> {
    pub runner: &'a mut dyn CommandRunner,
    pub accounts: &'a dyn AccountDatabase,
    pub prompter: &'a mut dyn Prompter,
}

/// Per-run settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowConfig {
    /// Account to replace and, if confirmed, remove
    pub default_account: String,
    pub shell: String,
}

impl WorkflowConfig {
    pub fn new(default_account: impl Into<String>) -> Self {
        Self {
            default_account: default_account.into(),
            shell: DEFAULT_SHELL.to_string(),
        }
    }
}

/// Everything the run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowReport {
    pub provisioned: ProvisionReport,
    pub decommission: DecommissionOutcome,
}

/// Provision the new administrator, then offer to remove the default account.
pub fn run(
    host: &mut Host<'_>,
    profile: &PlatformProfile,
    config: &WorkflowConfig,
) -> Result<WorkflowReport> {
    info!(
        "Starting: platform {}, default account '{}'",
        profile, config.default_account
    );
    host.prompter.say(&format!(
        "This will create a new admin user and can then remove the default user '{}'.",
        config.default_account
    ));

    let provisioned = provision(host, profile, &config.default_account, &config.shell)?;
    host.prompter.say(&format!(
        "User '{}' created and added to '{}'.",
        provisioned.username, provisioned.admin_group
    ));

    let mut coordinator =
        Decommissioner::new(profile, &config.default_account, &provisioned.username);
    let decommission = coordinator.run(host);
    debug!("Decommission path: {:?}", coordinator.history());
    let decommission = decommission?;

    Ok(WorkflowReport {
        provisioned,
        decommission,
    })
}
