//! Default account decommissioning
//!
//! Removes the default account only after the operator has said the new
//! administrator works, and never while the default account is logged in.
//! The home directory is always kept.
//!
//! # State Flow
//!
//! ```text
//! Undecided
//!     ↓
//! VerifyAccessPrompted ──no──→ Skipped
//!     ↓ yes
//!     ├──no──→ RemovalDeclined ──→ Skipped
//!     ↓ yes
//! RemovalConfirmed
//!     ↓  (self-removal check, existence check)
//! LoggedInWait ⟲ retry ──no──→ Skipped
//!     ↓ no session
//! Removed
//! ```
//!
//! Removing the just-created account is an error. A default account that
//! no longer exists is a successful no-op.

use std::fmt;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::accounts::has_active_session;
use crate::commands::{DeleteUserArgs, KillUserProcessesArgs};
use crate::error::{AdminSwapError, Result};
use crate::platform::PlatformProfile;
use crate::step::{StepExt, StepFailure, StepPolicy, StepResult};
use crate::workflow::Host;

const KILL_STEP: &str = "terminate processes";
const DELETE_STEP: &str = "delete account";

/// Disposition of the default account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecommissionState {
    Undecided,
    VerifyAccessPrompted,
    RemovalConfirmed,
    RemovalDeclined,
    LoggedInWait,
    Removed,
    Skipped,
}

impl DecommissionState {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Removed | Self::Skipped)
    }

    /// Whether `next` may follow `self`.
    pub const fn can_transition_to(self, next: Self) -> bool {
        use DecommissionState::*;
        matches!(
            (self, next),
            (Undecided, VerifyAccessPrompted)
                | (VerifyAccessPrompted, RemovalConfirmed | RemovalDeclined | Skipped)
                | (RemovalDeclined, Skipped)
                | (RemovalConfirmed, LoggedInWait | Removed | Skipped)
                | (LoggedInWait, LoggedInWait | Removed | Skipped)
        )
    }
}

impl fmt::Display for DecommissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Why the default account was left in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    AccessNotVerified,
    RemovalDeclined,
    StillLoggedIn,
}

/// How decommissioning ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecommissionOutcome {
    Removed {
        /// Home directory left on disk
        home: PathBuf,
        /// Whether any processes were killed first
        processes_terminated: bool,
    },
    Skipped(SkipReason),
    /// Nothing to remove.
    AlreadyAbsent,
}

/// Drives one default account through the state flow.
#[derive(Debug)]
pub struct Decommissioner<'p> {
    profile: &'p PlatformProfile,
    target: String,
    new_account: String,
    state: DecommissionState,
    history: Vec<DecommissionState>,
}

impl<'p> Decommissioner<'p> {
    pub fn new(
        profile: &'p PlatformProfile,
        target: impl Into<String>,
        new_account: impl Into<String>,
    ) -> Self {
        Self {
            profile,
            target: target.into(),
            new_account: new_account.into(),
            state: DecommissionState::Undecided,
            history: vec![DecommissionState::Undecided],
        }
    }

    pub fn state(&self) -> DecommissionState {
        self.state
    }

    /// Every state visited, in order.
    pub fn history(&self) -> &[DecommissionState] {
        &self.history
    }

    fn transition(&mut self, next: DecommissionState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(AdminSwapError::InvalidTransition {
                from: self.state.to_string(),
                to: next.to_string(),
            });
        }
        debug!("Decommission '{}': {} -> {}", self.target, self.state, next);
        self.state = next;
        self.history.push(next);
        Ok(())
    }

    fn skip(&mut self, host: &mut Host<'_>, reason: SkipReason) -> Result<DecommissionOutcome> {
        self.transition(DecommissionState::Skipped)?;
        host.prompter.say(&format!(
            "Default account '{}' was left in place. To remove it later, run:\n  {}",
            self.target,
            self.profile.delete_mechanism.manual_command(&self.target)
        ));
        info!("Decommission of '{}' skipped: {:?}", self.target, reason);
        Ok(DecommissionOutcome::Skipped(reason))
    }

    /// Run the whole flow.
    pub fn run(&mut self, host: &mut Host<'_>) -> Result<DecommissionOutcome> {
        self.transition(DecommissionState::VerifyAccessPrompted)?;
        let verified = host.prompter.confirm(&format!(
            "Have you verified that you can log in as '{}' and use sudo from another session?",
            self.new_account
        ))?;
        if !verified {
            host.prompter.say(&format!(
                "Keep '{}' until you have confirmed the new account works.",
                self.target
            ));
            return self.skip(host, SkipReason::AccessNotVerified);
        }

        let remove = host.prompter.confirm(&format!(
            "Remove the default account '{}' now? Its home directory will be kept.",
            self.target
        ))?;
        if !remove {
            self.transition(DecommissionState::RemovalDeclined)?;
            return self.skip(host, SkipReason::RemovalDeclined);
        }
        self.transition(DecommissionState::RemovalConfirmed)?;

        if self.target == self.new_account {
            return Err(AdminSwapError::SelfRemoval(self.target.clone()));
        }

        let Some(account) = host.accounts.lookup(&self.target)? else {
            host.prompter.say(&format!(
                "User '{}' does not exist; nothing to remove.",
                self.target
            ));
            self.transition(DecommissionState::Skipped)?;
            return Ok(DecommissionOutcome::AlreadyAbsent);
        };

        while has_active_session(host.runner, &self.target)? {
            self.transition(DecommissionState::LoggedInWait)?;
            host.prompter.say(&format!(
                "Warning: '{}' is currently logged in. Log that session out before removing it.",
                self.target
            ));
            if !host.prompter.confirm("Check again?")? {
                return self.skip(host, SkipReason::StillLoggedIn);
            }
        }

        let processes_terminated = match self.terminate_processes(host) {
            Ok(killed) => killed,
            Err(failure) => {
                failure.absorb()?;
                false
            }
        };

        if let Err(failure) = self.delete_account(host) {
            failure.absorb()?;
        }
        self.transition(DecommissionState::Removed)?;

        host.prompter.say(&format!(
            "Removed user '{}'. Home directory {} was preserved.",
            self.target,
            account.home.display()
        ));
        info!("Removed default account '{}'", self.target);

        Ok(DecommissionOutcome::Removed {
            home: account.home,
            processes_terminated,
        })
    }

    /// Remove the target from the account database, keeping its home.
    fn delete_account(&self, host: &mut Host<'_>) -> StepResult<()> {
        let program = self.profile.delete_mechanism.program();
        host.runner
            .run(&DeleteUserArgs {
                username: self.target.clone(),
                mechanism: self.profile.delete_mechanism,
            })
            .and_then(|output| output.ensure_success(program))
            .map_err(|error| StepFailure::fatal(DELETE_STEP, error))
    }

    /// Kill everything the target owns. `Ok(false)` when nothing was running.
    fn terminate_processes(&self, host: &mut Host<'_>) -> StepResult<bool> {
        let output = host
            .runner
            .run(&KillUserProcessesArgs {
                username: self.target.clone(),
            })
            .step(KILL_STEP, StepPolicy::BestEffort)?;

        match output.exit_code {
            Some(0) => Ok(true),
            Some(1) => {
                debug!("No processes owned by '{}'", self.target);
                Ok(false)
            }
            _ => Err(StepFailure::best_effort(KILL_STEP, output.failure("pkill"))),
        }
    }
}
