//! adminswap library
//!
//! Replaces a cloud image's default account (`ubuntu`, `ec2-user`, ...) with
//! a named administrator: creates the account, copies SSH keys across, and,
//! once the operator confirms the new account works, removes the old one
//! while keeping its home directory.

pub mod accounts;
pub mod cli;
pub mod command_runner;
pub mod commands;
pub mod decommission;
pub mod error;
pub mod platform;
pub mod process_guard;
pub mod prompt;
pub mod provision;
pub mod sanity;
pub mod ssh;
pub mod step;
pub mod validation;
pub mod workflow;

pub use accounts::{Account, AccountDatabase, SystemAccounts};
pub use command_runner::{CommandOutput, CommandRunner, SystemRunner};
pub use commands::CommandArgs;
pub use decommission::{DecommissionOutcome, DecommissionState, Decommissioner, SkipReason};
pub use error::{AdminSwapError, Result};
pub use platform::{DeleteMechanism, OsFamily, PlatformProfile};
pub use prompt::{Console, Prompter};
pub use provision::{ProvisionReport, SshOutcome};
pub use step::{StepFailure, StepPolicy, StepResult};
pub use validation::{UsernameRejection, validate_username};
pub use workflow::{Host, WorkflowConfig, WorkflowReport};
