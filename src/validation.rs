//! New-account username validation.
//!
//! Rules, first failure wins:
//!
//! 1. Syntax: `^[a-z][-a-z0-9]*$`
//! 2. Uniqueness: no existing account of that name (NSS lookup)
//!
//! Both rules are evaluated on every attempt; nothing is cached between
//! attempts. [`prompt_for_username`] re-asks until a name passes, with no
//! retry limit.

use thiserror::Error;
use tracing::debug;

use crate::accounts::AccountDatabase;
use crate::error::Result;
use crate::prompt::Prompter;

/// Why a candidate username was refused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UsernameRejection {
    #[error("username cannot be empty")]
    Empty,

    #[error("username must start with a lowercase letter, not '{0}'")]
    InvalidStart(char),

    #[error(
        "username contains invalid character '{0}'; only lowercase letters, digits and hyphens are allowed"
    )]
    InvalidCharacter(char),

    #[error("user '{0}' already exists")]
    AlreadyExists(String),

    #[error("could not check whether '{name}' exists: {reason}")]
    LookupFailed { name: String, reason: String },
}

/// Check `candidate` against `^[a-z][-a-z0-9]*$`.
pub fn validate_syntax(candidate: &str) -> std::result::Result<(), UsernameRejection> {
    let mut chars = candidate.chars();
    let first = chars.next().ok_or(UsernameRejection::Empty)?;
    if !first.is_ascii_lowercase() {
        return Err(UsernameRejection::InvalidStart(first));
    }
    match chars.find(|&c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')) {
        Some(bad) => Err(UsernameRejection::InvalidCharacter(bad)),
        None => Ok(()),
    }
}

/// Full validation: syntax, then uniqueness against `accounts`.
pub fn validate_username(
    candidate: &str,
    accounts: &dyn AccountDatabase,
) -> std::result::Result<(), UsernameRejection> {
    validate_syntax(candidate)?;
    match accounts.exists(candidate) {
        Ok(false) => Ok(()),
        Ok(true) => Err(UsernameRejection::AlreadyExists(candidate.to_string())),
        Err(e) => Err(UsernameRejection::LookupFailed {
            name: candidate.to_string(),
            reason: e.to_string(),
        }),
    }
}

/// Ask for a username until one passes validation.
///
/// Each rejection is explained to the operator before asking again.
/// Only a closed input stream ends the loop without a name.
pub fn prompt_for_username(
    prompter: &mut dyn Prompter,
    accounts: &dyn AccountDatabase,
) -> Result<String> {
    loop {
        let candidate = prompter.ask("Enter the new admin username: ")?;
        let candidate = candidate.trim();
        match validate_username(candidate, accounts) {
            Ok(()) => return Ok(candidate.to_string()),
            Err(rejection) => {
                debug!("Rejected username {:?}: {}", candidate, rejection);
                prompter.say(&format!("Error: {rejection}. Please try again."));
            }
        }
    }
}
