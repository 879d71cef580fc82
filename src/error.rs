//! Error handling module for adminswap
//!
//! Provides centralized error handling with proper error types using thiserror.
//! Every failure that ends the process maps to a nonzero exit status through
//! [`AdminSwapError::exit_code`]; skip paths are not errors.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for adminswap
#[derive(Error, Debug)]
pub enum AdminSwapError {
    /// IO errors (file operations, terminal, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The tool was started without root privileges
    #[error("root privileges required")]
    NotRoot,

    /// The OS identification file does not exist
    #[error("OS identification file not found: {}", .0.display())]
    PlatformSourceMissing(PathBuf),

    /// Binaries required by the workflow are not on PATH
    #[error("missing required binaries: {}", .0.join(", "))]
    MissingBinaries(Vec<String>),

    /// An OS command could not be started at all
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// An OS command ran and exited unsuccessfully
    #[error("{context} failed (exit code {}): {stderr}", .code.map_or_else(|| "signal".to_string(), |c| c.to_string()))]
    CommandFailed {
        context: String,
        code: Option<i32>,
        stderr: String,
    },

    /// Refusal to remove the account that was just provisioned
    #[error("refusing to remove '{0}': it is the account that was just created")]
    SelfRemoval(String),

    /// Decommission state machine was driven out of order
    #[error("invalid decommission transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    /// The account database could not be queried
    #[error("account lookup failed for '{name}': {reason}")]
    AccountLookup { name: String, reason: String },

    /// SSH key migration failed part way
    #[error("SSH key migration failed: {0}")]
    Ssh(String),

    /// Operator input ended (EOF on stdin) while a prompt was pending
    #[error("input closed while waiting for an answer")]
    InputClosed,

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for adminswap operations
pub type Result<T> = std::result::Result<T, AdminSwapError>;

impl AdminSwapError {
    /// Create an account lookup error
    pub fn account_lookup(name: impl Into<String>, reason: impl ToString) -> Self {
        Self::AccountLookup {
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    /// Create an SSH migration error
    pub fn ssh(msg: impl Into<String>) -> Self {
        Self::Ssh(msg.into())
    }

    /// Process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        1
    }
}
