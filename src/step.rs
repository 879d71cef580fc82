//! Per-step failure policy.
//!
//! Each fallible workflow step reports failure as a [`StepFailure`] that says
//! whether the workflow may continue past it. Best-effort steps (SSH key
//! migration, terminating the old account's processes) are logged and
//! swallowed; everything else aborts the run.

use std::fmt;

use tracing::warn;

use crate::error::{AdminSwapError, Result};

/// Whether a failed step aborts the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepPolicy {
    /// Failure terminates the workflow.
    Fatal,
    /// Failure is reported and the workflow proceeds.
    BestEffort,
}

/// A step that failed, tagged with its policy.
#[derive(Debug)]
pub struct StepFailure {
    pub step: &'static str,
    pub policy: StepPolicy,
    pub error: AdminSwapError,
}

/// Result of a single workflow step.
pub type StepResult<T> = std::result::Result<T, StepFailure>;

impl StepFailure {
    pub fn fatal(step: &'static str, error: AdminSwapError) -> Self {
        Self {
            step,
            policy: StepPolicy::Fatal,
            error,
        }
    }

    pub fn best_effort(step: &'static str, error: AdminSwapError) -> Self {
        Self {
            step,
            policy: StepPolicy::BestEffort,
            error,
        }
    }

    /// True when the workflow may continue past this failure.
    pub fn is_ignorable(&self) -> bool {
        self.policy == StepPolicy::BestEffort
    }

    /// Swallow a best-effort failure, propagate a fatal one.
    ///
    /// Returns `Ok(Some(self))` for ignored failures so callers can still
    /// tell the operator what was skipped.
    pub fn absorb(self) -> Result<Option<StepFailure>> {
        if self.is_ignorable() {
            warn!("{} failed (continuing): {}", self.step, self.error);
            Ok(Some(self))
        } else {
            Err(self.error)
        }
    }
}

impl fmt::Display for StepFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.step, self.error)
    }
}

/// Attach a policy to a plain result.
pub trait StepExt<T> {
    fn step(self, name: &'static str, policy: StepPolicy) -> StepResult<T>;
}

impl<T> StepExt<T> for Result<T> {
    fn step(self, name: &'static str, policy: StepPolicy) -> StepResult<T> {
        self.map_err(|error| StepFailure {
            step: name,
            policy,
            error,
        })
    }
}
