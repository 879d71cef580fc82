//! Type-safe OS command execution
//!
//! [`CommandRunner`] is the only sanctioned way to run account-management
//! commands. Workflow code depends on the trait; [`SystemRunner`] is the
//! production implementation and tests substitute their own.
//!
//! # Execution Rules
//!
//! - Non-interactive commands run piped, in a new process group, with their
//!   PID registered in [`ChildRegistry`] while they run.
//! - Interactive commands (`passwd`) inherit the terminal and stay in the
//!   foreground process group.
//! - In dry-run mode destructive commands are logged (at `warn`, so they
//!   show at the default level) and reported as successful without being
//!   spawned. Read-only commands still run.

use std::process::{Command, Stdio};

use tracing::{info, warn};

use crate::commands::CommandArgs;
use crate::error::{AdminSwapError, Result};
use crate::process_guard::{ChildRegistry, CommandProcessGroup};

/// Output from a command execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit code (None if terminated by signal).
    pub exit_code: Option<i32>,
    pub success: bool,
}

impl CommandOutput {
    /// Successful output carrying `stdout`.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            exit_code: Some(0),
            success: true,
        }
    }

    /// Failed output with the given exit code and stderr.
    pub fn failed(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            exit_code: Some(exit_code),
            success: false,
        }
    }

    /// Turn a non-zero exit into [`AdminSwapError::CommandFailed`].
    pub fn ensure_success(&self, context: &str) -> Result<()> {
        if self.success {
            Ok(())
        } else {
            Err(self.failure(context))
        }
    }

    /// Describe this output as a failure of `context`.
    pub fn failure(&self, context: &str) -> AdminSwapError {
        AdminSwapError::CommandFailed {
            context: context.to_string(),
            code: self.exit_code,
            stderr: self.stderr.trim().to_string(),
        }
    }
}

/// Execution gate for OS commands.
pub trait CommandRunner {
    /// Run a command and capture its result.
    ///
    /// `Err` means the command could not be started; a command that ran and
    /// failed is `Ok` with `success == false`.
    fn run(&mut self, args: &dyn CommandArgs) -> Result<CommandOutput>;

    /// Whether destructive commands are being skipped.
    fn is_dry_run(&self) -> bool {
        false
    }
}

/// Runs commands on the local host.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    dry_run: bool,
}

impl SystemRunner {
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }

    fn run_interactive(&self, args: &dyn CommandArgs) -> Result<CommandOutput> {
        let program = args.program();
        let status = Command::new(program)
            .args(args.to_cli_args())
            .envs(args.get_env_vars())
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|source| AdminSwapError::Spawn {
                program: program.to_string(),
                source,
            })?;

        Ok(CommandOutput {
            stdout: String::new(),
            stderr: String::new(),
            exit_code: status.code(),
            success: status.success(),
        })
    }

    fn run_captured(&self, args: &dyn CommandArgs) -> Result<CommandOutput> {
        let program = args.program();
        let child = Command::new(program)
            .args(args.to_cli_args())
            .envs(args.get_env_vars())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .in_new_process_group()
            .spawn()
            .map_err(|source| AdminSwapError::Spawn {
                program: program.to_string(),
                source,
            })?;
        let pid = child.id();

        if let Ok(mut registry) = ChildRegistry::global().lock() {
            registry.register(pid);
        }

        let output = child.wait_with_output();

        if let Ok(mut registry) = ChildRegistry::global().lock() {
            registry.unregister(pid);
        }

        let output = output?;
        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code(),
            success: output.status.success(),
        })
    }
}

impl CommandRunner for SystemRunner {
    fn run(&mut self, args: &dyn CommandArgs) -> Result<CommandOutput> {
        let env_vars = args.get_env_vars();
        info!("run: {} env={:?}", args.display(), env_vars);

        if self.dry_run && args.is_destructive() {
            warn!("[dry run] would run: {}", args.display());
            return Ok(CommandOutput::ok(""));
        }

        let output = if args.is_interactive() {
            self.run_interactive(args)?
        } else {
            self.run_captured(args)?
        };

        if !output.success {
            warn!(
                "{} exited with {:?}: {}",
                args.program(),
                output.exit_code,
                output.stderr.trim()
            );
        }
        Ok(output)
    }

    fn is_dry_run(&self) -> bool {
        self.dry_run
    }
}
