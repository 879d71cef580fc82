use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

use crate::platform::OS_RELEASE_PATH;
use crate::workflow::DEFAULT_SHELL;

/// adminswap - replace a cloud image's default user with your own admin
#[derive(Parser, Debug)]
#[command(name = "adminswap")]
#[command(about = "Create a named admin user, migrate SSH keys, and retire the default account")]
#[command(version)]
pub struct Cli {
    /// OS identification file used to pick the admin group and removal tool
    #[arg(long, global = true, default_value = OS_RELEASE_PATH)]
    pub os_release: PathBuf,

    /// Account to replace (default: $SUDO_USER, then "ubuntu")
    #[arg(long, global = true)]
    pub default_user: Option<String>,

    /// Log more (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Create the new admin and optionally remove the default account (default)
    Run {
        /// Login shell for the new account
        #[arg(long, default_value = DEFAULT_SHELL)]
        shell: String,

        /// Show what would change without creating or removing anything
        ///
        /// Read-only checks (account lookups, `who`) still run.
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the detected platform profile and default account, then exit
    Detect {
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// The subcommand, with `run` filled in when none was given.
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Run {
            shell: DEFAULT_SHELL.to_string(),
            dry_run: false,
        })
    }

    /// Log filter implied by `-v` flags.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}
