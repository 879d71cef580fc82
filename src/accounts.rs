//! Account database and session table access.
//!
//! Lookups go through NSS (`getpwnam_r` via nix) rather than parsing
//! `/etc/passwd`, so accounts served by LDAP, SSSD or similar are seen too.
//! Nothing here is cached: every question is asked again when it is asked.

use std::path::{Path, PathBuf};

use nix::unistd::User;
use tracing::debug;

use crate::command_runner::CommandRunner;
use crate::commands::WhoArgs;
use crate::error::{AdminSwapError, Result};

/// Home directory assumed for an account that cannot be looked up.
pub fn conventional_home(username: &str) -> PathBuf {
    Path::new("/home").join(username)
}

/// The parts of a passwd entry adminswap cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub name: String,
    pub uid: u32,
    pub gid: u32,
    pub home: PathBuf,
}

/// Read access to the OS account database.
pub trait AccountDatabase {
    /// `Ok(None)` when the account does not exist.
    fn lookup(&self, name: &str) -> Result<Option<Account>>;

    fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.lookup(name)?.is_some())
    }

    /// Home directory from the database, or `/home/<name>` if the account
    /// is unknown or the lookup fails.
    fn home_of(&self, name: &str) -> PathBuf {
        match self.lookup(name) {
            Ok(Some(account)) => account.home,
            Ok(None) => conventional_home(name),
            Err(e) => {
                debug!("Home lookup for '{}' failed ({}), using /home", name, e);
                conventional_home(name)
            }
        }
    }
}

/// NSS-backed account database.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemAccounts;

impl AccountDatabase for SystemAccounts {
    fn lookup(&self, name: &str) -> Result<Option<Account>> {
        let user = User::from_name(name).map_err(|e| AdminSwapError::account_lookup(name, e))?;
        Ok(user.map(|u| Account {
            name: u.name,
            uid: u.uid.as_raw(),
            gid: u.gid.as_raw(),
            home: u.dir,
        }))
    }
}

/// True if `who` lists at least one session for `username`.
///
/// Queried fresh on every call. A failing `who` is an error: without it
/// there is no way to know the account is idle.
pub fn has_active_session(runner: &mut dyn CommandRunner, username: &str) -> Result<bool> {
    let output = runner.run(&WhoArgs)?;
    output.ensure_success("who")?;
    let logged_in = sessions_include(&output.stdout, username);
    debug!("Session check for '{}': logged_in={}", username, logged_in);
    Ok(logged_in)
}

/// Match `username` against the first column of `who` output.
pub fn sessions_include(who_output: &str, username: &str) -> bool {
    who_output
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .any(|user| user == username)
}
