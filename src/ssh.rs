//! SSH key directory migration.
//!
//! Copies `~/.ssh` from the default account to the new account so the
//! operator can log in with the same key pair. Permissions are rewritten to
//! what sshd's `StrictModes` expects:
//!
//! - directories `0700`
//! - regular files `0600`
//! - `authorized_keys` reasserted to `0600`
//!
//! Ownership of the copied tree is handed to the new account.

use std::fs;
use std::os::unix::fs::{self as unix_fs, PermissionsExt};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::accounts::Account;
use crate::error::{AdminSwapError, Result};

pub const SSH_DIR: &str = ".ssh";
pub const AUTHORIZED_KEYS: &str = "authorized_keys";

const DIR_MODE: u32 = 0o700;
const FILE_MODE: u32 = 0o600;

/// What [`migrate_ssh_dir`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SshMigration {
    /// The source home has no `.ssh` directory; nothing was created.
    NoSource { source: PathBuf },
    /// The tree was copied.
    Copied { destination: PathBuf, files: usize },
}

/// Copy `<source_home>/.ssh` into `target`'s home.
///
/// A missing source directory is not an error. Sockets, FIFOs and device
/// nodes (ControlMaster sockets, agent forwards) are skipped. An entry that
/// cannot be copied does not stop the others: whatever reached the
/// destination is still handed to the new account and chmodded, and only
/// then are the collected copy errors returned as [`AdminSwapError::Ssh`].
pub fn migrate_ssh_dir(source_home: &Path, target: &Account) -> Result<SshMigration> {
    let source = source_home.join(SSH_DIR);
    if !source.is_dir() {
        debug!("No SSH directory at {}", source.display());
        return Ok(SshMigration::NoSource { source });
    }

    let destination = target.home.join(SSH_DIR);
    info!(
        "Copying {} -> {} for '{}'",
        source.display(),
        destination.display(),
        target.name
    );

    fs::create_dir_all(&destination)
        .map_err(|e| AdminSwapError::ssh(format!("create {}: {}", destination.display(), e)))?;

    let mut errors = Vec::new();
    let files = copy_tree(&source, &destination, &mut errors);

    secure_tree(&destination, (target.uid, target.gid))?;

    let authorized_keys = destination.join(AUTHORIZED_KEYS);
    let is_regular = authorized_keys
        .symlink_metadata()
        .is_ok_and(|m| m.file_type().is_file());
    if is_regular {
        set_mode(&authorized_keys, FILE_MODE)?;
    }

    if !errors.is_empty() {
        warn!("{} SSH entries could not be copied", errors.len());
        return Err(AdminSwapError::ssh(errors.join("; ")));
    }
    Ok(SshMigration::Copied { destination, files })
}

/// Recursive copy; returns the number of regular files copied.
///
/// Symlinks are recreated as symlinks rather than followed. Failures are
/// pushed onto `errors` and the walk continues.
fn copy_tree(source: &Path, destination: &Path, errors: &mut Vec<String>) -> usize {
    let entries = match fs::read_dir(source) {
        Ok(entries) => entries,
        Err(e) => {
            errors.push(format!("read {}: {}", source.display(), e));
            return 0;
        }
    };

    let mut files = 0;
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                errors.push(format!("read {}: {}", source.display(), e));
                continue;
            }
        };
        let from = entry.path();
        let to = destination.join(entry.file_name());

        match copy_entry(&from, &to, errors) {
            Ok(copied) => files += copied,
            Err(e) => errors.push(format!("copy {}: {}", from.display(), e)),
        }
    }
    files
}

fn copy_entry(from: &Path, to: &Path, errors: &mut Vec<String>) -> std::io::Result<usize> {
    let file_type = from.symlink_metadata()?.file_type();

    if file_type.is_dir() {
        fs::create_dir_all(to)?;
        Ok(copy_tree(from, to, errors))
    } else if file_type.is_symlink() {
        let link = fs::read_link(from)?;
        if to.symlink_metadata().is_ok() {
            fs::remove_file(to)?;
        }
        unix_fs::symlink(link, to)?;
        Ok(0)
    } else if file_type.is_file() {
        fs::copy(from, to)?;
        Ok(1)
    } else {
        debug!("Skipping special file {}", from.display());
        Ok(0)
    }
}

/// chown everything to `owner`; chmod directories 0700 and files 0600.
fn secure_tree(path: &Path, owner: (u32, u32)) -> Result<()> {
    let (uid, gid) = owner;
    let metadata = path
        .symlink_metadata()
        .map_err(|e| AdminSwapError::ssh(format!("stat {}: {}", path.display(), e)))?;

    if metadata.file_type().is_symlink() {
        return unix_fs::lchown(path, Some(uid), Some(gid))
            .map_err(|e| AdminSwapError::ssh(format!("chown {}: {}", path.display(), e)));
    }

    unix_fs::chown(path, Some(uid), Some(gid))
        .map_err(|e| AdminSwapError::ssh(format!("chown {}: {}", path.display(), e)))?;

    if metadata.is_dir() {
        set_mode(path, DIR_MODE)?;
        let entries = fs::read_dir(path)
            .map_err(|e| AdminSwapError::ssh(format!("read {}: {}", path.display(), e)))?;
        for entry in entries {
            let entry =
                entry.map_err(|e| AdminSwapError::ssh(format!("read {}: {}", path.display(), e)))?;
            secure_tree(&entry.path(), owner)?;
        }
    } else {
        set_mode(path, FILE_MODE)?;
    }
    Ok(())
}

fn set_mode(path: &Path, mode: u32) -> Result<()> {
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
        .map_err(|e| AdminSwapError::ssh(format!("chmod {:o} {}: {}", mode, path.display(), e)))
}
