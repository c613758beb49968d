//! Single-instance guard for an output directory.
//!
//! Two reporters writing into the same directory would race on identical file
//! names within the same minute. The lock holds our PID in a hidden file and is
//! removed when the guard drops.

use anyhow::{bail, Context, Result};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Hidden lock file placed in the output directory.
pub const LOCK_FILE_NAME: &str = ".power_position.lock";

/// Held for as long as the reporter runs.
#[derive(Debug)]
pub struct ReporterLock {
    lock_path: PathBuf,
    owned: bool,
}

/// What an existing lock file says about its owner.
#[derive(Debug, PartialEq, Eq)]
enum LockHolder {
    Live(u32),
    /// Created but the PID is not written yet.
    Acquiring,
    Stale,
}

impl ReporterLock {
    /// Take the lock for `output_dir`, creating the directory if needed.
    ///
    /// Fails if a live reporter already holds it. A lock left by a dead
    /// process is replaced. The file is created with `create_new`, so of two
    /// reporters starting together only one gets it.
    pub fn acquire<P: AsRef<Path>>(output_dir: P) -> Result<Self> {
        let output_dir = output_dir.as_ref();
        fs::create_dir_all(output_dir).with_context(|| {
            format!("Failed to create output directory: {}", output_dir.display())
        })?;

        let lock_path = output_dir.join(LOCK_FILE_NAME);
        let pid = std::process::id();

        // Second pass only after removing a stale lock
        for _ in 0..2 {
            match OpenOptions::new().write(true).create_new(true).open(&lock_path) {
                Ok(mut file) => {
                    file.write_all(format!("{pid}\n").as_bytes()).with_context(|| {
                        format!("Failed to write lock file: {}", lock_path.display())
                    })?;
                    tracing::debug!(pid, path = %lock_path.display(), "[Lock] Acquired");
                    return Ok(Self {
                        lock_path,
                        owned: true,
                    });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
                Err(e) => {
                    return Err(e).with_context(|| {
                        format!("Failed to create lock file: {}", lock_path.display())
                    });
                }
            }

            match Self::holder(&lock_path) {
                Ok(LockHolder::Live(holder)) => {
                    bail!(
                        "Another reporter (PID {holder}) is already writing to {}\n\
                         If it is not running, remove the stale lock file: {}",
                        output_dir.display(),
                        lock_path.display()
                    );
                }
                Ok(LockHolder::Acquiring) => {
                    bail!(
                        "Another reporter is starting in {} (lock file {} has no PID yet)",
                        output_dir.display(),
                        lock_path.display()
                    );
                }
                Ok(LockHolder::Stale) => {
                    tracing::info!(path = %lock_path.display(), "[Lock] Removing stale lock file");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "[Lock] Unreadable lock file, replacing it");
                }
            }
            match fs::remove_file(&lock_path) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e).context("Failed to remove stale lock file"),
            }
        }

        bail!(
            "Lock file {} was re-created while replacing a stale lock",
            lock_path.display()
        )
    }

    /// Classify the owner recorded in the lock file.
    fn holder(lock_path: &Path) -> Result<LockHolder> {
        let contents = fs::read_to_string(lock_path).context("Failed to read lock file")?;
        let trimmed = contents.trim();
        if trimmed.is_empty() {
            return Ok(LockHolder::Acquiring);
        }
        let pid: u32 = trimmed.parse().context("Failed to parse PID from lock file")?;
        if Self::is_reporter_running(pid) {
            Ok(LockHolder::Live(pid))
        } else {
            Ok(LockHolder::Stale)
        }
    }

    #[cfg(unix)]
    fn is_reporter_running(pid: u32) -> bool {
        let cmdline = fs::read_to_string(format!("/proc/{pid}/cmdline"));
        cmdline_shows_reporter(cmdline.ok().as_deref(), Path::new("/proc").is_dir())
    }

    #[cfg(not(unix))]
    fn is_reporter_running(_pid: u32) -> bool {
        true
    }

    pub fn path(&self) -> &Path {
        &self.lock_path
    }

    /// Remove the lock file. Called automatically on drop.
    pub fn release(&mut self) {
        if !self.owned {
            return;
        }
        match fs::remove_file(&self.lock_path) {
            Ok(()) => tracing::debug!(path = %self.lock_path.display(), "[Lock] Released"),
            Err(e) => tracing::warn!(error = %e, "[Lock] Failed to remove lock file"),
        }
        self.owned = false;
    }
}

impl Drop for ReporterLock {
    fn drop(&mut self) {
        self.release();
    }
}

/// Whether a process command line belongs to a reporter.
///
/// Without procfs (macOS, the BSDs) liveness cannot be checked, so the holder
/// counts as running.
#[cfg(unix)]
fn cmdline_shows_reporter(cmdline: Option<&str>, procfs: bool) -> bool {
    match cmdline {
        // Binary is power-position, test harnesses run as power_position-<hash>
        Some(cmdline) => cmdline.contains("power-position") || cmdline.contains("power_position"),
        None => !procfs,
    }
}
