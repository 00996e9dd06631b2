use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    fs::write_atomic,
    lock::{LockManager, LockOperation},
    Result,
};

pub const VERSION_FILE: &str = ".snapdist-version";
pub const TARGET_LOCK_FILE: &str = ".snapdist-lock";

/// Bookkeeping kept inside a target directory: the applied version and the
/// target's own lock, independent of the distribution lock.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TargetState {
    pub dir: PathBuf,
}

impl TargetState {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn version_path(&self) -> PathBuf {
        self.dir.join(VERSION_FILE)
    }

    pub fn lock(&self) -> LockManager {
        LockManager::new(self.dir.join(TARGET_LOCK_FILE), LockOperation::Apply)
    }

    /// Applied version, or `None` when the target was never brought up. An
    /// unreadable marker is treated like a missing one so the next `up`
    /// performs a full restore.
    pub fn recorded_version(&self) -> Result<Option<u64>> {
        let path = self.version_path();
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match raw.trim().parse::<u64>() {
            Ok(v) if v > 0 => Ok(Some(v)),
            _ => {
                warn!(marker = %path.display(), content = %raw.trim(), "ignoring malformed version marker");
                Ok(None)
            }
        }
    }

    pub fn record_version(&self, version: u64) -> Result<()> {
        write_atomic(&self.version_path(), format!("{version}\n").as_bytes())
    }

    pub fn clear_version(&self) -> Result<()> {
        match fs::remove_file(self.version_path()) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn as_path(&self) -> &Path {
        &self.dir
    }
}
