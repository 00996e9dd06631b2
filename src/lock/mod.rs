//! Crash-persistent lock markers.
//!
//! A lock is a plain file created with `O_CREAT | O_EXCL`. It is never tied to
//! a process lifetime: if the holder dies the marker stays behind and is the
//! signal that recovery (`reset` on a distribution, `up --force` on a target)
//! is required. Only [`LockManager::release`] removes it.

use std::{
    fs::{self, OpenOptions},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LockOperation {
    Commit,
    Reset,
    Apply,
}

/// Diagnostic payload stored inside the marker. Presence of the file is what
/// matters to the protocol; the payload only helps an operator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LockMarker {
    pub lock_id: Uuid,
    pub operation: LockOperation,
    pub pid: u32,
    pub host: String,
    pub started_at: u64,
}

impl LockMarker {
    fn new(operation: LockOperation) -> Self {
        Self {
            lock_id: Uuid::new_v4(),
            operation,
            pid: std::process::id(),
            host: std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown".into()),
            started_at: now_secs(),
        }
    }

    pub fn read(path: &Path) -> Result<Self> {
        let data = fs::read(path)?;
        let marker: LockMarker = serde_json::from_slice(&data)?;
        Ok(marker)
    }
}

#[derive(Debug, Clone)]
pub struct LockManager {
    path: PathBuf,
    operation: LockOperation,
}

impl LockManager {
    pub fn new(path: impl Into<PathBuf>, operation: LockOperation) -> Self {
        Self {
            path: path.into(),
            operation,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_held(&self) -> bool {
        fs::symlink_metadata(&self.path).is_ok()
    }

    /// Atomically create the marker, failing with [`Error::AlreadyLocked`] if it exists.
    pub fn acquire(&self) -> Result<LockMarker> {
        let mut file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                if let Some(holder) = self.holder() {
                    warn!(
                        lock = %self.path.display(),
                        operation = ?holder.operation,
                        pid = holder.pid,
                        host = %holder.host,
                        started_at = holder.started_at,
                        "lock held by an earlier operation"
                    );
                }
                return Err(Error::AlreadyLocked(self.path.clone()).into());
            }
            Err(e) => return Err(Error::Io(e).into()),
        };

        let marker = LockMarker::new(self.operation);
        let written = serde_json::to_vec_pretty(&marker)
            .map_err(anyhow::Error::from)
            .and_then(|bytes| {
                file.write_all(&bytes)?;
                file.sync_all()?;
                Ok(())
            });
        if let Err(err) = written {
            // The marker is ours; a failed acquire must not leave it behind.
            let _ = fs::remove_file(&self.path);
            return Err(err);
        }

        debug!(lock = %self.path.display(), operation = ?self.operation, "lock acquired");
        Ok(marker)
    }

    /// Take ownership of a marker left behind by an interrupted run, or
    /// acquire a fresh one when none exists. Used only on recovery paths.
    pub fn take_over(&self) -> Result<()> {
        if self.is_held() {
            info!(lock = %self.path.display(), "taking over lock left by an interrupted operation");
            return Ok(());
        }
        self.acquire().map(|_| ())
    }

    /// Remove the marker. Failure is reported as [`Error::LockRelease`]
    /// since the guarded work may already be complete.
    pub fn release(&self) -> Result<()> {
        fs::remove_file(&self.path).map_err(|source| Error::LockRelease {
            path: self.path.clone(),
            source,
        })?;
        debug!(lock = %self.path.display(), "lock released");
        Ok(())
    }

    /// Best-effort read of the marker payload for diagnostics.
    pub fn holder(&self) -> Option<LockMarker> {
        LockMarker::read(&self.path).ok()
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
