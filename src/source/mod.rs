//! Source side of a distribution: directory layout, `init`, commit and reset.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use std::io::ErrorKind;

use tracing::{info, warn};

use crate::{
    lock::{LockManager, LockOperation},
    store::{artifact::publish, temp_name, ArtifactKind, VersionStore},
    tools::Toolchain,
    Error, Result,
};

pub mod commit;
pub mod reset;

pub use commit::CommitPipeline;
pub use reset::RecoveryManager;

pub const IMAGE_DIR: &str = "image";
pub const DIST_LOCK_FILE: &str = ".lock";

/// Distribution directory: working image, artifacts and the source lock.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DistDir {
    pub path: PathBuf,
}

impl DistDir {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Open an existing, initialized distribution directory.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let dist = Self::new(path);
        if !dist.path.is_dir() {
            return Err(Error::Config(format!(
                "distribution directory does not exist: {}",
                dist.path.display()
            ))
            .into());
        }
        if !dist.image_path().is_dir() {
            return Err(Error::Config(format!(
                "{} is not an initialized distribution (missing {IMAGE_DIR}/); run `snapdist init`",
                dist.path.display()
            ))
            .into());
        }
        Ok(dist)
    }

    /// Open a distribution for `reset`. Only the directory itself must exist:
    /// an interrupted rebuild can leave `image/` missing, and reset recreates it.
    pub fn open_for_recovery(path: impl Into<PathBuf>) -> Result<Self> {
        let dist = Self::new(path);
        if !dist.path.is_dir() {
            return Err(Error::Config(format!(
                "distribution directory does not exist: {}",
                dist.path.display()
            ))
            .into());
        }
        if !dist.image_path().is_dir() {
            warn!(dist = %dist.path.display(), "working image is missing; reset will recreate it");
        }
        Ok(dist)
    }

    /// Archive `tree` as the full image of `version` and publish it.
    /// The scratch archive is removed on failure.
    pub(crate) fn write_full_image(&self, tools: &Toolchain, tree: &Path, version: u64) -> Result<PathBuf> {
        let tmp = self.temp_path(&temp_name(version, ArtifactKind::Full));
        let dest = self.store().artifact_path(version, ArtifactKind::Full);

        let result = tools
            .archiver
            .create(tree, &tmp)
            .and_then(|_| publish(&tmp, &dest));
        if result.is_err() {
            remove_if_present(&tmp);
        }
        result?;
        Ok(dest)
    }

    /// Create the directory and an empty working image.
    pub fn init(path: impl Into<PathBuf>) -> Result<Self> {
        let dist = Self::new(path);
        fs::create_dir_all(&dist.path)?;

        if dist.image_path().exists() || dist.lock(LockOperation::Commit).is_held() {
            return Err(Error::Config(format!(
                "{} is already initialized",
                dist.path.display()
            ))
            .into());
        }
        if dist.store().current_version()? > 0 {
            return Err(Error::Config(format!(
                "{} already contains artifacts",
                dist.path.display()
            ))
            .into());
        }

        fs::create_dir(dist.image_path())?;
        info!(dist = %dist.path.display(), "distribution initialized");
        Ok(dist)
    }

    pub fn image_path(&self) -> PathBuf {
        self.path.join(IMAGE_DIR)
    }

    pub fn lock_path(&self) -> PathBuf {
        self.path.join(DIST_LOCK_FILE)
    }

    /// Commit and reset share this single marker.
    pub fn lock(&self, operation: LockOperation) -> LockManager {
        LockManager::new(self.lock_path(), operation)
    }

    pub fn store(&self) -> VersionStore {
        VersionStore::new(&self.path)
    }

    pub fn temp_path(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }

    pub fn as_path(&self) -> &Path {
        &self.path
    }
}

pub(crate) fn remove_if_present(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "failed to remove scratch file"),
    }
}
