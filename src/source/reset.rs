//! `reset`: rebuild the working image from the committed artifacts.

use std::fs;

use tracing::{info, instrument, warn};

use crate::{
    config::DistConfig,
    fs::recreate_dir,
    lock::LockOperation,
    store::{artifact::is_temp_name, ArtifactKind, RestorePlan},
    tools::Toolchain,
    Error, Result,
};

use super::DistDir;

#[derive(Debug)]
pub struct RecoveryManager<'a> {
    dist: &'a DistDir,
    config: &'a DistConfig,
    tools: &'a Toolchain,
}

impl<'a> RecoveryManager<'a> {
    pub fn new(dist: &'a DistDir, config: &'a DistConfig, tools: &'a Toolchain) -> Self {
        Self {
            dist,
            config,
            tools,
        }
    }

    /// Rebuild the working image so it matches the current version exactly.
    ///
    /// Normally run because the lock was found held after an interrupted
    /// commit or reset. With the lock absent `force` is required.
    #[instrument(skip(self), fields(dist = %self.dist.path.display()))]
    pub fn reset(&self, force: bool) -> Result<u64> {
        let lock = self.dist.lock(LockOperation::Reset);
        if !lock.is_held() {
            if !force {
                return Err(Error::NotLocked(lock.path().to_path_buf()).into());
            }
            warn!("distribution lock not held; forcing rebuild");
        }
        lock.take_over()?;

        let store = self.dist.store();
        let version = store.current_version()?;
        let image = self.dist.image_path();

        if version == 0 {
            info!("no committed versions; recreating empty working image");
            recreate_dir(&image)?;
        } else {
            let plan = RestorePlan::full(&store, version)?;
            plan.validate(&store)?;
            info!(
                version,
                full = ?plan.base,
                diffs = plan.diffs.len(),
                "rebuilding working image"
            );
            recreate_dir(&image)?;
            plan.execute(&store, self.tools, &image)?;
        }

        self.remove_stale_temporaries()?;
        if version > 0
            && self.config.is_full_version(version)
            && !store.has_artifact(version, ArtifactKind::Full)
        {
            // A commit died between publishing the diff and the full image.
            let dest = self.dist.write_full_image(self.tools, &image, version)?;
            info!(version, artifact = %dest.display(), "missing full image rebuilt from working image");
        }
        lock.release()?;
        info!(version, "reset complete");
        Ok(version)
    }

    /// Scratch files from an interrupted commit never became artifacts.
    fn remove_stale_temporaries(&self) -> Result<()> {
        for entry in fs::read_dir(&self.dist.path)? {
            let entry = entry?;
            let name = entry.file_name();
            if name.to_str().is_some_and(is_temp_name) && entry.file_type()?.is_file() {
                info!(file = %entry.path().display(), "removing stale scratch file");
                fs::remove_file(entry.path())?;
            }
        }
        Ok(())
    }
}
