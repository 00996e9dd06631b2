//! `commit`: turn the current content of a source directory into the next version.

use std::{fs, path::Path};

use tracing::{info, instrument};

use crate::{
    config::DistConfig,
    fs::{recreate_dir, require_dir},
    lock::LockOperation,
    store::{artifact::publish, temp_name, ArtifactKind},
    tools::Toolchain,
    Result,
};

use super::{remove_if_present, DistDir};

#[derive(Debug)]
pub struct CommitPipeline<'a> {
    dist: &'a DistDir,
    config: &'a DistConfig,
    tools: &'a Toolchain,
}

impl<'a> CommitPipeline<'a> {
    pub fn new(dist: &'a DistDir, config: &'a DistConfig, tools: &'a Toolchain) -> Self {
        Self {
            dist,
            config,
            tools,
        }
    }

    /// Commit `source` as a new version and return it.
    ///
    /// Any failure leaves the distribution lock held; `reset` is then required
    /// before the next commit.
    #[instrument(skip(self, source, diff_opts), fields(dist = %self.dist.path.display(), source = %source.display()))]
    pub fn commit(&self, source: &Path, diff_opts: &[String]) -> Result<u64> {
        require_dir(source, "source directory")?;
        fs::read_dir(source)?;

        let lock = self.dist.lock(LockOperation::Commit);
        lock.acquire()?;

        let version = self.dist.store().current_version()? + 1;
        info!(version, "committing");

        if version > 1 {
            self.write_diff(source, version, diff_opts)?;
        }

        if self.config.is_full_version(version) {
            self.write_full(source, version)?;
            if version == 1 {
                self.materialize_image(version)?;
            }
        }

        lock.release()?;
        info!(version, "commit complete");
        Ok(version)
    }

    /// Generate the batch against the working image (which rsync updates in
    /// place), compress it and publish `<version>.diff`.
    fn write_diff(&self, source: &Path, version: u64, diff_opts: &[String]) -> Result<()> {
        let store = self.dist.store();
        let batch = self.dist.temp_path(&format!(".{version}.batch.tmp"));
        let tmp = self.dist.temp_path(&temp_name(version, ArtifactKind::Diff));
        let dest = store.artifact_path(version, ArtifactKind::Diff);

        let result = self
            .tools
            .diff
            .generate(source, &self.dist.image_path(), &batch, diff_opts)
            .and_then(|_| self.tools.compressor.compress(&batch, &tmp))
            .and_then(|_| publish(&tmp, &dest));

        remove_if_present(&batch);
        if result.is_err() {
            remove_if_present(&tmp);
        }
        result?;

        info!(version, artifact = %dest.display(), "diff published");
        Ok(())
    }

    fn write_full(&self, source: &Path, version: u64) -> Result<()> {
        let dest = self.dist.write_full_image(self.tools, source, version)?;
        info!(version, artifact = %dest.display(), "full image published");
        Ok(())
    }

    /// The first version has no diff step, so the working image is built
    /// from the full image just published.
    fn materialize_image(&self, version: u64) -> Result<()> {
        let image = self.dist.image_path();
        recreate_dir(&image)?;
        self.tools.archiver.extract(
            &self.dist.store().artifact_path(version, ArtifactKind::Full),
            &image,
        )
    }
}
