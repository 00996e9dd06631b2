//! Restore plans: which full image to extract and which diffs to replay.
//!
//! The same plan drives recovery of the source working image and both
//! restore paths of a target, because diff artifacts are deltas along the
//! working image's lineage and replay identically onto any tree that holds
//! the previous version.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{tools::Toolchain, Error, Result};

use super::{artifact::ArtifactKind, version::VersionStore};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RestoreMode {
    Full,
    Incremental,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RestorePlan {
    pub mode: RestoreMode,
    /// Full image to extract first (full mode only).
    pub base: Option<u64>,
    /// Diff versions to replay, ascending.
    pub diffs: Vec<u64>,
    pub goal: u64,
}

impl RestorePlan {
    /// Latest full image at or below `goal`, then every diff up to `goal`.
    pub fn full(store: &VersionStore, goal: u64) -> Result<Self> {
        let base = store.latest_full_at_or_below(goal)?;
        Ok(Self {
            mode: RestoreMode::Full,
            base: Some(base),
            diffs: (base + 1..=goal).collect(),
            goal,
        })
    }

    /// Diffs `from + 1 ..= goal` replayed onto a tree already at `from`.
    pub fn incremental(from: u64, goal: u64) -> Self {
        Self {
            mode: RestoreMode::Incremental,
            base: None,
            diffs: (from + 1..=goal).collect(),
            goal,
        }
    }

    /// Check every artifact the plan needs before anything is modified.
    pub fn validate(&self, store: &VersionStore) -> Result<()> {
        if let Some(base) = self.base {
            if !store.has_artifact(base, ArtifactKind::Full) {
                return Err(missing(store, base, ArtifactKind::Full));
            }
        }
        for version in &self.diffs {
            if !store.has_artifact(*version, ArtifactKind::Diff) {
                return Err(missing(store, *version, ArtifactKind::Diff));
            }
        }
        Ok(())
    }

    pub fn execute(&self, store: &VersionStore, tools: &Toolchain, dest: &Path) -> Result<()> {
        if let Some(base) = self.base {
            info!(version = base, dest = %dest.display(), "extracting full image");
            tools
                .archiver
                .extract(&store.artifact_path(base, ArtifactKind::Full), dest)?;
        }
        for version in &self.diffs {
            replay_diff(store, tools, *version, dest)?;
        }
        Ok(())
    }
}

/// Decompress `<version>.diff` into a scratch file and replay it onto `dest`.
pub fn replay_diff(store: &VersionStore, tools: &Toolchain, version: u64, dest: &Path) -> Result<()> {
    let artifact = store.artifact_path(version, ArtifactKind::Diff);
    let batch = tempfile::Builder::new()
        .prefix("snapdist-batch-")
        .tempfile()?;

    info!(version, dest = %dest.display(), "replaying diff");
    tools.compressor.decompress(&artifact, batch.path())?;
    tools.diff.replay(batch.path(), dest)?;
    Ok(())
}

fn missing(store: &VersionStore, version: u64, kind: ArtifactKind) -> anyhow::Error {
    Error::BrokenInvariant(format!(
        "missing artifact {}",
        store.artifact_path(version, kind).display()
    ))
    .into()
}
