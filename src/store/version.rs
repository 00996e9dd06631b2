use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{Error, Result};

use super::artifact::{artifact_name, parse_artifact_name, ArtifactKind};

/// Derives version numbers from the artifact files present in a directory.
#[derive(Debug, Clone)]
pub struct VersionStore {
    dir: PathBuf,
}

impl VersionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn artifact_path(&self, version: u64, kind: ArtifactKind) -> PathBuf {
        self.dir.join(artifact_name(version, kind))
    }

    pub fn has_artifact(&self, version: u64, kind: ArtifactKind) -> bool {
        self.artifact_path(version, kind).is_file()
    }

    /// Every artifact in the directory, ordered by version then kind.
    pub fn artifacts(&self) -> Result<Vec<(u64, ArtifactKind)>> {
        let mut found = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name();
            if let Some(parsed) = name.to_str().and_then(parse_artifact_name) {
                found.push(parsed);
            }
        }
        found.sort();
        Ok(found)
    }

    /// Highest version with any artifact, or 0 if nothing was committed yet.
    pub fn current_version(&self) -> Result<u64> {
        Ok(self
            .artifacts()?
            .into_iter()
            .map(|(version, _)| version)
            .max()
            .unwrap_or(0))
    }

    pub fn find_latest_full_version(&self) -> Result<u64> {
        let current = self.current_version()?;
        self.latest_full_at_or_below(current)
    }

    /// Newest full image with version `<= version`.
    pub fn latest_full_at_or_below(&self, version: u64) -> Result<u64> {
        (1..=version)
            .rev()
            .find(|v| self.has_artifact(*v, ArtifactKind::Full))
            .ok_or_else(|| {
                Error::BrokenInvariant(format!(
                    "no full image at or below version {version} in {}",
                    self.dir.display()
                ))
                .into()
            })
    }
}
