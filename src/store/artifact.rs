//! Artifact naming and atomic publication.

use std::{
    fs::{self, File},
    path::Path,
};

use serde::{Deserialize, Serialize};

use crate::Result;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Full,
    Diff,
}

impl ArtifactKind {
    pub fn extension(self) -> &'static str {
        match self {
            ArtifactKind::Full => "full",
            ArtifactKind::Diff => "diff",
        }
    }
}

/// `<version>.full` or `<version>.diff`.
pub fn artifact_name(version: u64, kind: ArtifactKind) -> String {
    format!("{version}.{}", kind.extension())
}

/// Hidden scratch name used while an artifact is being written. It never
/// parses as an artifact, so readers cannot observe a partial file.
pub fn temp_name(version: u64, kind: ArtifactKind) -> String {
    format!(".{version}.{}.tmp", kind.extension())
}

pub fn parse_artifact_name(name: &str) -> Option<(u64, ArtifactKind)> {
    let (stem, ext) = name.split_once('.')?;
    let kind = match ext {
        "full" => ArtifactKind::Full,
        "diff" => ArtifactKind::Diff,
        _ => return None,
    };
    if stem.is_empty() || !stem.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let version: u64 = stem.parse().ok()?;
    (version > 0).then_some((version, kind))
}

pub fn is_temp_name(name: &str) -> bool {
    name.starts_with('.') && (name.ends_with(".tmp") || name.ends_with(".tmp.sh"))
}

/// Flush `tmp`, rename it over `dest` and flush the parent directory so the
/// rename survives a crash.
pub fn publish(tmp: &Path, dest: &Path) -> Result<()> {
    File::open(tmp)?.sync_all()?;
    fs::rename(tmp, dest)?;
    if let Some(parent) = dest.parent() {
        if let Ok(dir) = File::open(parent) {
            let _ = dir.sync_all();
        }
    }
    Ok(())
}
