//! Filesystem helpers shared by the source and target sides.

use std::{
    fs::{self, File},
    io::Write,
    path::Path,
};

use tracing::debug;

use crate::{Error, Result};

/// Require `path` to be an existing directory.
pub fn require_dir(path: &Path, what: &str) -> Result<()> {
    if !path.is_dir() {
        return Err(Error::Config(format!("{what} is not a directory: {}", path.display())).into());
    }
    Ok(())
}

/// Remove everything inside `dir` except the top-level entries named in `keep`.
/// Symlinks are removed, never followed.
pub fn wipe_dir_except(dir: &Path, keep: &[&str]) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        if name.to_str().is_some_and(|n| keep.contains(&n)) {
            continue;
        }
        let path = entry.path();
        let meta = fs::symlink_metadata(&path)?;
        if meta.is_dir() {
            fs::remove_dir_all(&path)?;
        } else {
            fs::remove_file(&path)?;
        }
    }
    debug!(dir = %dir.display(), "directory wiped");
    Ok(())
}

/// Drop `dir` entirely (if present) and recreate it empty.
pub fn recreate_dir(dir: &Path) -> Result<()> {
    match fs::symlink_metadata(dir) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(dir)?,
        Ok(_) => fs::remove_file(dir)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }
    fs::create_dir_all(dir)?;
    Ok(())
}

/// Write a small file through a sibling temp file and rename.
pub fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| Error::Config(format!("no parent directory for {}", path.display())))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let tmp = parent.join(format!(".{file_name}.tmp.{}", std::process::id()));

    {
        let mut f = File::create(&tmp)?;
        f.write_all(data)?;
        f.sync_all()?;
    }
    fs::rename(&tmp, path)?;
    if let Ok(dir) = File::open(parent) {
        let _ = dir.sync_all();
    }
    Ok(())
}
