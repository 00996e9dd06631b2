//! In-process stand-ins for rsync, tar and gzip.
//!
//! Trees are captured as a path -> content map and serialized with
//! serde_json, which is enough to exercise the versioning protocol without
//! external binaries. Every call is logged so tests can assert which
//! artifacts were replayed and in what order.
#![allow(dead_code)]

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use snapdist::{
    tools::{Archiver, Compressor, DiffEngine, Toolchain},
    Error,
};

pub const BOOKKEEPING: [&str; 2] = [
    snapdist::target::VERSION_FILE,
    snapdist::target::TARGET_LOCK_FILE,
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Node {
    Dir,
    File(Vec<u8>),
}

pub type Tree = BTreeMap<String, Node>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCall {
    Generate,
    Replay { dest: PathBuf },
    Create { archive: PathBuf },
    Extract { archive: PathBuf, dest: PathBuf },
    Compress,
    Decompress { input: PathBuf },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    Generate,
    Compress,
    Create,
}

#[derive(Debug, Clone, Default)]
pub struct FakeTools {
    pub calls: Arc<Mutex<Vec<ToolCall>>>,
    pub fail: Arc<Mutex<Option<FailPoint>>>,
}

impl FakeTools {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toolchain(&self) -> Toolchain {
        Toolchain::new(
            Box::new(self.clone()),
            Box::new(self.clone()),
            Box::new(self.clone()),
        )
    }

    pub fn fail_at(&self, point: Option<FailPoint>) {
        *self.fail.lock() = point;
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    pub fn calls(&self) -> Vec<ToolCall> {
        self.calls.lock().clone()
    }

    /// Versions of the diff artifacts decompressed since the last clear.
    pub fn replayed_versions(&self) -> Vec<u64> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                ToolCall::Decompress { input } => artifact_version(input),
                _ => None,
            })
            .collect()
    }

    /// Versions of the full images extracted since the last clear.
    pub fn extracted_versions(&self) -> Vec<u64> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                ToolCall::Extract { archive, .. } => artifact_version(archive),
                _ => None,
            })
            .collect()
    }

    fn check(&self, point: FailPoint, program: &str) -> snapdist::Result<()> {
        if *self.fail.lock() == Some(point) {
            return Err(Error::Subprocess {
                program: program.to_string(),
                code: Some(1),
                signal: None,
                stderr: "injected failure".into(),
            }
            .into());
        }
        Ok(())
    }

    fn record(&self, call: ToolCall) {
        self.calls.lock().push(call);
    }
}

fn artifact_version(path: &Path) -> Option<u64> {
    let name = path.file_name()?.to_str()?;
    snapdist::store::parse_artifact_name(name).map(|(v, _)| v)
}

impl DiffEngine for FakeTools {
    fn generate(
        &self,
        source: &Path,
        image: &Path,
        batch: &Path,
        _opts: &[String],
    ) -> snapdist::Result<()> {
        self.record(ToolCall::Generate);
        let tree = snapshot(source)?;
        fs::write(batch, serde_json::to_vec(&tree)?)?;
        self.check(FailPoint::Generate, "rsync")?;
        materialize(image, &tree, &[])?;
        Ok(())
    }

    fn replay(&self, batch: &Path, dest: &Path) -> snapdist::Result<()> {
        self.record(ToolCall::Replay {
            dest: dest.to_path_buf(),
        });
        let tree: Tree = serde_json::from_slice(&fs::read(batch)?)?;
        materialize(dest, &tree, &BOOKKEEPING)?;
        Ok(())
    }
}

impl Archiver for FakeTools {
    fn create(&self, source: &Path, archive: &Path) -> snapdist::Result<()> {
        self.record(ToolCall::Create {
            archive: archive.to_path_buf(),
        });
        let tree = snapshot(source)?;
        fs::write(archive, serde_json::to_vec(&tree)?)?;
        self.check(FailPoint::Create, "tar")?;
        Ok(())
    }

    fn extract(&self, archive: &Path, dest: &Path) -> snapdist::Result<()> {
        self.record(ToolCall::Extract {
            archive: archive.to_path_buf(),
            dest: dest.to_path_buf(),
        });
        let tree: Tree = serde_json::from_slice(&fs::read(archive)?)?;
        write_tree(dest, &tree)?;
        Ok(())
    }
}

impl Compressor for FakeTools {
    fn compress(&self, input: &Path, output: &Path) -> snapdist::Result<()> {
        self.record(ToolCall::Compress);
        fs::copy(input, output)?;
        self.check(FailPoint::Compress, "gzip")?;
        Ok(())
    }

    fn decompress(&self, input: &Path, output: &Path) -> snapdist::Result<()> {
        self.record(ToolCall::Decompress {
            input: input.to_path_buf(),
        });
        fs::copy(input, output)?;
        Ok(())
    }
}

/// Capture every entry under `root`, skipping target bookkeeping files.
pub fn snapshot(root: &Path) -> snapdist::Result<Tree> {
    let mut tree = Tree::new();
    walk(root, root, &mut tree)?;
    Ok(tree)
}

fn walk(root: &Path, dir: &Path, tree: &mut Tree) -> snapdist::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let rel = path
            .strip_prefix(root)
            .expect("entry below root")
            .to_string_lossy()
            .to_string();
        if BOOKKEEPING.contains(&rel.as_str()) {
            continue;
        }
        if entry.file_type()?.is_dir() {
            tree.insert(rel, Node::Dir);
            walk(root, &path, tree)?;
        } else {
            tree.insert(rel, Node::File(fs::read(&path)?));
        }
    }
    Ok(())
}

fn materialize(dest: &Path, tree: &Tree, keep: &[&str]) -> snapdist::Result<()> {
    snapdist::fs::wipe_dir_except(dest, keep)?;
    write_tree(dest, tree)
}

fn write_tree(dest: &Path, tree: &Tree) -> snapdist::Result<()> {
    for (rel, node) in tree {
        let path = dest.join(rel);
        match node {
            Node::Dir => fs::create_dir_all(&path)?,
            Node::File(data) => {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&path, data)?;
            }
        }
    }
    Ok(())
}

/// Replace the content of `dir` with `files` (relative path, body).
pub fn set_content(dir: &Path, files: &[(&str, &str)]) {
    fs::create_dir_all(dir).unwrap();
    snapdist::fs::wipe_dir_except(dir, &[]).unwrap();
    for (rel, body) in files {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }
}

/// Files under `dir` (bookkeeping excluded) as path -> content.
pub fn files_of(dir: &Path) -> BTreeMap<String, Vec<u8>> {
    snapshot(dir)
        .unwrap()
        .into_iter()
        .filter_map(|(rel, node)| match node {
            Node::File(data) => Some((rel, data)),
            Node::Dir => None,
        })
        .collect()
}

/// Sorted artifact file names present in `dist`.
pub fn artifact_names(dist: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dist)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter_map(|e| e.file_name().to_str().map(str::to_string))
        .filter(|n| snapdist::store::parse_artifact_name(n).is_some())
        .collect();
    names.sort();
    names
}
