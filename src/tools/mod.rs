//! External collaborators: diff engine, archiver and compressor.
//!
//! The protocol engines only see the traits below; the default
//! [`Toolchain`] shells out to rsync (batch mode), tar and gzip through a
//! [`SubprocessRunner`].

use std::{ffi::OsString, path::Path};

use crate::{config::DistConfig, Result};

pub mod gzip;
pub mod rsync;
pub mod runner;
pub mod tar;

pub use gzip::GzipCompressor;
pub use rsync::RsyncDiffEngine;
pub use runner::SubprocessRunner;
pub use tar::TarArchiver;

/// Computes and replays whole-tree deltas.
pub trait DiffEngine: Send + Sync {
    /// Write a batch describing how to turn `image` into `source`, updating
    /// `image` in place so that it matches `source` afterwards.
    fn generate(&self, source: &Path, image: &Path, batch: &Path, opts: &[String]) -> Result<()>;

    /// Apply a previously generated batch to `dest`.
    fn replay(&self, batch: &Path, dest: &Path) -> Result<()>;
}

/// Creates and extracts self-contained full-content archives.
pub trait Archiver: Send + Sync {
    fn create(&self, source: &Path, archive: &Path) -> Result<()>;
    fn extract(&self, archive: &Path, dest: &Path) -> Result<()>;
}

/// Single-file compression used for diff artifacts.
pub trait Compressor: Send + Sync {
    fn compress(&self, input: &Path, output: &Path) -> Result<()>;
    fn decompress(&self, input: &Path, output: &Path) -> Result<()>;
}

pub struct Toolchain {
    pub diff: Box<dyn DiffEngine>,
    pub archiver: Box<dyn Archiver>,
    pub compressor: Box<dyn Compressor>,
}

impl std::fmt::Debug for Toolchain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Toolchain").finish_non_exhaustive()
    }
}

impl Toolchain {
    pub fn new(
        diff: Box<dyn DiffEngine>,
        archiver: Box<dyn Archiver>,
        compressor: Box<dyn Compressor>,
    ) -> Self {
        Self {
            diff,
            archiver,
            compressor,
        }
    }

    /// rsync + tar + gzip, with program names and archive options from `cfg`.
    pub fn from_config(cfg: &DistConfig) -> Self {
        let runner = SubprocessRunner::new();
        Self::new(
            Box::new(RsyncDiffEngine::new(&cfg.programs.rsync, runner)),
            Box::new(TarArchiver::new(
                &cfg.programs.tar,
                cfg.archive_opts.clone(),
                runner,
            )),
            Box::new(GzipCompressor::new(&cfg.programs.gzip, runner)),
        )
    }
}

/// `path` with a trailing separator, so copy tools treat it as "contents of".
pub(crate) fn dir_contents_arg(path: &Path) -> OsString {
    let mut arg = path.as_os_str().to_os_string();
    if !arg.to_string_lossy().ends_with('/') {
        arg.push("/");
    }
    arg
}
