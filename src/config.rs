//! Immutable per-run configuration.
//!
//! A [`DistConfig`] is built once from the environment (plus CLI overrides)
//! and handed by reference to every component; nothing mutates it afterwards.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub const FULL_INTERVAL_ENV: &str = "SNAPDIST_FULL_INTERVAL";
pub const RSYNC_ENV: &str = "SNAPDIST_RSYNC";
pub const TAR_ENV: &str = "SNAPDIST_TAR";
pub const GZIP_ENV: &str = "SNAPDIST_GZIP";
pub const TAR_OPTS_ENV: &str = "SNAPDIST_TAR_OPTS";

pub const DEFAULT_FULL_INTERVAL: u64 = 100;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolPrograms {
    pub rsync: String,
    pub tar: String,
    pub gzip: String,
}

impl Default for ToolPrograms {
    fn default() -> Self {
        Self {
            rsync: "rsync".into(),
            tar: "tar".into(),
            gzip: "gzip".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DistConfig {
    /// Cadence of full-image artifacts: version 1 and every `v % full_interval == 1`.
    pub full_interval: u64,
    pub programs: ToolPrograms,
    /// Extra arguments handed to the archiver when creating a full image.
    pub archive_opts: Vec<String>,
}

impl Default for DistConfig {
    fn default() -> Self {
        Self {
            full_interval: DEFAULT_FULL_INTERVAL,
            programs: ToolPrograms::default(),
            archive_opts: Vec::new(),
        }
    }
}

impl DistConfig {
    pub fn with_full_interval(full_interval: u64) -> Result<Self> {
        validate_interval(full_interval)?;
        Ok(Self {
            full_interval,
            ..Self::default()
        })
    }

    /// Build the configuration from `SNAPDIST_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let _env = crate::env_lock().lock();
        let mut cfg = Self::default();

        if let Ok(raw) = std::env::var(FULL_INTERVAL_ENV) {
            cfg.full_interval = parse_interval(&raw)?;
        }
        if let Some(v) = non_empty_var(RSYNC_ENV) {
            cfg.programs.rsync = v;
        }
        if let Some(v) = non_empty_var(TAR_ENV) {
            cfg.programs.tar = v;
        }
        if let Some(v) = non_empty_var(GZIP_ENV) {
            cfg.programs.gzip = v;
        }
        if let Some(v) = non_empty_var(TAR_OPTS_ENV) {
            cfg.archive_opts = v.split_whitespace().map(str::to_string).collect();
        }

        Ok(cfg)
    }

    /// Append per-invocation archiver options after the environment ones.
    pub fn with_archive_opts(mut self, extra: impl IntoIterator<Item = String>) -> Self {
        self.archive_opts.extend(extra);
        self
    }

    pub fn is_full_version(&self, version: u64) -> bool {
        version == 1 || version % self.full_interval == 1
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_interval(raw: &str) -> Result<u64> {
    let value: u64 = raw.trim().parse().map_err(|_| {
        Error::Config(format!("{FULL_INTERVAL_ENV} must be a positive integer, got {raw:?}"))
    })?;
    validate_interval(value)?;
    Ok(value)
}

fn validate_interval(value: u64) -> Result<()> {
    if value == 0 {
        return Err(Error::Config(format!("{FULL_INTERVAL_ENV} must be at least 1")).into());
    }
    Ok(())
}
