//! `up`: bring one target directory to the latest (or a chosen) version.
//!
//! Whether a target gets a full or an incremental restore depends only on its
//! recorded version, its lock marker and which artifacts exist; target
//! content is never inspected.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::{
    fs::{require_dir, wipe_dir_except},
    store::{ArtifactKind, RestoreMode, RestorePlan, VersionStore},
    tools::Toolchain,
    Error, Result,
};

use super::state::{TargetState, TARGET_LOCK_FILE, VERSION_FILE};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApplyOptions {
    /// Take over a lock left by an interrupted apply (implies a full restore).
    pub force: bool,
    /// Always perform a full restore.
    pub full: bool,
    /// Converge to this committed version instead of the latest.
    pub to_version: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApplyOutcome {
    pub mode: RestoreMode,
    pub previous: Option<u64>,
    pub version: u64,
    /// Full image extracted, if any.
    pub base: Option<u64>,
    /// Diff versions replayed, in order.
    pub replayed: Vec<u64>,
}

#[derive(Debug)]
pub struct ApplyEngine<'a> {
    store: VersionStore,
    tools: &'a Toolchain,
}

impl<'a> ApplyEngine<'a> {
    /// `dist_dir` is only read; targets never touch the distribution lock.
    pub fn new(dist_dir: &Path, tools: &'a Toolchain) -> Self {
        Self {
            store: VersionStore::new(dist_dir),
            tools,
        }
    }

    #[instrument(skip(self, target_dir), fields(dist = %self.store.dir().display(), target = %target_dir.display()))]
    pub fn up(&self, target_dir: &Path, opts: ApplyOptions) -> Result<ApplyOutcome> {
        require_dir(self.store.dir(), "distribution directory")?;
        require_dir(target_dir, "target directory")?;

        let latest = self.store.current_version()?;
        if latest == 0 {
            return Err(Error::Config(format!(
                "{} has no committed versions",
                self.store.dir().display()
            ))
            .into());
        }
        let goal = opts.to_version.unwrap_or(latest);
        if goal == 0 || goal > latest {
            return Err(Error::Config(format!(
                "requested version {goal} is outside the committed range 1..={latest}"
            ))
            .into());
        }

        let state = TargetState::new(target_dir);
        let lock = state.lock();
        let lock_held = lock.is_held();
        let recorded = state.recorded_version()?;

        let mode = self.decide(target_dir, recorded, lock_held, goal, opts)?;
        let plan = match mode {
            RestoreMode::Full => RestorePlan::full(&self.store, goal)?,
            RestoreMode::Incremental => RestorePlan::incremental(recorded.unwrap_or(0), goal),
        };
        plan.validate(&self.store)?;

        if lock_held {
            lock.take_over()?;
        } else {
            lock.acquire()?;
        }

        if mode == RestoreMode::Full {
            // A forced takeover must not leave a stale marker behind if this run dies too.
            state.clear_version()?;
            wipe_dir_except(target_dir, &[VERSION_FILE, TARGET_LOCK_FILE])?;
        }
        info!(
            mode = ?mode,
            from = ?recorded,
            to = goal,
            full = ?plan.base,
            diffs = plan.diffs.len(),
            "applying"
        );
        plan.execute(&self.store, self.tools, target_dir)?;

        state.record_version(goal)?;
        lock.release()?;
        info!(version = goal, "target up to date");

        Ok(ApplyOutcome {
            mode,
            previous: recorded,
            version: goal,
            base: plan.base,
            replayed: plan.diffs,
        })
    }

    /// Full vs incremental, evaluated in a fixed order.
    fn decide(
        &self,
        target_dir: &Path,
        recorded: Option<u64>,
        lock_held: bool,
        goal: u64,
        opts: ApplyOptions,
    ) -> Result<RestoreMode> {
        let Some(recorded) = recorded else {
            return Ok(RestoreMode::Full);
        };

        if lock_held {
            if !opts.force {
                return Err(Error::InconsistentTarget(target_dir.to_path_buf()).into());
            }
            if recorded < goal && self.store.has_artifact(recorded + 1, ArtifactKind::Diff) {
                warn!(
                    recorded,
                    goal,
                    "forced apply discards an available incremental path; doing a full restore"
                );
            } else {
                info!(recorded, goal, "forced apply on a locked target; doing a full restore");
            }
            return Ok(RestoreMode::Full);
        }

        if opts.full {
            return Ok(RestoreMode::Full);
        }

        if recorded > goal {
            warn!(recorded, goal, "target is ahead of the requested version; doing a full restore");
            return Ok(RestoreMode::Full);
        }

        if recorded < goal && !self.store.has_artifact(recorded + 1, ArtifactKind::Diff) {
            info!(
                next = recorded + 1,
                "diff for the next version is missing; falling back to a full restore"
            );
            return Ok(RestoreMode::Full);
        }

        Ok(RestoreMode::Incremental)
    }
}
