//! Implementation of `snapdist reset`.

use std::path::PathBuf;

use clap::Args;

use crate::{
    source::{DistDir, RecoveryManager},
    Result,
};

use super::{load_runtime, required};

#[derive(Debug, Clone, Args, Default)]
pub struct ResetArgs {
    /// Distribution directory
    pub dist_dir: Option<PathBuf>,

    /// Rebuild even if no interrupted operation left the lock behind
    #[arg(long = "force")]
    pub force: bool,
}

pub fn execute(args: ResetArgs) -> Result<()> {
    let dist_dir = required(args.dist_dir, "dist_dir")?;
    let (config, tools) = load_runtime(Vec::new())?;
    let dist = DistDir::open_for_recovery(dist_dir)?;
    RecoveryManager::new(&dist, &config, &tools).reset(args.force)?;
    Ok(())
}
