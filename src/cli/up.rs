//! Implementation of `snapdist up`.

use std::path::PathBuf;

use clap::Args;

use crate::{
    target::{ApplyEngine, ApplyOptions},
    Result,
};

use super::{load_runtime, required};

#[derive(Debug, Clone, Args, Default)]
pub struct UpArgs {
    /// Take over a lock left by an interrupted run and do a full restore
    #[arg(long = "force")]
    pub force: bool,

    /// Always do a full restore
    #[arg(long = "full")]
    pub full: bool,

    /// Converge to this committed version instead of the latest
    #[arg(long = "to-version", value_name = "VERSION")]
    pub to_version: Option<u64>,

    /// Distribution directory to read artifacts from
    pub dist_dir: Option<PathBuf>,

    /// Target directory to update
    pub target_dir: Option<PathBuf>,
}

pub fn execute(args: UpArgs) -> Result<()> {
    let dist_dir = required(args.dist_dir, "dist_dir")?;
    let target_dir = required(args.target_dir, "target_dir")?;

    let (_config, tools) = load_runtime(Vec::new())?;
    let outcome = ApplyEngine::new(&dist_dir, &tools).up(
        &target_dir,
        ApplyOptions {
            force: args.force,
            full: args.full,
            to_version: args.to_version,
        },
    )?;
    println!("{}", outcome.version);
    Ok(())
}
