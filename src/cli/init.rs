//! Implementation of `snapdist init`.

use std::path::PathBuf;

use clap::Args;

use crate::{source::DistDir, Result};

use super::required;

#[derive(Debug, Clone, Args, Default)]
pub struct InitArgs {
    /// Distribution directory to create
    pub dist_dir: Option<PathBuf>,
}

pub fn execute(args: InitArgs) -> Result<()> {
    let dist_dir = required(args.dist_dir, "dist_dir")?;
    DistDir::init(dist_dir)?;
    Ok(())
}
