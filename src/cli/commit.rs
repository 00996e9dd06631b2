//! Implementation of `snapdist commit`.

use std::path::PathBuf;

use clap::Args;

use crate::{
    source::{CommitPipeline, DistDir},
    Result,
};

use super::{load_runtime, required};

#[derive(Debug, Clone, Args, Default)]
pub struct CommitArgs {
    /// Extra archiver option used when a full image is written (repeatable)
    #[arg(long = "archive-opt", value_name = "OPT", allow_hyphen_values = true)]
    pub archive_opts: Vec<String>,

    /// Distribution directory
    pub dist_dir: Option<PathBuf>,

    /// Diff tool options, followed by the source directory to commit
    #[arg(
        value_name = "ARGS",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub rest: Vec<String>,
}

impl CommitArgs {
    /// Split the trailing arguments into (diff options, source directory).
    pub fn split_rest(&self) -> Option<(&[String], PathBuf)> {
        let (source, opts) = self.rest.split_last()?;
        Some((opts, PathBuf::from(source)))
    }
}

pub fn execute(args: CommitArgs) -> Result<()> {
    let dist_dir = required(args.dist_dir.clone(), "dist_dir")?;
    let (diff_opts, source_dir) = required(args.split_rest(), "source_dir")?;

    let (config, tools) = load_runtime(args.archive_opts.clone())?;
    let dist = DistDir::open(dist_dir)?;
    let version = CommitPipeline::new(&dist, &config, &tools).commit(&source_dir, diff_opts)?;
    println!("{version}");
    Ok(())
}
