//! Implementation of `snapdist status`.

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use crate::{fs::require_dir, lock::LockMarker, target::TargetState, Result};

use super::{required, OutputFormat};

#[derive(Debug, Clone, Args, Default)]
pub struct StatusArgs {
    /// Target directory to inspect
    pub target_dir: Option<PathBuf>,

    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Debug, Serialize)]
pub struct TargetStatus {
    pub version: Option<u64>,
    pub locked: bool,
    pub holder: Option<LockMarker>,
}

pub fn inspect(target_dir: &std::path::Path) -> Result<TargetStatus> {
    require_dir(target_dir, "target directory")?;
    let state = TargetState::new(target_dir);
    let lock = state.lock();
    Ok(TargetStatus {
        version: state.recorded_version()?,
        locked: lock.is_held(),
        holder: lock.holder(),
    })
}

pub fn execute(args: StatusArgs) -> Result<()> {
    let target_dir = required(args.target_dir, "target_dir")?;
    let status = inspect(&target_dir)?;

    match args.format {
        OutputFormat::Text => {
            match status.version {
                Some(v) => println!("version {v}"),
                None => println!("version none"),
            }
            if status.locked {
                println!("locked (interrupted apply; run `snapdist up --force`)");
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&status)?),
    }
    Ok(())
}
