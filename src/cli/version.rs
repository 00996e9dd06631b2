//! Implementation of `snapdist version`.

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use crate::{fs::require_dir, store::VersionStore, Result};

use super::{required, OutputFormat};

#[derive(Debug, Clone, Args, Default)]
pub struct VersionArgs {
    /// Distribution directory
    pub dist_dir: Option<PathBuf>,

    /// Also report the latest full-image version
    #[arg(long = "full")]
    pub full: bool,

    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Debug, Serialize)]
struct VersionReport {
    current: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    latest_full: Option<u64>,
}

pub fn execute(args: VersionArgs) -> Result<()> {
    let dist_dir = required(args.dist_dir, "dist_dir")?;
    require_dir(&dist_dir, "distribution directory")?;

    let store = VersionStore::new(&dist_dir);
    let current = store.current_version()?;
    let latest_full = if args.full && current > 0 {
        Some(store.find_latest_full_version()?)
    } else {
        None
    };

    match args.format {
        OutputFormat::Text => {
            println!("{current}");
            if let Some(full) = latest_full {
                println!("full {full}");
            }
        }
        OutputFormat::Json => {
            let report = VersionReport {
                current,
                latest_full,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}
