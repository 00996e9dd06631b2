use std::{path::PathBuf, sync::OnceLock};

use parking_lot::ReentrantMutex;
use thiserror::Error;

pub mod cli;
pub mod config;
pub mod fs;
pub mod lock;
pub mod logging;
pub mod source;
pub mod store;
pub mod target;
pub mod tools;

pub type Result<T> = anyhow::Result<T>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("lock already held: {0} (a previous operation did not finish; run `snapdist reset` on the distribution or `up --force` on the target)")]
    AlreadyLocked(PathBuf),
    #[error("no interrupted operation recorded at {0}; pass --force to rebuild anyway")]
    NotLocked(PathBuf),
    #[error("failed to release lock {path}: {source} (the operation may have completed; inspect and remove the lock manually)")]
    LockRelease {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("inconsistent state: {0} (run `snapdist reset --force` to rebuild)")]
    InconsistentState(String),
    #[error("inconsistent target: {0} is locked by an interrupted apply; rerun `snapdist up --force`")]
    InconsistentTarget(PathBuf),
    #[error("{program} failed ({}): {stderr}", describe_exit(.code, .signal))]
    Subprocess {
        program: String,
        code: Option<i32>,
        signal: Option<i32>,
        stderr: String,
    },
    #[error("broken invariant: {0}")]
    BrokenInvariant(String),
    #[error("serialization error")]
    Serde(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("cli error: {0}")]
    Cli(String),
}

fn describe_exit(code: &Option<i32>, signal: &Option<i32>) -> String {
    match (*code, *signal) {
        (Some(code), _) => format!("exit code {code}"),
        (None, Some(sig)) => format!("terminated by signal {sig}"),
        (None, None) => "unknown exit status".to_string(),
    }
}

/// Serializes tests and helpers that mutate process environment variables.
pub fn env_lock() -> &'static ReentrantMutex<()> {
    static LOCK: OnceLock<ReentrantMutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| ReentrantMutex::new(()))
}

/// Entry point for the library, called by the CLI thin wrapper.
pub fn run<I, S>(args: I) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    // Initialize logging before doing anything else.
    logging::init_logging(logging::LogFormat::from_env())?;

    let cli_args = cli::parse_args(args.into_iter().map(Into::into))?;
    cli::dispatch(cli_args)
}
