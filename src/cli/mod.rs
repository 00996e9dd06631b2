//! Command-line front-end; one submodule per command.

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};

use crate::{config::DistConfig, tools::Toolchain, Error, Result};

pub mod commit;
pub mod init;
pub mod reset;
pub mod status;
pub mod up;
pub mod version;

#[derive(Debug, Clone)]
pub enum Command {
    Init(init::InitArgs),
    Commit(commit::CommitArgs),
    Reset(reset::ResetArgs),
    Up(up::UpArgs),
    Version(version::VersionArgs),
    Status(status::StatusArgs),
    None,
}

#[derive(Debug, Clone)]
pub struct CliArgs {
    pub command: Command,
}

impl Default for CliArgs {
    fn default() -> Self {
        Self {
            command: Command::None,
        }
    }
}

pub fn dispatch(args: CliArgs) -> Result<()> {
    match args.command {
        Command::Init(a) => init::execute(a),
        Command::Commit(a) => commit::execute(a),
        Command::Reset(a) => reset::execute(a),
        Command::Up(a) => up::execute(a),
        Command::Version(a) => version::execute(a),
        Command::Status(a) => status::execute(a),
        Command::None => Ok(()),
    }
}

/// Output format for the informational commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(
    name = "snapdist",
    version,
    about = "Distribute versioned directory snapshots as full images and incremental diffs"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Subcommands>,
}

#[derive(Subcommand, Debug)]
enum Subcommands {
    /// Create a distribution directory with an empty working image.
    Init(init::InitArgs),
    /// Commit the content of a source directory as the next version.
    Commit(commit::CommitArgs),
    /// Rebuild the working image after an interrupted commit or reset.
    Reset(reset::ResetArgs),
    /// Bring a target directory up to the latest (or a chosen) version.
    Up(up::UpArgs),
    /// Print the current version of a distribution.
    Version(version::VersionArgs),
    /// Show the recorded version and lock state of a target directory.
    Status(status::StatusArgs),
}

/// Parse CLI arguments into internal representation.
pub fn parse_args<I, S>(args: I) -> Result<CliArgs>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let argv: Vec<String> = args.into_iter().map(Into::into).collect();
    let cli = Cli::parse_from(argv);
    let command = match cli.command {
        Some(Subcommands::Init(args)) => Command::Init(args),
        Some(Subcommands::Commit(args)) => Command::Commit(args),
        Some(Subcommands::Reset(args)) => Command::Reset(args),
        Some(Subcommands::Up(args)) => Command::Up(args),
        Some(Subcommands::Version(args)) => Command::Version(args),
        Some(Subcommands::Status(args)) => Command::Status(args),
        None => Command::None,
    };

    Ok(CliArgs { command })
}

/// Build the underlying clap `Command` (useful for help/usage contract tests).
pub fn clap_command() -> clap::Command {
    Cli::command()
}

pub(crate) fn required<T>(value: Option<T>, name: &str) -> Result<T> {
    value.ok_or_else(|| Error::Cli(format!("{name} is required")).into())
}

/// Configuration and toolchain for one invocation.
pub(crate) fn load_runtime(extra_archive_opts: Vec<String>) -> Result<(DistConfig, Toolchain)> {
    let config = DistConfig::from_env()?.with_archive_opts(extra_archive_opts);
    let tools = Toolchain::from_config(&config);
    Ok((config, tools))
}
