//! Synchronous execution of external collaborators.

use std::{
    fs::File,
    io::ErrorKind,
    path::Path,
    process::{Command, Output, Stdio},
};

use tracing::debug;

use crate::{Error, Result};

/// Runs one external command to completion and maps its exit status.
///
/// Exactly one subprocess is in flight at a time; callers block until it has
/// exited before starting the next step.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubprocessRunner;

impl SubprocessRunner {
    pub fn new() -> Self {
        Self
    }

    pub fn run(&self, cmd: &mut Command) -> Result<()> {
        cmd.stdout(Stdio::null());
        self.execute(cmd)
    }

    /// Run `cmd` with its standard output written to `out` (created or truncated).
    pub fn run_with_stdout(&self, cmd: &mut Command, out: &Path) -> Result<()> {
        let file = File::create(out)?;
        cmd.stdout(Stdio::from(file));
        self.execute(cmd)
    }

    fn execute(&self, cmd: &mut Command) -> Result<()> {
        let program = cmd.get_program().to_string_lossy().to_string();
        debug!(
            program = %program,
            args = ?cmd.get_args().collect::<Vec<_>>(),
            "running external tool"
        );

        cmd.stdin(Stdio::null()).stderr(Stdio::piped());
        let output = match cmd.output() {
            Ok(output) => output,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::Config(format!(
                    "{program} not found in PATH; install it or point the matching SNAPDIST_* variable at it"
                ))
                .into());
            }
            Err(e) => return Err(Error::Io(e).into()),
        };

        check_status(&program, &output)
    }
}

fn check_status(program: &str, output: &Output) -> Result<()> {
    if output.status.success() {
        return Ok(());
    }

    Err(Error::Subprocess {
        program: program.to_string(),
        code: output.status.code(),
        signal: exit_signal(output),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    }
    .into())
}

#[cfg(unix)]
fn exit_signal(output: &Output) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    output.status.signal()
}

#[cfg(not(unix))]
fn exit_signal(_output: &Output) -> Option<i32> {
    None
}
