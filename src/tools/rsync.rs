use std::{ffi::OsString, fs, io::ErrorKind, path::Path, process::Command};

use crate::{
    target::{TARGET_LOCK_FILE, VERSION_FILE},
    Result,
};

use super::{dir_contents_arg, runner::SubprocessRunner, DiffEngine};

/// Diff engine backed by rsync batch mode (`--write-batch` / `--read-batch`).
#[derive(Debug, Clone)]
pub struct RsyncDiffEngine {
    program: String,
    runner: SubprocessRunner,
}

impl RsyncDiffEngine {
    pub fn new(program: impl Into<String>, runner: SubprocessRunner) -> Self {
        Self {
            program: program.into(),
            runner,
        }
    }

    /// Command line for replaying `batch` onto `dest`.
    pub fn replay_command(&self, batch: &Path, dest: &Path) -> Command {
        let mut read_batch = OsString::from("--read-batch=");
        read_batch.push(batch.as_os_str());

        let mut cmd = Command::new(&self.program);
        cmd.args(["-a", "--delete"]).arg(read_batch);
        // Target bookkeeping files live inside the target tree and must survive --delete.
        for name in [VERSION_FILE, TARGET_LOCK_FILE] {
            cmd.arg(format!("--filter=P /{name}"));
        }
        cmd.arg(dir_contents_arg(dest));
        cmd
    }
}

impl DiffEngine for RsyncDiffEngine {
    fn generate(&self, source: &Path, image: &Path, batch: &Path, opts: &[String]) -> Result<()> {
        let mut write_batch = OsString::from("--write-batch=");
        write_batch.push(batch.as_os_str());

        let mut cmd = Command::new(&self.program);
        cmd.args(["-a", "--delete"])
            .args(opts)
            .arg(write_batch)
            .arg(dir_contents_arg(source))
            .arg(dir_contents_arg(image));
        self.runner.run(&mut cmd)?;

        // rsync drops a helper script next to the batch; it is not part of the artifact.
        let mut script = batch.as_os_str().to_os_string();
        script.push(".sh");
        match fs::remove_file(&script) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn replay(&self, batch: &Path, dest: &Path) -> Result<()> {
        self.runner.run(&mut self.replay_command(batch, dest))
    }
}
