use std::{path::Path, process::Command};

use crate::Result;

use super::{runner::SubprocessRunner, Archiver};

#[derive(Debug, Clone)]
pub struct TarArchiver {
    program: String,
    opts: Vec<String>,
    runner: SubprocessRunner,
}

impl TarArchiver {
    pub fn new(program: impl Into<String>, opts: Vec<String>, runner: SubprocessRunner) -> Self {
        Self {
            program: program.into(),
            opts,
            runner,
        }
    }
}

impl Archiver for TarArchiver {
    fn create(&self, source: &Path, archive: &Path) -> Result<()> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.opts)
            .arg("-C")
            .arg(source)
            .arg("-cf")
            .arg(archive)
            .arg(".");
        self.runner.run(&mut cmd)
    }

    fn extract(&self, archive: &Path, dest: &Path) -> Result<()> {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-C").arg(dest).arg("-xf").arg(archive);
        self.runner.run(&mut cmd)
    }
}
