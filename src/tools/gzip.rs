use std::{path::Path, process::Command};

use crate::Result;

use super::{runner::SubprocessRunner, Compressor};

#[derive(Debug, Clone)]
pub struct GzipCompressor {
    program: String,
    runner: SubprocessRunner,
}

impl GzipCompressor {
    pub fn new(program: impl Into<String>, runner: SubprocessRunner) -> Self {
        Self {
            program: program.into(),
            runner,
        }
    }
}

impl Compressor for GzipCompressor {
    fn compress(&self, input: &Path, output: &Path) -> Result<()> {
        let mut cmd = Command::new(&self.program);
        cmd.args(["-c", "-n"]).arg(input);
        self.runner.run_with_stdout(&mut cmd, output)
    }

    fn decompress(&self, input: &Path, output: &Path) -> Result<()> {
        let mut cmd = Command::new(&self.program);
        cmd.args(["-d", "-c"]).arg(input);
        self.runner.run_with_stdout(&mut cmd, output)
    }
}
