use std::path::Path;

use anyhow::Result;

use crate::command::{CommandRunner, Invocation};

#[derive(Debug, Clone)]
pub struct Git {
    program: String,
}

impl Git {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn clone_repo(&self, runner: &dyn CommandRunner, url: &str, dir: &Path) -> Result<()> {
        let invocation = Invocation::new(&self.program)
            .args(["clone", "--quiet", url])
            .arg(dir);
        runner.run_checked(&invocation)?;
        Ok(())
    }

    pub fn pull(&self, runner: &dyn CommandRunner, dir: &Path) -> Result<()> {
        let invocation = Invocation::new(&self.program)
            .arg("-C")
            .arg(dir)
            .args(["pull", "--quiet"]);
        runner.run_checked(&invocation)?;
        Ok(())
    }
}
