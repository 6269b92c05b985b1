use std::path::Path;

use anyhow::Result;

use crate::{
    command::{CommandRunner, Invocation},
    error::Fatal,
    workdir::CertDir,
};

/// The hosting provider's command line client.
#[derive(Debug, Clone)]
pub struct HostingCli {
    program: String,
}

impl HostingCli {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Lists the site's aliases in the order the provider reports them.
    pub fn list_aliases(&self, runner: &dyn CommandRunner) -> Result<Vec<String>> {
        let output = runner.run_checked(&Invocation::new(&self.program).arg("list-aliases"))?;
        Ok(parse_aliases(&output.stdout_lossy()))
    }

    /// Installs a key + certificate + chain bundle.
    ///
    /// On failure the error carries a command the operator can run by hand.
    pub fn install_tls(
        &self,
        runner: &dyn CommandRunner,
        bundle: Vec<u8>,
        cert_dir: &CertDir,
    ) -> Result<()> {
        let invocation = Invocation::new(&self.program)
            .args(["-i", "set-tls"])
            .stdin(bundle);
        let detail = match runner.run(&invocation) {
            Ok(output) if output.success() => return Ok(()),
            Ok(output) => output.failure_detail(),
            Err(err) => format!("{err:#}"),
        };
        Err(Fatal::UploadFailed {
            detail,
            recovery: self.recovery_command(cert_dir.path()),
        }
        .into())
    }

    pub fn recovery_command(&self, cert_dir: &Path) -> String {
        let files = CertDir::new(cert_dir)
            .bundle_paths()
            .iter()
            .map(|path| shell_quote(&path.to_string_lossy()))
            .collect::<Vec<_>>();
        format!("cat {} | {} -i set-tls", files.join(" "), self.program)
    }
}

/// Single-quotes `arg` for a POSIX shell.
fn shell_quote(arg: &str) -> String {
    format!("'{}'", arg.replace('\'', r"'\''"))
}

fn parse_aliases(output: &str) -> Vec<String> {
    output
        .split_whitespace()
        .map(|alias| alias.to_string())
        .collect()
}
