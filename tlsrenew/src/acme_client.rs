use std::path::Path;

use anyhow::{Context, Result};
use fs_err as fs;
use tracing::{debug, warn};

use crate::{
    command::{CommandRunner, Invocation},
    error::Fatal,
    workdir::{CertDir, ClientDir},
};

/// Wrapper around a dehydrated-style shell ACME client checkout.
#[derive(Debug, Clone)]
pub struct AcmeClient {
    dir: ClientDir,
    script: String,
}

impl AcmeClient {
    pub fn new(dir: ClientDir, script: impl Into<String>) -> Self {
        Self {
            dir,
            script: script.into(),
        }
    }

    pub fn dir(&self) -> &ClientDir {
        &self.dir
    }

    /// Points the HTTP-01 challenge at `webroot`.
    pub fn write_config(&self, webroot: &Path) -> Result<()> {
        let config = format!("WELLKNOWN=\"{}\"\n", webroot.display());
        fs::write(self.dir.config_path(), config).context("failed to write client config")?;
        Ok(())
    }

    /// Replaces the domain list with a single certificate covering `aliases`.
    pub fn write_domains(&self, aliases: &[String]) -> Result<()> {
        fs::write(self.dir.domains_path(), format!("{}\n", aliases.join(" ")))
            .context("failed to write domain list")?;
        Ok(())
    }

    pub fn register(&self, runner: &dyn CommandRunner) -> Result<()> {
        runner.run_checked(&self.invocation(["--register", "--accept-terms"]))?;
        Ok(())
    }

    /// Issues or renews every certificate in the domain list.
    pub fn cron(&self, runner: &dyn CommandRunner) -> Result<()> {
        let output = runner.run(&self.invocation(["--cron"]))?;
        if !output.success() {
            return Err(Fatal::RenewalFailed(output.failure_detail()).into());
        }
        Ok(())
    }

    /// Finds the directory the client wrote the certificate for `aliases` to.
    ///
    /// The client names it after the first domain of the list. If that one is
    /// missing the other aliases are tried in order.
    pub fn locate_cert_dir(&self, aliases: &[String]) -> Result<CertDir> {
        let existing = aliases
            .iter()
            .map(|alias| self.dir.cert_dir(alias))
            .filter(|path| path.is_dir())
            .collect::<Vec<_>>();
        let Some(first) = existing.first() else {
            return Err(Fatal::CertDirNotFound(aliases.to_vec()).into());
        };
        if existing.len() > 1 {
            warn!(
                "several certificate directories match the aliases, using {}",
                first.display()
            );
        }
        debug!("certificate directory: {}", first.display());
        Ok(CertDir::new(first))
    }

    /// Key, certificate and chain concatenated in upload order.
    pub fn read_bundle(&self, cert_dir: &CertDir) -> Result<Vec<u8>> {
        let mut bundle = vec![];
        for path in cert_dir.bundle_paths() {
            bundle.extend(fs::read(&path)?);
        }
        Ok(bundle)
    }

    fn invocation<const N: usize>(&self, args: [&str; N]) -> Invocation {
        Invocation::new(self.dir.script_path(&self.script).to_string_lossy())
            .args(args)
            .current_dir(self.dir.path())
    }
}
