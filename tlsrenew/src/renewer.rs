use anyhow::{Context, Result};
use fs_err as fs;
use path_absolutize::Absolutize;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tracing::{debug, info, warn};

use crate::{
    acme_client::AcmeClient,
    command::{CommandRunner, SystemRunner},
    config::RenewerConfig,
    error::Fatal,
    expiration::{self, renewal_due, ExpirationSource},
    git::Git,
    hosting::HostingCli,
    inspect::{CertInspector, Inspect},
    workdir::{CertDir, ClientDir},
};

/// Result of an `--update` run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    Renewed { expires: OffsetDateTime },
    UpToDate { expires: OffsetDateTime },
}

impl CheckOutcome {
    /// Text for the operator, `None` when there is nothing to say.
    pub fn message(&self, quiet: bool) -> Option<String> {
        if quiet {
            return None;
        }
        Some(match self {
            CheckOutcome::Renewed { expires } => {
                format!("Certificate renewed, now valid until {}.", fmt_date(*expires))
            }
            CheckOutcome::UpToDate { expires } => format!(
                "Certificate valid until {}, not renewing yet (use --force to renew now).",
                fmt_date(*expires)
            ),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub domain: String,
    pub expires: OffsetDateTime,
    /// Whether update runs also pull this tool's own checkout.
    pub self_update: bool,
}

impl InstallReport {
    /// Scheduling instructions, `command` being how the tool was invoked.
    pub fn instructions(&self, command: &str) -> String {
        let mut text = format!(
            "Certificate installed for {domain}, valid until {expires}.\n\
             \n\
             To keep it renewed, add a scheduled task that runs daily:\n\
             \n    {command} {domain} --update --quiet\n",
            domain = self.domain,
            expires = fmt_date(self.expires),
        );
        if !self.self_update {
            text.push_str(
                "\nSelf update is off. Set `self_dir` in the configuration file to the \
                 checkout of this tool to have update runs pull it.\n",
            );
        }
        text
    }
}

fn fmt_date(at: OffsetDateTime) -> String {
    at.format(&Rfc3339).unwrap_or_else(|_| at.to_string())
}

/// Sequences the ACME client, the hosting API and the expiration cache.
pub struct Renewer<R = SystemRunner> {
    config: RenewerConfig,
    runner: R,
    acme_client: AcmeClient,
    hosting: HostingCli,
    git: Git,
    inspector: CertInspector,
}

impl Renewer<SystemRunner> {
    pub fn new(config: RenewerConfig) -> Self {
        Self::with_runner(config, SystemRunner)
    }
}

impl<R: CommandRunner> Renewer<R> {
    pub fn with_runner(config: RenewerConfig, runner: R) -> Self {
        let acme_client = AcmeClient::new(
            ClientDir::new(&config.client_dir),
            config.client_script.clone(),
        );
        let hosting = HostingCli::new(config.hosting_program.clone());
        let git = Git::new(config.git_program.clone());
        let inspector = CertInspector::new(config.inspector, &config.openssl_program);
        Self {
            config,
            runner,
            acme_client,
            hosting,
            git,
            inspector,
        }
    }

    pub fn is_installed(&self) -> bool {
        self.acme_client.dir().is_installed()
    }

    /// Rejects the provider's default hostnames, which cannot get certificates.
    pub fn validate_domain(&self, domain: &str) -> Result<()> {
        let suffix = self.config.default_host_suffix.to_ascii_lowercase();
        let normalized = domain.trim_end_matches('.').to_ascii_lowercase();
        if !suffix.is_empty() && normalized.ends_with(&suffix) {
            return Err(Fatal::DisallowedDomain {
                domain: domain.to_string(),
                suffix: self.config.default_host_suffix.clone(),
            }
            .into());
        }
        Ok(())
    }

    /// Sets up the ACME client and issues the first certificate.
    pub fn install(&self, domain: &str) -> Result<InstallReport> {
        self.validate_domain(domain)?;
        let client_dir = self.acme_client.dir().path();
        if self.is_installed() {
            return Err(Fatal::AlreadyInstalled(client_dir.clone()).into());
        }

        info!("cloning {} into {}", self.config.client_repo, client_dir.display());
        self.git
            .clone_repo(&self.runner, &self.config.client_repo, client_dir)
            .context("failed to clone the ACME client")?;

        let webroot = &self.config.webroot;
        if webroot.exists() {
            return Err(Fatal::WebrootExists(webroot.clone()).into());
        }
        fs::create_dir_all(webroot).context("failed to create the webroot")?;
        self.acme_client.write_config(webroot)?;

        let aliases = self.fetch_aliases(domain)?;
        info!("site aliases: {}", aliases.join(", "));
        self.acme_client.write_domains(&aliases)?;

        info!("registering the ACME account");
        self.acme_client
            .register(&self.runner)
            .context("failed to register the ACME account")?;

        let expires = self.update(domain, true)?;
        Ok(InstallReport {
            domain: domain.to_string(),
            expires,
            self_update: self.config.self_dir.is_some(),
        })
    }

    /// Renews the certificate and installs it on the hosting account.
    ///
    /// `install_mode` skips pulling the ACME client, which was just cloned.
    /// Returns the new expiration.
    pub fn update(&self, domain: &str, install_mode: bool) -> Result<OffsetDateTime> {
        self.validate_domain(domain)?;
        self.ensure_installed()?;

        let aliases = self.fetch_aliases(domain)?;
        self.acme_client.write_domains(&aliases)?;

        if !install_mode {
            let client_dir = self.acme_client.dir().path();
            if let Err(err) = self.git.pull(&self.runner, client_dir) {
                warn!("failed to update the ACME client, using the current version: {err:#}");
            }
        }

        info!("requesting certificate for {}", aliases.join(", "));
        self.acme_client.cron(&self.runner)?;

        let cert_dir = self.acme_client.locate_cert_dir(&aliases)?;
        let cert_dir = CertDir::new(cert_dir.path().absolutize()?);
        let bundle = self.acme_client.read_bundle(&cert_dir)?;
        info!("installing certificate from {}", cert_dir.path().display());
        self.hosting.install_tls(&self.runner, bundle, &cert_dir)?;

        let expires = self
            .inspector
            .not_after(&self.runner, &cert_dir.cert_path())
            .context("failed to read the new certificate's expiration")?;
        expiration::write_cached(&self.config.cache_file, expires)
            .context("failed to save the expiration")?;
        info!("certificate valid until {}", fmt_date(expires));
        Ok(expires)
    }

    /// Renews when due or forced, then pulls this tool's own checkout.
    pub fn check_and_maybe_update(&self, domain: &str, force: bool) -> Result<CheckOutcome> {
        self.check_and_maybe_update_at(domain, force, OffsetDateTime::now_utc())
    }

    pub fn check_and_maybe_update_at(
        &self,
        domain: &str,
        force: bool,
        now: OffsetDateTime,
    ) -> Result<CheckOutcome> {
        self.validate_domain(domain)?;
        self.ensure_installed()?;
        let outcome = self.check_inner(domain, force, now);
        self.self_update();
        outcome
    }

    /// Reads the current expiration from `source`.
    pub fn cert_expiration(&self, source: &ExpirationSource) -> Result<OffsetDateTime> {
        match source {
            ExpirationSource::File => expiration::read_cached(&self.config.cache_file),
            ExpirationSource::Cert { domain } => {
                let cert_dir = self.resolve_cert_dir(domain)?;
                self.inspector
                    .not_after(&self.runner, &cert_dir.cert_path())
                    .context("failed to inspect the certificate")
            }
        }
    }

    fn check_inner(&self, domain: &str, force: bool, now: OffsetDateTime) -> Result<CheckOutcome> {
        let source = if self.config.cache_file.exists() {
            ExpirationSource::File
        } else {
            info!("no cached expiration, inspecting the certificate");
            ExpirationSource::Cert {
                domain: domain.to_string(),
            }
        };
        let expires = self.cert_expiration(&source)?;
        if renewal_due(expires, now, self.config.renew_before) {
            info!("certificate expires {}, renewing", fmt_date(expires));
        } else if force {
            info!("certificate expires {}, forced renewal", fmt_date(expires));
        } else {
            debug!("certificate expires {}, nothing to do", fmt_date(expires));
            return Ok(CheckOutcome::UpToDate { expires });
        }
        let expires = self.update(domain, false)?;
        Ok(CheckOutcome::Renewed { expires })
    }

    fn self_update(&self) {
        let Some(dir) = &self.config.self_dir else {
            return;
        };
        if let Err(err) = self.git.pull(&self.runner, dir) {
            debug!("self update failed: {err:#}");
        }
    }

    fn ensure_installed(&self) -> Result<()> {
        if !self.is_installed() {
            return Err(Fatal::NotInstalled.into());
        }
        Ok(())
    }

    fn fetch_aliases(&self, domain: &str) -> Result<Vec<String>> {
        let aliases = self
            .hosting
            .list_aliases(&self.runner)
            .context("failed to list aliases")?;
        if aliases.is_empty() {
            return Err(Fatal::NoAliases(domain.to_string()).into());
        }
        Ok(aliases)
    }

    fn resolve_cert_dir(&self, domain: &str) -> Result<CertDir> {
        let primary = self.acme_client.dir().cert_dir(domain);
        if primary.is_dir() {
            return Ok(CertDir::new(primary));
        }
        let aliases = self.fetch_aliases(domain)?;
        self.acme_client.locate_cert_dir(&aliases)
    }
}
