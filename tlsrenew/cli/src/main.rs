use std::{io::IsTerminal, path::PathBuf, process::ExitCode, time::Duration};

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser};
use fs_err as fs;
use serde::{Deserialize, Serialize};
use tlsrenew::{InspectorKind, Renewer, RenewerConfig};
use tracing::debug;

fn app_version() -> String {
    const CARGO_PKG_VERSION: &str = env!("CARGO_PKG_VERSION");
    const VERSION: &str = git_version::git_version!(
        args = ["--abbrev=20", "--always", "--dirty=-modified"],
        prefix = "git:",
        fallback = "unknown"
    );
    format!("v{CARGO_PKG_VERSION} ({VERSION})")
}

/// Issue and renew the TLS certificate of a hosting account
#[derive(Parser)]
#[command(author, version, about, long_version = app_version())]
struct Args {
    /// Domain the certificate is issued for
    domain: String,
    #[command(flatten)]
    mode: Mode,
    /// Renew even if the certificate is not about to expire
    #[arg(short, long)]
    force: bool,
    /// Only print errors
    #[arg(short, long)]
    quiet: bool,
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(ClapArgs)]
#[group(required = true, multiple = false)]
struct Mode {
    /// Set up the ACME client and issue the first certificate
    #[arg(long)]
    install: bool,
    /// Renew the certificate if it expires soon
    #[arg(long)]
    update: bool,
}

#[derive(Deserialize, Serialize, Debug, PartialEq)]
#[serde(default)]
struct Config {
    /// Where the ACME client is checked out
    client_dir: PathBuf,
    /// Git URL of the ACME client
    client_repo: String,
    /// Entry point of the ACME client
    client_script: String,
    /// Directory served at /.well-known/acme-challenge
    webroot: PathBuf,
    /// File caching the current certificate expiration
    cache_file: PathBuf,
    /// Checkout of this tool to pull after update runs
    self_dir: Option<PathBuf>,
    /// Hosting provider command line client
    hosting_program: String,
    /// Suffix of the provider's default hostnames
    default_host_suffix: String,
    git_program: String,
    openssl_program: String,
    /// How to read certificate expirations, "openssl" or "x509"
    inspector: InspectorKind,
    /// Number of days before expiration to trigger renewal
    renew_days_before: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            client_dir: "/home/private/dehydrated".into(),
            client_repo: tlsrenew::config::DEFAULT_CLIENT_REPO.into(),
            client_script: "dehydrated".into(),
            webroot: "/home/public/.well-known/acme-challenge".into(),
            cache_file: "/home/private/certificate_expiration.txt".into(),
            self_dir: None,
            hosting_program: "nfsn".into(),
            default_host_suffix: tlsrenew::config::DEFAULT_HOST_SUFFIX.into(),
            git_program: "git".into(),
            openssl_program: "openssl".into(),
            inspector: InspectorKind::Openssl,
            renew_days_before: 14,
        }
    }
}

impl Config {
    fn into_renewer_config(self) -> RenewerConfig {
        RenewerConfig::builder()
            .client_dir(self.client_dir)
            .client_repo(self.client_repo)
            .client_script(self.client_script)
            .webroot(self.webroot)
            .cache_file(self.cache_file)
            .maybe_self_dir(self.self_dir)
            .hosting_program(self.hosting_program)
            .default_host_suffix(self.default_host_suffix)
            .git_program(self.git_program)
            .openssl_program(self.openssl_program)
            .inspector(self.inspector)
            .renew_before(Duration::from_secs(self.renew_days_before * 24 * 60 * 60))
            .build()
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<RenewerConfig> {
    let config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml_edit::de::from_str(&content)
                .with_context(|| format!("invalid configuration in {}", path.display()))?
        }
        None => Config::default(),
    };
    Ok(config.into_renewer_config())
}

fn run(args: &Args) -> Result<()> {
    let config = load_config(args.config.as_ref()).context("Failed to load configuration")?;
    let renewer = Renewer::new(config);
    if args.mode.install {
        let report = renewer.install(&args.domain)?;
        let command = std::env::args().next().unwrap_or_else(|| "tlsrenew".into());
        println!("{}", report.instructions(&command));
    } else {
        let outcome = renewer.check_and_maybe_update(&args.domain, args.force)?;
        if let Some(message) = outcome.message(args.quiet) {
            println!("{message}");
        }
    }
    Ok(())
}

/// Plain text for stderr, kept free of log decoration so the recovery command
/// can be copied from cron mail.
fn error_report(err: &anyhow::Error) -> String {
    format!("error: {err:#}")
}

fn main() -> ExitCode {
    let args = Args::parse();
    {
        use tracing_subscriber::{fmt, EnvFilter};
        let default_level = if args.quiet { "warn" } else { "info" };
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_ansi(std::io::stderr().is_terminal())
            .init();
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", error_report(&err));
            let code = tlsrenew::exit_code(&err);
            debug!(code, "exiting");
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args() {
        Args::command().debug_assert();
        let args = Args::try_parse_from(["tlsrenew", "example.com", "--update", "-f", "-q"]).unwrap();
        assert!(args.mode.update && args.force && args.quiet);
        assert!(!args.mode.install);
    }

    #[test]
    fn test_mode_required_and_exclusive() {
        assert!(Args::try_parse_from(["tlsrenew", "example.com"]).is_err());
        assert!(
            Args::try_parse_from(["tlsrenew", "example.com", "--install", "--update"]).is_err()
        );
        assert!(Args::try_parse_from(["tlsrenew", "--install"]).is_err());
    }

    #[test]
    fn test_partial_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tlsrenew.toml");
        fs::write(
            &path,
            r#"
client_dir = "/srv/acme"
inspector = "x509"
renew_days_before = 30
"#,
        )
        .unwrap();
        let config: Config = toml_edit::de::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(config.client_dir, PathBuf::from("/srv/acme"));
        assert_eq!(config.inspector, InspectorKind::X509);
        assert_eq!(config.hosting_program, "nfsn");
        assert_eq!(config.self_dir, None);

        let renewer_config = load_config(Some(&path)).unwrap();
        assert_eq!(renewer_config.client_dir(), &PathBuf::from("/srv/acme"));
        assert_eq!(renewer_config.self_dir(), None);
        assert_eq!(
            renewer_config.renew_before(),
            Duration::from_secs(30 * 24 * 3600)
        );
    }

    #[test]
    fn test_long_version() {
        let version = app_version();
        assert!(version.starts_with(&format!("v{}", env!("CARGO_PKG_VERSION"))));
        let rendered = Args::command().render_long_version();
        assert!(rendered.contains(&version));
    }

    #[test]
    fn test_error_report_keeps_recovery_verbatim() {
        let recovery = "cat '/home/private/my certs/privkey.pem' | nfsn -i set-tls".to_string();
        let err = anyhow::Error::from(tlsrenew::Fatal::UploadFailed {
            detail: "exit status 1".into(),
            recovery: recovery.clone(),
        });
        let report = error_report(&err);
        assert!(report.starts_with("error: failed to install the new certificate"));
        assert!(report.contains(&format!("\n    {recovery}")));
        assert!(!report.contains('\x1b'));
    }

    #[test]
    fn test_default_config_roundtrip() {
        let toml = toml_edit::ser::to_string_pretty(&Config::default()).unwrap();
        let config: Config = toml_edit::de::from_str(&toml).unwrap();
        assert_eq!(config, Config::default());
    }
}
