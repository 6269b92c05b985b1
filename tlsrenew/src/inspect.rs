use std::path::Path;

use anyhow::{bail, Context, Result};
use enum_dispatch::enum_dispatch;
use fs_err as fs;
use serde::{Deserialize, Serialize};
use time::{macros::format_description, OffsetDateTime, PrimitiveDateTime};
use x509_parser::prelude::Pem;

use crate::command::{CommandRunner, Invocation};

/// Reads the end of the validity period from an installed certificate.
#[enum_dispatch]
pub(crate) trait Inspect {
    fn not_after(&self, runner: &dyn CommandRunner, cert_path: &Path) -> Result<OffsetDateTime>;
}

/// Which inspector to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InspectorKind {
    /// Shell out to `openssl x509 -enddate`.
    #[default]
    Openssl,
    /// Parse the certificate in-process.
    X509,
}

#[derive(Debug, Clone)]
#[enum_dispatch(Inspect)]
pub enum CertInspector {
    Openssl(OpensslInspector),
    X509(X509Inspector),
}

impl CertInspector {
    pub fn new(kind: InspectorKind, openssl_program: &str) -> Self {
        match kind {
            InspectorKind::Openssl => Self::Openssl(OpensslInspector {
                program: openssl_program.to_string(),
            }),
            InspectorKind::X509 => Self::X509(X509Inspector),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OpensslInspector {
    program: String,
}

impl Inspect for OpensslInspector {
    fn not_after(&self, runner: &dyn CommandRunner, cert_path: &Path) -> Result<OffsetDateTime> {
        let invocation = Invocation::new(&self.program)
            .args(["x509", "-enddate", "-noout", "-in"])
            .arg(cert_path);
        let output = runner.run_checked(&invocation)?;
        let stdout = output.stdout_lossy();
        let line = stdout.trim();
        let date = line
            .strip_prefix("notAfter=")
            .with_context(|| format!("unexpected openssl output: {line:?}"))?;
        parse_cert_date(date)
    }
}

#[derive(Debug, Clone)]
pub struct X509Inspector;

impl Inspect for X509Inspector {
    fn not_after(&self, _runner: &dyn CommandRunner, cert_path: &Path) -> Result<OffsetDateTime> {
        let cert_pem = fs::read(cert_path)?;
        let pem = Pem::iter_from_buffer(&cert_pem)
            .next()
            .transpose()
            .context("Invalid pem")?
            .context("no certificate in pem")?;
        let cert = pem.parse_x509().context("Invalid x509 certificate")?;
        Ok(cert.validity().not_after.to_datetime())
    }
}

/// Parses an end date in the `Mon DD HH:MM:SS YYYY GMT` form used by openssl.
///
/// openssl pads single-digit days with a space, so runs of whitespace are
/// collapsed before parsing.
pub fn parse_cert_date(date: &str) -> Result<OffsetDateTime> {
    let fields = date.split_whitespace().collect::<Vec<_>>();
    let Some((zone, rest)) = fields.split_last() else {
        bail!("empty certificate date");
    };
    if *zone != "GMT" {
        bail!("unsupported timezone in certificate date {date:?}");
    }
    let format = format_description!(
        "[month repr:short] [day padding:none] [hour]:[minute]:[second] [year]"
    );
    let datetime = PrimitiveDateTime::parse(&rest.join(" "), format)
        .with_context(|| format!("invalid certificate date {date:?}"))?;
    Ok(datetime.assume_utc())
}
