use std::{path::Path, time::Duration};

use anyhow::{bail, Context, Result};
use fs_err as fs;
use time::OffsetDateTime;

/// Where to read the current expiration from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpirationSource {
    /// Inspect the certificate the ACME client issued for `domain`.
    Cert { domain: String },
    /// Read the timestamp cached by the last update.
    File,
}

pub fn read_cached(path: impl AsRef<Path>) -> Result<OffsetDateTime> {
    let content = fs::read_to_string(path.as_ref())?;
    parse_timestamp(content.trim())
        .with_context(|| format!("invalid timestamp in {}", path.as_ref().display()))
}

pub fn write_cached(path: impl AsRef<Path>, expires: OffsetDateTime) -> Result<()> {
    if let Some(parent) = path.as_ref().parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path.as_ref(), format!("{}\n", format_timestamp(expires)))?;
    Ok(())
}

fn parse_timestamp(value: &str) -> Result<OffsetDateTime> {
    let secs: f64 = value.parse().context("not a number")?;
    if !secs.is_finite() {
        bail!("not a finite number");
    }
    let nanos = (secs * 1e9).round() as i128;
    Ok(OffsetDateTime::from_unix_timestamp_nanos(nanos)?)
}

fn format_timestamp(at: OffsetDateTime) -> String {
    let secs = at.unix_timestamp_nanos() as f64 / 1e9;
    format!("{secs:.1}")
}

/// True once no more than `renew_before` is left until `expires`.
pub fn renewal_due(expires: OffsetDateTime, now: OffsetDateTime, renew_before: Duration) -> bool {
    let remaining = expires - now;
    remaining <= renew_before
}
