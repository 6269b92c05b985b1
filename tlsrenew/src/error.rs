use std::path::PathBuf;

use thiserror::Error;

/// Failures that end a run with a specific exit code.
///
/// Everything else travels as a plain `anyhow::Error` and exits with 1.
#[derive(Debug, Error)]
pub enum Fatal {
    #[error("{domain} ends with {suffix}; use one of the account's own aliases instead")]
    DisallowedDomain { domain: String, suffix: String },
    #[error("already installed in {}", .0.display())]
    AlreadyInstalled(PathBuf),
    #[error("not installed yet; run with --install first")]
    NotInstalled,
    #[error("webroot {} already exists", .0.display())]
    WebrootExists(PathBuf),
    #[error("no aliases found for this site; {0} looks like a raw hosting subdomain")]
    NoAliases(String),
    #[error("{tool} failed: {detail}")]
    ToolFailed { tool: String, detail: String },
    #[error("certificate renewal failed, nothing was updated: {0}")]
    RenewalFailed(String),
    #[error("no certificate directory found for any of: {}", .0.join(", "))]
    CertDirNotFound(Vec<String>),
    #[error(
        "failed to install the new certificate: {detail}\n\
         To install it manually, run:\n    {recovery}"
    )]
    UploadFailed { detail: String, recovery: String },
}

impl Fatal {
    pub fn exit_code(&self) -> i32 {
        match self {
            Fatal::DisallowedDomain { .. } => 2,
            Fatal::AlreadyInstalled(_)
            | Fatal::NotInstalled
            | Fatal::WebrootExists(_)
            | Fatal::NoAliases(_) => 3,
            Fatal::ToolFailed { .. } | Fatal::RenewalFailed(_) | Fatal::CertDirNotFound(_) => 4,
            Fatal::UploadFailed { .. } => 5,
        }
    }
}

/// Maps any error from this crate to a process exit code.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<Fatal>())
        .map(Fatal::exit_code)
        .unwrap_or(1)
}
