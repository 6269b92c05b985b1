use std::{path::PathBuf, time::Duration};

use crate::inspect::InspectorKind;

pub const DEFAULT_CLIENT_REPO: &str = "https://github.com/dehydrated-io/dehydrated.git";
pub const DEFAULT_HOST_SUFFIX: &str = ".nfshost.com";
pub const DEFAULT_RENEW_BEFORE: Duration = Duration::from_secs(14 * 24 * 3600);

#[allow(clippy::duplicated_attributes)]
#[derive(Clone, Debug, bon::Builder)]
#[builder(on(String, into))]
#[builder(on(PathBuf, into))]
pub struct RenewerConfig {
    /// Checkout of the ACME client.
    pub(crate) client_dir: PathBuf,
    #[builder(default = DEFAULT_CLIENT_REPO.to_string())]
    pub(crate) client_repo: String,
    /// Entry point inside `client_dir`.
    #[builder(default = "dehydrated".to_string())]
    pub(crate) client_script: String,
    /// Directory served at `/.well-known/acme-challenge`.
    pub(crate) webroot: PathBuf,
    pub(crate) cache_file: PathBuf,
    /// Checkout of this tool, pulled after update runs.
    pub(crate) self_dir: Option<PathBuf>,
    #[builder(default = "nfsn".to_string())]
    pub(crate) hosting_program: String,
    #[builder(default = DEFAULT_HOST_SUFFIX.to_string())]
    pub(crate) default_host_suffix: String,
    #[builder(default = "git".to_string())]
    pub(crate) git_program: String,
    #[builder(default = "openssl".to_string())]
    pub(crate) openssl_program: String,
    #[builder(default)]
    pub(crate) inspector: InspectorKind,
    #[builder(default = DEFAULT_RENEW_BEFORE)]
    pub(crate) renew_before: Duration,
}

impl RenewerConfig {
    pub fn client_dir(&self) -> &PathBuf {
        &self.client_dir
    }

    pub fn self_dir(&self) -> Option<&PathBuf> {
        self.self_dir.as_ref()
    }

    pub fn renew_before(&self) -> Duration {
        self.renew_before
    }
}
