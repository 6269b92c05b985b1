//! Keeps the TLS certificate of a web-hosting account renewed.
//!
//! The heavy lifting is done by external programs: a dehydrated-style ACME
//! client issues certificates through the webroot challenge, and the hosting
//! provider's command line client lists the site aliases and installs the
//! issued bundle. This crate sequences those calls, decides when a renewal is
//! due and remembers the current expiration between runs.
//!
//! ```no_run
//! use tlsrenew::{Renewer, RenewerConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = RenewerConfig::builder()
//!         .client_dir("/home/private/dehydrated")
//!         .webroot("/home/public/.well-known/acme-challenge")
//!         .cache_file("/home/private/certificate_expiration.txt")
//!         .build();
//!     let renewer = Renewer::new(config);
//!     let outcome = renewer.check_and_maybe_update("example.com", false)?;
//!     if let Some(message) = outcome.message(false) {
//!         println!("{message}");
//!     }
//!     Ok(())
//! }
//! ```
pub use command::{CommandOutput, CommandRunner, Invocation, SystemRunner};
pub use config::RenewerConfig;
pub use error::{exit_code, Fatal};
pub use expiration::ExpirationSource;
pub use inspect::{parse_cert_date, InspectorKind};
pub use renewer::{CheckOutcome, InstallReport, Renewer};

pub mod config;
pub mod expiration;

mod acme_client;
mod command;
mod error;
mod git;
mod hosting;
mod inspect;
mod renewer;
mod workdir;

#[cfg(test)]
mod testing;
