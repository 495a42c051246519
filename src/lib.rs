//! bazaar-vcs - Revision control for translation files kept in Bazaar working copies
//!
//! This crate wraps the `bzr` command-line client behind the [`VcsBackend`]
//! adapter trait: update, add, commit and fetching the committed ("clean")
//! content of a file. Every operation shells out to the installed client.
//!
//! # Modules
//!
//! - [`vcs`] - Adapter trait, path helpers and working-copy discovery
//! - [`bzr`] - The bzr backend and client version detection
//! - [`command`] - Async subprocess execution
//! - [`config`] - Configuration loading
//! - [`error`] - Error types
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use bazaar_vcs::{Bzr, ProcessRunner, VcsBackend};
//!
//! # async fn demo() -> bazaar_vcs::Result<()> {
//! let bzr = Bzr::discover("po/de.po", Arc::new(ProcessRunner::new()))?;
//! bzr.update(None, true).await?;
//! let pristine = bzr.get_clean_file(None).await?;
//! println!("{}", pristine);
//! # Ok(())
//! # }
//! ```

pub mod bzr;
pub mod command;
pub mod config;
pub mod error;
pub mod vcs;

pub use bzr::{Bzr, BzrVersion, VersionProbe};
pub use command::{CommandResult, CommandRunner, ProcessRunner};
pub use config::Config;
pub use error::{Error, Result, VcsError, VcsOperation};
pub use vcs::VcsBackend;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
