//! Bazaar (bzr) support
//!
//! - `Bzr` - `VcsBackend` over the `bzr` executable
//! - `VersionProbe` - Memoized client version detection

mod backend;
mod version;

pub use backend::*;
pub use version::*;
