//! Installed bzr client detection
//!
//! `bzr version` answers "is it installed", `bzr --version` answers "which
//! release". The release is probed once per [`VersionProbe`] and memoized,
//! failures included.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::command::CommandRunner;

/// First `major.minor` pair on the banner line
static VERSION_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+\.\d+").unwrap());

static GLOBAL_PROBE: LazyLock<Arc<VersionProbe>> = LazyLock::new(|| Arc::new(VersionProbe::new()));

/// `(major, minor)` of a bzr client
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BzrVersion {
    pub major: u32,
    pub minor: u32,
}

impl BzrVersion {
    /// Sentinel for "detection failed"; compares below every real release
    pub const UNKNOWN: Self = Self::new(0, 0);

    /// First release accepting `commit --author` (0.91rc1)
    pub const AUTHOR_FLAG: Self = Self::new(0, 91);

    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    pub fn is_known(self) -> bool {
        self != Self::UNKNOWN
    }

    pub fn supports_author_flag(self) -> bool {
        self >= Self::AUTHOR_FLAG
    }
}

impl fmt::Display for BzrVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Extract the version from `bzr --version` output.
///
/// Only the first line is inspected.
pub fn parse_version_output(output: &str) -> Option<BzrVersion> {
    let banner = output.lines().next()?;
    let found = VERSION_PATTERN.find(banner)?;
    let (major, minor) = found.as_str().split_once('.')?;
    Some(BzrVersion::new(major.parse().ok()?, minor.parse().ok()?))
}

/// Check if the bzr client can be run
pub async fn is_available(runner: &dyn CommandRunner, program: &OsStr) -> bool {
    let argv = [program.to_os_string(), OsString::from("version")];
    let available = runner.run(&argv, None).await.success();
    debug!("{} version: available={}", program.to_string_lossy(), available);
    available
}

/// Memoized result of `bzr --version`
#[derive(Debug, Default)]
pub struct VersionProbe {
    cached: OnceCell<BzrVersion>,
}

impl VersionProbe {
    /// A probe that has not run yet
    pub fn new() -> Self {
        Self::default()
    }

    /// A probe that already knows the answer
    pub fn with_version(version: BzrVersion) -> Self {
        Self {
            cached: OnceCell::new_with(Some(version)),
        }
    }

    /// The probe shared by the whole process
    pub fn global() -> Arc<VersionProbe> {
        Arc::clone(&GLOBAL_PROBE)
    }

    /// The memoized version, if the probe has run
    pub fn cached(&self) -> Option<BzrVersion> {
        self.cached.get().copied()
    }

    /// Detect the client version, running `bzr --version` at most once.
    ///
    /// Concurrent first callers wait for a single probe.
    pub async fn get_version(&self, runner: &dyn CommandRunner, program: &OsStr) -> BzrVersion {
        *self
            .cached
            .get_or_init(|| detect_version(runner, program))
            .await
    }
}

async fn detect_version(runner: &dyn CommandRunner, program: &OsStr) -> BzrVersion {
    let argv = [program.to_os_string(), OsString::from("--version")];
    let result = runner.run(&argv, None).await;

    if !result.success() {
        debug!(
            "{} --version exited with {}",
            program.to_string_lossy(),
            result.exit_code
        );
        return BzrVersion::UNKNOWN;
    }

    let version = parse_version_output(&result.stdout).unwrap_or(BzrVersion::UNKNOWN);
    debug!("Detected bzr {}", version);
    version
}
