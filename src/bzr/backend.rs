//! Bazaar backend driven through the `bzr` executable
//!
//! Every operation is at most two dependent `bzr` invocations. The second one
//! is only issued when the first exits with status 0; nothing is rolled back
//! when the second one fails.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, instrument};

use super::version::{self, BzrVersion, VersionProbe};
use crate::command::{display_command, CommandRunner};
use crate::error::{Result, VcsError, VcsOperation};
use crate::vcs::{find_working_copy, prepare_file_list, youngest_ancestor, VcsBackend};

/// Default client executable
pub const DEFAULT_PROGRAM: &str = "bzr";

/// Build `bzr commit [-m <message>] [--author <author>] <location>`.
///
/// Empty messages and authors are left out. The caller decides whether the
/// client is new enough for `--author`.
pub fn commit_args(
    program: &OsStr,
    message: Option<&str>,
    author: Option<&str>,
    location: &Path,
) -> Vec<OsString> {
    let mut argv = vec![program.to_os_string(), OsString::from("commit")];
    if let Some(message) = message.filter(|m| !m.is_empty()) {
        argv.push("-m".into());
        argv.push(message.into());
    }
    if let Some(author) = author.filter(|a| !a.is_empty()) {
        argv.push("--author".into());
        argv.push(author.into());
    }
    // the location is always the last argument
    argv.push(location.as_os_str().to_os_string());
    argv
}

/// Files and directories under bzr control
#[derive(Clone)]
pub struct Bzr {
    /// Absolute location this instance operates on
    location: PathBuf,
    /// Subprocess runner
    runner: Arc<dyn CommandRunner>,
    /// Client executable
    program: OsString,
    /// Shared client version cache
    version: Arc<VersionProbe>,
}

impl std::fmt::Debug for Bzr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bzr")
            .field("location", &self.location)
            .field("program", &self.program)
            .field("version", &self.version.cached())
            .finish()
    }
}

impl Bzr {
    /// Create a backend for `location`, made absolute against the current directory
    pub fn new(location: impl AsRef<Path>, runner: Arc<dyn CommandRunner>) -> Self {
        let location = prepare_file_list([location])
            .pop()
            .unwrap_or_default();

        Self {
            location,
            runner,
            program: OsString::from(DEFAULT_PROGRAM),
            version: VersionProbe::global(),
        }
    }

    /// Find the bzr working copy governing `location` and bind a backend to it.
    ///
    /// Symlinks that are not themselves inside a working copy are followed.
    pub fn discover(location: impl AsRef<Path>, runner: Arc<dyn CommandRunner>) -> Result<Self> {
        Self::discover_within(location, runner, None)
    }

    /// Like [`Bzr::discover`], but the upward search stops at `stop_at`
    #[instrument(skip_all, fields(path = %location.as_ref().display()))]
    pub fn discover_within(
        location: impl AsRef<Path>,
        runner: Arc<dyn CommandRunner>,
        stop_at: Option<&Path>,
    ) -> Result<Self> {
        let backend = Self::new(location, runner);

        if find_working_copy(&backend.location, Self::RCS_METADIR, Self::SCAN_PARENTS, stop_at)
            .is_some()
        {
            return Ok(backend);
        }

        if backend.location.is_symlink() {
            let target = std::fs::canonicalize(&backend.location)?;
            debug!("Following symlink {:?} -> {:?}", backend.location, target);
            if find_working_copy(&target, Self::RCS_METADIR, Self::SCAN_PARENTS, stop_at).is_some() {
                return Ok(backend.at_location(target));
            }
        }

        Err(VcsError::NotVersioned(backend.location).into())
    }

    /// Use a different client executable
    pub fn with_program(mut self, program: impl Into<OsString>) -> Self {
        self.program = program.into();
        self
    }

    /// Use a private version cache instead of the process-wide one
    pub fn with_version_probe(mut self, probe: Arc<VersionProbe>) -> Self {
        self.version = probe;
        self
    }

    /// A backend for another location sharing runner, executable and version cache
    pub fn at_location(&self, location: impl Into<PathBuf>) -> Self {
        Self {
            location: location.into(),
            runner: Arc::clone(&self.runner),
            program: self.program.clone(),
            version: Arc::clone(&self.version),
        }
    }

    pub fn program(&self) -> &OsStr {
        &self.program
    }

    /// Check if the bzr client is installed
    pub async fn is_available(&self) -> bool {
        version::is_available(self.runner.as_ref(), &self.program).await
    }

    /// Installed client version, `(0, 0)` if it cannot be determined
    pub async fn get_version(&self) -> BzrVersion {
        self.version
            .get_version(self.runner.as_ref(), &self.program)
            .await
    }

    /// Directory the subcommands run in: the nearest existing directory at
    /// or above the location, since reverting may restore deleted ones
    fn working_dir(&self) -> Option<&Path> {
        self.location.ancestors().find(|dir| dir.is_dir())
    }

    fn command<I, S>(&self, args: I) -> Vec<OsString>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        std::iter::once(self.program.clone())
            .chain(args.into_iter().map(Into::into))
            .collect()
    }

    /// Run one subcommand, turning a non-zero exit into an error
    async fn run_checked(&self, operation: VcsOperation, argv: Vec<OsString>) -> Result<String> {
        debug!("Running {}", display_command(&argv));
        let result = self.runner.run(&argv, self.working_dir()).await;

        if !result.success() {
            debug!("{} exited with {}", operation, result.exit_code);
            return Err(VcsError::OperationFailed {
                operation,
                location: self.location.clone(),
                stderr: result.stderr,
            }
            .into());
        }

        Ok(result.stdout)
    }
}

#[async_trait]
impl VcsBackend for Bzr {
    const RCS_METADIR: &'static str = ".bzr";
    const SCAN_PARENTS: bool = true;

    fn location_abs(&self) -> &Path {
        &self.location
    }

    /// `bzr revert <location>` (optional) followed by `bzr pull`.
    ///
    /// Always pulls to the branch tip; `revision` is not forwarded.
    #[instrument(skip(self), fields(location = %self.location.display()))]
    async fn update(&self, revision: Option<&str>, needs_revert: bool) -> Result<String> {
        if let Some(revision) = revision {
            debug!("Ignoring requested revision {}; pulling the branch tip", revision);
        }

        let mut output = String::new();
        if needs_revert {
            let argv = self.command([OsStr::new("revert"), self.location.as_os_str()]);
            output = self.run_checked(VcsOperation::Revert, argv).await?;
        }

        let pulled = self
            .run_checked(VcsOperation::Pull, self.command(["pull"]))
            .await?;
        output.push_str(&pulled);

        info!("Updated {:?}", self.location);
        Ok(output)
    }

    /// `bzr add <files...>`, then a commit scoped to the files' youngest
    /// common ancestor so unrelated changes stay out of the revision.
    #[instrument(skip(self, files), fields(location = %self.location.display(), files = files.len()))]
    async fn add(
        &self,
        files: &[PathBuf],
        message: Option<&str>,
        author: Option<&str>,
    ) -> Result<String> {
        let files = prepare_file_list(files);

        let argv = self.command(
            std::iter::once(OsString::from("add")).chain(files.iter().map(|f| f.into())),
        );
        let mut output = self.run_checked(VcsOperation::Add, argv).await?;

        // TODO: commit the added files by name instead of their common ancestor
        let scope = match youngest_ancestor(files.as_slice()) {
            Some(ancestor) => self.at_location(ancestor),
            None => self.clone(),
        };
        debug!("Committing added files from {:?}", scope.location);

        let committed = scope.commit(message, author).await?;
        output.push_str(&committed);
        Ok(output)
    }

    /// `bzr commit ... <location>` followed by `bzr push`.
    ///
    /// `--author` is only passed to clients that understand it.
    #[instrument(skip(self), fields(location = %self.location.display()))]
    async fn commit(&self, message: Option<&str>, author: Option<&str>) -> Result<String> {
        let author = match author.filter(|a| !a.is_empty()) {
            Some(author) => {
                let version = self.get_version().await;
                if version.supports_author_flag() {
                    Some(author)
                } else {
                    debug!("bzr {} has no --author flag; dropping author {:?}", version, author);
                    None
                }
            }
            None => None,
        };

        let argv = commit_args(&self.program, message, author, &self.location);
        let mut output = self.run_checked(VcsOperation::Commit, argv).await?;

        let pushed = self
            .run_checked(VcsOperation::Push, self.command(["push"]))
            .await?;
        output.push_str(&pushed);

        info!("Committed and pushed {:?}", self.location);
        Ok(output)
    }

    /// `bzr cat <location>`: the last committed content.
    ///
    /// Always reads the branch tip; `revision` is not forwarded.
    #[instrument(skip(self), fields(location = %self.location.display()))]
    async fn get_clean_file(&self, revision: Option<&str>) -> Result<String> {
        if let Some(revision) = revision {
            debug!("Ignoring requested revision {}; reading the branch tip", revision);
        }

        let argv = self.command([OsStr::new("cat"), self.location.as_os_str()]);
        self.run_checked(VcsOperation::Cat, argv).await
    }
}
