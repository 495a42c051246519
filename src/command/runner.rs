//! Async subprocess runner with semaphore-controlled concurrency
//!
//! Provides non-blocking command execution with:
//! - Semaphore to limit concurrent bzr processes (default: 4)
//! - Optional timeout handling
//! - Captured stdout, stderr and exit code

use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::{debug, instrument, warn};

/// Default maximum concurrent subprocesses
pub const DEFAULT_MAX_CONCURRENT: usize = 4;

/// Exit code reported when the process could not be run to completion
pub const SPAWN_FAILURE_EXIT_CODE: i32 = -1;

/// Outcome of one external command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandResult {
    /// Build a successful result with the given stdout
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            exit_code: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Build a failed result with the given exit code and stderr
    pub fn failed(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Result used when the process never ran (missing binary, timeout, ...)
    pub fn spawn_failure(reason: impl Into<String>) -> Self {
        Self::failed(SPAWN_FAILURE_EXIT_CODE, reason)
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Something that can run an argument vector and report its outcome.
///
/// `argv[0]` is the program. Implementations never fail: problems starting
/// the process are reported as a [`CommandResult`] with a non-zero exit code.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, argv: &[OsString], cwd: Option<&Path>) -> CommandResult;
}

/// Render an argument vector for log output
pub fn display_command(argv: &[OsString]) -> String {
    argv.iter()
        .map(|arg| arg.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Runs commands as real child processes
#[derive(Clone)]
pub struct ProcessRunner {
    /// Semaphore for concurrency control
    semaphore: Arc<Semaphore>,
    /// Command timeout, `None` waits forever
    timeout: Option<Duration>,
}

impl ProcessRunner {
    /// Create a new runner with default settings
    pub fn new() -> Self {
        Self::with_max_concurrent(DEFAULT_MAX_CONCURRENT)
    }

    /// Create a runner with custom concurrency limit
    pub fn with_max_concurrent(max_concurrent: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
            timeout: None,
        }
    }

    /// Set the command timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    #[instrument(skip_all, fields(command = %display_command(argv)))]
    async fn run(&self, argv: &[OsString], cwd: Option<&Path>) -> CommandResult {
        let Some((program, args)) = argv.split_first() else {
            return CommandResult::spawn_failure("empty command line");
        };

        let Ok(_permit) = self.semaphore.acquire().await else {
            return CommandResult::spawn_failure("command semaphore closed");
        };

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }

        let output = match self.timeout {
            Some(limit) => match timeout(limit, cmd.output()).await {
                Ok(output) => output,
                Err(_) => {
                    warn!("{} timed out after {:?}", program.to_string_lossy(), limit);
                    return CommandResult::spawn_failure(format!(
                        "command timed out after {:?}",
                        limit
                    ));
                }
            },
            None => cmd.output().await,
        };

        match output {
            Ok(output) => {
                let result = CommandResult {
                    // Killed by a signal: no exit code
                    exit_code: output.status.code().unwrap_or(SPAWN_FAILURE_EXIT_CODE),
                    stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                    stderr: String::from_utf8_lossy(&output.stderr).to_string(),
                };
                debug!("exit code {}", result.exit_code);
                result
            }
            Err(e) => {
                warn!("failed to run {}: {}", program.to_string_lossy(), e);
                CommandResult::spawn_failure(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<OsString> {
        args.iter().map(OsString::from).collect()
    }

    #[test]
    fn test_runner_creation() {
        let runner = ProcessRunner::new();
        assert_eq!(runner.timeout(), None);
    }

    #[test]
    fn test_runner_with_custom_settings() {
        let runner = ProcessRunner::with_max_concurrent(8).with_timeout(Duration::from_secs(10));
        assert_eq!(runner.timeout(), Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_display_command() {
        assert_eq!(
            display_command(&argv(&["bzr", "commit", "-m", "msg"])),
            "bzr commit -m msg"
        );
    }

    #[tokio::test]
    async fn test_captures_output_and_exit_code() {
        let runner = ProcessRunner::new();
        let result = runner
            .run(&argv(&["sh", "-c", "printf out; printf err >&2; exit 3"]), None)
            .await;

        assert_eq!(result.exit_code, 3);
        assert_eq!(result.stdout, "out");
        assert_eq!(result.stderr, "err");
        assert!(!result.success());
    }

    #[tokio::test]
    async fn test_runs_in_working_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        let runner = ProcessRunner::new();
        let result = runner.run(&argv(&["pwd"]), Some(dir.path())).await;

        assert!(result.success());
        let reported = std::path::PathBuf::from(result.stdout.trim());
        assert_eq!(
            reported.canonicalize().unwrap(),
            dir.path().canonicalize().unwrap()
        );
    }

    #[tokio::test]
    async fn test_missing_program_is_reported_as_failure() {
        let runner = ProcessRunner::new();
        let result = runner
            .run(&argv(&["definitely-not-a-real-program-7f3a"]), None)
            .await;

        assert_eq!(result.exit_code, SPAWN_FAILURE_EXIT_CODE);
        assert!(!result.stderr.is_empty());
    }

    #[tokio::test]
    async fn test_empty_command_line() {
        let runner = ProcessRunner::new();
        let result = runner.run(&[], None).await;
        assert_eq!(result.exit_code, SPAWN_FAILURE_EXIT_CODE);
    }

    #[tokio::test]
    async fn test_timeout() {
        let runner = ProcessRunner::new().with_timeout(Duration::from_millis(100));
        let result = runner.run(&argv(&["sleep", "5"]), None).await;

        assert_eq!(result.exit_code, SPAWN_FAILURE_EXIT_CODE);
        assert!(result.stderr.contains("timed out"));
    }
}
