//! User configuration settings
//!
//! Layered configuration: defaults → config file → extra file → environment variables

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::bzr::DEFAULT_PROGRAM;
use crate::command::{ProcessRunner, DEFAULT_MAX_CONCURRENT};
use crate::error::{ConfigError, Error, Result};

/// Prefix of environment variable overrides (`BZR_VCS_BZR_PROGRAM`, ...)
pub const ENV_PREFIX: &str = "BZR_VCS_";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// bzr executable to run
    pub bzr_program: String,

    /// Per-command timeout in seconds (0 = wait forever)
    pub command_timeout_secs: u64,

    /// Maximum concurrently running bzr processes
    pub max_concurrent_commands: usize,

    /// Enable debug logging
    pub debug: bool,

    /// Log file path (if set, logs to file instead of stderr)
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bzr_program: DEFAULT_PROGRAM.to_string(),
            command_timeout_secs: 0,
            max_concurrent_commands: DEFAULT_MAX_CONCURRENT,
            debug: false,
            log_file: None,
        }
    }
}

impl Config {
    /// Load configuration from all sources, layering `extra_file` above the
    /// default config file
    pub fn load_with(extra_file: Option<&Path>) -> Result<Self> {
        let config_path = Self::config_file_path()?;

        let mut figment = Figment::new()
            // Start with defaults
            .merge(Serialized::defaults(Config::default()))
            // Layer config file if it exists
            .merge(Toml::file(&config_path));

        if let Some(extra) = extra_file {
            if !extra.exists() {
                return Err(ConfigError::LoadFailed(format!(
                    "Config file not found: {}",
                    extra.display()
                ))
                .into());
            }
            figment = figment.merge(Toml::file(extra));
        }

        // Layer environment variables (BZR_VCS_BZR_PROGRAM, etc.)
        Self::extract(figment.merge(Env::prefixed(ENV_PREFIX)))
    }

    /// Extract a config from an assembled figment
    pub fn extract(figment: Figment) -> Result<Self> {
        figment
            .extract()
            .map_err(|e| ConfigError::LoadFailed(e.to_string()).into())
    }

    /// Get the configuration file path
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = Self::project_dirs()?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Save current configuration to the default file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    /// Save current configuration to a specific path
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|_e| {
                Error::Config(ConfigError::DirectoryCreationFailed(parent.to_path_buf()))
            })?;
        }

        let toml = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SaveFailed(e.to_string()))?;

        std::fs::write(config_path, toml).map_err(|e| ConfigError::SaveFailed(e.to_string()))?;

        Ok(())
    }

    /// Command timeout, `None` when disabled
    pub fn command_timeout(&self) -> Option<Duration> {
        (self.command_timeout_secs > 0).then(|| Duration::from_secs(self.command_timeout_secs))
    }

    /// Build the process runner described by this configuration
    pub fn runner(&self) -> ProcessRunner {
        let runner = ProcessRunner::with_max_concurrent(self.max_concurrent_commands);
        match self.command_timeout() {
            Some(limit) => runner.with_timeout(limit),
            None => runner,
        }
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("org", "bazaar-vcs", "bazaar-vcs").ok_or_else(|| {
            Error::Config(ConfigError::LoadFailed(
                "Could not determine home directory".to_string(),
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.bzr_program, "bzr");
        assert_eq!(config.command_timeout_secs, 0);
        assert_eq!(config.max_concurrent_commands, DEFAULT_MAX_CONCURRENT);
        assert!(!config.debug);
        assert_eq!(config.command_timeout(), None);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("bzr_program"));
        assert!(toml.contains("bzr"));
    }

    #[test]
    fn test_file_layer_overrides_defaults() {
        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::string("bzr_program = \"/opt/bzr/bin/bzr\"\ncommand_timeout_secs = 30\n"));

        let config = Config::extract(figment).unwrap();
        assert_eq!(config.bzr_program, "/opt/bzr/bin/bzr");
        assert_eq!(config.command_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.runner().timeout(), Some(Duration::from_secs(30)));
        // untouched keys keep their defaults
        assert_eq!(config.max_concurrent_commands, DEFAULT_MAX_CONCURRENT);
    }

    #[test]
    fn test_invalid_value_is_a_load_error() {
        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::string("command_timeout_secs = \"soon\"\n"));

        let err = Config::extract(figment).unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::LoadFailed(_))));
    }

    #[test]
    fn test_save_to_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested/config.toml");

        let config = Config {
            bzr_program: "brz".to_string(),
            debug: true,
            ..Config::default()
        };
        config.save_to(&path).unwrap();

        let loaded = Config::extract(Figment::new().merge(Toml::file(&path))).unwrap();
        assert_eq!(loaded, config);
    }
}
