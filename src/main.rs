//! bzr-vcs - Drive Bazaar working copies of translation files
//!
//! Run with `bzr-vcs --help` for usage.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{eyre, Result};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use bazaar_vcs::{Bzr, CommandRunner, Config, VcsBackend, VERSION};

#[derive(Parser)]
#[command(name = "bzr-vcs")]
#[command(version = VERSION)]
#[command(about = "Update, add, commit and inspect translation files in bzr working copies")]
#[command(long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Path to an additional config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether the bzr client is installed
    Available,

    /// Show the detected bzr client version
    Version,

    /// Revert local changes and pull the latest revision
    Update {
        /// File or directory inside a working copy
        path: PathBuf,

        /// Keep local changes (skip `bzr revert`)
        #[arg(long)]
        no_revert: bool,

        /// Requested revision (accepted, the branch tip is always pulled)
        #[arg(short, long)]
        revision: Option<String>,
    },

    /// Add files and commit them
    Add {
        /// Files to put under version control
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Commit message
        #[arg(short, long)]
        message: Option<String>,

        /// Commit author
        #[arg(short, long)]
        author: Option<String>,
    },

    /// Commit local changes and push them
    Commit {
        /// File or directory inside a working copy
        path: PathBuf,

        /// Commit message
        #[arg(short, long)]
        message: Option<String>,

        /// Commit author
        #[arg(short, long)]
        author: Option<String>,
    },

    /// Print the last committed content of a file
    Cat {
        /// File inside a working copy
        path: PathBuf,

        /// Requested revision (accepted, the branch tip is always read)
        #[arg(short, long)]
        revision: Option<String>,
    },

    /// Show configuration
    Config {
        /// Initialize config file with defaults
        #[arg(long)]
        init: bool,
    },
}

fn setup_logging(config: &Config, debug: bool) -> Result<()> {
    let filter = if debug || config.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info").add_directive("tokio=warn".parse()?)
    };

    if let Some(path) = &config.log_file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;

        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(file).with_target(false))
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .with(filter)
            .init();
    }

    Ok(())
}

/// Backend for the working copy governing `path`
fn backend(config: &Config, runner: &Arc<dyn CommandRunner>, path: PathBuf) -> Result<Bzr> {
    Ok(Bzr::discover(path, Arc::clone(runner))?.with_program(&config.bzr_program))
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Install color-eyre error hooks
    color_eyre::install()?;

    let cli = Cli::parse();

    let config = Config::load_with(cli.config.as_deref()).unwrap_or_else(|e| {
        eprintln!("Warning: Failed to load config, using defaults: {}", e);
        Config::default()
    });

    setup_logging(&config, cli.debug)?;

    let runner: Arc<dyn CommandRunner> = Arc::new(config.runner());
    let probe = Bzr::new(".", Arc::clone(&runner)).with_program(&config.bzr_program);

    match cli.command {
        Commands::Available => {
            if probe.is_available().await {
                println!("bzr is available");
            } else {
                println!("bzr is not installed or not in PATH");
                return Ok(ExitCode::FAILURE);
            }
        }

        Commands::Version => {
            let version = probe.get_version().await;
            if !version.is_known() {
                return Err(eyre!("Could not determine the bzr version"));
            }
            println!("{}", version);
        }

        Commands::Update {
            path,
            no_revert,
            revision,
        } => {
            let bzr = backend(&config, &runner, path)?;
            let output = bzr.update(revision.as_deref(), !no_revert).await?;
            print!("{}", output);
        }

        Commands::Add {
            files,
            message,
            author,
        } => {
            let bzr = backend(&config, &runner, files[0].clone())?;
            info!("Adding {} file(s)", files.len());
            let output = bzr
                .add(&files, message.as_deref(), author.as_deref())
                .await?;
            print!("{}", output);
        }

        Commands::Commit {
            path,
            message,
            author,
        } => {
            let bzr = backend(&config, &runner, path)?;
            let output = bzr.commit(message.as_deref(), author.as_deref()).await?;
            print!("{}", output);
        }

        Commands::Cat { path, revision } => {
            let bzr = backend(&config, &runner, path)?;
            print!("{}", bzr.get_clean_file(revision.as_deref()).await?);
        }

        Commands::Config { init } => {
            if init {
                config.save()?;
                println!(
                    "Configuration initialized at {:?}",
                    Config::config_file_path()?
                );
            } else {
                println!("Configuration:");
                println!("{}", toml::to_string_pretty(&config)?);
                println!("\nConfig file: {:?}", Config::config_file_path()?);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
