// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, Subcommand, ValueEnum};

use crate::types::BuildMode;

/// Environment variable that selects production mode when set to
/// `production` (same effect as `--production`).
pub const ENV_VAR: &str = "ASSETPIPE_ENV";

/// Command-line arguments for `assetpipe`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "assetpipe",
    version,
    about = "Compile, inject and live-serve front-end assets.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// When omitted, `Assetpipe.toml` in the current directory is used if it
    /// exists, otherwise the built-in defaults.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<String>,

    /// Production mode: bundle scripts without debug symbols.
    ///
    /// Also enabled by `ASSETPIPE_ENV=production`.
    #[arg(long, global = true)]
    pub production: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `ASSETPIPE_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Validate config and print the resolved paths and stage plan without
    /// touching the filesystem.
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Clean, compile and inject into the intermediate tree, serve it with
    /// live reload and rebuild on source changes.
    Serve,
    /// Clean, compile, minify, promote and inject into the output tree.
    Build {
        /// Keep serving the output tree after a successful build.
        #[arg(long)]
        serve: bool,
    },
}

impl Command {
    pub fn mode(&self) -> BuildMode {
        match self {
            Command::Serve => BuildMode::Serve,
            Command::Build { .. } => BuildMode::Build,
        }
    }
}

impl CliArgs {
    /// Production mode from the flag or the environment.
    pub fn is_production(&self) -> bool {
        self.production || env_selects_production(std::env::var(ENV_VAR).ok().as_deref())
    }
}

/// `ASSETPIPE_ENV` value check, split out so it can be tested without
/// touching the process environment.
pub fn env_selects_production(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_lowercase()).as_deref(),
        Some("production") | Some("prod")
    )
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
