// src/logging.rs

//! `tracing` subscriber setup.
//!
//! The filter comes from, in order: `--log-level`, `ASSETPIPE_LOG`, `info`.
//! `ASSETPIPE_LOG` takes either a bare level or full `EnvFilter` directives
//! (`info,assetpipe::watch=debug`). Bare levels keep the transport crates
//! at `warn` so a `debug` session shows pipeline events rather than socket
//! frames.
//!
//! Output goes to stderr; stdout belongs to `--dry-run`.

use anyhow::{Result, anyhow};
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::LogLevel;

pub const LOG_ENV_VAR: &str = "ASSETPIPE_LOG";

/// Dependencies that log per frame or per request.
const QUIET_TARGETS: &[&str] = &["tungstenite", "tiny_http", "notify", "globset"];

/// Install the global subscriber. Call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env_value = std::env::var(LOG_ENV_VAR).ok();
    let filter = filter_for(cli_level, env_value.as_deref());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))
}

/// Filter for the given CLI level and `ASSETPIPE_LOG` value.
pub fn filter_for(cli_level: Option<LogLevel>, env_value: Option<&str>) -> EnvFilter {
    if let Some(level) = cli_level {
        return level_filter(level.into());
    }

    match env_value.map(str::trim).filter(|s| !s.is_empty()) {
        Some(value) => match parse_level_str(value) {
            Some(level) => level_filter(level),
            None => EnvFilter::try_new(value).unwrap_or_else(|err| {
                eprintln!("assetpipe: ignoring invalid {LOG_ENV_VAR}={value:?}: {err}");
                level_filter(Level::INFO)
            }),
        },
        None => level_filter(Level::INFO),
    }
}

fn level_filter(level: Level) -> EnvFilter {
    let mut directives = level.as_str().to_lowercase();
    if level > Level::WARN {
        for target in QUIET_TARGETS {
            directives.push_str(&format!(",{target}=warn"));
        }
    }
    EnvFilter::new(directives)
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

fn parse_level_str(s: &str) -> Option<Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(Level::ERROR),
        "warn" | "warning" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}
