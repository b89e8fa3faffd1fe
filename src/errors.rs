// src/errors.rs

//! Crate-wide error type and result alias.
//!
//! Internals use `anyhow::Result` with context; this enum is what the
//! pipeline and config layers hand back to callers, so a failed run can be
//! told apart from a bad config without string matching.

use thiserror::Error;

use crate::types::{Category, Stage};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("stage '{stage}' failed: {source:#}")]
    StageFailed {
        stage: Stage,
        source: anyhow::Error,
    },

    #[error("no paths configured for category '{0}'")]
    UnknownCategory(Category),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PipelineError {
    pub fn stage(stage: Stage, source: anyhow::Error) -> Self {
        PipelineError::StageFailed { stage, source }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, PipelineError>;
