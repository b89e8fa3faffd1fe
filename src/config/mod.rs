// src/config/mod.rs

//! Configuration loading and validation for assetpipe.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk or fall back to defaults (`loader.rs`).
//! - Validate layout invariants (`validate.rs`).
//! - Resolve the validated config into absolute per-category paths
//!   (`paths.rs`).

pub mod loader;
pub mod model;
pub mod paths;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, resolve};
pub use model::{
    ConfigFile, ImagesSection, MarkupSection, PathsSection, RawConfigFile, ScriptsSection,
    ServeSection, StylesSection,
};
pub use paths::{CategoryPaths, PathConfig, glob_base, project_root_for};
