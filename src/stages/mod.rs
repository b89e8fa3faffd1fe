// src/stages/mod.rs

//! Whole-tree stages that run around the per-category compilers.

pub mod clean;
pub mod inject;
pub mod minify;
pub mod promote;

pub use clean::clean;
pub use inject::{InjectionManifest, inject, inject_markup};
pub use minify::{minify_css, minify_styles};
pub use promote::promote;

use crate::types::Stage;

/// What one stage did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
    pub stage: Stage,
    /// Files written, copied or removed.
    pub written: usize,
    /// Results reused from the image cache.
    pub cached: usize,
    /// Non-fatal per-file failures.
    pub errors: Vec<String>,
}

impl StageReport {
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            written: 0,
            cached: 0,
            errors: Vec::new(),
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}
