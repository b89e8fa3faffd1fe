// src/pipeline/context.rs

use std::sync::Arc;

use crate::compile::Compilers;
use crate::config::PathConfig;
use crate::fs::FileSystem;

/// Everything a stage needs, shared read-only across concurrent stages.
#[derive(Debug, Clone)]
pub struct PipelineContext {
    pub paths: PathConfig,
    pub fs: Arc<dyn FileSystem>,
    pub compilers: Compilers,
    /// Production builds drop debug output such as inline script source maps.
    pub production: bool,
}

impl PipelineContext {
    pub fn new(
        paths: PathConfig,
        fs: Arc<dyn FileSystem>,
        compilers: Compilers,
        production: bool,
    ) -> Self {
        Self {
            paths,
            fs,
            compilers,
            production,
        }
    }
}
