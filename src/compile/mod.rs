// src/compile/mod.rs

//! Per-category asset compilers.
//!
//! Each category turns the files matched by its source pattern into files
//! under its intermediate directory:
//!
//! - styles: stylesheet compiler (built-in or external command) plus a source
//!   map per file; partials (`_name.scss`) are skipped.
//! - scripts: one bundle produced by an external bundler from the entry file.
//! - markup: HTML copied verbatim; the entry point is its own stage.
//! - images: optimized once per distinct content and cached by hash.
//!
//! The tool seams are traits so the pipeline can be driven with fakes.

use std::fmt::Debug;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use anyhow::Result;

use crate::config::{CategoryPaths, ConfigFile, PathConfig};
use crate::fs::{FileSystem, walk_files};

pub mod command;
pub mod image_cache;
pub mod images;
pub mod markup;
pub mod script;
pub mod style;

pub use image_cache::{ImageCache, content_hash};
pub use images::{ImageCrateOptimizer, optimize_images};
pub use markup::{copy_entry_point, copy_markup};
pub use script::{CommandBundler, compile_scripts};
pub use style::{CommandStyleCompiler, LightningStyleCompiler, compile_styles};

/// Boxed future returned by the async tool traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Output of compiling one stylesheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledStyle {
    pub css: String,
    /// JSON source map, when the compiler produces one.
    pub source_map: Option<String>,
}

/// Compiles a single stylesheet.
///
/// `name` is the project-relative source path, used in diagnostics and
/// source maps.
pub trait StyleCompiler: Send + Sync + Debug {
    fn compile<'a>(
        &'a self,
        name: &'a str,
        path: &'a Path,
        source: &'a str,
    ) -> BoxFuture<'a, Result<CompiledStyle>>;
}

/// Bundles the script entry file and its imports into one JavaScript file.
pub trait ScriptBundler: Send + Sync + Debug {
    /// `debug` asks for inline source maps and other non-production output.
    fn bundle<'a>(&'a self, entry: &'a Path, debug: bool) -> BoxFuture<'a, Result<String>>;
}

/// Optimizes the bytes of one image.
pub trait ImageOptimizer: Send + Sync + Debug {
    fn optimize(&self, path: &Path, bytes: &[u8]) -> Result<Vec<u8>>;
}

/// The tool set a pipeline compiles with.
#[derive(Debug, Clone)]
pub struct Compilers {
    pub styles: Arc<dyn StyleCompiler>,
    pub scripts: Arc<dyn ScriptBundler>,
    pub images: Arc<dyn ImageOptimizer>,
}

impl Compilers {
    /// Tools described by the config. External commands run in
    /// `project_root`.
    pub fn from_config(cfg: &ConfigFile, project_root: &Path) -> Self {
        let styles: Arc<dyn StyleCompiler> = match &cfg.styles().cmd {
            Some(cmd) => Arc::new(CommandStyleCompiler::new(cmd.clone(), project_root)),
            None => Arc::new(LightningStyleCompiler),
        };

        Self {
            styles,
            scripts: Arc::new(CommandBundler::new(
                cfg.scripts().cmd.clone(),
                cfg.scripts().debug_args.clone(),
                project_root,
            )),
            images: Arc::new(ImageCrateOptimizer::new(cfg.images().jpeg_quality)),
        }
    }
}

/// Every file matched by the category's source pattern, sorted.
pub fn collect_sources(
    fs: &dyn FileSystem,
    paths: &PathConfig,
    category: &CategoryPaths,
) -> Result<Vec<PathBuf>> {
    let files = walk_files(fs, &category.source_base)?;
    Ok(files
        .into_iter()
        .filter(|path| {
            paths
                .relative_to_root(path)
                .is_some_and(|rel| category.matches(&rel))
        })
        .collect())
}

/// Where `source` lands below `dir`, keeping its layout relative to the
/// category's source base.
pub fn target_for(category: &CategoryPaths, source: &Path, dir: &Path) -> PathBuf {
    match source.strip_prefix(&category.source_base) {
        Ok(rel) => dir.join(rel),
        Err(_) => dir.join(source.file_name().unwrap_or(source.as_os_str())),
    }
}
