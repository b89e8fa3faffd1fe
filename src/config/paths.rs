// src/config/paths.rs

//! Resolved filesystem layout: which sources feed each category and where
//! each category writes in the intermediate and output trees.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use globset::{Glob, GlobMatcher};

use crate::config::model::ConfigFile;
use crate::errors::{PipelineError, Result};
use crate::types::{BuildMode, Category};

/// Paths for a single asset category.
#[derive(Debug, Clone)]
pub struct CategoryPaths {
    pub category: Category,
    /// Glob relative to the project root, e.g. `src/styles/**/*.scss`.
    pub source_pattern: String,
    /// Literal directory prefix of `source_pattern`, resolved against the
    /// project root. Output paths keep the layout below this directory.
    pub source_base: PathBuf,
    pub intermediate_dir: PathBuf,
    pub output_dir: PathBuf,
    matcher: GlobMatcher,
}

impl CategoryPaths {
    /// Whether a project-root-relative path (forward slashes) belongs to this
    /// category.
    pub fn matches(&self, rel_path: &str) -> bool {
        self.matcher.is_match(rel_path)
    }
}

/// Process-wide, read-only mapping of categories to their locations.
#[derive(Debug, Clone)]
pub struct PathConfig {
    project_root: PathBuf,
    intermediate_root: PathBuf,
    output_root: PathBuf,
    cache_dir: PathBuf,
    script_entry: PathBuf,
    script_output: String,
    markup_entry: PathBuf,
    categories: BTreeMap<Category, CategoryPaths>,
}

impl PathConfig {
    /// Resolve every configured path against `project_root`.
    pub fn from_config(cfg: &ConfigFile, project_root: impl Into<PathBuf>) -> Result<Self> {
        let project_root = project_root.into();
        let intermediate_root = project_root.join(&cfg.paths().intermediate);
        let output_root = project_root.join(&cfg.paths().output);

        let specs = [
            (Category::Styles, cfg.styles().source.as_str(), Some(cfg.styles().dir.as_str())),
            (Category::Scripts, cfg.scripts().source.as_str(), Some(cfg.scripts().dir.as_str())),
            (Category::Markup, cfg.markup().source.as_str(), None),
            (Category::Images, cfg.images().source.as_str(), Some(cfg.images().dir.as_str())),
        ];

        let mut categories = BTreeMap::new();
        for (category, pattern, dir) in specs {
            let matcher = Glob::new(pattern)
                .map_err(|e| {
                    PipelineError::ConfigError(format!(
                        "[{category}].source is not a valid glob '{pattern}': {e}"
                    ))
                })?
                .compile_matcher();

            let (intermediate_dir, output_dir) = match dir {
                Some(dir) => (intermediate_root.join(dir), output_root.join(dir)),
                None => (intermediate_root.clone(), output_root.clone()),
            };

            categories.insert(
                category,
                CategoryPaths {
                    category,
                    source_pattern: pattern.to_string(),
                    source_base: project_root.join(glob_base(pattern)),
                    intermediate_dir,
                    output_dir,
                    matcher,
                },
            );
        }

        let paths = Self {
            cache_dir: project_root.join(&cfg.paths().cache),
            script_entry: project_root.join(&cfg.scripts().entry),
            script_output: cfg.scripts().output.clone(),
            markup_entry: project_root.join(&cfg.markup().entry),
            project_root,
            intermediate_root,
            output_root,
            categories,
        };

        for category in Category::ALL {
            paths.category(category)?;
        }

        Ok(paths)
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn intermediate_root(&self) -> &Path {
        &self.intermediate_root
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn script_entry(&self) -> &Path {
        &self.script_entry
    }

    pub fn script_output_name(&self) -> &str {
        &self.script_output
    }

    pub fn markup_entry(&self) -> &Path {
        &self.markup_entry
    }

    pub fn category(&self, category: Category) -> Result<&CategoryPaths> {
        self.categories
            .get(&category)
            .ok_or(PipelineError::UnknownCategory(category))
    }

    pub fn categories(&self) -> impl Iterator<Item = &CategoryPaths> {
        self.categories.values()
    }

    /// Root that InjectStage rewrites and the dev server serves.
    pub fn root_for(&self, mode: BuildMode) -> &Path {
        match mode {
            BuildMode::Serve => &self.intermediate_root,
            BuildMode::Build => &self.output_root,
        }
    }

    /// Location of the markup entry point once copied into `root`.
    pub fn entry_point_in(&self, root: &Path) -> Result<PathBuf> {
        let markup = self.category(Category::Markup)?;
        let rel = self
            .markup_entry
            .strip_prefix(&markup.source_base)
            .map_err(|_| {
                PipelineError::ConfigError(format!(
                    "markup entry {:?} is outside the markup source directory {:?}",
                    self.markup_entry, markup.source_base
                ))
            })?;
        Ok(root.join(rel))
    }

    /// Path of `path` relative to the project root, with forward slashes, for
    /// glob matching.
    pub fn relative_to_root(&self, path: &Path) -> Option<String> {
        let rel = path.strip_prefix(&self.project_root).ok()?;
        Some(rel.to_string_lossy().replace('\\', "/"))
    }
}

/// Figure out the project root from the config path.
///
/// - If the config path has a non-empty parent (e.g. "web/Assetpipe.toml"),
///   that directory is the root.
/// - A bare file name (parent = "") means the current working directory.
pub fn project_root_for(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

/// Literal directory prefix of a glob: every leading component that contains
/// no glob metacharacter.
///
/// `src/styles/**/*.scss` → `src/styles`; `*.html` → `` (the root itself).
pub fn glob_base(pattern: &str) -> PathBuf {
    let mut base = PathBuf::new();
    let components: Vec<Component<'_>> = Path::new(pattern).components().collect();
    let last = components.len().saturating_sub(1);

    for (idx, component) in components.into_iter().enumerate() {
        let text = component.as_os_str().to_string_lossy();
        if idx == last || text.contains(['*', '?', '[', '{']) {
            break;
        }
        base.push(component);
    }
    base
}
