// src/watch/patterns.rs

use std::fmt;

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::config::PathConfig;
use crate::types::Category;

/// Compiled watch/exclude globs for one category, matched against
/// project-root-relative paths with forward slashes.
#[derive(Clone)]
pub struct CategoryWatchProfile {
    category: Category,
    watch_set: GlobSet,
    exclude_set: GlobSet,
}

impl fmt::Debug for CategoryWatchProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CategoryWatchProfile")
            .field("category", &self.category)
            .finish_non_exhaustive()
    }
}

impl CategoryWatchProfile {
    pub fn new(category: Category, watch: &[String], exclude: &[String]) -> Result<Self> {
        Ok(Self {
            category,
            watch_set: build_globset(watch)
                .with_context(|| format!("building watch globset for {category}"))?,
            exclude_set: build_globset(exclude)
                .with_context(|| format!("building exclude globset for {category}"))?,
        })
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn matches(&self, rel_path: &str) -> bool {
        self.watch_set.is_match(rel_path) && !self.exclude_set.is_match(rel_path)
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        builder.add(Glob::new(pat).with_context(|| format!("invalid glob pattern: {pat}"))?);
    }
    Ok(builder.build()?)
}

/// One profile per category: its source pattern, minus everything below the
/// generated trees.
pub fn build_profiles(paths: &PathConfig) -> Result<Vec<CategoryWatchProfile>> {
    let exclude: Vec<String> = [paths.intermediate_root(), paths.output_root(), paths.cache_dir()]
        .into_iter()
        .filter_map(|dir| paths.relative_to_root(dir))
        .filter(|rel| !rel.is_empty())
        .map(|rel| format!("{}/**", rel.trim_end_matches('/')))
        .collect();

    paths
        .categories()
        .map(|cat| CategoryWatchProfile::new(cat.category, &[cat.source_pattern.clone()], &exclude))
        .collect()
}
