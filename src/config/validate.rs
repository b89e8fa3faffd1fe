// src/config/validate.rs

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use globset::Glob;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{PipelineError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = PipelineError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_roots(cfg)?;
    validate_category_dirs(cfg)?;
    validate_patterns(cfg)?;
    validate_entry_points(cfg)?;
    validate_images(cfg)?;
    validate_serve(cfg)?;
    Ok(())
}

fn config_error(msg: impl Into<String>) -> PipelineError {
    PipelineError::ConfigError(msg.into())
}

fn validate_roots(cfg: &RawConfigFile) -> Result<()> {
    let paths = &cfg.paths;
    let roots = [
        ("intermediate", paths.intermediate.as_str()),
        ("output", paths.output.as_str()),
        ("cache", paths.cache.as_str()),
    ];

    let mut normalized = Vec::with_capacity(roots.len());
    for (key, value) in roots {
        if value.trim().is_empty() {
            return Err(config_error(format!("[paths].{key} must not be empty")));
        }
        let path = normalize_root(value);
        if path.as_os_str().is_empty() {
            return Err(config_error(format!(
                "[paths].{key} '{value}' resolves to the project root"
            )));
        }
        normalized.push((key, value, path));
    }

    let (intermediate, output) = (&normalized[0].2, &normalized[1].2);
    if intermediate == output {
        return Err(config_error(format!(
            "[paths].intermediate and [paths].output must differ (both '{}')",
            paths.intermediate
        )));
    }
    let cache = &normalized[2].2;
    if cache == intermediate || cache == output {
        return Err(config_error(format!(
            "[paths].cache ('{}') must not be the intermediate or output directory; \
             those are deleted by clean",
            paths.cache
        )));
    }

    // Clean removes whole trees, so no root may live inside another.
    for (i, (outer_key, outer_value, outer)) in normalized.iter().enumerate() {
        for (inner_key, inner_value, inner) in &normalized[i + 1..] {
            let (parent, child) = if inner.starts_with(outer) {
                ((outer_key, outer_value), (inner_key, inner_value))
            } else if outer.starts_with(inner) {
                ((inner_key, inner_value), (outer_key, outer_value))
            } else {
                continue;
            };
            return Err(config_error(format!(
                "[paths].{} ('{}') is nested inside [paths].{} ('{}'); \
                 roots must not contain one another",
                child.0, child.1, parent.0, parent.1
            )));
        }
    }
    Ok(())
}

/// Lexical form of a root for comparison: `./dist/` and `dist` are equal.
fn normalize_root(value: &str) -> PathBuf {
    let mut out = PathBuf::new();
    for component in Path::new(value.trim()).components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Compilers run concurrently, so each one needs a subtree of its own.
fn validate_category_dirs(cfg: &RawConfigFile) -> Result<()> {
    let mut seen = HashSet::new();
    for (key, dir) in [
        ("styles", &cfg.styles.dir),
        ("scripts", &cfg.scripts.dir),
        ("images", &cfg.images.dir),
    ] {
        let trimmed = dir.trim().trim_matches('/');
        if trimmed.is_empty() {
            return Err(config_error(format!("[{key}].dir must not be empty")));
        }
        if !seen.insert(trimmed.to_string()) {
            return Err(config_error(format!(
                "[{key}].dir '{dir}' is shared with another category; \
                 styles, scripts and images need distinct directories"
            )));
        }
    }

    if cfg.scripts.output.trim().is_empty() {
        return Err(config_error("[scripts].output must not be empty"));
    }
    Ok(())
}

fn validate_patterns(cfg: &RawConfigFile) -> Result<()> {
    for (key, pattern) in [
        ("styles", &cfg.styles.source),
        ("scripts", &cfg.scripts.source),
        ("markup", &cfg.markup.source),
        ("images", &cfg.images.source),
    ] {
        Glob::new(pattern).map_err(|e| {
            config_error(format!("[{key}].source is not a valid glob '{pattern}': {e}"))
        })?;
    }
    Ok(())
}

fn validate_entry_points(cfg: &RawConfigFile) -> Result<()> {
    if cfg.scripts.entry.trim().is_empty() {
        return Err(config_error("[scripts].entry must not be empty"));
    }

    let entry = cfg.markup.entry.trim();
    if entry.is_empty() {
        return Err(config_error("[markup].entry must not be empty"));
    }

    let markup = Glob::new(&cfg.markup.source)
        .map_err(|e| config_error(format!("[markup].source: {e}")))?
        .compile_matcher();
    if !markup.is_match(entry) {
        return Err(config_error(format!(
            "[markup].entry '{}' is not matched by [markup].source '{}'",
            entry, cfg.markup.source
        )));
    }
    Ok(())
}

fn validate_images(cfg: &RawConfigFile) -> Result<()> {
    let q = cfg.images.jpeg_quality;
    if !(1..=100).contains(&q) {
        return Err(config_error(format!(
            "[images].jpeg_quality must be within 1..=100 (got {q})"
        )));
    }
    Ok(())
}

fn validate_serve(cfg: &RawConfigFile) -> Result<()> {
    let serve = &cfg.serve;
    if serve.debounce_ms == 0 {
        return Err(config_error("[serve].debounce_ms must be >= 1 (got 0)"));
    }
    if serve.port == serve.reload_port {
        return Err(config_error(format!(
            "[serve].port and [serve].reload_port must differ (both {})",
            serve.port
        )));
    }
    Ok(())
}
