// src/compile/style.rs

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};
use parcel_sourcemap::SourceMap;
use tracing::{debug, error, info};

use super::command::{expand, run_capture};
use super::{BoxFuture, CompiledStyle, StyleCompiler, collect_sources, target_for};
use crate::pipeline::PipelineContext;
use crate::stages::StageReport;
use crate::types::{Category, Stage};

/// Built-in compiler: parses with lightningcss and prints unminified CSS
/// with a source map back to the original file.
///
/// Handles plain CSS and modern nesting. Sass-specific syntax needs an
/// external compiler (`[styles].cmd`).
#[derive(Debug, Default, Clone, Copy)]
pub struct LightningStyleCompiler;

impl LightningStyleCompiler {
    pub fn compile_source(&self, name: &str, source: &str) -> Result<CompiledStyle> {
        let stylesheet = StyleSheet::parse(
            source,
            ParserOptions {
                filename: name.to_string(),
                ..ParserOptions::default()
            },
        )
        .map_err(|e| anyhow!("{name}: {e}"))?;

        let mut source_map = SourceMap::new("/");
        source_map.add_source(name);
        source_map
            .set_source_content(0, source)
            .map_err(|e| anyhow!("{name}: source map: {e:?}"))?;

        let output = stylesheet
            .to_css(PrinterOptions {
                source_map: Some(&mut source_map),
                ..PrinterOptions::default()
            })
            .map_err(|e| anyhow!("{name}: {e}"))?;

        let map = source_map
            .to_json(None)
            .map_err(|e| anyhow!("{name}: source map: {e:?}"))?;

        Ok(CompiledStyle {
            css: output.code,
            source_map: Some(map),
        })
    }
}

impl StyleCompiler for LightningStyleCompiler {
    fn compile<'a>(
        &'a self,
        name: &'a str,
        _path: &'a Path,
        source: &'a str,
    ) -> BoxFuture<'a, Result<CompiledStyle>> {
        Box::pin(async move { self.compile_source(name, source) })
    }
}

/// External compiler such as `sass {input}`; stdout is the compiled CSS.
#[derive(Debug, Clone)]
pub struct CommandStyleCompiler {
    cmd: String,
    cwd: PathBuf,
}

impl CommandStyleCompiler {
    pub fn new(cmd: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            cmd: cmd.into(),
            cwd: cwd.into(),
        }
    }
}

impl StyleCompiler for CommandStyleCompiler {
    fn compile<'a>(
        &'a self,
        name: &'a str,
        path: &'a Path,
        _source: &'a str,
    ) -> BoxFuture<'a, Result<CompiledStyle>> {
        Box::pin(async move {
            let input = path.to_string_lossy();
            let line = expand(&self.cmd, &[("input", input.as_ref())]);
            let css = run_capture(name, &line, &self.cwd).await?;
            Ok(CompiledStyle {
                css,
                source_map: None,
            })
        })
    }
}

/// Sass-style partials are only compiled through the files importing them.
pub fn is_partial(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('_'))
}

/// Compile every non-partial stylesheet into the styles intermediate
/// directory.
///
/// A stylesheet that fails to compile is logged and recorded in the report;
/// the remaining files are still compiled and the stage succeeds.
pub async fn compile_styles(ctx: &PipelineContext) -> Result<StageReport> {
    let category = ctx.paths.category(Category::Styles)?;
    let fs = ctx.fs.as_ref();
    let mut report = StageReport::new(Stage::Styles);

    for source_path in collect_sources(fs, &ctx.paths, category)? {
        if is_partial(&source_path) {
            debug!(file = ?source_path, "skipping partial");
            continue;
        }

        let name = ctx
            .paths
            .relative_to_root(&source_path)
            .unwrap_or_else(|| source_path.to_string_lossy().into_owned());
        let source = fs.read_to_string(&source_path)?;
        let target = target_for(category, &source_path, &category.intermediate_dir)
            .with_extension("css");

        match ctx.compilers.styles.compile(&name, &source_path, &source).await {
            Ok(compiled) => {
                let mut css = compiled.css;
                if let Some(map) = compiled.source_map {
                    let map_path = map_path_for(&target);
                    fs.write(&map_path, map.as_bytes())
                        .with_context(|| format!("writing source map for {name}"))?;
                    if let Some(map_name) = map_path.file_name() {
                        if !css.ends_with('\n') {
                            css.push('\n');
                        }
                        css.push_str(&format!(
                            "/*# sourceMappingURL={} */\n",
                            map_name.to_string_lossy()
                        ));
                    }
                }
                fs.write(&target, css.as_bytes())?;
                report.written += 1;
            }
            Err(err) => {
                let message = format!("{err:#}");
                error!(file = %name, error = %message, "stylesheet failed to compile");
                report.errors.push(format!("{name}: {message}"));
            }
        }
    }

    info!(
        written = report.written,
        failed = report.errors.len(),
        "styles compiled"
    );
    Ok(report)
}

fn map_path_for(css_path: &Path) -> PathBuf {
    let mut name = css_path.as_os_str().to_os_string();
    name.push(".map");
    PathBuf::from(name)
}
