// src/stages/minify.rs

use anyhow::{Result, anyhow};
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use tracing::{debug, info};

use super::StageReport;
use crate::fs::walk_files;
use crate::pipeline::PipelineContext;
use crate::types::{Category, Stage};

/// lightningcss encodes browser versions as `major << 16 | minor << 8 | patch`.
fn version(major: u32) -> Option<u32> {
    Some(major << 16)
}

/// Browsers the production CSS is lowered for.
pub fn browser_targets() -> Targets {
    Targets::from(Browsers {
        chrome: version(80),
        edge: version(80),
        firefox: version(78),
        safari: version(13),
        ios_saf: version(13),
        ..Browsers::default()
    })
}

/// Minify one stylesheet.
pub fn minify_css(name: &str, source: &str) -> Result<String> {
    let mut stylesheet = StyleSheet::parse(
        source,
        ParserOptions {
            filename: name.to_string(),
            ..ParserOptions::default()
        },
    )
    .map_err(|e| anyhow!("{name}: {e}"))?;

    stylesheet
        .minify(MinifyOptions {
            targets: browser_targets(),
            ..MinifyOptions::default()
        })
        .map_err(|e| anyhow!("{name}: {e}"))?;

    let output = stylesheet
        .to_css(PrinterOptions {
            minify: true,
            targets: browser_targets(),
            ..PrinterOptions::default()
        })
        .map_err(|e| anyhow!("{name}: {e}"))?;

    Ok(output.code)
}

/// Minify every compiled stylesheet in the styles intermediate directory in
/// place.
pub fn minify_styles(ctx: &PipelineContext) -> Result<StageReport> {
    let dir = &ctx.paths.category(Category::Styles)?.intermediate_dir;
    let mut report = StageReport::new(Stage::Minify);

    for file in walk_files(ctx.fs.as_ref(), dir)? {
        if file.extension().and_then(|e| e.to_str()) != Some("css") {
            continue;
        }
        let name = file.to_string_lossy();
        let source = ctx.fs.read_to_string(&file)?;
        let minified = minify_css(&name, &source)?;
        debug!(file = %name, before = source.len(), after = minified.len(), "minified");
        ctx.fs.write(&file, minified.as_bytes())?;
        report.written += 1;
    }

    info!(files = report.written, "styles minified");
    Ok(report)
}
