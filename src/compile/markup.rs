// src/compile/markup.rs

use anyhow::{Result, bail};
use tracing::{debug, info};

use super::{collect_sources, target_for};
use crate::pipeline::PipelineContext;
use crate::stages::StageReport;
use crate::types::{Category, Stage};

/// Copy every markup file except the entry point into the intermediate tree.
pub fn copy_markup(ctx: &PipelineContext) -> Result<StageReport> {
    let category = ctx.paths.category(Category::Markup)?;
    let entry = ctx.paths.markup_entry();
    let mut report = StageReport::new(Stage::Markup);

    for source in collect_sources(ctx.fs.as_ref(), &ctx.paths, category)? {
        if source == entry {
            continue;
        }
        let target = target_for(category, &source, &category.intermediate_dir);
        debug!(from = ?source, to = ?target, "copying markup");
        ctx.fs.copy(&source, &target)?;
        report.written += 1;
    }

    info!(copied = report.written, "markup copied");
    Ok(report)
}

/// Copy the markup entry point (the page InjectStage rewrites).
pub fn copy_entry_point(ctx: &PipelineContext) -> Result<StageReport> {
    let entry = ctx.paths.markup_entry();
    if !ctx.fs.is_file(entry) {
        bail!("markup entry point {:?} does not exist", entry);
    }

    let target = ctx.paths.entry_point_in(ctx.paths.intermediate_root())?;
    ctx.fs.copy(entry, &target)?;
    info!(target = ?target, "entry point copied");

    let mut report = StageReport::new(Stage::EntryPoint);
    report.written = 1;
    Ok(report)
}
