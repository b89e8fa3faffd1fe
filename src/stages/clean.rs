// src/stages/clean.rs

use anyhow::Result;
use tracing::info;

use super::StageReport;
use crate::pipeline::PipelineContext;
use crate::types::{BuildMode, Stage};

/// Remove the generated trees for `mode`.
///
/// The intermediate tree is always removed; the output tree only for a
/// build. The cache directory is never touched. Missing trees are fine.
pub fn clean(ctx: &PipelineContext, mode: BuildMode) -> Result<StageReport> {
    let mut report = StageReport::new(Stage::Clean);

    let mut targets = vec![ctx.paths.intermediate_root()];
    if mode.cleans_output() {
        targets.push(ctx.paths.output_root());
    }

    for dir in targets {
        info!(dir = ?dir, %mode, "cleaning");
        ctx.fs.remove_dir_all(dir)?;
        report.written += 1;
    }

    Ok(report)
}
