// src/stages/promote.rs

use anyhow::Result;
use tracing::{debug, info};

use super::StageReport;
use crate::fs::walk_files;
use crate::pipeline::PipelineContext;
use crate::types::Stage;

/// Copy the finished intermediate tree into the output tree, keeping its
/// layout.
pub fn promote(ctx: &PipelineContext) -> Result<StageReport> {
    let from_root = ctx.paths.intermediate_root();
    let to_root = ctx.paths.output_root();
    let mut report = StageReport::new(Stage::Promote);

    for file in walk_files(ctx.fs.as_ref(), from_root)? {
        let Ok(rel) = file.strip_prefix(from_root) else {
            continue;
        };
        let target = to_root.join(rel);
        debug!(from = ?file, to = ?target, "promoting");
        ctx.fs.copy(&file, &target)?;
        report.written += 1;
    }

    info!(files = report.written, output = ?to_root, "promoted to output tree");
    Ok(report)
}
