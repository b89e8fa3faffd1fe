// src/engine/backend.rs

//! Pluggable rebuild backend.
//!
//! The watch runtime talks to a `RebuildBackend` instead of the pipeline
//! directly, so tests can count and delay rebuilds without touching the
//! filesystem.

use crate::compile::BoxFuture;
use crate::errors::Error;
use crate::pipeline::Pipeline;
use crate::types::Category;

/// Rebuilds one category in response to source changes.
pub trait RebuildBackend: Send + Sync + 'static {
    fn rebuild(&self, category: Category) -> BoxFuture<'_, Result<(), Error>>;
}

impl RebuildBackend for Pipeline {
    fn rebuild(&self, category: Category) -> BoxFuture<'_, Result<(), Error>> {
        Box::pin(async move {
            let reports = self.rebuild_category(category).await?;
            for report in reports.iter().filter(|r| r.has_errors()) {
                tracing::warn!(
                    %category,
                    stage = %report.stage,
                    failures = report.errors.len(),
                    "rebuild finished with per-file errors"
                );
            }
            Ok(())
        })
    }
}
