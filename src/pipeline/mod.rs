// src/pipeline/mod.rs

//! Runs the stage graph for a [`BuildMode`] and rebuilds single categories
//! for the watch loop.
//!
//! Stages within one layer of the graph run concurrently on the Tokio
//! runtime; filesystem-heavy stages go through `spawn_blocking`. A layer only
//! starts once every stage of the previous layer has finished, and the first
//! stage error aborts the run after its layer has drained.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::compile;
use crate::errors::{PipelineError, Result};
use crate::plan::{RunStatus, StageGraph};
use crate::reload::ReloadNotifier;
use crate::stages::{self, StageReport};
use crate::types::{BuildMode, Category, PipelineState, Stage};

pub mod context;

pub use context::PipelineContext;

/// Outcome of a complete pipeline run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub mode: BuildMode,
    pub status: RunStatus,
    /// One report per executed stage, in execution order.
    pub stages: Vec<StageReport>,
}

impl RunReport {
    pub fn stage(&self, stage: Stage) -> Option<&StageReport> {
        self.stages.iter().find(|r| r.stage == stage)
    }

    /// Non-fatal per-file failures across all stages.
    pub fn errors(&self) -> impl Iterator<Item = &String> {
        self.stages.iter().flat_map(|r| r.errors.iter())
    }
}

/// Stages re-run when sources of `category` change during serve.
///
/// Markup changes may touch the entry point, and every category that
/// produces referenced assets is followed by InjectStage so the page keeps
/// pointing at exactly what exists.
pub fn rebuild_stages(category: Category) -> &'static [Stage] {
    match category {
        Category::Styles => &[Stage::Styles, Stage::Inject],
        Category::Scripts => &[Stage::Scripts, Stage::Inject],
        Category::Markup => &[Stage::Markup, Stage::EntryPoint, Stage::Inject],
        Category::Images => &[Stage::Images],
    }
}

/// Whether `stage` reads or writes the entry point in the intermediate tree.
fn touches_entry_point(stage: Stage) -> bool {
    matches!(stage, Stage::EntryPoint | Stage::Inject)
}

/// Cheap to clone; clones share the same context.
#[derive(Debug, Clone)]
pub struct Pipeline {
    ctx: Arc<PipelineContext>,
    /// Held by a category rebuild from its first entry point stage to its
    /// last, so concurrent rebuilds never interleave on the same page.
    entry_lock: Arc<Mutex<()>>,
}

impl Pipeline {
    pub fn new(ctx: PipelineContext) -> Self {
        Self {
            ctx: Arc::new(ctx),
            entry_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn context(&self) -> &PipelineContext {
        &self.ctx
    }

    /// Run every stage of `mode` in dependency order.
    pub async fn run(&self, mode: BuildMode) -> Result<RunReport> {
        let graph = StageGraph::for_mode(mode);
        let layers = graph.layers()?;
        let mut status = RunStatus::new(mode);
        let mut reports = Vec::new();

        info!(%mode, production = self.ctx.production, "pipeline run started");

        for layer in layers {
            for stage in &layer {
                status.advance(stage.pipeline_state())?;
            }
            debug!(?layer, state = %status.state(), "running layer");

            match self.run_layer(&layer, mode).await {
                Ok(mut layer_reports) => reports.append(&mut layer_reports),
                Err(err) => {
                    status.fail();
                    error!(%mode, error = %err, "pipeline run failed");
                    return Err(err);
                }
            }
        }

        let failures = reports.iter().map(|r| r.errors.len()).sum::<usize>();
        if failures > 0 {
            warn!(%mode, failures, "pipeline finished with per-file errors");
        } else {
            info!(%mode, "pipeline run finished");
        }

        Ok(RunReport {
            mode,
            status,
            stages: reports,
        })
    }

    async fn run_layer(&self, layer: &[Stage], mode: BuildMode) -> Result<Vec<StageReport>> {
        let mut set = JoinSet::new();
        for &stage in layer {
            let this = self.clone();
            set.spawn(async move { (stage, this.run_stage(stage, mode).await) });
        }

        let mut reports = Vec::with_capacity(layer.len());
        let mut first_error: Option<PipelineError> = None;

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((_, Ok(report))) => reports.push(report),
                Ok((stage, Err(err))) => {
                    error!(%stage, error = %err, "stage failed");
                    first_error.get_or_insert(err);
                }
                Err(join_err) => {
                    first_error.get_or_insert(PipelineError::Other(join_err.into()));
                }
            }
        }

        if let Some(err) = first_error {
            return Err(err);
        }

        reports.sort_by_key(|r| r.stage);
        Ok(reports)
    }

    /// Run a single stage.
    pub async fn run_stage(&self, stage: Stage, mode: BuildMode) -> Result<StageReport> {
        let result = match stage {
            Stage::Clean => self.blocking(move |ctx| stages::clean(ctx, mode)).await,
            Stage::Styles => compile::compile_styles(&self.ctx).await,
            Stage::Scripts => compile::compile_scripts(&self.ctx).await,
            Stage::Markup => self.blocking(compile::copy_markup).await,
            Stage::EntryPoint => self.blocking(compile::copy_entry_point).await,
            Stage::Images => self.blocking(compile::optimize_images).await,
            Stage::Minify => self.blocking(stages::minify_styles).await,
            Stage::Promote => self.blocking(stages::promote).await,
            Stage::Inject => self.blocking(move |ctx| stages::inject(ctx, mode)).await,
        };
        result.map_err(|err| PipelineError::stage(stage, err))
    }

    async fn blocking<F>(&self, f: F) -> anyhow::Result<StageReport>
    where
        F: FnOnce(&PipelineContext) -> anyhow::Result<StageReport> + Send + 'static,
    {
        let ctx = Arc::clone(&self.ctx);
        tokio::task::spawn_blocking(move || f(&ctx)).await?
    }

    /// Re-run the stages for one category against the intermediate tree.
    pub async fn rebuild_category(&self, category: Category) -> Result<Vec<StageReport>> {
        info!(%category, "rebuilding");
        let mut reports = Vec::new();
        let mut entry_guard = None;
        for &stage in rebuild_stages(category) {
            if entry_guard.is_none() && touches_entry_point(stage) {
                debug!(%category, "waiting for entry point");
                entry_guard = Some(self.entry_lock.lock().await);
            }
            reports.push(self.run_stage(stage, BuildMode::Serve).await?);
        }
        drop(entry_guard);
        Ok(reports)
    }
}

/// State a finished serve run moves into once the dev server is up.
pub fn mark_serving(report: &mut RunReport) -> Result<()> {
    report.status.advance(PipelineState::Serving)
}

/// Close a Build run. With a reload server on the output root, the run moves
/// to `Serving` and connected clients are told to reload; without one the
/// build is complete as is. Returns the number of clients signalled.
pub fn finish_build(report: &mut RunReport, notifier: Option<&dyn ReloadNotifier>) -> Result<usize> {
    let Some(notifier) = notifier else {
        debug!("no reload server; build complete");
        return Ok(0);
    };
    mark_serving(report)?;
    Ok(notifier.notify())
}
