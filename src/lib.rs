// src/lib.rs

pub mod cli;
pub mod compile;
pub mod config;
pub mod engine;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod pipeline;
pub mod plan;
pub mod reload;
pub mod stages;
pub mod types;
pub mod watch;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::cli::{CliArgs, Command};
use crate::compile::Compilers;
use crate::config::{ConfigFile, PathConfig, ServeSection, project_root_for};
use crate::engine::{WatchEvent, WatchRuntime};
use crate::fs::RealFileSystem;
use crate::pipeline::{Pipeline, PipelineContext, RunReport, finish_build, mark_serving};
use crate::plan::StageGraph;
use crate::reload::{LiveReloadServer, ReloadNotifier};
use crate::types::BuildMode;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and path resolution
/// - the stage pipeline for the selected mode
/// - the dev server and reload socket
/// - (serve) the file watcher and watch runtime
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let (cfg, config_path) = config::resolve(args.config.as_deref())?;
    let project_root = project_root_for(&config_path);
    let paths = PathConfig::from_config(&cfg, &project_root)?;
    let mode = args.command.mode();
    let production = args.is_production();

    if args.dry_run {
        print_dry_run(&cfg, &paths, mode, production)?;
        return Ok(());
    }

    let compilers = Compilers::from_config(&cfg, &project_root);
    let ctx = PipelineContext::new(paths, Arc::new(RealFileSystem), compilers, production);
    let pipeline = Pipeline::new(ctx);

    match args.command {
        Command::Serve => serve(pipeline, cfg.serve()).await,
        Command::Build { serve } => build(pipeline, cfg.serve(), serve).await,
    }
}

async fn serve(pipeline: Pipeline, serve_cfg: &ServeSection) -> Result<()> {
    let mut report = pipeline.run(BuildMode::Serve).await?;
    log_summary(&report);

    let paths = &pipeline.context().paths;
    let server = Arc::new(LiveReloadServer::start(
        paths.intermediate_root(),
        serve_cfg,
    )?);
    mark_serving(&mut report)?;
    info!(addr = %server.http_addr(), state = %report.status.state(), "serving");

    let (tx, rx) = mpsc::channel::<WatchEvent>(256);
    let profiles = watch::build_profiles(paths)?;
    let _watcher = watch::spawn_watcher(paths.project_root(), profiles, tx.clone())?;
    spawn_ctrl_c(tx.clone());

    let notifier: Arc<dyn ReloadNotifier> = server;
    let runtime = WatchRuntime::new(
        rx,
        tx,
        Arc::new(pipeline),
        notifier,
        Duration::from_millis(serve_cfg.debounce_ms),
    );
    runtime.run().await?;
    Ok(())
}

async fn build(pipeline: Pipeline, serve_cfg: &ServeSection, keep_serving: bool) -> Result<()> {
    let mut report = pipeline.run(BuildMode::Build).await?;
    log_summary(&report);

    if !keep_serving {
        finish_build(&mut report, None)?;
        return Ok(());
    }

    let server = LiveReloadServer::start(pipeline.context().paths.output_root(), serve_cfg)?;
    finish_build(&mut report, Some(&server as &dyn ReloadNotifier))?;
    info!(addr = %server.http_addr(), "serving build output; Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    Ok(())
}

fn spawn_ctrl_c(tx: mpsc::Sender<WatchEvent>) {
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            eprintln!("failed to listen for Ctrl+C: {e}");
            return;
        }
        let _ = tx.send(WatchEvent::ShutdownRequested).await;
    });
}

fn log_summary(report: &RunReport) {
    for stage in &report.stages {
        debug!(
            stage = %stage.stage,
            written = stage.written,
            cached = stage.cached,
            failed = stage.errors.len(),
            "stage summary"
        );
    }
    for error in report.errors() {
        warn!("{error}");
    }
    info!(mode = %report.mode, state = %report.status.state(), "pipeline complete");
}

/// Print the resolved layout and stage plan without running anything.
fn print_dry_run(
    cfg: &ConfigFile,
    paths: &PathConfig,
    mode: BuildMode,
    production: bool,
) -> Result<()> {
    println!("assetpipe dry-run");
    println!("  mode = {mode}");
    println!("  production = {production}");
    println!("  project_root = {}", paths.project_root().display());
    println!("  intermediate = {}", paths.intermediate_root().display());
    println!("  output = {}", paths.output_root().display());
    println!("  cache = {}", paths.cache_dir().display());
    println!();

    println!("categories:");
    for cat in paths.categories() {
        println!("  - {}", cat.category);
        println!("      source: {}", cat.source_pattern);
        println!("      intermediate: {}", cat.intermediate_dir.display());
        println!("      output: {}", cat.output_dir.display());
    }
    println!("  script entry: {}", paths.script_entry().display());
    println!("  script bundle: {}", paths.script_output_name());
    println!("  markup entry: {}", paths.markup_entry().display());
    match &cfg.styles().cmd {
        Some(cmd) => println!("  style compiler: {cmd}"),
        None => println!("  style compiler: built-in"),
    }
    println!("  bundler: {}", cfg.scripts().cmd);
    println!();

    println!("stages:");
    for (idx, layer) in StageGraph::for_mode(mode).layers()?.iter().enumerate() {
        let names: Vec<&str> = layer.iter().map(|s| s.as_str()).collect();
        println!("  {}. {}", idx + 1, names.join(", "));
    }

    debug!("dry-run complete (no execution)");
    Ok(())
}
