// src/compile/script.rs

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use super::command::{expand, run_capture};
use super::{BoxFuture, ScriptBundler};
use crate::pipeline::PipelineContext;
use crate::stages::StageReport;
use crate::types::{Category, Stage};

/// Bundler driven by an external command line such as
/// `esbuild {entry} --bundle`. The bundle is read from stdout.
#[derive(Debug, Clone)]
pub struct CommandBundler {
    cmd: String,
    debug_args: String,
    cwd: PathBuf,
}

impl CommandBundler {
    pub fn new(
        cmd: impl Into<String>,
        debug_args: impl Into<String>,
        cwd: impl Into<PathBuf>,
    ) -> Self {
        Self {
            cmd: cmd.into(),
            debug_args: debug_args.into(),
            cwd: cwd.into(),
        }
    }

    /// Full command line for bundling `entry`.
    pub fn command_line(&self, entry: &Path, debug: bool) -> String {
        let entry = entry.to_string_lossy();
        let mut line = expand(&self.cmd, &[("entry", entry.as_ref())]);
        if debug && !self.debug_args.trim().is_empty() {
            line.push(' ');
            line.push_str(self.debug_args.trim());
        }
        line
    }
}

impl ScriptBundler for CommandBundler {
    fn bundle<'a>(&'a self, entry: &'a Path, debug: bool) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move {
            let line = self.command_line(entry, debug);
            run_capture("bundler", &line, &self.cwd).await
        })
    }
}

/// Bundle the script entry into `<intermediate>/<scripts dir>/<output>`.
///
/// Unlike styles, a bundler failure fails the stage.
pub async fn compile_scripts(ctx: &PipelineContext) -> Result<StageReport> {
    let category = ctx.paths.category(Category::Scripts)?;
    let entry = ctx.paths.script_entry();
    let debug_symbols = !ctx.production;

    let bundle = ctx
        .compilers
        .scripts
        .bundle(entry, debug_symbols)
        .await
        .with_context(|| format!("bundling {:?}", entry))?;

    if bundle.trim().is_empty() {
        warn!(entry = ?entry, "bundler produced empty output");
    }

    let target = category
        .intermediate_dir
        .join(ctx.paths.script_output_name());
    ctx.fs.write(&target, bundle.as_bytes())?;

    info!(target = ?target, bytes = bundle.len(), debug_symbols, "scripts bundled");

    let mut report = StageReport::new(Stage::Scripts);
    report.written = 1;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_args_are_appended_outside_production() {
        let bundler = CommandBundler::new("esbuild {entry} --bundle", "--sourcemap=inline", ".");
        assert_eq!(
            bundler.command_line(Path::new("src/main.ts"), true),
            "esbuild src/main.ts --bundle --sourcemap=inline"
        );
        assert_eq!(
            bundler.command_line(Path::new("src/main.ts"), false),
            "esbuild src/main.ts --bundle"
        );
    }
}
