#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Result, anyhow, bail};
use assetpipe::compile::{
    BoxFuture, CompiledStyle, Compilers, ImageOptimizer, LightningStyleCompiler, ScriptBundler,
    StyleCompiler,
};
use assetpipe::engine::RebuildBackend;
use assetpipe::reload::ReloadNotifier;
use assetpipe::types::Category;

/// Bundler that returns a fixed script and records the `debug` flag of
/// every call.
#[derive(Debug, Clone)]
pub struct FakeBundler {
    output: String,
    fail: bool,
    calls: Arc<Mutex<Vec<bool>>>,
}

impl FakeBundler {
    pub fn new(output: &str) -> Self {
        Self {
            output: output.to_string(),
            fail: false,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new("")
        }
    }

    /// `debug` flag of each call so far.
    pub fn calls(&self) -> Vec<bool> {
        self.calls.lock().unwrap().clone()
    }
}

impl ScriptBundler for FakeBundler {
    fn bundle<'a>(&'a self, entry: &'a Path, debug: bool) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(debug);
            if self.fail {
                bail!("bundler failed on {:?}", entry);
            }
            Ok(self.output.clone())
        })
    }
}

/// Optimizer that passes bytes through and counts invocations per file name.
#[derive(Debug, Clone, Default)]
pub struct CountingOptimizer {
    calls: Arc<AtomicUsize>,
    per_file: Arc<Mutex<HashMap<String, usize>>>,
}

impl CountingOptimizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn calls_for(&self, file_name: &str) -> usize {
        self.per_file
            .lock()
            .unwrap()
            .get(file_name)
            .copied()
            .unwrap_or(0)
    }

    pub fn reset(&self) {
        self.calls.store(0, Ordering::SeqCst);
        self.per_file.lock().unwrap().clear();
    }
}

impl ImageOptimizer for CountingOptimizer {
    fn optimize(&self, path: &Path, bytes: &[u8]) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        *self.per_file.lock().unwrap().entry(name).or_insert(0) += 1;
        Ok(bytes.to_vec())
    }
}

/// Built-in style compiler that rejects any source containing `marker`.
#[derive(Debug, Clone)]
pub struct FailingStyleCompiler {
    marker: String,
}

impl FailingStyleCompiler {
    pub fn new(marker: &str) -> Self {
        Self {
            marker: marker.to_string(),
        }
    }
}

impl StyleCompiler for FailingStyleCompiler {
    fn compile<'a>(
        &'a self,
        name: &'a str,
        _path: &'a Path,
        source: &'a str,
    ) -> BoxFuture<'a, Result<CompiledStyle>> {
        Box::pin(async move {
            if source.contains(&self.marker) {
                return Err(anyhow!("{name}: syntax error"));
            }
            LightningStyleCompiler.compile_source(name, source)
        })
    }
}

/// Built-in styles with the given bundler and optimizer.
pub fn fake_compilers(bundler: FakeBundler, optimizer: CountingOptimizer) -> Compilers {
    Compilers {
        styles: Arc::new(LightningStyleCompiler),
        scripts: Arc::new(bundler),
        images: Arc::new(optimizer),
    }
}

/// Notifier that only counts broadcasts.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    count: AtomicUsize,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl ReloadNotifier for RecordingNotifier {
    fn notify(&self) -> usize {
        self.count.fetch_add(1, Ordering::SeqCst);
        0
    }
}

#[derive(Debug, Default)]
struct BackendState {
    rebuilds: Vec<Category>,
    running: HashMap<Category, usize>,
    max_concurrent_same: usize,
    max_concurrent_total: usize,
}

/// Rebuild backend that records calls, optionally sleeps, and can fail
/// one category.
#[derive(Debug, Default)]
pub struct FakeRebuildBackend {
    delay: Duration,
    failing: Option<Category>,
    state: Mutex<BackendState>,
}

impl FakeRebuildBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing_for(mut self, category: Category) -> Self {
        self.failing = Some(category);
        self
    }

    pub fn rebuilds(&self) -> Vec<Category> {
        self.state.lock().unwrap().rebuilds.clone()
    }

    pub fn rebuild_count(&self, category: Category) -> usize {
        self.rebuilds().iter().filter(|c| **c == category).count()
    }

    /// Highest number of simultaneous rebuilds of a single category.
    pub fn max_concurrent_same(&self) -> usize {
        self.state.lock().unwrap().max_concurrent_same
    }

    /// Highest number of simultaneous rebuilds overall.
    pub fn max_concurrent_total(&self) -> usize {
        self.state.lock().unwrap().max_concurrent_total
    }
}

impl RebuildBackend for FakeRebuildBackend {
    fn rebuild(&self, category: Category) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            {
                let mut state = self.state.lock().unwrap();
                state.rebuilds.push(category);
                let running = state.running.entry(category).or_insert(0);
                *running += 1;
                let same = *running;
                let total: usize = state.running.values().sum();
                state.max_concurrent_same = state.max_concurrent_same.max(same);
                state.max_concurrent_total = state.max_concurrent_total.max(total);
            }

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            {
                let mut state = self.state.lock().unwrap();
                if let Some(running) = state.running.get_mut(&category) {
                    *running -= 1;
                }
            }

            if self.failing == Some(category) {
                bail!("{category} rebuild failed");
            }
            Ok(())
        })
    }
}
