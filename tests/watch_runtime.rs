// tests/watch_runtime.rs

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use assetpipe::engine::{WatchEvent, WatchRuntime};
use assetpipe::reload::ReloadNotifier;
use assetpipe::types::{BuildMode, Category};
use assetpipe_test_utils::{
    ConfigFileBuilder, CountingOptimizer, FailingStyleCompiler, FakeBundler, FakeRebuildBackend,
    ProjectFixture, RecordingNotifier, fake_compilers, init_tracing, wait_until, with_timeout,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

type TestResult = Result<(), Box<dyn Error>>;

const DEBOUNCE: Duration = Duration::from_millis(30);

struct Harness {
    tx: mpsc::Sender<WatchEvent>,
    backend: Arc<FakeRebuildBackend>,
    notifier: Arc<RecordingNotifier>,
    handle: JoinHandle<assetpipe::errors::Result<()>>,
}

fn start(backend: FakeRebuildBackend) -> Harness {
    init_tracing();
    let (tx, rx) = mpsc::channel(64);
    let backend = Arc::new(backend);
    let notifier = Arc::new(RecordingNotifier::new());
    let runtime = WatchRuntime::new(
        rx,
        tx.clone(),
        backend.clone(),
        notifier.clone() as Arc<dyn ReloadNotifier>,
        DEBOUNCE,
    );
    let handle = tokio::spawn(runtime.run());
    Harness {
        tx,
        backend,
        notifier,
        handle,
    }
}

fn changed(category: Category, path: &str) -> WatchEvent {
    WatchEvent::SourceChanged {
        category,
        path: path.to_string(),
    }
}

impl Harness {
    async fn shutdown(self) -> TestResult {
        self.tx.send(WatchEvent::ShutdownRequested).await?;
        with_timeout(self.handle).await??;
        Ok(())
    }
}

#[tokio::test]
async fn rapid_changes_collapse_into_one_rebuild() -> TestResult {
    let h = start(FakeRebuildBackend::new());

    h.tx.send(changed(Category::Styles, "src/styles/a.css")).await?;
    h.tx.send(changed(Category::Styles, "src/styles/b.css")).await?;
    h.tx.send(changed(Category::Styles, "src/styles/a.css")).await?;

    assert!(wait_until(|| h.notifier.notifications() == 1).await);
    tokio::time::sleep(DEBOUNCE * 4).await;

    assert_eq!(h.backend.rebuild_count(Category::Styles), 1);
    assert_eq!(h.notifier.notifications(), 1);
    h.shutdown().await
}

#[tokio::test]
async fn failed_rebuild_keeps_watching_without_reload() -> TestResult {
    let h = start(FakeRebuildBackend::new().failing_for(Category::Scripts));

    h.tx.send(changed(Category::Scripts, "src/main.ts")).await?;
    assert!(wait_until(|| h.backend.rebuild_count(Category::Scripts) == 1).await);
    tokio::time::sleep(DEBOUNCE * 2).await;
    assert_eq!(h.notifier.notifications(), 0);

    h.tx.send(changed(Category::Styles, "src/styles/main.css")).await?;
    assert!(wait_until(|| h.notifier.notifications() == 1).await);

    h.tx.send(changed(Category::Scripts, "src/main.ts")).await?;
    assert!(wait_until(|| h.backend.rebuild_count(Category::Scripts) == 2).await);
    tokio::time::sleep(DEBOUNCE * 2).await;
    assert_eq!(h.notifier.notifications(), 1);
    h.shutdown().await
}

#[tokio::test]
async fn changes_during_a_rebuild_queue_exactly_one_rerun() -> TestResult {
    let h = start(FakeRebuildBackend::new().with_delay(Duration::from_millis(200)));

    h.tx.send(changed(Category::Markup, "src/index.html")).await?;
    assert!(wait_until(|| h.backend.rebuild_count(Category::Markup) == 1).await);

    for _ in 0..10 {
        h.tx.send(changed(Category::Markup, "src/about.html")).await?;
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    assert!(wait_until(|| h.notifier.notifications() == 2).await);
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert_eq!(h.backend.rebuild_count(Category::Markup), 2);
    assert_eq!(h.backend.max_concurrent_same(), 1);
    h.shutdown().await
}

#[tokio::test]
async fn different_categories_rebuild_concurrently() -> TestResult {
    let h = start(FakeRebuildBackend::new().with_delay(Duration::from_millis(300)));

    h.tx.send(changed(Category::Styles, "src/styles/main.css")).await?;
    h.tx.send(changed(Category::Images, "src/images/logo.png")).await?;

    assert!(wait_until(|| h.backend.max_concurrent_total() == 2).await);
    assert!(wait_until(|| h.notifier.notifications() == 2).await);
    assert_eq!(h.backend.max_concurrent_same(), 1);
    h.shutdown().await
}

#[tokio::test]
async fn shutdown_with_nothing_pending_returns_immediately() -> TestResult {
    let h = start(FakeRebuildBackend::new());
    h.shutdown().await
}

#[tokio::test]
async fn broken_stylesheet_keeps_the_real_pipeline_watching() -> TestResult {
    init_tracing();
    let project = ProjectFixture::sample();
    let cfg = ConfigFileBuilder::new().build();
    let mut compilers = fake_compilers(FakeBundler::new("console.log(1);"), CountingOptimizer::new());
    compilers.styles = Arc::new(FailingStyleCompiler::new("@@broken"));
    let pipeline = project.pipeline(&cfg, compilers, false);
    pipeline.run(BuildMode::Serve).await?;
    let before = project.read_string(".tmp/css/main.css");

    let (tx, rx) = mpsc::channel(64);
    let notifier = Arc::new(RecordingNotifier::new());
    let runtime = WatchRuntime::new(
        rx,
        tx.clone(),
        Arc::new(pipeline),
        notifier.clone() as Arc<dyn ReloadNotifier>,
        DEBOUNCE,
    );
    let handle = tokio::spawn(runtime.run());

    project.write("src/styles/main.css", ".main { @@broken }");
    tx.send(changed(Category::Styles, "src/styles/main.css")).await?;
    assert!(wait_until(|| notifier.notifications() == 1).await);
    assert!(!handle.is_finished());
    assert_eq!(project.read_string(".tmp/css/main.css"), before);

    project.write("src/styles/main.css", ".fresh { margin: 1px; }");
    tx.send(changed(Category::Styles, "src/styles/main.css")).await?;
    assert!(wait_until(|| notifier.notifications() == 2).await);
    assert!(project.read_string(".tmp/css/main.css").contains(".fresh"));

    tx.send(WatchEvent::ShutdownRequested).await?;
    with_timeout(handle).await??;
    Ok(())
}

/// Notifier whose broadcast blocks, like a client that stopped reading.
#[derive(Debug, Default)]
struct StalledNotifier;

impl ReloadNotifier for StalledNotifier {
    fn notify(&self) -> usize {
        std::thread::sleep(Duration::from_millis(1500));
        0
    }
}

#[tokio::test]
async fn slow_reload_broadcast_does_not_stall_the_loop() -> TestResult {
    init_tracing();
    let (tx, rx) = mpsc::channel(64);
    let backend = Arc::new(FakeRebuildBackend::new());
    let runtime = WatchRuntime::new(
        rx,
        tx.clone(),
        backend.clone(),
        Arc::new(StalledNotifier),
        DEBOUNCE,
    );
    let handle = tokio::spawn(runtime.run());

    tx.send(changed(Category::Styles, "src/styles/main.css")).await?;
    assert!(wait_until(|| backend.rebuild_count(Category::Styles) == 1).await);
    // Let the broadcast for the styles rebuild start.
    tokio::time::sleep(DEBOUNCE * 2).await;

    tx.send(changed(Category::Scripts, "src/main.ts")).await?;
    let next = tokio::time::timeout(
        Duration::from_millis(700),
        wait_until(|| backend.rebuild_count(Category::Scripts) == 1),
    )
    .await;
    assert!(matches!(next, Ok(true)), "scripts rebuild waited on the broadcast");

    tx.send(WatchEvent::ShutdownRequested).await?;
    with_timeout(handle).await??;
    Ok(())
}
