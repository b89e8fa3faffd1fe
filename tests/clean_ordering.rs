// tests/clean_ordering.rs

//! Ordering and side-effect checks against the journaling mock filesystem.

use std::error::Error;
use std::path::Path;

use assetpipe::fs::FileSystem;
use assetpipe::fs::mock::FsOp;
use assetpipe::types::BuildMode;
use assetpipe_test_utils::{
    CountingOptimizer, FakeBundler, MockProject, fake_compilers, init_tracing,
};

type TestResult = Result<(), Box<dyn Error>>;

fn is_remove(op: &FsOp) -> bool {
    matches!(op, FsOp::RemoveDirAll(_))
}

#[tokio::test]
async fn build_cleans_both_trees_before_any_write() -> TestResult {
    init_tracing();
    let project = MockProject::sample();
    let pipeline = project.pipeline(
        fake_compilers(FakeBundler::new("console.log('bundled');"), CountingOptimizer::new()),
        false,
    );

    pipeline.run(BuildMode::Build).await?;

    let journal = project.fs.journal();
    let first_other = journal
        .iter()
        .position(|op| !is_remove(op))
        .ok_or("no writes recorded")?;
    let removes: Vec<&FsOp> = journal.iter().filter(|op| is_remove(op)).collect();

    assert!(journal[..first_other].iter().all(is_remove));
    assert!(journal[first_other..].iter().all(|op| !is_remove(op)));
    assert_eq!(
        removes,
        vec![
            &FsOp::RemoveDirAll(project.path(".tmp")),
            &FsOp::RemoveDirAll(project.path("dist")),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn serve_never_touches_output_tree() -> TestResult {
    init_tracing();
    let project = MockProject::sample();
    project.fs.add_file(project.path("dist/keep.txt"), "previous build");

    let pipeline = project.pipeline(
        fake_compilers(FakeBundler::new("x"), CountingOptimizer::new()),
        false,
    );
    pipeline.run(BuildMode::Serve).await?;

    let dist = project.path("dist");
    assert!(project.fs.journal().iter().all(|op| !op.target().starts_with(&dist)));
    assert_eq!(
        project.fs.contents(project.path("dist/keep.txt")).as_deref(),
        Some(&b"previous build"[..])
    );
    assert!(project.fs.is_file(&project.path(".tmp/index.html")));
    Ok(())
}

#[tokio::test]
async fn clean_removes_stale_intermediate_files() -> TestResult {
    init_tracing();
    let project = MockProject::sample();
    project.fs.add_file(project.path(".tmp/css/removed.css"), ".old {}");

    let pipeline = project.pipeline(
        fake_compilers(FakeBundler::new("x"), CountingOptimizer::new()),
        false,
    );
    pipeline.run(BuildMode::Serve).await?;

    assert!(!project.fs.exists(&project.path(".tmp/css/removed.css")));
    let index = String::from_utf8(
        project
            .fs
            .contents(project.path(".tmp/index.html"))
            .ok_or("index missing")?,
    )?;
    assert!(!index.contains("removed.css"));
    Ok(())
}

#[tokio::test]
async fn cache_directory_survives_clean() -> TestResult {
    init_tracing();
    let project = MockProject::sample();
    let pipeline = project.pipeline(
        fake_compilers(FakeBundler::new("x"), CountingOptimizer::new()),
        false,
    );

    pipeline.run(BuildMode::Build).await?;
    pipeline.run(BuildMode::Build).await?;

    let cache = project.path(".assetpipe");
    assert!(
        project
            .fs
            .journal()
            .iter()
            .filter(|op| is_remove(op))
            .all(|op| !op.target().starts_with(&cache))
    );
    assert!(project.fs.is_dir(&cache.join("images")));
    Ok(())
}

#[tokio::test]
async fn build_output_is_minified_and_injected() -> TestResult {
    init_tracing();
    let project = MockProject::sample();
    let pipeline = project.pipeline(
        fake_compilers(FakeBundler::new("console.log('bundled');"), CountingOptimizer::new()),
        false,
    );

    let report = pipeline.run(BuildMode::Build).await?;
    assert_eq!(report.errors().count(), 0);

    let read = |rel: &str| -> Result<String, Box<dyn Error>> {
        let bytes = project.fs.contents(project.path(rel)).ok_or(format!("{rel} missing"))?;
        Ok(String::from_utf8(bytes)?)
    };

    assert!(read("dist/css/main.css")?.contains(".main{color:red;margin:0}"));
    assert_eq!(read("dist/js/main.js")?, "console.log('bundled');");
    assert!(project.fs.is_file(Path::new("/proj/dist/about.html")));
    assert!(project.fs.is_file(Path::new("/proj/dist/images/icons/star.png")));
    assert!(!project.fs.exists(Path::new("/proj/dist/css/_vars.css")));

    let index = read("dist/index.html")?;
    let main_css = index.find("href=\"css/main.css\"").ok_or("main.css not injected")?;
    let dark_css = index.find("href=\"css/theme/dark.css\"").ok_or("dark.css not injected")?;
    let main_js = index.find("src=\"js/main.js\"").ok_or("main.js not injected")?;
    assert!(main_css < dark_css && dark_css < main_js);
    assert!(!index.contains("_vars"));
    Ok(())
}
