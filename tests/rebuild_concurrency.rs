// tests/rebuild_concurrency.rs

//! Category rebuilds that share the entry point must not lose each other's
//! changes when the watch loop runs them at the same time.

use std::error::Error;

use assetpipe::types::{BuildMode, Category};
use assetpipe_test_utils::builders::SAMPLE_INDEX;
use assetpipe_test_utils::{
    ConfigFileBuilder, CountingOptimizer, FakeBundler, ProjectFixture, fake_compilers,
    init_tracing,
};

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_style_and_markup_rebuilds_keep_both_changes() -> TestResult {
    init_tracing();
    let project = ProjectFixture::sample();
    let cfg = ConfigFileBuilder::new().build();
    let pipeline = project.pipeline(
        &cfg,
        fake_compilers(FakeBundler::new("console.log(1);"), CountingOptimizer::new()),
        false,
    );
    pipeline.run(BuildMode::Serve).await?;

    for i in 0..100 {
        let heading = format!("<h1>v{i}</h1>");
        project.write("src/index.html", SAMPLE_INDEX.replace("<h1>sample</h1>", &heading));

        let styles = tokio::spawn({
            let pipeline = pipeline.clone();
            async move { pipeline.rebuild_category(Category::Styles).await }
        });
        let markup = tokio::spawn({
            let pipeline = pipeline.clone();
            async move { pipeline.rebuild_category(Category::Markup).await }
        });
        styles.await??;
        markup.await??;

        let index = project.read_string(".tmp/index.html");
        assert!(index.contains(&heading), "round {i}: stale page\n{index}");
        assert_eq!(index.matches("href=\"css/main.css\"").count(), 1, "round {i}\n{index}");
        assert_eq!(index.matches("src=\"js/main.js\"").count(), 1, "round {i}\n{index}");
    }
    Ok(())
}
