// tests/paths_layout.rs

use std::path::{Path, PathBuf};

use assetpipe::config::{PathConfig, glob_base};
use assetpipe::types::{BuildMode, Category};
use assetpipe_test_utils::ConfigFileBuilder;

#[test]
fn glob_base_stops_at_first_wildcard() {
    assert_eq!(glob_base("src/styles/**/*.scss"), PathBuf::from("src/styles"));
    assert_eq!(glob_base("src/*.ts"), PathBuf::from("src"));
    assert_eq!(glob_base("*.html"), PathBuf::new());
    assert_eq!(glob_base("src/{a,b}/x.css"), PathBuf::from("src"));
    assert_eq!(glob_base("src/index.html"), PathBuf::from("src"));
}

#[test]
fn categories_get_disjoint_subtrees() {
    let cfg = ConfigFileBuilder::new().build();
    let paths = PathConfig::from_config(&cfg, "/proj").unwrap();

    let styles = paths.category(Category::Styles).unwrap();
    assert_eq!(styles.source_base, Path::new("/proj/src/styles"));
    assert_eq!(styles.intermediate_dir, Path::new("/proj/.tmp/css"));
    assert_eq!(styles.output_dir, Path::new("/proj/dist/css"));

    let scripts = paths.category(Category::Scripts).unwrap();
    assert_eq!(scripts.intermediate_dir, Path::new("/proj/.tmp/js"));

    let images = paths.category(Category::Images).unwrap();
    assert_eq!(images.intermediate_dir, Path::new("/proj/.tmp/images"));

    let markup = paths.category(Category::Markup).unwrap();
    assert_eq!(markup.intermediate_dir, Path::new("/proj/.tmp"));
    assert_eq!(paths.categories().count(), 4);
}

#[test]
fn entry_point_keeps_layout_below_markup_base() {
    let cfg = ConfigFileBuilder::new().build();
    let paths = PathConfig::from_config(&cfg, "/proj").unwrap();

    assert_eq!(
        paths.entry_point_in(paths.root_for(BuildMode::Serve)).unwrap(),
        Path::new("/proj/.tmp/index.html")
    );
    assert_eq!(
        paths.entry_point_in(paths.root_for(BuildMode::Build)).unwrap(),
        Path::new("/proj/dist/index.html")
    );
}

#[test]
fn category_patterns_match_root_relative_paths() {
    let cfg = ConfigFileBuilder::new().build();
    let paths = PathConfig::from_config(&cfg, "/proj").unwrap();
    let styles = paths.category(Category::Styles).unwrap();

    assert!(styles.matches("src/styles/main.scss"));
    assert!(styles.matches("src/styles/deep/nested.css"));
    assert!(!styles.matches("src/main.ts"));
    assert_eq!(
        paths.relative_to_root(Path::new("/proj/src/styles/a.css")).as_deref(),
        Some("src/styles/a.css")
    );
    assert_eq!(paths.relative_to_root(Path::new("/elsewhere/a.css")), None);
}
