// tests/config_validation.rs

use std::io::Write;

use assetpipe::config::{load_and_validate, resolve};
use assetpipe::errors::PipelineError;
use assetpipe_test_utils::ConfigFileBuilder;
use tempfile::NamedTempFile;

fn config_error<T: std::fmt::Debug>(result: Result<T, PipelineError>) -> String {
    match result {
        Err(PipelineError::ConfigError(msg)) => msg,
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn defaults_are_valid() {
    let cfg = ConfigFileBuilder::new().build();
    assert_eq!(cfg.paths().intermediate, ".tmp");
    assert_eq!(cfg.paths().output, "dist");
    assert_eq!(cfg.scripts().output, "main.js");
    assert_eq!(cfg.serve().debounce_ms, 100);
    assert!(cfg.styles().cmd.is_none());
}

#[test]
fn intermediate_and_output_must_differ() {
    let msg = config_error(
        ConfigFileBuilder::new()
            .with(|raw| raw.paths.output = ".tmp".to_string())
            .try_build(),
    );
    assert!(msg.contains("must differ"), "{msg}");
}

#[test]
fn cache_may_not_be_a_generated_tree() {
    let msg = config_error(
        ConfigFileBuilder::new()
            .with(|raw| raw.paths.cache = "dist".to_string())
            .try_build(),
    );
    assert!(msg.contains("[paths].cache"), "{msg}");
}

#[test]
fn output_inside_intermediate_is_rejected() {
    let msg = config_error(
        ConfigFileBuilder::new()
            .with(|raw| raw.paths.output = ".tmp/dist".to_string())
            .try_build(),
    );
    assert!(msg.contains("[paths].output"), "{msg}");
    assert!(msg.contains("nested inside [paths].intermediate"), "{msg}");
}

#[test]
fn intermediate_inside_output_is_rejected() {
    let msg = config_error(
        ConfigFileBuilder::new()
            .with(|raw| raw.paths.intermediate = "./dist/tmp/".to_string())
            .try_build(),
    );
    assert!(msg.contains("nested inside [paths].output"), "{msg}");
}

#[test]
fn cache_inside_a_cleaned_tree_is_rejected() {
    for cache in [".tmp/cache", "dist/.cache", "./.tmp/images/../cache"] {
        let msg = config_error(
            ConfigFileBuilder::new()
                .with(|raw| raw.paths.cache = cache.to_string())
                .try_build(),
        );
        assert!(msg.contains("[paths].cache"), "{cache}: {msg}");
    }
}

#[test]
fn equal_roots_are_compared_lexically() {
    let msg = config_error(
        ConfigFileBuilder::new()
            .with(|raw| raw.paths.output = "./.tmp/".to_string())
            .try_build(),
    );
    assert!(msg.contains("must differ"), "{msg}");
}

#[test]
fn project_root_cannot_be_a_generated_tree() {
    let msg = config_error(
        ConfigFileBuilder::new()
            .with(|raw| raw.paths.intermediate = ".".to_string())
            .try_build(),
    );
    assert!(msg.contains("project root"), "{msg}");
}

#[test]
fn sibling_roots_with_shared_prefix_are_fine() {
    let cfg = ConfigFileBuilder::new()
        .with(|raw| {
            raw.paths.intermediate = "build/tmp".to_string();
            raw.paths.output = "build/tmp-dist".to_string();
            raw.paths.cache = "build/cache".to_string();
        })
        .try_build();
    assert!(cfg.is_ok(), "{cfg:?}");
}

#[test]
fn category_dirs_must_be_distinct() {
    let msg = config_error(
        ConfigFileBuilder::new()
            .with(|raw| raw.scripts.dir = "css/".to_string())
            .try_build(),
    );
    assert!(msg.contains("[scripts].dir"), "{msg}");
}

#[test]
fn invalid_glob_is_rejected() {
    let msg = config_error(
        ConfigFileBuilder::new()
            .with(|raw| raw.styles.source = "src/{a,b".to_string())
            .try_build(),
    );
    assert!(msg.contains("[styles].source"), "{msg}");
}

#[test]
fn markup_entry_must_match_markup_source() {
    let msg = config_error(
        ConfigFileBuilder::new()
            .with(|raw| raw.markup.entry = "public/index.html".to_string())
            .try_build(),
    );
    assert!(msg.contains("is not matched by"), "{msg}");
}

#[test]
fn jpeg_quality_range() {
    for quality in [0u8, 101] {
        let msg = config_error(
            ConfigFileBuilder::new()
                .with(|raw| raw.images.jpeg_quality = quality)
                .try_build(),
        );
        assert!(msg.contains("jpeg_quality"), "{msg}");
    }
}

#[test]
fn serve_ports_must_differ() {
    config_error(ConfigFileBuilder::new().with_serve_ports(4000, 4000).try_build());
}

#[test]
fn zero_debounce_is_rejected() {
    config_error(ConfigFileBuilder::new().with_debounce_ms(0).try_build());
}

#[test]
fn toml_file_is_loaded_and_validated() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[paths]
output = "public"

[scripts]
entry = "src/app.ts"
cmd = "bundle {{entry}}"

[serve]
port = 8080
"#
    )
    .unwrap();

    let cfg = load_and_validate(file.path()).unwrap();
    assert_eq!(cfg.paths().output, "public");
    assert_eq!(cfg.paths().intermediate, ".tmp");
    assert_eq!(cfg.scripts().entry, "src/app.ts");
    assert_eq!(cfg.scripts().cmd, "bundle {entry}");
    assert_eq!(cfg.serve().port, 8080);
}

#[test]
fn unknown_keys_are_a_toml_error() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "[paths]\nouptut = \"x\"\n").unwrap();

    match load_and_validate(file.path()) {
        Err(PipelineError::TomlError(_)) => {}
        other => panic!("expected TomlError, got {other:?}"),
    }
}

#[test]
fn explicit_missing_config_is_an_io_error() {
    match resolve(Some("/definitely/not/here/Assetpipe.toml")) {
        Err(PipelineError::IoError(_)) => {}
        other => panic!("expected IoError, got {other:?}"),
    }
}
