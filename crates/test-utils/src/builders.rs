#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use assetpipe::compile::Compilers;
use assetpipe::config::{ConfigFile, PathConfig, RawConfigFile};
use assetpipe::errors::PipelineError;
use assetpipe::fs::mock::MockFileSystem;
use assetpipe::fs::{FileSystem, RealFileSystem};
use assetpipe::pipeline::{Pipeline, PipelineContext};
use tempfile::TempDir;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    /// Arbitrary edit of the raw config.
    pub fn with(mut self, edit: impl FnOnce(&mut RawConfigFile)) -> Self {
        edit(&mut self.config);
        self
    }

    pub fn with_styles_cmd(mut self, cmd: &str) -> Self {
        self.config.styles.cmd = Some(cmd.to_string());
        self
    }

    pub fn with_serve_ports(mut self, port: u16, reload_port: u16) -> Self {
        self.config.serve.port = port;
        self.config.serve.reload_port = reload_port;
        self
    }

    pub fn with_debounce_ms(mut self, ms: u64) -> Self {
        self.config.serve.debounce_ms = ms;
        self
    }

    pub fn try_build(self) -> Result<ConfigFile, PipelineError> {
        ConfigFile::try_from(self.config)
    }

    pub fn build(self) -> ConfigFile {
        self.try_build()
            .expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub const SAMPLE_INDEX: &str = "<!doctype html>
<html>
<head>
  <title>sample</title>
  <!-- inject:css -->
  <!-- endinject -->
</head>
<body>
  <h1>sample</h1>
  <!-- inject:js -->
  <!-- endinject -->
</body>
</html>
";

/// Source tree of the sample project, relative to the project root.
pub const SAMPLE_FILES: &[(&str, &[u8])] = &[
    ("src/index.html", SAMPLE_INDEX.as_bytes()),
    ("src/about.html", b"<html><body>about</body></html>\n"),
    ("src/styles/main.css", b".main {\n  color: red;\n  margin: 0px;\n}\n"),
    ("src/styles/theme/dark.css", b".dark { background: #000000; }\n"),
    ("src/styles/_vars.css", b":root { --accent: blue; }\n"),
    ("src/main.ts", b"console.log('main');\n"),
    ("src/images/logo.png", b"fake-png-logo"),
    ("src/images/icons/star.png", b"fake-png-star"),
];

fn context(
    paths: PathConfig,
    fs: Arc<dyn FileSystem>,
    compilers: Compilers,
    production: bool,
) -> Pipeline {
    Pipeline::new(PipelineContext::new(paths, fs, compilers, production))
}

/// Sample project on a [`MockFileSystem`] rooted at `/proj`.
pub struct MockProject {
    pub fs: MockFileSystem,
    pub root: PathBuf,
    pub cfg: ConfigFile,
}

impl MockProject {
    pub fn sample() -> Self {
        let fs = MockFileSystem::new();
        let root = PathBuf::from("/proj");
        for (rel, contents) in SAMPLE_FILES {
            fs.add_file(root.join(rel), contents.to_vec());
        }
        Self {
            fs,
            root,
            cfg: ConfigFileBuilder::new().build(),
        }
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }

    pub fn paths(&self) -> PathConfig {
        PathConfig::from_config(&self.cfg, &self.root).expect("resolving sample paths")
    }

    pub fn pipeline(&self, compilers: Compilers, production: bool) -> Pipeline {
        context(self.paths(), Arc::new(self.fs.clone()), compilers, production)
    }
}

/// Project on the real filesystem inside a temporary directory.
pub struct ProjectFixture {
    dir: TempDir,
}

impl ProjectFixture {
    pub fn empty() -> Self {
        Self {
            dir: tempfile::tempdir().expect("creating temp project dir"),
        }
    }

    pub fn sample() -> Self {
        let fixture = Self::empty();
        for (rel, contents) in SAMPLE_FILES {
            fixture.write(rel, contents);
        }
        fixture
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    pub fn write(&self, rel: &str, contents: impl AsRef<[u8]>) {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("creating fixture dir");
        }
        std::fs::write(path, contents).expect("writing fixture file");
    }

    pub fn remove(&self, rel: &str) {
        std::fs::remove_file(self.path(rel)).expect("removing fixture file");
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.path(rel).exists()
    }

    pub fn read(&self, rel: &str) -> Vec<u8> {
        std::fs::read(self.path(rel)).unwrap_or_else(|e| panic!("reading {rel}: {e}"))
    }

    pub fn read_string(&self, rel: &str) -> String {
        String::from_utf8(self.read(rel)).expect("fixture file is UTF-8")
    }

    pub fn paths(&self, cfg: &ConfigFile) -> PathConfig {
        PathConfig::from_config(cfg, self.root()).expect("resolving fixture paths")
    }

    pub fn pipeline(&self, cfg: &ConfigFile, compilers: Compilers, production: bool) -> Pipeline {
        context(self.paths(cfg), Arc::new(RealFileSystem), compilers, production)
    }

    /// Every file below `rel` with its contents, keyed by relative path.
    pub fn snapshot(&self, rel: &str) -> BTreeMap<String, Vec<u8>> {
        let base = self.path(rel);
        assetpipe::fs::walk_files(&RealFileSystem, &base)
            .expect("walking fixture tree")
            .into_iter()
            .map(|path| {
                let key = path
                    .strip_prefix(&base)
                    .expect("walked path below base")
                    .to_string_lossy()
                    .replace('\\', "/");
                let contents = std::fs::read(&path).expect("reading walked file");
                (key, contents)
            })
            .collect()
    }
}
