// src/config/model.rs

use serde::Deserialize;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [paths]
/// intermediate = ".tmp"
/// output = "dist"
///
/// [scripts]
/// entry = "src/main.ts"
/// cmd = "esbuild {entry} --bundle"
///
/// [serve]
/// port = 3000
/// ```
///
/// All sections are optional; an empty file (or no file at all) yields the
/// conventional `src/` → `.tmp/` → `dist/` layout.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub paths: PathsSection,
    #[serde(default)]
    pub styles: StylesSection,
    #[serde(default)]
    pub scripts: ScriptsSection,
    #[serde(default)]
    pub markup: MarkupSection,
    #[serde(default)]
    pub images: ImagesSection,
    #[serde(default)]
    pub serve: ServeSection,
}

/// Validated configuration. Only constructible through
/// `ConfigFile::try_from(RawConfigFile)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    paths: PathsSection,
    styles: StylesSection,
    scripts: ScriptsSection,
    markup: MarkupSection,
    images: ImagesSection,
    serve: ServeSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            paths: raw.paths,
            styles: raw.styles,
            scripts: raw.scripts,
            markup: raw.markup,
            images: raw.images,
            serve: raw.serve,
        }
    }

    pub fn paths(&self) -> &PathsSection {
        &self.paths
    }

    pub fn styles(&self) -> &StylesSection {
        &self.styles
    }

    pub fn scripts(&self) -> &ScriptsSection {
        &self.scripts
    }

    pub fn markup(&self) -> &MarkupSection {
        &self.markup
    }

    pub fn images(&self) -> &ImagesSection {
        &self.images
    }

    pub fn serve(&self) -> &ServeSection {
        &self.serve
    }
}

/// `[paths]` section. Directories are relative to the config file's directory.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathsSection {
    /// Scratch tree written by the compilers (`.tmp`).
    #[serde(default = "default_intermediate")]
    pub intermediate: String,

    /// Final tree produced by `build` (`dist`).
    #[serde(default = "default_output")]
    pub output: String,

    /// Persistent cache directory; never cleaned.
    #[serde(default = "default_cache")]
    pub cache: String,
}

fn default_intermediate() -> String {
    ".tmp".to_string()
}

fn default_output() -> String {
    "dist".to_string()
}

fn default_cache() -> String {
    ".assetpipe".to_string()
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            intermediate: default_intermediate(),
            output: default_output(),
            cache: default_cache(),
        }
    }
}

/// `[styles]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StylesSection {
    #[serde(default = "default_styles_source")]
    pub source: String,

    /// Subdirectory of the intermediate/output roots.
    #[serde(default = "default_styles_dir")]
    pub dir: String,

    /// Optional external compiler. `{input}` is replaced with the source file
    /// path and the command's stdout is taken as the compiled CSS. When unset
    /// the built-in compiler is used.
    #[serde(default)]
    pub cmd: Option<String>,
}

fn default_styles_source() -> String {
    "src/styles/**/*.{css,scss}".to_string()
}

fn default_styles_dir() -> String {
    "css".to_string()
}

impl Default for StylesSection {
    fn default() -> Self {
        Self {
            source: default_styles_source(),
            dir: default_styles_dir(),
            cmd: None,
        }
    }
}

/// `[scripts]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScriptsSection {
    /// Pattern that is watched; the bundle itself always starts at `entry`.
    #[serde(default = "default_scripts_source")]
    pub source: String,

    #[serde(default = "default_scripts_entry")]
    pub entry: String,

    #[serde(default = "default_scripts_dir")]
    pub dir: String,

    /// File name of the single bundled output.
    #[serde(default = "default_scripts_output")]
    pub output: String,

    /// Bundler command. `{entry}` is replaced with the entry file path; the
    /// command's stdout is the bundle.
    #[serde(default = "default_scripts_cmd")]
    pub cmd: String,

    /// Appended to `cmd` unless running in production mode.
    #[serde(default = "default_scripts_debug_args")]
    pub debug_args: String,
}

fn default_scripts_source() -> String {
    "src/**/*.ts".to_string()
}

fn default_scripts_entry() -> String {
    "src/main.ts".to_string()
}

fn default_scripts_dir() -> String {
    "js".to_string()
}

fn default_scripts_output() -> String {
    "main.js".to_string()
}

fn default_scripts_cmd() -> String {
    "esbuild {entry} --bundle".to_string()
}

fn default_scripts_debug_args() -> String {
    "--sourcemap=inline".to_string()
}

impl Default for ScriptsSection {
    fn default() -> Self {
        Self {
            source: default_scripts_source(),
            entry: default_scripts_entry(),
            dir: default_scripts_dir(),
            output: default_scripts_output(),
            cmd: default_scripts_cmd(),
            debug_args: default_scripts_debug_args(),
        }
    }
}

/// `[markup]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MarkupSection {
    #[serde(default = "default_markup_source")]
    pub source: String,

    /// The page that gets asset references injected.
    #[serde(default = "default_markup_entry")]
    pub entry: String,
}

fn default_markup_source() -> String {
    "src/**/*.html".to_string()
}

fn default_markup_entry() -> String {
    "src/index.html".to_string()
}

impl Default for MarkupSection {
    fn default() -> Self {
        Self {
            source: default_markup_source(),
            entry: default_markup_entry(),
        }
    }
}

/// `[images]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImagesSection {
    #[serde(default = "default_images_source")]
    pub source: String,

    #[serde(default = "default_images_dir")]
    pub dir: String,

    /// JPEG re-encoding quality, 1..=100.
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

fn default_images_source() -> String {
    "src/images/**/*.{png,jpg,jpeg,gif,svg,webp}".to_string()
}

fn default_images_dir() -> String {
    "images".to_string()
}

fn default_jpeg_quality() -> u8 {
    80
}

impl Default for ImagesSection {
    fn default() -> Self {
        Self {
            source: default_images_source(),
            dir: default_images_dir(),
            jpeg_quality: default_jpeg_quality(),
        }
    }
}

/// `[serve]` section: dev server and watch behaviour.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServeSection {
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP port; successive ports are tried if it is taken.
    #[serde(default = "default_port")]
    pub port: u16,

    /// WebSocket port for reload notifications.
    #[serde(default = "default_reload_port")]
    pub reload_port: u16,

    /// Window during which repeated changes to one category coalesce into a
    /// single rebuild.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_reload_port() -> u16 {
    35729
}

fn default_debounce_ms() -> u64 {
    100
}

impl Default for ServeSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            reload_port: default_reload_port(),
            debounce_ms: default_debounce_ms(),
        }
    }
}
