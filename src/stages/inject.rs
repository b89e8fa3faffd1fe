// src/stages/inject.rs

//! Writes `<link>`/`<script>` references for the compiled assets into the
//! markup entry point.
//!
//! References go between marker comments:
//!
//! ```html
//! <!-- inject:css -->
//! <link rel="stylesheet" href="css/main.css">
//! <!-- endinject -->
//! ```
//!
//! Whatever sits between the markers is replaced on every run, so injecting
//! twice gives the same document. Without markers the block is inserted
//! before `</head>` (styles) or `</body>` (scripts), or appended.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use regex::{Captures, Regex};
use tracing::info;

use super::StageReport;
use crate::fs::{FileSystem, walk_files};
use crate::pipeline::PipelineContext;
use crate::types::{BuildMode, Stage};

const END_MARKER: &str = "<!-- endinject -->";

fn marker_regex(kind: &str) -> Result<Regex> {
    let pattern = format!(
        r"(?s)(?P<indent>[ \t]*)(?P<open><!--\s*inject:{kind}\s*-->)(?P<body>.*?)(?P<close><!--\s*endinject\s*-->)"
    );
    Regex::new(&pattern).with_context(|| format!("compiling inject:{kind} marker pattern"))
}

/// Asset references to inject, relative to the served root, in lexical
/// order within each kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InjectionManifest {
    pub styles: Vec<String>,
    pub scripts: Vec<String>,
}

impl InjectionManifest {
    /// Build the manifest from file paths below `root`. Only `.css` and `.js`
    /// files are kept.
    pub fn from_paths<I, P>(root: &Path, files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut manifest = Self::default();
        for file in files {
            let file = file.as_ref();
            let Ok(rel) = file.strip_prefix(root) else {
                continue;
            };
            let rel = rel.to_string_lossy().replace('\\', "/");
            match file.extension().and_then(|e| e.to_str()) {
                Some("css") => manifest.styles.push(rel),
                Some("js") => manifest.scripts.push(rel),
                _ => {}
            }
        }
        manifest.styles.sort();
        manifest.scripts.sort();
        manifest
    }

    /// Scan `root` for compiled assets.
    pub fn discover(fs: &dyn FileSystem, root: &Path) -> Result<Self> {
        Ok(Self::from_paths(root, walk_files(fs, root)?))
    }

    pub fn len(&self) -> usize {
        self.styles.len() + self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
}

fn style_tag(href: &str) -> String {
    format!(r#"<link rel="stylesheet" href="{}">"#, escape_attr(href))
}

fn script_tag(src: &str) -> String {
    format!(r#"<script src="{}"></script>"#, escape_attr(src))
}

fn render_block(indent: &str, open: &str, close: &str, tags: &[String]) -> String {
    let mut block = format!("{indent}{open}\n");
    for tag in tags {
        block.push_str(indent);
        block.push_str(tag);
        block.push('\n');
    }
    block.push_str(indent);
    block.push_str(close);
    block
}

/// Find `needle` case-insensitively, last occurrence.
fn rfind_ignore_case(haystack: &str, needle: &str) -> Option<usize> {
    haystack.to_ascii_lowercase().rfind(needle)
}

fn inject_kind(html: &str, kind: &str, closing_tag: &str, tags: &[String]) -> Result<String> {
    let re = marker_regex(kind)?;
    if re.is_match(html) {
        return Ok(re
            .replace_all(html, |caps: &Captures<'_>| {
                render_block(&caps["indent"], &caps["open"], &caps["close"], tags)
            })
            .into_owned());
    }

    let block = render_block("", &format!("<!-- inject:{kind} -->"), END_MARKER, tags);
    match rfind_ignore_case(html, closing_tag) {
        Some(pos) => {
            let mut out = String::with_capacity(html.len() + block.len() + 1);
            out.push_str(&html[..pos]);
            out.push_str(&block);
            out.push('\n');
            out.push_str(&html[pos..]);
            Ok(out)
        }
        None => {
            let mut out = html.to_string();
            if !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(&block);
            out.push('\n');
            Ok(out)
        }
    }
}

/// Rewrite `html` so it references exactly the assets in `manifest`.
pub fn inject_markup(html: &str, manifest: &InjectionManifest) -> Result<String> {
    let styles: Vec<String> = manifest.styles.iter().map(|s| style_tag(s)).collect();
    let scripts: Vec<String> = manifest.scripts.iter().map(|s| script_tag(s)).collect();

    let html = inject_kind(html, "css", "</head>", &styles)?;
    inject_kind(&html, "js", "</body>", &scripts)
}

/// Inject the assets found under the root for `mode` into that root's entry
/// point. A missing entry point fails the stage.
pub fn inject(ctx: &PipelineContext, mode: BuildMode) -> Result<StageReport> {
    let root = ctx.paths.root_for(mode);
    let entry: PathBuf = ctx.paths.entry_point_in(root)?;

    if !ctx.fs.is_file(&entry) {
        bail!("entry point {:?} not found in {:?}", entry, root);
    }

    let manifest = InjectionManifest::discover(ctx.fs.as_ref(), root)?;
    let html = ctx.fs.read_to_string(&entry)?;
    let injected = inject_markup(&html, &manifest)?;

    let mut report = StageReport::new(Stage::Inject);
    if injected != html {
        ctx.fs.write(&entry, injected.as_bytes())?;
        report.written = 1;
    }

    info!(
        entry = ?entry,
        styles = manifest.styles.len(),
        scripts = manifest.scripts.len(),
        "references injected"
    );
    Ok(report)
}
