use std::fmt;
use std::str::FromStr;

/// Which end-to-end workflow is being run.
///
/// - `Serve`: development loop. Only the intermediate tree is cleaned, the
///   intermediate tree is injected and served, and file changes trigger
///   per-category rebuilds.
/// - `Build`: one-shot production build. Both trees are cleaned, styles are
///   minified, the intermediate tree is promoted to the output tree and the
///   output tree is injected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildMode {
    Serve,
    Build,
}

impl BuildMode {
    /// Whether CleanStage also clears the output tree.
    pub fn cleans_output(self) -> bool {
        matches!(self, BuildMode::Build)
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildMode::Serve => f.write_str("serve"),
            BuildMode::Build => f.write_str("build"),
        }
    }
}

/// Logical asset category. Each category owns a source pattern and a disjoint
/// subtree of the intermediate/output roots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    Styles,
    Scripts,
    Markup,
    Images,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Styles,
        Category::Scripts,
        Category::Markup,
        Category::Images,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Styles => "styles",
            Category::Scripts => "scripts",
            Category::Markup => "markup",
            Category::Images => "images",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "styles" => Ok(Category::Styles),
            "scripts" => Ok(Category::Scripts),
            "markup" => Ok(Category::Markup),
            "images" => Ok(Category::Images),
            other => Err(format!(
                "invalid category: {other} (expected styles, scripts, markup or images)"
            )),
        }
    }
}

/// A named unit of pipeline work.
///
/// The compile stages map onto categories; `EntryPoint` copies the markup
/// entry point separately from the bulk markup copy so InjectStage can
/// rewrite it afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Clean,
    Styles,
    Scripts,
    Markup,
    EntryPoint,
    Images,
    Minify,
    Promote,
    Inject,
}

impl Stage {
    /// Stages that compile sources into the intermediate tree.
    pub const COMPILERS: [Stage; 5] = [
        Stage::Styles,
        Stage::Scripts,
        Stage::Markup,
        Stage::EntryPoint,
        Stage::Images,
    ];

    /// The pipeline state a run is in while this stage executes.
    pub fn pipeline_state(self) -> PipelineState {
        match self {
            Stage::Clean => PipelineState::Cleaning,
            Stage::Styles
            | Stage::Scripts
            | Stage::Markup
            | Stage::EntryPoint
            | Stage::Images => PipelineState::Compiling,
            Stage::Minify | Stage::Promote => PipelineState::Minifying,
            Stage::Inject => PipelineState::Injecting,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Clean => "clean",
            Stage::Styles => "styles",
            Stage::Scripts => "scripts",
            Stage::Markup => "markup",
            Stage::EntryPoint => "entry-point",
            Stage::Images => "images",
            Stage::Minify => "minify",
            Stage::Promote => "promote",
            Stage::Inject => "inject",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of a single pipeline invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum PipelineState {
    #[default]
    Idle,
    Cleaning,
    Compiling,
    Minifying,
    Injecting,
    Serving,
    Failed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PipelineState::Idle => "idle",
            PipelineState::Cleaning => "cleaning",
            PipelineState::Compiling => "compiling",
            PipelineState::Minifying => "minifying",
            PipelineState::Injecting => "injecting",
            PipelineState::Serving => "serving",
            PipelineState::Failed => "failed",
        };
        f.write_str(s)
    }
}
