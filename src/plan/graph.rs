// src/plan/graph.rs

use std::collections::BTreeMap;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use petgraph::Direction;

use crate::errors::{PipelineError, Result};
use crate::types::{BuildMode, Stage};

/// Directed acyclic graph of the stages making up one pipeline run.
///
/// Edge direction: dependency -> dependent. For a build run:
///
/// ```text
/// clean -> {styles, scripts, markup, entry-point, images} -> minify -> promote -> inject
/// ```
///
/// A serve run drops `minify` and `promote` and goes straight from the
/// compilers to `inject`.
#[derive(Debug, Clone)]
pub struct StageGraph {
    mode: BuildMode,
    graph: DiGraphMap<Stage, ()>,
}

impl StageGraph {
    pub fn for_mode(mode: BuildMode) -> Self {
        let mut graph: DiGraphMap<Stage, ()> = DiGraphMap::new();

        graph.add_node(Stage::Clean);
        for compiler in Stage::COMPILERS {
            graph.add_edge(Stage::Clean, compiler, ());
        }

        match mode {
            BuildMode::Serve => {
                for compiler in Stage::COMPILERS {
                    graph.add_edge(compiler, Stage::Inject, ());
                }
            }
            BuildMode::Build => {
                for compiler in Stage::COMPILERS {
                    graph.add_edge(compiler, Stage::Minify, ());
                }
                graph.add_edge(Stage::Minify, Stage::Promote, ());
                graph.add_edge(Stage::Promote, Stage::Inject, ());
            }
        }

        Self { mode, graph }
    }

    pub fn mode(&self) -> BuildMode {
        self.mode
    }

    pub fn contains(&self, stage: Stage) -> bool {
        self.graph.contains_node(stage)
    }

    /// All stages, in sorted order.
    pub fn stages(&self) -> Vec<Stage> {
        let mut stages: Vec<Stage> = self.graph.nodes().collect();
        stages.sort();
        stages
    }

    /// Immediate dependencies of a stage.
    pub fn dependencies_of(&self, stage: Stage) -> Vec<Stage> {
        let mut deps: Vec<Stage> = self
            .graph
            .neighbors_directed(stage, Direction::Incoming)
            .collect();
        deps.sort();
        deps
    }

    /// Group stages into layers: every stage sits one layer after its deepest
    /// dependency, so all stages within a layer are independent of each other.
    pub fn layers(&self) -> Result<Vec<Vec<Stage>>> {
        let order = toposort(&self.graph, None).map_err(|cycle| {
            PipelineError::Other(anyhow::anyhow!(
                "cycle detected in stage graph involving stage '{}'",
                cycle.node_id()
            ))
        })?;

        let mut depth: BTreeMap<Stage, usize> = BTreeMap::new();
        for stage in order {
            let d = self
                .dependencies_of(stage)
                .iter()
                .filter_map(|dep| depth.get(dep))
                .map(|d| d + 1)
                .max()
                .unwrap_or(0);
            depth.insert(stage, d);
        }

        let mut layers: Vec<Vec<Stage>> = Vec::new();
        for (stage, d) in depth {
            if layers.len() <= d {
                layers.resize_with(d + 1, Vec::new);
            }
            layers[d].push(stage);
        }
        Ok(layers)
    }
}
