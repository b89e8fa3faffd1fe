// src/plan/mod.rs

//! Stage graph and run lifecycle.
//!
//! - [`graph`] holds the per-mode DAG of pipeline stages and groups it into
//!   layers that can run concurrently.
//! - [`state`] tracks the `PipelineState` of one run and rejects transitions
//!   that would break stage ordering.

pub mod graph;
pub mod state;

pub use graph::StageGraph;
pub use state::RunStatus;
