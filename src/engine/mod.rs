// src/engine/mod.rs

//! Watch orchestration engine.
//!
//! Turns source change events into per-category rebuilds:
//! - at most one rebuild per category in flight
//! - bursts of changes collapse into one rebuild after a debounce window
//! - changes arriving during a rebuild schedule exactly one follow-up run
//! - different categories rebuild concurrently
//!
//! The pure state machine lives in [`core`]; the async/IO shell that runs
//! timers and rebuilds is [`runtime`].

use crate::types::Category;

/// Outcome of one category rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildOutcome {
    Success,
    Failed,
}

/// Events flowing into the runtime from the watcher, timers and rebuilds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// A source file of `category` was created, modified or removed.
    SourceChanged { category: Category, path: String },
    /// The debounce window for `category` has passed.
    DebounceElapsed { category: Category },
    /// A rebuild of `category` finished.
    RebuildFinished {
        category: Category,
        outcome: RebuildOutcome,
    },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

pub mod backend;
pub mod core;
pub mod runtime;

pub use backend::RebuildBackend;
pub use core::{CategoryState, WatchCommand, WatchCore, WatchStep};
pub use runtime::WatchRuntime;
