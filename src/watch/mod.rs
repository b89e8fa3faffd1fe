// src/watch/mod.rs

//! File watching.
//!
//! Compiles one glob profile per asset category, runs a `notify` watcher on
//! the project root and turns relevant filesystem events into
//! [`WatchEvent::SourceChanged`](crate::engine::WatchEvent) for the engine.
//! Generated trees (intermediate, output, cache) are always excluded so
//! rebuild output never retriggers a rebuild.

pub mod event_handler;
pub mod patterns;
pub mod watcher;

pub use event_handler::{categories_for, relative_to};
pub use patterns::{CategoryWatchProfile, build_profiles};
pub use watcher::{WatcherHandle, spawn_watcher};
