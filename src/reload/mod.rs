// src/reload/mod.rs

//! Browser live reload.
//!
//! [`LiveReloadServer`] serves a directory over HTTP, adds a small client
//! script to every HTML response and keeps one WebSocket per open page.
//! [`ReloadNotifier::notify`] tells every connected page to reload.

pub mod client;
pub mod http;
pub mod server;

pub use client::{RELOAD_MESSAGE, inject_reload_script, reload_script};
pub use server::LiveReloadServer;

/// Something that can tell connected browsers to reload.
pub trait ReloadNotifier: Send + Sync {
    /// Broadcast a reload. Returns the number of clients reached; zero
    /// clients is not an error.
    fn notify(&self) -> usize;
}
