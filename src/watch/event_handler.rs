// src/watch/event_handler.rs

//! Turning changed paths into category events.

use std::path::Path;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::engine::WatchEvent;
use crate::types::Category;
use crate::watch::patterns::CategoryWatchProfile;

/// `path` relative to `root` with forward slashes.
///
/// Falls back to canonicalized paths when the watcher reports a different
/// absolute prefix for the same directory (symlinked temp dirs on macOS).
pub fn relative_to(root: &Path, path: &Path) -> Option<String> {
    let normalize = |rel: &Path| rel.to_string_lossy().replace('\\', "/");

    if let Ok(rel) = path.strip_prefix(root) {
        return Some(normalize(rel));
    }

    let root = root.canonicalize().ok()?;
    // A removed file cannot be canonicalized; its parent usually can.
    let canonical = match path.canonicalize() {
        Ok(p) => p,
        Err(_) => path.parent()?.canonicalize().ok()?.join(path.file_name()?),
    };
    canonical.strip_prefix(&root).ok().map(normalize)
}

/// Categories whose profile matches `rel_path`, in category order.
pub fn categories_for(profiles: &[CategoryWatchProfile], rel_path: &str) -> Vec<Category> {
    let mut categories: Vec<Category> = profiles
        .iter()
        .filter(|p| p.matches(rel_path))
        .map(|p| p.category())
        .collect();
    categories.sort();
    categories.dedup();
    categories
}

/// Forward one changed path to the engine. Returns `false` once the engine
/// has gone away.
pub async fn dispatch_path(
    root: &Path,
    path: &Path,
    profiles: &[CategoryWatchProfile],
    tx: &mpsc::Sender<WatchEvent>,
) -> bool {
    let Some(rel) = relative_to(root, path) else {
        warn!("could not relativize path {:?} against root {:?}", path, root);
        return true;
    };

    for category in categories_for(profiles, &rel) {
        debug!(%category, path = %rel, "watch match");
        let event = WatchEvent::SourceChanged {
            category,
            path: rel.clone(),
        };
        if tx.send(event).await.is_err() {
            debug!("watch event channel closed");
            return false;
        }
    }
    true
}
