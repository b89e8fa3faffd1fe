// src/engine/runtime.rs

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::errors::Result;
use crate::reload::ReloadNotifier;

use super::core::WatchCore;
use super::{RebuildBackend, RebuildOutcome, WatchCommand, WatchEvent};

/// Async shell around [`WatchCore`].
///
/// Reads events from the channel, feeds them to the core and executes the
/// resulting commands: debounce timers and rebuilds run as Tokio tasks that
/// report back on the same channel, so the loop itself never blocks on a
/// rebuild.
pub struct WatchRuntime<B: RebuildBackend> {
    core: WatchCore,
    event_rx: mpsc::Receiver<WatchEvent>,
    event_tx: mpsc::Sender<WatchEvent>,
    backend: Arc<B>,
    notifier: Arc<dyn ReloadNotifier>,
    debounce: Duration,
}

impl<B: RebuildBackend> fmt::Debug for WatchRuntime<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchRuntime")
            .field("core", &self.core)
            .field("debounce", &self.debounce)
            .finish_non_exhaustive()
    }
}

impl<B: RebuildBackend> WatchRuntime<B> {
    /// `event_tx` must feed `event_rx`; timers and rebuilds report back
    /// through it.
    pub fn new(
        event_rx: mpsc::Receiver<WatchEvent>,
        event_tx: mpsc::Sender<WatchEvent>,
        backend: Arc<B>,
        notifier: Arc<dyn ReloadNotifier>,
        debounce: Duration,
    ) -> Self {
        Self {
            core: WatchCore::new(),
            event_rx,
            event_tx,
            backend,
            notifier,
            debounce,
        }
    }

    /// Main event loop. Returns on `ShutdownRequested`.
    pub async fn run(mut self) -> Result<()> {
        info!(debounce_ms = self.debounce.as_millis() as u64, "watch runtime started");

        while let Some(event) = self.event_rx.recv().await {
            debug!(?event, "watch runtime received event");

            if let WatchEvent::SourceChanged { category, path } = &event {
                info!(%category, path = %path, "source changed");
            }

            let step = self.core.step(event);
            for command in step.commands {
                self.execute_command(command);
            }

            if !step.keep_running {
                info!("shutdown requested; stopping watch runtime");
                break;
            }
        }

        info!("watch runtime exiting");
        Ok(())
    }

    fn execute_command(&self, command: WatchCommand) {
        match command {
            WatchCommand::StartDebounce(category) => {
                let tx = self.event_tx.clone();
                let delay = self.debounce;
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = tx.send(WatchEvent::DebounceElapsed { category }).await;
                });
            }
            WatchCommand::Rebuild(category) => {
                let tx = self.event_tx.clone();
                let backend = Arc::clone(&self.backend);
                tokio::spawn(async move {
                    let outcome = match backend.rebuild(category).await {
                        Ok(()) => {
                            info!(%category, "rebuild finished");
                            RebuildOutcome::Success
                        }
                        Err(err) => {
                            let message = format!("{err:#}");
                            error!(%category, error = %message, "rebuild failed; keeping previous output");
                            RebuildOutcome::Failed
                        }
                    };
                    let _ = tx
                        .send(WatchEvent::RebuildFinished { category, outcome })
                        .await;
                });
            }
            WatchCommand::NotifyReload(category) => {
                // Broadcasting writes to sockets; keep it off the event loop.
                let notifier = Arc::clone(&self.notifier);
                tokio::task::spawn_blocking(move || {
                    let reached = notifier.notify();
                    debug!(%category, clients = reached, "reload notified");
                });
            }
        }
    }
}
