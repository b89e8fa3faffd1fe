// src/plan/state.rs

use anyhow::anyhow;
use tracing::{debug, warn};

use crate::errors::{PipelineError, Result};
use crate::types::{BuildMode, PipelineState};

/// Lifecycle of one pipeline run:
///
/// `Idle -> Cleaning -> Compiling -> [Minifying ->] Injecting -> Serving`
///
/// `Minifying` is only legal for build runs. Any state may move to `Failed`,
/// which is terminal.
#[derive(Debug, Clone)]
pub struct RunStatus {
    mode: BuildMode,
    state: PipelineState,
    history: Vec<PipelineState>,
}

impl RunStatus {
    pub fn new(mode: BuildMode) -> Self {
        Self {
            mode,
            state: PipelineState::Idle,
            history: vec![PipelineState::Idle],
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Every distinct state this run has been in, in order.
    pub fn history(&self) -> &[PipelineState] {
        &self.history
    }

    /// Move to `next`. Staying in the current state is a no-op (several
    /// stages share one state).
    pub fn advance(&mut self, next: PipelineState) -> Result<()> {
        if next == self.state {
            return Ok(());
        }
        if !self.is_allowed(next) {
            return Err(PipelineError::Other(anyhow!(
                "illegal pipeline transition {} -> {} in {} mode",
                self.state,
                next,
                self.mode
            )));
        }
        debug!(mode = %self.mode, from = %self.state, to = %next, "pipeline state change");
        self.state = next;
        self.history.push(next);
        Ok(())
    }

    pub fn fail(&mut self) {
        if self.state != PipelineState::Failed {
            warn!(mode = %self.mode, from = %self.state, "pipeline run failed");
            self.state = PipelineState::Failed;
            self.history.push(PipelineState::Failed);
        }
    }

    fn is_allowed(&self, next: PipelineState) -> bool {
        use PipelineState::*;

        match (self.state, next) {
            (Failed, _) => false,
            (_, Failed) => true,
            (Idle, Cleaning) => true,
            (Cleaning, Compiling) => true,
            (Compiling, Minifying) => self.mode == BuildMode::Build,
            (Compiling, Injecting) => self.mode == BuildMode::Serve,
            (Minifying, Injecting) => true,
            (Injecting, Serving) => true,
            _ => false,
        }
    }
}
