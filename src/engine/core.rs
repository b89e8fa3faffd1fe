// src/engine/core.rs

//! Pure watch state machine.
//!
//! Consumes [`WatchEvent`]s and produces the commands the IO shell should
//! execute. No channels, no Tokio, no IO, so every interleaving can be
//! tested synchronously.

use std::collections::BTreeMap;

use tracing::debug;

use crate::engine::{RebuildOutcome, WatchEvent};
use crate::types::Category;

/// Per-category lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryState {
    #[default]
    Idle,
    /// Changes seen; waiting for the debounce window to pass.
    Debouncing,
    /// A rebuild is in flight.
    Running,
    /// A rebuild is in flight and more changes arrived meanwhile.
    RerunPending,
}

/// Command produced by the core, executed by the IO shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchCommand {
    /// Start the debounce timer; it reports back `DebounceElapsed`.
    StartDebounce(Category),
    /// Rebuild the category; it reports back `RebuildFinished`.
    Rebuild(Category),
    /// Tell connected browsers to reload.
    NotifyReload(Category),
}

/// Decision returned after handling one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchStep {
    pub commands: Vec<WatchCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl WatchStep {
    fn run(commands: Vec<WatchCommand>) -> Self {
        Self {
            commands,
            keep_running: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct WatchCore {
    states: BTreeMap<Category, CategoryState>,
}

impl WatchCore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, category: Category) -> CategoryState {
        self.states.get(&category).copied().unwrap_or_default()
    }

    /// Number of categories with a rebuild in flight.
    pub fn in_flight(&self) -> usize {
        self.states
            .values()
            .filter(|s| matches!(s, CategoryState::Running | CategoryState::RerunPending))
            .count()
    }

    pub fn is_idle(&self) -> bool {
        self.states.values().all(|s| *s == CategoryState::Idle)
    }

    fn set(&mut self, category: Category, next: CategoryState) {
        let prev = self.state(category);
        if prev != next {
            debug!(%category, ?prev, ?next, "watch state change");
        }
        self.states.insert(category, next);
    }

    pub fn step(&mut self, event: WatchEvent) -> WatchStep {
        match event {
            WatchEvent::SourceChanged { category, .. } => self.on_change(category),
            WatchEvent::DebounceElapsed { category } => self.on_debounce_elapsed(category),
            WatchEvent::RebuildFinished { category, outcome } => {
                self.on_rebuild_finished(category, outcome)
            }
            WatchEvent::ShutdownRequested => WatchStep {
                commands: Vec::new(),
                keep_running: false,
            },
        }
    }

    fn on_change(&mut self, category: Category) -> WatchStep {
        use CategoryState::*;

        match self.state(category) {
            Idle => {
                self.set(category, Debouncing);
                WatchStep::run(vec![WatchCommand::StartDebounce(category)])
            }
            Debouncing | RerunPending => WatchStep::run(Vec::new()),
            Running => {
                self.set(category, RerunPending);
                WatchStep::run(Vec::new())
            }
        }
    }

    fn on_debounce_elapsed(&mut self, category: Category) -> WatchStep {
        if self.state(category) != CategoryState::Debouncing {
            return WatchStep::run(Vec::new());
        }
        self.set(category, CategoryState::Running);
        WatchStep::run(vec![WatchCommand::Rebuild(category)])
    }

    fn on_rebuild_finished(&mut self, category: Category, outcome: RebuildOutcome) -> WatchStep {
        let mut commands = Vec::new();

        match self.state(category) {
            CategoryState::Running => self.set(category, CategoryState::Idle),
            CategoryState::RerunPending => {
                self.set(category, CategoryState::Debouncing);
                commands.push(WatchCommand::StartDebounce(category));
            }
            state => {
                debug!(%category, ?state, "ignoring completion for category without a rebuild in flight");
                return WatchStep::run(commands);
            }
        }

        if outcome == RebuildOutcome::Success {
            commands.push(WatchCommand::NotifyReload(category));
        }
        WatchStep::run(commands)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn changed(category: Category) -> WatchEvent {
        WatchEvent::SourceChanged {
            category,
            path: "src/x".to_string(),
        }
    }

    #[test]
    fn burst_of_changes_starts_one_debounce() {
        let mut core = WatchCore::new();
        let first = core.step(changed(Category::Scripts));
        let second = core.step(changed(Category::Scripts));

        assert_eq!(first.commands, vec![WatchCommand::StartDebounce(Category::Scripts)]);
        assert!(second.commands.is_empty());
        assert_eq!(core.state(Category::Scripts), CategoryState::Debouncing);
    }

    #[test]
    fn change_during_rebuild_reruns_once() {
        let mut core = WatchCore::new();
        core.step(changed(Category::Styles));
        let step = core.step(WatchEvent::DebounceElapsed {
            category: Category::Styles,
        });
        assert_eq!(step.commands, vec![WatchCommand::Rebuild(Category::Styles)]);

        core.step(changed(Category::Styles));
        core.step(changed(Category::Styles));
        assert_eq!(core.state(Category::Styles), CategoryState::RerunPending);

        let step = core.step(WatchEvent::RebuildFinished {
            category: Category::Styles,
            outcome: RebuildOutcome::Success,
        });
        assert_eq!(
            step.commands,
            vec![
                WatchCommand::StartDebounce(Category::Styles),
                WatchCommand::NotifyReload(Category::Styles)
            ]
        );
        assert_eq!(core.state(Category::Styles), CategoryState::Debouncing);
    }

    #[test]
    fn failed_rebuild_does_not_notify() {
        let mut core = WatchCore::new();
        core.step(changed(Category::Markup));
        core.step(WatchEvent::DebounceElapsed {
            category: Category::Markup,
        });
        let step = core.step(WatchEvent::RebuildFinished {
            category: Category::Markup,
            outcome: RebuildOutcome::Failed,
        });
        assert!(step.commands.is_empty());
        assert!(step.keep_running);
        assert!(core.is_idle());
    }

    #[test]
    fn categories_are_independent() {
        let mut core = WatchCore::new();
        for category in [Category::Styles, Category::Images] {
            core.step(changed(category));
            core.step(WatchEvent::DebounceElapsed { category });
        }
        assert_eq!(core.in_flight(), 2);
        assert_eq!(core.state(Category::Scripts), CategoryState::Idle);
    }

    #[test]
    fn stray_timer_is_ignored() {
        let mut core = WatchCore::new();
        let step = core.step(WatchEvent::DebounceElapsed {
            category: Category::Images,
        });
        assert!(step.commands.is_empty());
        assert!(core.is_idle());
    }

    #[test]
    fn shutdown_stops_loop() {
        let mut core = WatchCore::new();
        assert!(!core.step(WatchEvent::ShutdownRequested).keep_running);
    }
}
