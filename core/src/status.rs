//! Live execution state of every (target, step) pair of one workflow.
//!
//! The board is the only structure runners share. All mutation goes through
//! [`StatusBoard::set`], which takes the lock, records the state, and bumps a
//! version number on a `watch` channel so the monitor can redraw as soon as
//! something changes.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use sebat_common::scan::pipeline::Pipeline;
use sebat_common::scan::target::Target;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutionState {
    Waiting,
    Running,
    Done,
    Skipped,
}

impl ExecutionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, ExecutionState::Done | ExecutionState::Skipped)
    }

    pub fn label(self) -> &'static str {
        match self {
            ExecutionState::Waiting => "waiting",
            ExecutionState::Running => "running",
            ExecutionState::Done => "done",
            ExecutionState::Skipped => "skipped",
        }
    }
}

impl fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StateCounts {
    pub waiting: usize,
    pub running: usize,
    pub done: usize,
    pub skipped: usize,
}

impl StateCounts {
    /// Steps in a terminal state.
    pub fn finished(&self) -> usize {
        self.done + self.skipped
    }

    pub fn total(&self) -> usize {
        self.waiting + self.running + self.done + self.skipped
    }

    fn add(&mut self, state: ExecutionState) {
        match state {
            ExecutionState::Waiting => self.waiting += 1,
            ExecutionState::Running => self.running += 1,
            ExecutionState::Done => self.done += 1,
            ExecutionState::Skipped => self.skipped += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardRow {
    pub target: String,
    pub states: Vec<ExecutionState>,
}

/// A consistent copy of the board, taken under the lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardSnapshot {
    pub title: String,
    pub steps: Vec<String>,
    pub rows: Vec<BoardRow>,
    pub counts: StateCounts,
}

type StateKey = (String, String);

pub struct StatusBoard {
    title: String,
    targets: Vec<Target>,
    steps: Vec<String>,
    states: Mutex<HashMap<StateKey, ExecutionState>>,
    version: watch::Sender<u64>,
}

impl StatusBoard {
    /// Creates a board with every (target, step) pair `waiting`.
    pub fn new(title: impl Into<String>, targets: &[Target], pipeline: &Pipeline) -> Self {
        let steps: Vec<String> = pipeline.step_names().map(str::to_string).collect();

        let mut states: HashMap<StateKey, ExecutionState> = HashMap::new();
        for target in targets {
            for step in &steps {
                states.insert(
                    (target.key().to_string(), step.clone()),
                    ExecutionState::Waiting,
                );
            }
        }

        let (version, _) = watch::channel(0);

        Self {
            title: title.into(),
            targets: targets.to_vec(),
            steps,
            states: Mutex::new(states),
            version,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set(&self, target: &Target, step: &str, state: ExecutionState) {
        {
            let mut states = self.lock();
            states.insert((target.key().to_string(), step.to_string()), state);
        }
        self.version.send_modify(|version| *version += 1);
    }

    pub fn state(&self, target: &Target, step: &str) -> Option<ExecutionState> {
        self.lock()
            .get(&(target.key().to_string(), step.to_string()))
            .copied()
    }

    pub fn counts(&self) -> StateCounts {
        let mut counts = StateCounts::default();
        for state in self.lock().values() {
            counts.add(*state);
        }
        counts
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        let states = self.lock();
        let mut counts = StateCounts::default();

        let rows: Vec<BoardRow> = self
            .targets
            .iter()
            .map(|target| {
                let row_states: Vec<ExecutionState> = self
                    .steps
                    .iter()
                    .map(|step| {
                        let key: StateKey = (target.key().to_string(), step.clone());
                        let state: ExecutionState =
                            states.get(&key).copied().unwrap_or(ExecutionState::Waiting);
                        counts.add(state);
                        state
                    })
                    .collect();
                BoardRow {
                    target: target.original().to_string(),
                    states: row_states,
                }
            })
            .collect();

        BoardSnapshot {
            title: self.title.clone(),
            steps: self.steps.clone(),
            rows,
            counts,
        }
    }

    /// Receiver whose value changes on every [`set`](Self::set).
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<StateKey, ExecutionState>> {
        self.states.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
