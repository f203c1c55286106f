//! The **abstraction** over launching a step's command.
//!
//! The engine only ever sees [`StepExecutor`]. The production implementation,
//! [`ShellExecutor`], hands the rendered string to the system shell; tests
//! substitute recorders that never touch the OS.
//!
//! Whatever the implementation, the engine does not judge the outcome: a
//! non-zero exit still ends the step as `done`.

use async_trait::async_trait;

mod shell;

pub use shell::ShellExecutor;

/// Captured result of one command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
}

impl StepOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

#[async_trait]
pub trait StepExecutor: Send + Sync {
    /// Runs `command` to completion. An `Err` means the command could not be
    /// launched at all, not that it failed.
    async fn run(&self, command: &str) -> anyhow::Result<StepOutput>;
}
