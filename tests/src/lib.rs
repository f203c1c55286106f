//! Shared helpers for the end-to-end tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use sebat_core::executor::{ShellExecutor, StepExecutor, StepOutput};

/// Runs commands through the real shell and counts every launch.
#[derive(Default)]
pub struct CountingExecutor {
    inner: ShellExecutor,
    launches: AtomicUsize,
}

impl CountingExecutor {
    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StepExecutor for CountingExecutor {
    async fn run(&self, command: &str) -> anyhow::Result<StepOutput> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        self.inner.run(command).await
    }
}
