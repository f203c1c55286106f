//! Redraws the status board while a batch is running.
//!
//! The monitor wakes up on a fixed cadence and whenever the board reports a
//! change, and asks its [`BoardRenderer`] to draw. When the batch finishes it
//! stops and draws one last time, so the final state is always on screen.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::MissedTickBehavior;

use crate::status::StatusBoard;

/// Draws the boards it knows about. Implementations decide where (full
/// screen, progress bar, nowhere) and must tolerate concurrent calls.
pub trait BoardRenderer: Send + Sync {
    fn render(&self);
}

#[derive(Clone)]
pub struct Monitor {
    renderer: Arc<dyn BoardRenderer>,
    interval: Duration,
}

impl Monitor {
    pub fn new(renderer: Arc<dyn BoardRenderer>, interval: Duration) -> Self {
        Self { renderer, interval }
    }

    /// Renders until `finished` fires (or its sender is dropped), then
    /// renders once more.
    pub async fn watch(self, board: Arc<StatusBoard>, mut finished: oneshot::Receiver<()>) {
        let mut changes = board.subscribe();
        let mut ticker = tokio::time::interval(self.interval.max(Duration::from_millis(10)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = &mut finished => break,
                _ = ticker.tick() => self.renderer.render(),
                changed = changes.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    self.renderer.render();
                }
            }
        }

        self.renderer.render();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use sebat_common::scan::pipeline::{Pipeline, PipelineStep};
    use sebat_common::scan::target::Target;

    use crate::status::ExecutionState;

    #[derive(Default)]
    struct CountingRenderer {
        renders: AtomicUsize,
    }

    impl BoardRenderer for CountingRenderer {
        fn render(&self) {
            self.renders.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn renders_on_change_and_once_after_finish() {
        let target = Target::new("example.com").unwrap();
        let pipeline = Pipeline::new(vec![PipelineStep::new("a", "x")]).unwrap();
        let board = Arc::new(StatusBoard::new("t", std::slice::from_ref(&target), &pipeline));
        let renderer = Arc::new(CountingRenderer::default());

        let (tx, rx) = oneshot::channel();
        let monitor = Monitor::new(renderer.clone(), Duration::from_secs(60));
        let handle = tokio::spawn(monitor.watch(board.clone(), rx));

        tokio::time::sleep(Duration::from_millis(20)).await;
        let before: usize = renderer.renders.load(Ordering::SeqCst);
        assert!(before >= 1, "first tick should render immediately");

        board.set(&target, "a", ExecutionState::Running);
        tokio::time::sleep(Duration::from_millis(20)).await;
        let after_change: usize = renderer.renders.load(Ordering::SeqCst);
        assert!(after_change > before);

        tx.send(()).unwrap();
        handle.await.unwrap();
        assert_eq!(renderer.renders.load(Ordering::SeqCst), after_change + 1);
    }
}
