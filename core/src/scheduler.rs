//! Batch scheduling of targets.
//!
//! The target list is cut into consecutive batches. Every target of a batch
//! gets its own [`TargetRunner`] task and the scheduler waits for all of them
//! before admitting the next batch: a barrier, not a sliding window. While a
//! batch runs, an optional [`Monitor`] keeps the board on screen.

use std::sync::Arc;

use sebat_common::scan::pipeline::Pipeline;
use sebat_common::scan::target::Target;
use tokio::sync::oneshot;
use tokio::task::JoinSet;
use tracing::{Instrument, debug, error, info_span};

use crate::context::RunContext;
use crate::executor::StepExecutor;
use crate::runner::{StepOutcome, TargetReport, TargetRunner};
use crate::status::StatusBoard;

mod monitor;

pub use monitor::{BoardRenderer, Monitor};

/// Per-workflow result of a full run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub workflow: String,
    pub batches: usize,
    pub reports: Vec<TargetReport>,
}

impl RunSummary {
    fn outcomes(&self) -> impl Iterator<Item = &StepOutcome> {
        self.reports
            .iter()
            .flat_map(|report| report.steps.iter().map(|step| &step.outcome))
    }

    pub fn executed(&self) -> usize {
        self.outcomes()
            .filter(|o| !matches!(o, StepOutcome::Skipped(_)))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes()
            .filter(|o| matches!(o, StepOutcome::Skipped(_)))
            .count()
    }

    /// Steps that exited non-zero or never started. They still count as done.
    pub fn failed(&self) -> usize {
        self.outcomes().filter(|o| o.is_failure()).count()
    }
}

/// Sizes of the batches `len` targets are split into.
pub fn batch_sizes(len: usize, batch_size: usize) -> Vec<usize> {
    let size: usize = batch_size.max(1);
    (0..len)
        .step_by(size)
        .map(|start| size.min(len - start))
        .collect()
}

pub struct Scheduler {
    workflow: String,
    targets: Vec<Target>,
    pipeline: Arc<Pipeline>,
    board: Arc<StatusBoard>,
    context: Arc<RunContext>,
    executor: Arc<dyn StepExecutor>,
    batch_size: usize,
    monitor: Option<Monitor>,
}

impl Scheduler {
    /// Creates a scheduler and its status board, with every (target, step)
    /// pair `waiting`.
    pub fn new(
        workflow: impl Into<String>,
        targets: Vec<Target>,
        pipeline: Arc<Pipeline>,
        context: Arc<RunContext>,
        executor: Arc<dyn StepExecutor>,
        batch_size: usize,
    ) -> Self {
        let workflow: String = workflow.into();
        let board = Arc::new(StatusBoard::new(workflow.clone(), &targets, &pipeline));

        Self {
            workflow,
            targets,
            pipeline,
            board,
            context,
            executor,
            batch_size: batch_size.max(1),
            monitor: None,
        }
    }

    pub fn with_monitor(mut self, monitor: Monitor) -> Self {
        self.monitor = Some(monitor);
        self
    }

    pub fn board(&self) -> Arc<StatusBoard> {
        self.board.clone()
    }

    /// Creates every result directory, then runs the batches in order.
    ///
    /// Only directory creation can fail; whatever happens inside a step is
    /// recorded in the reports instead.
    pub async fn run(&self) -> anyhow::Result<RunSummary> {
        self.context.resolver.prepare(&self.targets, &self.pipeline)?;

        let sizes: Vec<usize> = batch_sizes(self.targets.len(), self.batch_size);
        let batches: usize = sizes.len();
        let mut reports: Vec<TargetReport> = Vec::with_capacity(self.targets.len());
        let mut start: usize = 0;

        for (idx, size) in sizes.into_iter().enumerate() {
            let batch: &[Target] = &self.targets[start..start + size];
            start += size;
            debug!(
                "[{}] starting batch {}/{batches} with {size} targets",
                self.workflow,
                idx + 1
            );
            reports.extend(self.run_batch(batch).await);
        }

        Ok(RunSummary {
            workflow: self.workflow.clone(),
            batches,
            reports,
        })
    }

    async fn run_batch(&self, batch: &[Target]) -> Vec<TargetReport> {
        let (finished_tx, finished_rx) = oneshot::channel::<()>();
        let monitor_handle = self
            .monitor
            .clone()
            .map(|monitor| tokio::spawn(monitor.watch(self.board.clone(), finished_rx)));

        let mut join_set: JoinSet<(usize, TargetReport)> = JoinSet::new();
        for (idx, target) in batch.iter().enumerate() {
            let span = info_span!("target", workflow = %self.workflow, target = %target);
            let runner = TargetRunner::new(
                target.clone(),
                self.pipeline.clone(),
                self.context.clone(),
                self.executor.clone(),
                self.board.clone(),
            );
            join_set.spawn(async move { (idx, runner.run().await) }.instrument(span));
        }

        let mut slots: Vec<Option<TargetReport>> = vec![None; batch.len()];
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((idx, report)) => slots[idx] = Some(report),
                Err(e) => error!("[{}] target runner aborted: {e}", self.workflow),
            }
        }

        let _ = finished_tx.send(());
        if let Some(handle) = monitor_handle {
            if let Err(e) = handle.await {
                error!("[{}] status monitor aborted: {e}", self.workflow);
            }
        }

        slots.into_iter().flatten().collect()
    }
}
