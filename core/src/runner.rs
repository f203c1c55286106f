//! Drives one target through a pipeline.
//!
//! Steps run strictly in declared order. For each step the runner resolves
//! the output path, renders the command against the paths of the steps before
//! it, consults the skip policy and, unless skipped, launches the command and
//! waits for it. Every transition is published on the [`StatusBoard`].

use std::path::PathBuf;
use std::sync::Arc;

use sebat_common::scan::pipeline::{Pipeline, PipelineStep};
use sebat_common::scan::target::Target;
use tracing::{debug, error, warn};

use crate::context::RunContext;
use crate::executor::{StepExecutor, StepOutput};
use crate::skip::SkipReason;
use crate::status::{ExecutionState, StatusBoard};
use crate::template::{Rendered, ResolvedPaths, Templater};

const STDERR_TAIL: usize = 240;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Skipped(SkipReason),
    /// The command ran to completion; the exit code is informational only.
    Executed { exit_code: Option<i32> },
    /// The shell could not be started.
    LaunchFailed,
}

impl StepOutcome {
    pub fn is_failure(&self) -> bool {
        match self {
            StepOutcome::Skipped(_) => false,
            StepOutcome::Executed { exit_code } => *exit_code != Some(0),
            StepOutcome::LaunchFailed => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub step: String,
    pub output: PathBuf,
    pub command: String,
    pub outcome: StepOutcome,
}

#[derive(Debug, Clone)]
pub struct TargetReport {
    pub target: Target,
    pub steps: Vec<StepReport>,
    pub resolved: ResolvedPaths,
}

pub struct TargetRunner {
    target: Target,
    pipeline: Arc<Pipeline>,
    context: Arc<RunContext>,
    executor: Arc<dyn StepExecutor>,
    board: Arc<StatusBoard>,
}

impl TargetRunner {
    pub fn new(
        target: Target,
        pipeline: Arc<Pipeline>,
        context: Arc<RunContext>,
        executor: Arc<dyn StepExecutor>,
        board: Arc<StatusBoard>,
    ) -> Self {
        Self {
            target,
            pipeline,
            context,
            executor,
            board,
        }
    }

    pub async fn run(self) -> TargetReport {
        let mut resolved = ResolvedPaths::new();
        let mut steps: Vec<StepReport> = Vec::with_capacity(self.pipeline.len());

        for step in self.pipeline.steps() {
            let report: StepReport = self.run_step(step, &resolved).await;
            resolved.insert(step.name.clone(), report.output.clone());
            steps.push(report);
        }

        TargetReport {
            target: self.target,
            steps,
            resolved,
        }
    }

    async fn run_step(&self, step: &PipelineStep, prior: &ResolvedPaths) -> StepReport {
        let ctx: &RunContext = &self.context;
        let output: PathBuf = ctx.resolver.resolve(&self.target, step, &ctx.run_date);

        let rendered: Rendered = Templater::new(&self.target, &output, prior).render(&step.command);
        for reference in &rendered.unresolved {
            warn!(
                "Reference '{reference}' in step '{}' does not name an earlier step for {}; leaving it as is",
                step.name, self.target
            );
        }

        let step_dir: PathBuf = ctx.resolver.step_dir(&self.target, step);
        if let Some(reason) = ctx.policy.check(step, &step_dir, &output) {
            self.board.set(&self.target, &step.name, ExecutionState::Skipped);
            debug!("[{}] skipped for {} ({reason:?})", step.name, self.target);
            return StepReport {
                step: step.name.clone(),
                output,
                command: rendered.command,
                outcome: StepOutcome::Skipped(reason),
            };
        }

        self.board.set(&self.target, &step.name, ExecutionState::Running);
        debug!("[{}] running for {}: {}", step.name, self.target, rendered.command);

        let outcome: StepOutcome = match self.executor.run(&rendered.command).await {
            Ok(result) => {
                log_output(step, &self.target, &result);
                StepOutcome::Executed {
                    exit_code: result.exit_code,
                }
            }
            Err(e) => {
                error!("[{}] could not be launched for {}: {e:#}", step.name, self.target);
                StepOutcome::LaunchFailed
            }
        };

        self.board.set(&self.target, &step.name, ExecutionState::Done);

        StepReport {
            step: step.name.clone(),
            output,
            command: rendered.command,
            outcome,
        }
    }
}

fn log_output(step: &PipelineStep, target: &Target, result: &StepOutput) {
    if result.success() {
        debug!(
            "[{}] finished for {} ({} bytes stdout)",
            step.name,
            target,
            result.stdout.len()
        );
        return;
    }

    let stderr: &str = result.stderr.trim_end();
    let tail_start: usize = stderr
        .char_indices()
        .rev()
        .nth(STDERR_TAIL.saturating_sub(1))
        .map(|(idx, _)| idx)
        .unwrap_or(0);
    debug!(
        "[{}] exited with {:?} for {}: {}",
        step.name,
        result.exit_code,
        target,
        &stderr[tail_start..]
    );
}
