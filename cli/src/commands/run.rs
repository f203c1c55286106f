use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, bail};
use colored::*;
use sebat_common::config::{Config, Rescan};
use sebat_common::scan::pipeline::Workflow;
use sebat_common::scan::target::{self, Target};
use sebat_core::context::RunContext;
use sebat_core::executor::{ShellExecutor, StepExecutor};
use sebat_core::scheduler::{BoardRenderer, Monitor, RunSummary, Scheduler};
use sebat_core::status::StatusBoard;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::commands::RunArgs;
use crate::terminal::{board, colors, print};

pub async fn run(args: &RunArgs, cfg: &Config) -> anyhow::Result<()> {
    let targets: Vec<Target> = target::read_list(&args.targets)?;
    if targets.is_empty() {
        bail!("no targets found in {}", args.targets.display());
    }

    let workflows: Vec<Workflow> = args
        .workflows
        .iter()
        .map(|path| Workflow::load(path).with_context(|| format!("loading {}", path.display())))
        .collect::<anyhow::Result<_>>()?;

    warn_unknown_rescan_steps(&cfg.rescan, &workflows);

    info!(
        "{} targets, {} workflows, results under {}",
        targets.len(),
        workflows.len(),
        cfg.results_root.display()
    );

    let context: Arc<RunContext> = Arc::new(RunContext::from_config(cfg));
    let executor: Arc<dyn StepExecutor> = Arc::new(ShellExecutor::default());
    let start_time: Instant = Instant::now();

    let mut summaries: Vec<RunSummary> = Vec::with_capacity(workflows.len());
    for group in workflows.chunks(cfg.parallel_workflows.max(1)) {
        let schedulers: Vec<Scheduler> = group
            .iter()
            .map(|workflow| {
                Scheduler::new(
                    workflow.name.clone(),
                    targets.clone(),
                    Arc::new(workflow.pipeline.clone()),
                    context.clone(),
                    executor.clone(),
                    cfg.batch_size,
                )
            })
            .collect();

        let boards: Vec<Arc<StatusBoard>> = schedulers.iter().map(Scheduler::board).collect();
        let renderer: Arc<dyn BoardRenderer> = board::renderer_for(cfg, boards);
        let monitor = Monitor::new(renderer, cfg.refresh_interval);

        summaries.extend(run_group(schedulers, monitor).await?);
    }

    print_summaries(&summaries, start_time.elapsed());
    Ok(())
}

/// Runs one group of workflows side by side and returns their summaries in
/// the order the workflows were given.
async fn run_group(schedulers: Vec<Scheduler>, monitor: Monitor) -> anyhow::Result<Vec<RunSummary>> {
    let mut join_set: JoinSet<(usize, anyhow::Result<RunSummary>)> = JoinSet::new();
    for (idx, scheduler) in schedulers.into_iter().enumerate() {
        let scheduler: Scheduler = scheduler.with_monitor(monitor.clone());
        join_set.spawn(async move { (idx, scheduler.run().await) });
    }

    let mut slots: Vec<Option<RunSummary>> = (0..join_set.len()).map(|_| None).collect();
    while let Some(joined) = join_set.join_next().await {
        let (idx, summary) = joined.context("workflow task aborted")?;
        slots[idx] = Some(summary?);
    }

    Ok(slots.into_iter().flatten().collect())
}

fn warn_unknown_rescan_steps(rescan: &Rescan, workflows: &[Workflow]) {
    let Rescan::Steps(steps) = rescan else {
        return;
    };
    for step in steps {
        let known: bool = workflows
            .iter()
            .any(|workflow| workflow.pipeline.position(step).is_some());
        if !known {
            warn!("--rescan-steps names unknown step '{step}'");
        }
    }
}

fn print_summaries(summaries: &[RunSummary], total_time: Duration) {
    print::header("run summary");
    for summary in summaries {
        let failed: ColoredString = match summary.failed() {
            0 => "0 failed".normal(),
            n => format!("{n} failed").red().bold(),
        };
        print::print_status(format!(
            "{}: {} executed, {} skipped, {} in {} batches",
            summary.workflow.color(colors::PRIMARY),
            summary.executed().to_string().green(),
            summary.skipped().to_string().color(colors::STATE_SKIPPED),
            failed,
            summary.batches
        ));
    }

    let total_time: ColoredString = format!("{:.2}s", total_time.as_secs_f64()).bold().yellow();
    print::fat_separator();
    print::centerln(&format!("All scans completed in {total_time}"));
    print::end_of_program();
}
