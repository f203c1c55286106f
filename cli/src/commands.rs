pub mod results;
pub mod run;

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand};
use sebat_common::config::{
    Config, DEFAULT_BATCH_SIZE, DEFAULT_RESULTS_ROOT, Rescan, RunDate, SkipMode,
};

#[derive(Parser)]
#[command(name = "sebat")]
#[command(about = "A declarative, batched scan pipeline runner.")]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one or more workflows against every target in a list
    #[command(alias = "r")]
    Run(RunArgs),
    /// List the result files written on a given run date
    #[command(alias = "ls")]
    Results(ResultsArgs),
}

#[derive(Args)]
pub struct RunArgs {
    /// File with one target (domain or CIDR block) per line
    #[arg(short = 't', long)]
    pub targets: PathBuf,

    /// Workflow YAML file; repeat to run several workflows
    #[arg(short = 'w', long = "workflow", required = true)]
    pub workflows: Vec<PathBuf>,

    /// Number of targets processed in parallel
    #[arg(short = 'p', long, default_value_t = DEFAULT_BATCH_SIZE, value_parser = positive)]
    pub parallel_targets: usize,

    /// Number of workflows processed in parallel
    #[arg(long, default_value_t = 1, value_parser = positive)]
    pub parallel_workflows: usize,

    /// Re-run every step, ignoring existing results
    #[arg(long, conflicts_with = "rescan_steps")]
    pub rescan: bool,

    /// Re-run only these steps (comma-separated names)
    #[arg(long, value_delimiter = ',')]
    pub rescan_steps: Vec<String>,

    /// Also skip a step when any earlier run left a result for it
    #[arg(long)]
    pub reuse_any: bool,

    /// Directory results are written to
    #[arg(long, default_value = DEFAULT_RESULTS_ROOT)]
    pub root: PathBuf,

    /// Date stamped into output file names (YYYY-MM-DD); defaults to today
    #[arg(long)]
    pub date: Option<RunDate>,

    /// Milliseconds between two redraws of the progress table
    #[arg(long, default_value_t = 1000)]
    pub refresh_ms: u64,

    /// Show a compact progress bar instead of the full-screen table
    #[arg(short, long, action = ArgAction::Count)]
    pub quiet: u8,
}

impl RunArgs {
    pub fn to_config(&self) -> Config {
        let rescan: Rescan = if self.rescan {
            Rescan::All
        } else if !self.rescan_steps.is_empty() {
            let steps: BTreeSet<String> = self
                .rescan_steps
                .iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            Rescan::Steps(steps)
        } else {
            Rescan::None
        };

        Config {
            results_root: self.root.clone(),
            batch_size: self.parallel_targets,
            parallel_workflows: self.parallel_workflows,
            rescan,
            skip_mode: if self.reuse_any {
                SkipMode::AnyResult
            } else {
                SkipMode::Exact
            },
            refresh_interval: Duration::from_millis(self.refresh_ms),
            quiet: self.quiet,
            run_date: self.date.clone().unwrap_or_else(RunDate::today),
        }
    }
}

#[derive(Args)]
pub struct ResultsArgs {
    /// Directory results were written to
    #[arg(long, default_value = DEFAULT_RESULTS_ROOT)]
    pub root: PathBuf,

    /// Run date to list (YYYY-MM-DD), or "latest"
    #[arg(long, default_value = "latest")]
    pub date: String,

    /// Lines of each file to preview
    #[arg(long, default_value_t = 5)]
    pub preview: usize,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

fn positive(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}
