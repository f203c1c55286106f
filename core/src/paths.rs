//! Output path derivation.
//!
//! Every (target, step, run date) triple maps onto exactly one file:
//!
//! ```text
//! {root}/{target key}/{category?}/{step name}/scan-at-{date}[-{output_file}]
//! ```
//!
//! The mapping has no hidden inputs, so a second run on the same date lands on
//! the same paths and can find the output of the first one.

use std::path::PathBuf;

use anyhow::Context;
use sebat_common::config::RunDate;
use sebat_common::scan::pipeline::{Pipeline, PipelineStep};
use sebat_common::scan::target::Target;

/// Prefix shared by every result file the runner produces.
pub const RESULT_PREFIX: &str = "scan-at-";

#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
}

impl PathResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding every result of `step` for `target`.
    pub fn step_dir(&self, target: &Target, step: &PipelineStep) -> PathBuf {
        let mut dir: PathBuf = self.root.join(target.key());
        if let Some(category) = &step.category {
            dir.push(category);
        }
        dir.push(&step.name);
        dir
    }

    pub fn resolve(&self, target: &Target, step: &PipelineStep, run_date: &RunDate) -> PathBuf {
        self.step_dir(target, step).join(file_name(step, run_date))
    }

    /// Creates the directory of every (target, step) pair up front, including
    /// steps that will end up skipped. Commands write into these directories
    /// without creating them.
    pub fn prepare(&self, targets: &[Target], pipeline: &Pipeline) -> anyhow::Result<()> {
        for target in targets {
            for step in pipeline.steps() {
                let dir: PathBuf = self.step_dir(target, step);
                std::fs::create_dir_all(&dir)
                    .with_context(|| format!("creating result directory {}", dir.display()))?;
            }
        }
        Ok(())
    }
}

pub fn file_name(step: &PipelineStep, run_date: &RunDate) -> String {
    match &step.output_file {
        Some(hint) => format!("{RESULT_PREFIX}{run_date}-{hint}"),
        None => format!("{RESULT_PREFIX}{run_date}"),
    }
}
