//! Deciding whether a step's existing output is good enough to skip it.
//!
//! The check is "did an earlier run leave something behind", nothing more: a
//! truncated or garbage file still counts as valid as long as it is not empty.

use std::path::Path;

use sebat_common::config::{Rescan, SkipMode};
use sebat_common::scan::pipeline::PipelineStep;

use crate::paths::RESULT_PREFIX;

/// `true` when `path` holds output worth keeping: a non-empty file or a
/// directory with at least one entry.
pub fn is_valid(path: &Path) -> bool {
    if path.as_os_str().is_empty() {
        return false;
    }

    let metadata = match std::fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(_) => return false,
    };

    if metadata.is_dir() {
        return std::fs::read_dir(path)
            .map(|mut entries| entries.next().is_some())
            .unwrap_or(false);
    }

    metadata.len() > 0
}

/// `true` when `step_dir` holds a result file from any run date.
pub fn has_any_result(step_dir: &Path) -> bool {
    let entries = match std::fs::read_dir(step_dir) {
        Ok(entries) => entries,
        Err(_) => return false,
    };

    entries
        .filter_map(Result::ok)
        .any(|entry| entry.file_name().to_string_lossy().starts_with(RESULT_PREFIX))
}

/// Why a step was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Today's output file exists and is not empty.
    OutputExists,
    /// Some run left a result in the step directory.
    AnyResultExists,
}

#[derive(Debug, Clone, Default)]
pub struct SkipPolicy {
    mode: SkipMode,
    rescan: Rescan,
}

impl SkipPolicy {
    pub fn new(mode: SkipMode, rescan: Rescan) -> Self {
        Self { mode, rescan }
    }

    /// Returns the reason to skip `step`, or `None` when it has to run.
    pub fn check(&self, step: &PipelineStep, step_dir: &Path, output: &Path) -> Option<SkipReason> {
        if self.rescan.forces(&step.name) {
            return None;
        }

        if self.mode == SkipMode::AnyResult && has_any_result(step_dir) {
            return Some(SkipReason::AnyResultExists);
        }

        is_valid(output).then_some(SkipReason::OutputExists)
    }
}
