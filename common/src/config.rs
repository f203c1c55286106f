use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use chrono::{Local, NaiveDate};

use crate::error::RunDateError;

pub const DEFAULT_RESULTS_ROOT: &str = "results-scan";
pub const DEFAULT_BATCH_SIZE: usize = 3;
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(1);

const RUN_DATE_FORMAT: &str = "%Y-%m-%d";

pub struct Config {
    /// Directory every result path is rooted at.
    pub results_root: PathBuf,
    /// How many targets run concurrently inside one batch.
    pub batch_size: usize,
    /// How many workflows run concurrently.
    pub parallel_workflows: usize,
    pub rescan: Rescan,
    pub skip_mode: SkipMode,
    /// Upper bound between two renders of the status board.
    pub refresh_interval: Duration,
    /// `0` draws the full-screen table, anything higher a compact progress bar.
    pub quiet: u8,
    /// Stamped into every output file name. Stable for the whole invocation.
    pub run_date: RunDate,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            results_root: PathBuf::from(DEFAULT_RESULTS_ROOT),
            batch_size: DEFAULT_BATCH_SIZE,
            parallel_workflows: 1,
            rescan: Rescan::None,
            skip_mode: SkipMode::Exact,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            quiet: 0,
            run_date: RunDate::today(),
        }
    }
}

/// Which steps ignore existing output and always run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Rescan {
    #[default]
    None,
    All,
    Steps(BTreeSet<String>),
}

impl Rescan {
    pub fn forces(&self, step_name: &str) -> bool {
        match self {
            Rescan::None => false,
            Rescan::All => true,
            Rescan::Steps(steps) => steps.contains(step_name),
        }
    }
}

/// What counts as "already has output" when deciding to skip a step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SkipMode {
    /// Only the file for the current run date counts.
    #[default]
    Exact,
    /// Any `scan-at-*` result left in the step directory by any run counts.
    AnyResult,
}

/// A `YYYY-MM-DD` date string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RunDate(String);

impl RunDate {
    pub fn today() -> Self {
        Self(Local::now().format(RUN_DATE_FORMAT).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for RunDate {
    type Err = RunDateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let date: NaiveDate = NaiveDate::parse_from_str(s.trim(), RUN_DATE_FORMAT)
            .map_err(|_| RunDateError(s.to_string()))?;
        Ok(Self(date.format(RUN_DATE_FORMAT).to_string()))
    }
}

impl fmt::Display for RunDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
