use sebat_common::config::{Config, RunDate};

use crate::paths::PathResolver;
use crate::skip::SkipPolicy;

/// Immutable, per-invocation state shared by every runner of a run.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_date: RunDate,
    pub resolver: PathResolver,
    pub policy: SkipPolicy,
}

impl RunContext {
    pub fn new(run_date: RunDate, resolver: PathResolver, policy: SkipPolicy) -> Self {
        Self {
            run_date,
            resolver,
            policy,
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(
            cfg.run_date.clone(),
            PathResolver::new(cfg.results_root.clone()),
            SkipPolicy::new(cfg.skip_mode, cfg.rescan.clone()),
        )
    }
}
