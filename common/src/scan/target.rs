//! # Scan Target Model
//!
//! A target is whatever a workflow step scans: a domain name, a single host or
//! a CIDR block.
//!
//! Every target has two spellings:
//! * The **original** string, handed verbatim to the tools a step runs.
//! * The **key**, a filesystem-safe form (`/` replaced with `-`) used for
//!   output directories and status lookups.
//!
//! Mixing them up either breaks the tool (`10.0.0.0-24` is not a network) or
//! the filesystem (`10.0.0.0/24` becomes two directories).

use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::Context;
use tracing::warn;

use crate::error::TargetError;

/// Represents a distinct target to be run through a pipeline.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Target {
    original: String,
    key: String,
}

impl Target {
    pub fn new(raw: &str) -> Result<Self, TargetError> {
        raw.parse()
    }

    /// The target exactly as the user wrote it, e.g. `10.0.0.0/24`.
    pub fn original(&self) -> &str {
        &self.original
    }

    /// The filesystem-safe key, e.g. `10.0.0.0-24`.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_cidr(&self) -> bool {
        self.original.contains('/')
    }
}

impl FromStr for Target {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed: &str = s.trim();
        if trimmed.is_empty() {
            return Err(TargetError::Empty);
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(TargetError::Whitespace(trimmed.to_string()));
        }

        Ok(Self {
            original: trimmed.to_string(),
            key: normalize(trimmed),
        })
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

/// Maps a raw target onto its filesystem key. Idempotent.
pub fn normalize(raw: &str) -> String {
    raw.replace('/', "-")
}

/// Parses the contents of a target list.
///
/// One target per line; blank lines and `#` comments are ignored. A target
/// whose key collides with an earlier one is dropped, since both would write
/// into the same result directories.
pub fn parse_list(contents: &str) -> Vec<Target> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut targets: Vec<Target> = Vec::new();

    for (idx, line) in contents.lines().enumerate() {
        let line: &str = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let target: Target = match line.parse() {
            Ok(target) => target,
            Err(e) => {
                warn!("Ignoring line {}: {e}", idx + 1);
                continue;
            }
        };

        if !seen.insert(target.key().to_string()) {
            warn!(
                "Ignoring duplicate target '{}' (same result directory as an earlier entry)",
                target.original()
            );
            continue;
        }

        targets.push(target);
    }

    targets
}

/// Reads and parses a target list file.
pub fn read_list(path: &Path) -> anyhow::Result<Vec<Target>> {
    let contents: String = std::fs::read_to_string(path)
        .with_context(|| format!("reading target list {}", path.display()))?;
    Ok(parse_list(&contents))
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
