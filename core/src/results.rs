//! Read-only index over a results tree produced by earlier runs.

use std::path::{Path, PathBuf};

use anyhow::Context;
use sebat_common::config::RunDate;

use crate::paths::RESULT_PREFIX;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultFile {
    /// First path component below the root: the target key.
    pub target: String,
    /// Directories between the target and the file, e.g. `ports/naabu`.
    pub location: PathBuf,
    pub path: PathBuf,
    pub size: u64,
}

/// Extracts the run date from a result file name such as
/// `scan-at-2024-05-01-open.txt`.
pub fn date_of(file_name: &str) -> Option<RunDate> {
    let rest: &str = file_name.strip_prefix(RESULT_PREFIX)?;
    rest.get(..10)?.parse().ok()
}

/// Most recent run date with at least one result file under `root`.
pub fn latest_run_date(root: &Path) -> anyhow::Result<Option<RunDate>> {
    let mut latest: Option<RunDate> = None;
    for path in walk_files(root)? {
        let date: Option<RunDate> = path
            .file_name()
            .and_then(|name| date_of(&name.to_string_lossy()));
        if let Some(date) = date {
            if latest.as_ref().is_none_or(|current| date > *current) {
                latest = Some(date);
            }
        }
    }
    Ok(latest)
}

/// Every result file written on `date`, ordered by path.
pub fn collect(root: &Path, date: &RunDate) -> anyhow::Result<Vec<ResultFile>> {
    let mut results: Vec<ResultFile> = Vec::new();

    for path in walk_files(root)? {
        let on_date: bool = path
            .file_name()
            .and_then(|name| date_of(&name.to_string_lossy()))
            .is_some_and(|file_date| file_date == *date);
        if !on_date {
            continue;
        }

        let relative: &Path = match path.strip_prefix(root) {
            Ok(relative) => relative,
            Err(_) => continue,
        };
        let mut components = relative.components();
        let target: String = match components.next() {
            Some(first) => first.as_os_str().to_string_lossy().into_owned(),
            None => continue,
        };
        let location: PathBuf = components
            .as_path()
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        let size: u64 = std::fs::metadata(&path)
            .with_context(|| format!("reading metadata of {}", path.display()))?
            .len();

        results.push(ResultFile {
            target,
            location,
            path,
            size,
        });
    }

    Ok(results)
}

fn walk_files(root: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = Vec::new();
    if !root.is_dir() {
        return Ok(files);
    }

    let mut pending: Vec<PathBuf> = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let entries = std::fs::read_dir(&dir)
            .with_context(|| format!("listing {}", dir.display()))?;
        for entry in entries {
            let entry = entry.with_context(|| format!("listing {}", dir.display()))?;
            let path: PathBuf = entry.path();
            if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                pending.push(path);
            } else {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}
