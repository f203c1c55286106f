use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::Context;
use colored::*;
use sebat_common::config::RunDate;
use sebat_core::results::{self, ResultFile};

use crate::commands::ResultsArgs;
use crate::terminal::{colors, format, print};

type Detail = (String, ColoredString);

const LATEST: &str = "latest";
const PREVIEW_INDENT: &str = "      ";

pub fn results(args: &ResultsArgs) -> anyhow::Result<()> {
    let date: Option<RunDate> = if args.date == LATEST {
        results::latest_run_date(&args.root)?
    } else {
        Some(
            args.date
                .parse::<RunDate>()
                .with_context(|| format!("invalid --date '{}'", args.date))?,
        )
    };

    let Some(date) = date else {
        no_results_found(&args.root);
        return Ok(());
    };

    let files: Vec<ResultFile> = results::collect(&args.root, &date)?;
    if files.is_empty() {
        no_results_found(&args.root);
        return Ok(());
    }

    print::print_status(format!(
        "results of {} under {}",
        date.to_string().color(colors::ACCENT),
        args.root.display()
    ));
    print::print("");

    let groups: Vec<&[ResultFile]> = files.chunk_by(|a, b| a.target == b.target).collect();
    for (idx, group) in groups.iter().enumerate() {
        print::tree_head(idx, &group[0].target);
        let details: Vec<Detail> = group
            .iter()
            .map(|file| to_detail(file, args.preview))
            .collect();
        print::as_tree_one_level(details);
        if idx + 1 != groups.len() {
            print::print("");
        }
    }

    print::fat_separator();
    print::centerln(&format!(
        "{} files across {} targets",
        files.len().to_string().bold().green(),
        groups.len().to_string().bold().green()
    ));
    Ok(())
}

fn no_results_found(root: &Path) {
    print::header("zero results found");
    print::print_status(format!("nothing matched under {}", root.display()));
    print::no_results();
}

fn to_detail(file: &ResultFile, preview_lines: usize) -> Detail {
    let name: String = file
        .path
        .file_name()
        .map(|name| file.location.join(name).display().to_string())
        .unwrap_or_else(|| file.path.display().to_string());

    let mut value: String = format::size(file.size);
    match preview(&file.path, preview_lines) {
        Ok(lines) => {
            for line in lines {
                value.push('\n');
                value.push_str(PREVIEW_INDENT);
                value.push_str(&line.color(colors::SEPARATOR).to_string());
            }
        }
        Err(e) => {
            value.push_str(&format!(" ({})", e.to_string().red()));
        }
    }

    (name, value.normal())
}

/// First `limit` lines of the file at `path`.
fn preview(path: &Path, limit: usize) -> anyhow::Result<Vec<String>> {
    if limit == 0 {
        return Ok(Vec::new());
    }
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    BufReader::new(file)
        .lines()
        .take(limit)
        .map(|line| line.with_context(|| format!("reading {}", path.display())))
        .collect()
}
