//! Terminal renderers for the status boards.
//!
//! * [`ScreenRenderer`] clears the screen and redraws a target × step table
//!   for every board, followed by the waiting/done counters.
//! * [`CompactRenderer`] keeps one progress bar per board, driven through
//!   `tracing-indicatif` so log lines scroll above it.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

use colored::*;
use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::terminal::{Clear, ClearType};
use indicatif::ProgressStyle;
use sebat_common::config::Config;
use sebat_core::scheduler::BoardRenderer;
use sebat_core::status::{BoardSnapshot, StateCounts, StatusBoard};
use tracing::{Span, info_span};
use tracing_indicatif::span_ext::IndicatifSpanExt;

use crate::terminal::{colors, format};

const TARGET_COLUMN: usize = 25;
const STATE_COLUMN: usize = 7;

/// Picks the renderer matching the configured verbosity.
pub fn renderer_for(cfg: &Config, boards: Vec<Arc<StatusBoard>>) -> Arc<dyn BoardRenderer> {
    match cfg.quiet {
        0 => Arc::new(ScreenRenderer::new(boards)),
        _ => Arc::new(CompactRenderer::new(boards)),
    }
}

pub struct ScreenRenderer {
    boards: Vec<Arc<StatusBoard>>,
    out: Mutex<()>,
}

impl ScreenRenderer {
    pub fn new(boards: Vec<Arc<StatusBoard>>) -> Self {
        Self {
            boards,
            out: Mutex::new(()),
        }
    }

    fn draw(&self, out: &mut impl Write) -> io::Result<()> {
        queue!(out, Clear(ClearType::All), MoveTo(0, 0))?;
        for (idx, board) in self.boards.iter().enumerate() {
            if idx > 0 {
                writeln!(out, "{}", "─".repeat(80).color(colors::SEPARATOR))?;
            }
            for line in table(&board.snapshot()) {
                writeln!(out, "{line}")?;
            }
        }
        out.flush()
    }
}

impl BoardRenderer for ScreenRenderer {
    fn render(&self) {
        let _guard = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        let mut stdout = io::stdout().lock();
        // A broken stdout must not take the run down with it.
        let _ = self.draw(&mut stdout);
    }
}

/// Lines of the progress table for one board.
pub fn table(snapshot: &BoardSnapshot) -> Vec<String> {
    let widths: Vec<usize> = snapshot
        .steps
        .iter()
        .map(|step| console::measure_text_width(step).max(STATE_COLUMN))
        .collect();

    let mut lines: Vec<String> = Vec::with_capacity(snapshot.rows.len() + 5);
    lines.push(format!(
        "Scan Progress ({}):",
        snapshot.title.color(colors::PRIMARY).bold()
    ));
    lines.push(String::new());

    let mut head: String = format::pad("target", TARGET_COLUMN);
    head.push_str(" |");
    for (step, width) in snapshot.steps.iter().zip(&widths) {
        head.push(' ');
        head.push_str(&format::pad(step, *width));
    }
    lines.push(format!("{}", head.color(colors::SEPARATOR)));

    for row in &snapshot.rows {
        let mut line: String = format::pad(&row.target, TARGET_COLUMN);
        line.push_str(" |");
        for (state, width) in row.states.iter().zip(&widths) {
            line.push(' ');
            line.push_str(&format::pad(&format::state(*state).to_string(), *width));
        }
        lines.push(line);
    }

    lines.push(String::new());
    lines.push(counters(&snapshot.counts));
    lines
}

fn counters(counts: &StateCounts) -> String {
    format!(
        "[WAITING: {}] [DONE: {}]",
        counts.waiting.to_string().color(colors::STATE_WAITING),
        counts.finished().to_string().color(colors::STATE_DONE).bold()
    )
}

pub struct CompactRenderer {
    bars: Vec<(Arc<StatusBoard>, Span)>,
}

impl CompactRenderer {
    pub fn new(boards: Vec<Arc<StatusBoard>>) -> Self {
        let style: ProgressStyle = ProgressStyle::with_template(
            "{spinner:.blue} {msg:20} [{bar:30.green/white}] {pos}/{len}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▆▁");

        let bars: Vec<(Arc<StatusBoard>, Span)> = boards
            .into_iter()
            .map(|board| {
                let span = info_span!("workflow", indicatif.pb_show = true, name = board.title());
                span.pb_set_style(&style);
                span.pb_set_length(board.counts().total() as u64);
                span.pb_set_message(board.title());
                span.pb_start();
                (board, span)
            })
            .collect();

        Self { bars }
    }
}

impl BoardRenderer for CompactRenderer {
    fn render(&self) {
        for (board, span) in &self.bars {
            let counts: StateCounts = board.counts();
            span.pb_set_position(counts.finished() as u64);
            span.pb_set_message(&format!(
                "{} ({} running)",
                board.title(),
                counts.running
            ));
        }
    }
}
