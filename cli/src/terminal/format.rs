use colored::*;
use sebat_core::status::ExecutionState;

use crate::terminal::colors;

pub fn state(state: ExecutionState) -> ColoredString {
    let color: Color = match state {
        ExecutionState::Waiting => colors::STATE_WAITING,
        ExecutionState::Running => colors::STATE_RUNNING,
        ExecutionState::Done => colors::STATE_DONE,
        ExecutionState::Skipped => colors::STATE_SKIPPED,
    };
    let label: ColoredString = state.label().color(color);
    match state {
        ExecutionState::Running => label.bold(),
        _ => label,
    }
}

/// Pads `text` with spaces to `width` visible columns, ignoring colour codes.
pub fn pad(text: &str, width: usize) -> String {
    let visible: usize = console::measure_text_width(text);
    format!("{}{}", text, " ".repeat(width.saturating_sub(visible)))
}

pub fn size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} bytes")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
