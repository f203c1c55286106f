use colored::Color;

pub const PRIMARY: Color = Color::BrightCyan;
pub const ACCENT: Color = Color::BrightYellow;
pub const SEPARATOR: Color = Color::BrightBlack;
pub const TEXT_DEFAULT: Color = Color::White;

pub const STATE_WAITING: Color = Color::BrightBlack;
pub const STATE_RUNNING: Color = Color::BrightYellow;
pub const STATE_DONE: Color = Color::BrightGreen;
pub const STATE_SKIPPED: Color = Color::Cyan;
