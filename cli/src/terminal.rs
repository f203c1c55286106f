pub mod board;
pub mod colors;
pub mod format;
pub mod logging;
pub mod print;
