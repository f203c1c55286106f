//! # Sebat Core
//!
//! The execution engine. Given targets and a validated pipeline it:
//!
//! * derives one output path per (target, step, date) in [`paths`],
//! * renders each step's command in [`template`],
//! * decides what can be skipped in [`skip`],
//! * launches commands through the [`executor`] seam,
//! * walks one target through its steps in [`runner`],
//! * and fans targets out in barrier-separated batches in [`scheduler`],
//!   publishing progress on the [`status`] board.
//!
//! [`results`] reads back what earlier runs left on disk.

pub mod context;
pub mod executor;
pub mod paths;
pub mod results;
pub mod runner;
pub mod scheduler;
pub mod skip;
pub mod status;
pub mod template;

#[cfg(test)]
mod testing;
