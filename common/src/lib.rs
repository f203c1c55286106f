//! # Sebat Common
//!
//! Shared data model for the pipeline runner: scan targets, workflow
//! definitions, run configuration and the typed errors raised while loading
//! them. Nothing in here spawns processes or touches the terminal.

pub mod config;
pub mod error;
pub mod scan;
