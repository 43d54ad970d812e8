//! Command-line interface for apod-bot.
//!
//! Provides commands for running a single post immediately and for running
//! the daily scheduler daemon.

mod commands;

pub use commands::{parse_cli, run, run_with_cli};
