//! CLI module for Shelf.
//!
//! This module provides command-line interface functionality for Shelf. Plugin
//! and layout commands work on the persisted plugin list directly, through the
//! same validation path the running panel uses.

mod commands;
mod output;

use clap::Parser;
pub use commands::Cli;

use crate::error::ShelfError;

/// Runs the CLI.
///
/// Parses command-line arguments and executes the appropriate command.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn run() -> Result<(), ShelfError> {
    let cli = Cli::parse();
    cli.execute()
}
