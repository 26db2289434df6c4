#![allow(clippy::multiple_crate_versions)]

//! Shelf - desktop panel core.
//!
//! This binary serves as both the panel daemon and the CLI:
//! - When called with no arguments: runs the panel with default options
//! - When called with subcommands (e.g., `shelf plugins list`): runs CLI commands

use tracing_subscriber::EnvFilter;

fn main() {
    init_logging();

    let result = if std::env::args().len() == 1 {
        shelf_lib::run(&shelf_lib::RunOptions::default())
    } else {
        shelf_lib::cli::run()
    };

    if let Err(err) = result {
        eprintln!("shelf: {err}");
        std::process::exit(1);
    }
}

/// Logs go to stderr so CLI output on stdout stays machine-readable.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("shelf=info,shelf_lib=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
