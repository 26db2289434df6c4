//! CLI command definitions using Clap.
//!
//! This module defines all CLI commands and their arguments, organized into
//! domain-specific submodules:
//!
//! - `config_cmd` - Configuration file commands
//! - `layout` - Layout inspection
//! - `plugins` - Plugin list management

use std::io;
use std::time::Instant;

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{Generator, Shell, generate};

use crate::error::ShelfError;
use crate::geometry::Rect;
use crate::modules::panel::{PanelState, PluginRegistry, RecordingServices, open_store};
use crate::{RunOptions, config, schema};

pub mod config_cmd;
pub mod layout;
pub mod plugins;

pub use config_cmd::ConfigCommands;
pub use plugins::PluginCommands;

/// Application version from Cargo.toml.
const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default screen geometry when none is given.
const DEFAULT_SCREEN: &str = "1920x1080";

/// Shelf CLI - Command-line interface for the Shelf panel.
#[derive(Parser, Debug)]
#[command(name = "shelf")]
#[command(author, version = APP_VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to a custom configuration file.
    ///
    /// Overrides the default configuration file search paths.
    /// Supports JSONC format (JSON with comments).
    #[arg(long, short, global = true, value_name = "PATH")]
    pub config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Screen geometry argument shared by commands that compute a layout.
#[derive(Args, Debug, Clone)]
pub struct ScreenArgs {
    /// Screen geometry as WIDTHxHEIGHT[+X+Y].
    #[arg(long, short = 's', default_value = DEFAULT_SCREEN, value_name = "GEOMETRY")]
    pub screen: Rect,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
#[command(next_display_order = None)]
pub enum Commands {
    /// Run the panel.
    ///
    /// Runs the panel against the built-in in-memory window manager until
    /// interrupted. Configuration changes are applied live.
    Run {
        #[command(flatten)]
        screen: ScreenArgs,

        /// Open a few sample windows.
        #[arg(long)]
        demo: bool,
    },

    /// Plugin list management commands.
    ///
    /// List, add, remove, move and configure panel plugins.
    #[command(subcommand)]
    Plugins(PluginCommands),

    /// Show the computed panel layout.
    ///
    /// Computes the panel rectangle, plugin slots and the reserved screen
    /// strut for the current configuration and plugin list.
    #[command(after_long_help = r#"Examples:
  shelf layout                       # Layout on a 1920x1080 screen
  shelf layout --screen 1280x800     # Layout on another screen size
  shelf layout --json                # Output as JSON"#)]
    Layout {
        #[command(flatten)]
        screen: ScreenArgs,

        /// Output in JSON format instead of table format.
        #[arg(long, short = 'j')]
        json: bool,
    },

    /// Configuration file management commands.
    ///
    /// Initialize, view, and manage the configuration file.
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Output Shelf configuration JSON Schema.
    ///
    /// Outputs a JSON Schema to stdout that describes the structure of the
    /// Shelf configuration file. Can be redirected to a file for use with
    /// editors that support JSON Schema validation.
    Schema,

    /// Generate shell completions.
    ///
    /// Outputs shell completion script to stdout for the specified shell.
    ///
    /// Usage:
    ///   eval "$(shelf completions --shell zsh)"
    ///   shelf completions --shell fish > ~/.config/fish/completions/shelf.fish
    Completions {
        /// The shell to generate completions for.
        #[arg(long, short, value_enum)]
        shell: Shell,
    },
}

impl Cli {
    /// Returns the custom config path if specified via --config flag.
    #[must_use]
    pub fn config_path(&self) -> Option<std::path::PathBuf> {
        self.config.as_ref().map(std::path::PathBuf::from)
    }

    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command execution fails.
    pub fn execute(&self) -> Result<(), ShelfError> {
        if let Some(ref path) = self.config {
            let path_buf = std::path::PathBuf::from(path);
            if !path_buf.exists() {
                return Err(ShelfError::ConfigError(format!(
                    "Configuration file not found: {path}"
                )));
            }
            config::set_custom_config_path(path_buf);
        }

        match &self.command {
            Commands::Run { screen, demo } => crate::run(&RunOptions {
                screen: screen.screen,
                demo: *demo,
            }),
            Commands::Plugins(cmd) => plugins::execute(cmd),
            Commands::Layout { screen, json } => layout::execute(screen.screen, *json),
            Commands::Config(cmd) => config_cmd::execute(cmd),

            Commands::Schema => {
                println!("{}", schema::print_schema());
                Ok(())
            }

            Commands::Completions { shell } => {
                Self::print_completions(*shell);
                Ok(())
            }
        }
    }

    /// Print shell completions to stdout.
    fn print_completions<G: Generator>(generator: G) {
        let mut cmd = Self::command();
        generate(generator, &mut cmd, "shelf", &mut io::stdout());
    }
}

/// Open the persisted plugin list as an offline panel.
///
/// Session actions are recorded instead of run, and no window manager is
/// connected, so nothing outside the plugin store is touched.
pub(crate) fn open_panel(screen: Rect) -> Result<PanelState, ShelfError> {
    let config = config::read_config().map(|(config, _)| config).or_else(|err| match err {
        config::ConfigError::NotFound => Ok(config::ShelfConfig::default()),
        err => Err(ShelfError::from(err)),
    })?;
    let registry = PluginRegistry::open(open_store(&config.persistence))?;
    Ok(PanelState::new(
        config,
        registry,
        std::sync::Arc::new(RecordingServices::new()),
        screen,
        Instant::now(),
    ))
}

#[cfg(test)]
mod tests {
    use super::plugins::PluginCommands;
    use super::*;

    #[test]
    fn test_cli_parses_run_with_screen() {
        let cli = Cli::try_parse_from(["shelf", "run", "--demo", "--screen", "1280x800"]).unwrap();
        match cli.command {
            Commands::Run { screen, demo } => {
                assert!(demo);
                assert_eq!(screen.screen, Rect::new(0, 0, 1280, 800));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_rejects_bad_screen() {
        assert!(Cli::try_parse_from(["shelf", "layout", "--screen", "huge"]).is_err());
    }

    #[test]
    fn test_cli_parses_plugins_add() {
        let cli = Cli::try_parse_from([
            "shelf",
            "plugins",
            "add",
            "clock",
            "--position",
            "0",
            "--config",
            r#"{"format":"%H:%M"}"#,
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Plugins(PluginCommands::Add { position: Some(0), .. })
        ));
    }

    #[test]
    fn test_cli_parses_move_direction() {
        let cli = Cli::try_parse_from([
            "shelf",
            "plugins",
            "move",
            "0190b5a4-0000-7000-8000-000000000000",
            "left",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Plugins(PluginCommands::Move { .. })));
    }

    #[test]
    fn test_cli_global_config_flag() {
        let cli = Cli::try_parse_from(["shelf", "schema", "--config", "/tmp/x.jsonc"]).unwrap();
        assert_eq!(cli.config_path(), Some(std::path::PathBuf::from("/tmp/x.jsonc")));
    }

    #[test]
    fn test_cli_completions() {
        let cli = Cli::try_parse_from(["shelf", "completions", "--shell", "bash"]).unwrap();
        assert!(matches!(cli.command, Commands::Completions { .. }));
    }

    #[test]
    fn test_cli_command_is_consistent() { Cli::command().debug_assert(); }
}
