//! Config CLI commands.
//!
//! Commands for creating, locating, inspecting and validating the Shelf
//! configuration file.

use std::path::{Path, PathBuf};

use clap::Subcommand;
use colored::Colorize;

use crate::cli::output;
use crate::config::template::{create_config_file, generate_config_template};
use crate::config::{ConfigError, ShelfConfig, config_paths, load_config_from_path, read_config};
use crate::error::ShelfError;

/// Config management commands.
#[derive(Subcommand, Debug)]
#[command(next_display_order = None)]
pub enum ConfigCommands {
    /// Initialize a new configuration file with all options documented.
    ///
    /// Every option is written commented out with its default value.
    #[command(
        name = "init",
        after_long_help = r#"Examples:
  shelf config init              # Create config at default location
  shelf config init --force      # Overwrite existing config
  shelf config init --path ~/my-config.jsonc  # Create at custom path
  shelf config init --stdout     # Print template to stdout"#
    )]
    Init {
        /// Overwrite existing configuration file if it exists.
        #[arg(long, short)]
        force: bool,

        /// Custom path for the configuration file.
        /// If not specified, uses ~/.config/shelf/config.jsonc
        #[arg(long, short, value_name = "PATH")]
        path: Option<PathBuf>,

        /// Print the configuration template to stdout instead of writing to a file.
        #[arg(long)]
        stdout: bool,
    },

    /// Show the configuration search paths.
    ///
    /// The first existing file is the one in use.
    Path,

    /// Print the effective configuration, defaults included.
    Show,

    /// Validate a configuration file without applying it.
    Check {
        /// File to check. Defaults to the active configuration file.
        #[arg(value_name = "PATH")]
        path: Option<PathBuf>,
    },
}

/// Execute config subcommands.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cmd: &ConfigCommands) -> Result<(), ShelfError> {
    match cmd {
        ConfigCommands::Init { force, path, stdout } => {
            if *stdout {
                println!("{}", generate_config_template());
                Ok(())
            } else {
                init_config(*force, path.clone())
            }
        }
        ConfigCommands::Path => {
            show_config_paths();
            Ok(())
        }
        ConfigCommands::Show => show_config(),
        ConfigCommands::Check { path } => check_config(path.as_deref()),
    }
}

fn init_config(force: bool, custom_path: Option<PathBuf>) -> Result<(), ShelfError> {
    let config_path = custom_path.unwrap_or_else(|| {
        config_paths().into_iter().next().unwrap_or_else(|| PathBuf::from("config.jsonc"))
    });

    if config_path.exists() && !force {
        return Err(ShelfError::ConfigError(format!(
            "Configuration file already exists at: {}\nUse --force to overwrite.",
            config_path.display()
        )));
    }

    create_config_file(&config_path).map_err(|e| {
        ShelfError::ConfigError(format!(
            "Failed to create config file {}: {e}",
            config_path.display()
        ))
    })?;

    println!("Configuration file created at: {}", config_path.display());
    println!("Every option is commented out; uncomment the ones you want to change.");
    Ok(())
}

fn show_config_paths() {
    println!("Configuration file search paths (in priority order):\n");

    let mut found = false;
    for (i, path) in config_paths().iter().enumerate() {
        let marker = match (path.exists(), found) {
            (true, false) => {
                found = true;
                " (active)".green().to_string()
            }
            (true, true) => " (exists)".dimmed().to_string(),
            _ => String::new(),
        };
        println!("  {}. {}{marker}", i + 1, path.display());
    }

    if !found {
        println!("\nNo configuration file found.");
        println!("Run 'shelf config init' to create one.");
    }
}

fn show_config() -> Result<(), ShelfError> {
    let config = match read_config() {
        Ok((config, path)) => {
            eprintln!("{}", format!("# {}", path.display()).dimmed());
            config
        }
        Err(ConfigError::NotFound) => {
            eprintln!("{}", "# no configuration file, showing defaults".dimmed());
            ShelfConfig::default()
        }
        Err(err) => return Err(err.into()),
    };
    output::print_highlighted_json(&serde_json::to_value(&config)?);
    Ok(())
}

fn check_config(path: Option<&Path>) -> Result<(), ShelfError> {
    let (_, checked) = match path {
        Some(path) => load_config_from_path(path)?,
        None => read_config()?,
    };
    println!("{} {}", "Valid".green(), checked.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_paths_returns_non_empty() {
        let paths = config_paths();
        assert!(!paths.is_empty() || std::env::var("HOME").is_err());
    }

    #[test]
    fn test_check_rejects_invalid_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.jsonc");
        std::fs::write(&path, r#"{ "panel": { "thickness": "wide" } }"#).unwrap();
        assert!(check_config(Some(&path)).is_err());
    }

    #[test]
    fn test_check_accepts_comments() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.jsonc");
        std::fs::write(&path, "// panel\n{ \"panel\": { \"edge\": \"top\" } }").unwrap();
        assert!(check_config(Some(&path)).is_ok());
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.jsonc");
        std::fs::write(&path, "{}").unwrap();
        assert!(init_config(false, Some(path.clone())).is_err());
        assert!(init_config(true, Some(path)).is_ok());
    }
}
