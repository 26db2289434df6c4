//! Plugin CLI commands.
//!
//! Mutations go through the same handler the running panel uses, so
//! configuration is validated and the singleton rule is enforced before the
//! plugin list is written.

use std::time::Instant;

use clap::Subcommand;
use colored::Colorize;
use tabled::settings::object::Columns;
use tabled::settings::{Alignment, Modify, Style};
use tabled::{Table, Tabled};
use uuid::Uuid;

use super::open_panel;
use crate::RunOptions;
use crate::cli::output;
use crate::error::ShelfError;
use crate::geometry::Rect;
use crate::modules::panel::actor::handlers::on_mutate;
use crate::modules::panel::{
    Cardinality, Direction, MutationOutcome, PanelState, PluginKind, RegistryMutation,
};

/// Plugin list subcommands.
#[derive(Subcommand, Debug)]
#[command(next_display_order = None)]
pub enum PluginCommands {
    /// List the plugins on the panel, in order.
    List {
        /// Output in JSON format instead of table format.
        #[arg(long, short = 'j')]
        json: bool,
    },

    /// List the available plugin types.
    Types,

    /// Add a plugin.
    #[command(after_long_help = r#"Examples:
  shelf plugins add clock                           # Append a clock
  shelf plugins add showdesktop --position 0        # Put it first
  shelf plugins add clock --config '{"format":"%H:%M:%S"}'"#)]
    Add {
        /// Plugin type (see `shelf plugins types`).
        kind: PluginKind,

        /// Zero-based position. Appends when omitted.
        #[arg(long, short)]
        position: Option<usize>,

        /// Instance configuration as JSON.
        #[arg(long, value_name = "JSON")]
        config: Option<String>,
    },

    /// Remove a plugin.
    Remove {
        /// Instance id.
        id: Uuid,
    },

    /// Move a plugin one step.
    Move {
        /// Instance id.
        id: Uuid,

        /// `up`/`left` moves towards the start, `down`/`right` towards the end.
        direction: Direction,
    },

    /// Replace a plugin's configuration.
    Configure {
        /// Instance id.
        id: Uuid,

        /// New instance configuration as JSON.
        #[arg(value_name = "JSON")]
        config: String,
    },
}

/// Execute plugin subcommands.
///
/// # Errors
///
/// Returns an error if the plugin list cannot be read or the change is rejected.
pub fn execute(cmd: &PluginCommands) -> Result<(), ShelfError> {
    // Slot geometry is irrelevant here.
    let screen = RunOptions::default().screen;

    match cmd {
        PluginCommands::List { json } => list(&open_panel(screen)?, *json),
        PluginCommands::Types => {
            print_types();
            Ok(())
        }
        PluginCommands::Add {
            kind,
            position,
            config,
        } => {
            let config = parse_json(config.as_deref())?;
            let mutation = RegistryMutation::add(*kind, *position, config);
            let id = mutation.id();
            apply(screen, mutation)?;
            println!("{} {kind} {}", "Added".green(), id.to_string().dimmed());
            Ok(())
        }
        PluginCommands::Remove { id } => {
            apply(screen, RegistryMutation::Remove { id: *id })?;
            println!("{} {id}", "Removed".green());
            Ok(())
        }
        PluginCommands::Move { id, direction } => {
            let outcome = apply(screen, RegistryMutation::Move {
                id: *id,
                direction: *direction,
            })?;
            if outcome == MutationOutcome::Unchanged {
                println!("{}", "Already at the end of the panel.".dimmed());
            }
            Ok(())
        }
        PluginCommands::Configure { id, config } => {
            let config = parse_json(Some(config))?;
            apply(screen, RegistryMutation::Reconfigure { id: *id, config })?;
            println!("{} {id}", "Configured".green());
            Ok(())
        }
    }
}

fn apply(screen: Rect, mutation: RegistryMutation) -> Result<MutationOutcome, ShelfError> {
    let mut panel = open_panel(screen)?;
    on_mutate(&mut panel, mutation, Instant::now())
}

fn parse_json(raw: Option<&str>) -> Result<serde_json::Value, ShelfError> {
    raw.map_or(Ok(serde_json::Value::Null), |raw| {
        serde_json::from_str(raw)
            .map_err(|err| ShelfError::InvalidArguments(format!("Invalid JSON config: {err}")))
    })
}

fn list(panel: &PanelState, json: bool) -> Result<(), ShelfError> {
    #[derive(Tabled)]
    struct PluginRow {
        #[tabled(rename = "#")]
        ordinal: usize,
        #[tabled(rename = "Type")]
        kind: String,
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Loaded")]
        loaded: String,
        #[tabled(rename = "Config")]
        config: String,
    }

    let records = panel.registry().records();
    if json {
        output::print_highlighted_json(&serde_json::to_value(records)?);
        return Ok(());
    }
    if records.is_empty() {
        println!("{}", "No plugins on the panel.".dimmed());
        return Ok(());
    }

    let rows: Vec<PluginRow> = records
        .iter()
        .map(|record| PluginRow {
            ordinal: record.ordinal,
            kind: record.kind.clone(),
            id: record.id.to_string(),
            loaded: output::format_bool(panel.is_instantiated(record.id)),
            config: if record.config.is_null() {
                String::new()
            } else {
                output::truncate(&record.config.to_string(), 40)
            },
        })
        .collect();

    let table = Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::first()).with(Alignment::right()))
        .with(Modify::new(Columns::new(3..4)).with(Alignment::center()))
        .to_string();

    println!("{}", format!("Plugins ({})", records.len()).bold());
    println!("{table}");
    if panel.registry().is_locked() {
        println!("{}", "The panel is locked; changes are rejected.".yellow());
    }
    Ok(())
}

fn print_types() {
    #[derive(Tabled)]
    struct TypeRow {
        #[tabled(rename = "Type")]
        kind: &'static str,
        #[tabled(rename = "Instances")]
        instances: &'static str,
        #[tabled(rename = "Description")]
        description: &'static str,
    }

    let rows = PluginKind::ALL.into_iter().map(|kind| TypeRow {
        kind: kind.as_str(),
        instances: match kind.cardinality() {
            Cardinality::Single => "one",
            Cardinality::Multiple => "many",
        },
        description: kind.description(),
    });
    println!("{}", Table::new(rows).with(Style::rounded()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_defaults_to_null() {
        assert_eq!(parse_json(None).unwrap(), serde_json::Value::Null);
    }

    #[test]
    fn test_parse_json_rejects_garbage() {
        assert!(matches!(parse_json(Some("{nope")), Err(ShelfError::InvalidArguments(_))));
    }
}
