//! Layout CLI command.

use colored::Colorize;
use tabled::settings::object::Columns;
use tabled::settings::{Alignment, Modify, Style};
use tabled::{Table, Tabled};

use super::open_panel;
use crate::cli::output;
use crate::error::ShelfError;
use crate::geometry::Rect;
use crate::modules::panel::{PanelLayout, SlotVisibility};

/// Compute and print the layout for `screen`.
///
/// # Errors
///
/// Returns an error if the plugin list cannot be read.
pub fn execute(screen: Rect, json: bool) -> Result<(), ShelfError> {
    let panel = open_panel(screen)?;
    let layout = panel.layout();

    if json {
        output::print_highlighted_json(&serde_json::to_value(layout.as_ref())?);
    } else {
        print_layout(&layout);
    }
    Ok(())
}

fn print_layout(layout: &PanelLayout) {
    #[derive(Tabled)]
    struct SlotRow {
        #[tabled(rename = "#")]
        ordinal: usize,
        #[tabled(rename = "Type")]
        kind: String,
        #[tabled(rename = "Geometry")]
        geometry: String,
        #[tabled(rename = "State")]
        state: String,
    }

    println!("{} {} ({})", "Screen".bold(), layout.screen, layout.edge);
    println!("{} {}", "Panel ".bold(), layout.panel);
    if layout.strut.is_reserved() {
        println!("{} {}px", "Strut ".bold(), layout.strut.thickness);
    } else {
        println!("{} {}", "Strut ".bold(), "none".dimmed());
    }

    let rows: Vec<SlotRow> = layout
        .slots
        .iter()
        .map(|slot| SlotRow {
            ordinal: slot.ordinal,
            kind: slot.kind.clone(),
            geometry: if slot.visibility == SlotVisibility::Hidden {
                "-".to_string()
            } else {
                slot.rect.to_string()
            },
            state: match slot.visibility {
                SlotVisibility::Visible => "visible".green().to_string(),
                SlotVisibility::Truncated => "truncated".yellow().to_string(),
                SlotVisibility::Hidden => "hidden".red().to_string(),
            },
        })
        .collect();

    if rows.is_empty() {
        println!("\n{}", "No plugins on the panel.".dimmed());
        return;
    }

    let table = Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::first()).with(Alignment::right()))
        .with(Modify::new(Columns::new(2..3)).with(Alignment::right()))
        .to_string();
    println!("\n{table}");

    let overflowed = layout.overflowed();
    if overflowed > 0 {
        println!("{}", format!("{overflowed} plugin(s) do not fully fit on the panel.").yellow());
    }
}
