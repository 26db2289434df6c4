//! Configuration template generation.
//!
//! Generates a commented configuration template with all available options.

use std::fs;
use std::path::Path;

/// Generates a configuration template with all options commented out.
///
/// This creates a JSONC file documenting every option with its default value.
#[must_use]
pub fn generate_config_template() -> String {
    r##"// Shelf Configuration File
// ========================
// This file uses JSONC format (JSON with comments).
// All options below are commented out and show their default values.
// Uncomment and modify the options you want to configure.
//
// Run `shelf schema > shelf.schema.json` for editor completion.

{
  // ============================================================================
  // Panel
  // ============================================================================
  // "panel": {
  //   // Screen edge: "top", "bottom", "left" or "right"
  //   "edge": "bottom",
  //
  //   // Length along the edge:
  //   //   a positive number is an absolute length in pixels,
  //   //   zero or a negative number means "screen length minus N pixels",
  //   //   a string like "75%" is a share of the screen length
  //   "length": "100%",
  //
  //   // Thickness in pixels
  //   "thickness": 46,
  //
  //   // Placement when shorter than the edge: "start", "center" or "end"
  //   "alignment": "center",
  //
  //   // Offset from the aligned position in pixels
  //   "offset": 0,
  //
  //   // Icon size used by plugins
  //   "iconSize": 32,
  //
  //   // Keep maximized windows off the panel
  //   "reserveSpace": true,
  //
  //   // Refuse adding, removing, moving and reconfiguring plugins
  //   "locked": false,
  //
  //   // Screen index the panel lives on
  //   "screen": 0,
  //
  //   "autoHide": {
  //     "enabled": false,
  //     // Delay before hiding, in milliseconds
  //     "delayMs": 500,
  //     // Animation duration, in milliseconds (0 = immediate)
  //     "durationMs": 200,
  //     // Visible trigger strip while hidden, in pixels
  //     "hiddenMargin": 4
  //   }
  // },

  // ============================================================================
  // Taskbar
  // ============================================================================
  // "taskbar": {
  //   // Collapse windows of the same application into one button
  //   "grouping": true,
  //
  //   // Filters
  //   "currentDesktopOnly": true,
  //   "currentScreenOnly": false,
  //   "minimizedOnly": false,
  //
  //   // "iconAndText", "iconOnly" or "textOnly"
  //   "buttonStyle": "iconAndText",
  //   "buttonWidth": 180,
  //
  //   "closeOnMiddleClick": false,
  //   "cycleOnWheel": true,
  //
  //   // Bring a minimized window to the current desktop when restoring it
  //   "raiseOnCurrentDesktop": false,
  //
  //   // How long a pressed button waits for the window manager, in milliseconds
  //   "pendingTimeoutMs": 1000
  // },

  // ============================================================================
  // Window Manager Connection
  // ============================================================================
  // "adapter": {
  //   // Reconnect backoff in milliseconds, doubled on each failure
  //   "reconnectMinMs": 250,
  //   "reconnectMaxMs": 10000
  // },

  // ============================================================================
  // Plugin List Persistence
  // ============================================================================
  // "persistence": {
  //   // Empty means plugins.json next to this file
  //   "path": "",
  //   "writeRetries": 3,
  //   "retryDelayMs": 500
  // },

  // ============================================================================
  // Session Commands
  // ============================================================================
  // Shell commands run by the start menu and the night mode toggle.
  // Empty commands disable the action.
  // "session": {
  //   "logout": "",
  //   "lockScreen": "",
  //   "switchUser": "",
  //   "suspend": "systemctl suspend",
  //   "hibernate": "systemctl hibernate",
  //   "reboot": "systemctl reboot",
  //   "shutdown": "systemctl poweroff",
  //   "nightModeOn": "",
  //   "nightModeOff": ""
  // }
}
"##
    .to_string()
}

/// Creates a configuration file with the template at the specified path.
///
/// Creates parent directories if they don't exist.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn create_config_file(path: &Path) -> Result<(), std::io::Error> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(path, generate_config_template())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ShelfConfig;

    #[test]
    fn test_template_parses_to_default_config() {
        let template = generate_config_template();
        let reader = json_comments::StripComments::new(template.as_bytes());
        let config: ShelfConfig = serde_json::from_reader(reader).unwrap();
        assert_eq!(config, ShelfConfig::default());
    }

    #[test]
    fn test_template_contains_all_sections() {
        let template = generate_config_template();
        for section in ["panel", "autoHide", "taskbar", "adapter", "persistence", "session"] {
            assert!(template.contains(section), "missing section {section}");
        }
    }

    #[test]
    fn test_create_config_file_creates_parents() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.jsonc");
        create_config_file(&path).unwrap();
        assert!(path.exists());
    }
}
