//! Configuration types for Shelf.
//!
//! This module provides the configuration types and loading functionality.
//! The configuration file supports JSONC format (JSON with comments).
//! Both single-line (`//`) and multi-line (`/* */`) comments are allowed.

use std::fs;
use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::geometry::{Alignment, Edge};

// ============================================================================
// Panel
// ============================================================================

/// Panel length along its edge.
///
/// - A positive number is an absolute length in pixels.
/// - Zero or a negative number means "screen length minus |value| pixels".
/// - A string such as `"75%"` is a percentage of the screen length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum PanelLength {
    /// Value in pixels. Non-positive values are relative to the screen length.
    Pixels(i32),
    /// Value as a percentage string (e.g., "50%").
    Percentage(String),
}

impl Default for PanelLength {
    fn default() -> Self { Self::Percentage("100%".to_string()) }
}

impl PanelLength {
    /// Resolves the length to pixels for a screen edge of `available` pixels.
    ///
    /// The result is always within `[0, available]`.
    #[must_use]
    pub fn resolve(&self, available: i32) -> i32 {
        let available = available.max(0);
        let length = match self {
            Self::Pixels(px) if *px > 0 => *px,
            Self::Pixels(px) => available.saturating_add(*px),
            Self::Percentage(s) => {
                let trimmed = s.trim().trim_end_matches('%').trim();
                let pct = trimmed.parse::<f64>().unwrap_or(100.0).clamp(0.0, 100.0);
                percent_of(available, pct)
            }
        };
        length.clamp(0, available)
    }
}

#[allow(clippy::cast_possible_truncation)] // pct is clamped to [0, 100]
fn percent_of(available: i32, pct: f64) -> i32 { (f64::from(available) * pct / 100.0).round() as i32 }

/// Auto-hide behavior of the panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct AutoHideConfig {
    /// Whether the panel retracts when the pointer leaves it.
    /// Default: false
    pub enabled: bool,

    /// Delay before the panel starts hiding, in milliseconds.
    /// Default: 500
    pub delay_ms: u64,

    /// Duration of the hide/show animation, in milliseconds.
    /// Default: 200
    pub duration_ms: u64,

    /// Thickness of the visible trigger strip while hidden, in pixels.
    /// Default: 4
    pub hidden_margin: u32,
}

impl Default for AutoHideConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            delay_ms: 500,
            duration_ms: 200,
            hidden_margin: 4,
        }
    }
}

/// Panel geometry and behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct PanelConfig {
    /// Screen edge the panel is attached to.
    /// Default: "bottom"
    pub edge: Edge,

    /// Panel length along the edge. See [`PanelLength`].
    /// Default: "100%"
    pub length: PanelLength,

    /// Panel thickness in pixels.
    /// Default: 46
    pub thickness: u32,

    /// Placement when the panel does not span the whole edge.
    /// Default: "center"
    pub alignment: Alignment,

    /// Offset from the aligned position, in pixels.
    /// Default: 0
    pub offset: i32,

    /// Icon size used by plugins, in pixels.
    /// Default: 32
    pub icon_size: u32,

    /// Ask the window manager to keep maximized windows off the panel.
    /// Default: true
    pub reserve_space: bool,

    /// Refuse plugin add, remove, move and reconfigure requests.
    /// Default: false
    pub locked: bool,

    /// Index of the screen the panel lives on.
    /// Default: 0
    pub screen: u32,

    /// Auto-hide settings.
    pub auto_hide: AutoHideConfig,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            edge: Edge::Bottom,
            length: PanelLength::default(),
            thickness: 46,
            alignment: Alignment::Center,
            offset: 0,
            icon_size: 32,
            reserve_space: true,
            locked: false,
            screen: 0,
            auto_hide: AutoHideConfig::default(),
        }
    }
}

// ============================================================================
// Taskbar
// ============================================================================

/// How taskbar buttons are drawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum ButtonStyle {
    /// Icon and title.
    #[default]
    IconAndText,
    /// Icon only.
    IconOnly,
    /// Title only.
    TextOnly,
}

/// Taskbar behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools)] // Independent toggles
pub struct TaskbarConfig {
    /// Collapse windows of the same application into one entry.
    /// Default: true
    pub grouping: bool,

    /// Only show windows on the current virtual desktop.
    /// Default: true
    pub current_desktop_only: bool,

    /// Only show windows on the panel's screen.
    /// Default: false
    pub current_screen_only: bool,

    /// Only show minimized windows.
    /// Default: false
    pub minimized_only: bool,

    /// Button style.
    pub button_style: ButtonStyle,

    /// Preferred button width in pixels. Icon-only buttons use the panel thickness.
    /// Default: 180
    pub button_width: u32,

    /// Close a window with a middle click on its button.
    /// Default: false
    pub close_on_middle_click: bool,

    /// Cycle window activation with the mouse wheel.
    /// Default: true
    pub cycle_on_wheel: bool,

    /// Move a minimized window to the current desktop before activating it.
    /// Default: false
    pub raise_on_current_desktop: bool,

    /// How long a pressed button waits for confirmation, in milliseconds.
    /// Default: 1000
    pub pending_timeout_ms: u64,
}

impl Default for TaskbarConfig {
    fn default() -> Self {
        Self {
            grouping: true,
            current_desktop_only: true,
            current_screen_only: false,
            minimized_only: false,
            button_style: ButtonStyle::IconAndText,
            button_width: 180,
            close_on_middle_click: false,
            cycle_on_wheel: true,
            raise_on_current_desktop: false,
            pending_timeout_ms: 1000,
        }
    }
}

// ============================================================================
// Adapter / Persistence / Session
// ============================================================================

/// Reconnect policy for the window manager connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct AdapterConfig {
    /// First reconnect delay, in milliseconds. Doubles on each failure.
    /// Default: 250
    pub reconnect_min_ms: u64,

    /// Upper bound of the reconnect delay, in milliseconds.
    /// Default: 10000
    pub reconnect_max_ms: u64,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            reconnect_min_ms: 250,
            reconnect_max_ms: 10_000,
        }
    }
}

/// Plugin list persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct PersistenceConfig {
    /// Path of the plugin list. Empty means next to the configuration file.
    /// Default: ""
    pub path: String,

    /// Number of retries after a failed write.
    /// Default: 3
    pub write_retries: u32,

    /// Delay between write retries, in milliseconds.
    /// Default: 500
    pub retry_delay_ms: u64,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            path: String::new(),
            write_retries: 3,
            retry_delay_ms: 500,
        }
    }
}

impl PersistenceConfig {
    /// Resolves the plugin list path.
    ///
    /// Falls back to `plugins.json` in the first configuration directory.
    #[must_use]
    pub fn resolve_path(&self) -> Option<PathBuf> {
        if !self.path.is_empty() {
            return Some(expand_home(&self.path));
        }
        config_paths()
            .into_iter()
            .next()
            .and_then(|p| p.parent().map(|dir| dir.join(PLUGIN_STORE_FILE_NAME)))
    }
}

/// Shell commands backing session and launcher actions.
///
/// Empty commands disable the corresponding action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionConfig {
    pub logout: String,
    pub lock_screen: String,
    pub switch_user: String,
    pub suspend: String,
    pub hibernate: String,
    pub reboot: String,
    pub shutdown: String,

    /// Command to enable night mode.
    pub night_mode_on: String,

    /// Command to disable night mode.
    pub night_mode_off: String,
}

// ============================================================================
// Root
// ============================================================================

/// Root configuration structure for Shelf.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct ShelfConfig {
    /// JSON schema reference for editor support.
    #[serde(rename = "$schema", skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Panel geometry and behavior.
    pub panel: PanelConfig,

    /// Taskbar behavior.
    pub taskbar: TaskbarConfig,

    /// Window manager reconnect policy.
    pub adapter: AdapterConfig,

    /// Plugin list persistence.
    pub persistence: PersistenceConfig,

    /// Session and launcher commands.
    pub session: SessionConfig,
}

/// Errors that can occur when loading the configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// No configuration file was found in any of the expected locations.
    NotFound,
    /// The configuration file exists but could not be read.
    IoError(std::io::Error),
    /// The configuration file contains invalid JSON.
    ParseError(serde_json::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(
                f,
                "No configuration file found. Expected at ~/.config/shelf/config.jsonc \
                or ~/.shelf.jsonc"
            ),
            Self::IoError(err) => write!(f, "Failed to read configuration file: {err}"),
            Self::ParseError(err) => write!(f, "Failed to parse configuration file: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::IoError(err) => Some(err),
            Self::ParseError(err) => Some(err),
            Self::NotFound => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self { Self::IoError(err) }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self { Self::ParseError(err) }
}

/// Configuration file names to search for (in priority order).
const CONFIG_FILE_NAMES: &[&str] = &["config.jsonc", "config.json"];

/// Configuration file names in the home directory.
const HOME_CONFIG_FILE_NAMES: &[&str] = &[".shelf.jsonc", ".shelf.json"];

/// Default file name of the persisted plugin list.
const PLUGIN_STORE_FILE_NAME: &str = "plugins.json";

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(path)
}

/// Returns the possible configuration file paths in priority order.
///
/// The function checks the following locations (both `.jsonc` and `.json` variants):
/// 1. `$XDG_CONFIG_HOME/shelf/config.jsonc` if the variable is set
/// 2. `~/.config/shelf/config.jsonc`
/// 3. The platform config directory (`dirs::config_dir()/shelf/`)
/// 4. `~/.shelf.jsonc`
#[must_use]
pub fn config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        let shelf_dir = PathBuf::from(xdg_config).join("shelf");
        for filename in CONFIG_FILE_NAMES {
            paths.push(shelf_dir.join(filename));
        }
    }

    if let Some(home) = dirs::home_dir() {
        let shelf_dir = home.join(".config").join("shelf");
        for filename in CONFIG_FILE_NAMES {
            let path = shelf_dir.join(filename);
            // XDG_CONFIG_HOME might be ~/.config
            if !paths.contains(&path) {
                paths.push(path);
            }
        }
    }

    if let Some(config_dir) = dirs::config_dir() {
        let shelf_dir = config_dir.join("shelf");
        for filename in CONFIG_FILE_NAMES {
            let path = shelf_dir.join(filename);
            if !paths.contains(&path) {
                paths.push(path);
            }
        }
    }

    if let Some(home) = dirs::home_dir() {
        for filename in HOME_CONFIG_FILE_NAMES {
            paths.push(home.join(filename));
        }
    }

    paths
}

/// Loads the configuration from a specific file.
///
/// # Errors
///
/// Returns `ConfigError::NotFound` if the file does not exist.
/// Returns `ConfigError::IoError` if the file could not be read.
/// Returns `ConfigError::ParseError` if the file contains invalid JSON.
pub fn load_config_from_path(path: &Path) -> Result<(ShelfConfig, PathBuf), ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound);
    }
    let file = fs::File::open(path)?;
    // Strip comments from JSONC before parsing
    let reader = json_comments::StripComments::new(file);
    let config: ShelfConfig = serde_json::from_reader(reader)?;
    Ok((config, path.to_path_buf()))
}

/// Loads the configuration from the first available config file.
///
/// # Errors
///
/// Returns `ConfigError::NotFound` if no configuration file exists in any of the expected locations.
/// Returns `ConfigError::IoError` if a configuration file exists but could not be read.
/// Returns `ConfigError::ParseError` if the configuration file contains invalid JSON.
pub fn load_config() -> Result<(ShelfConfig, PathBuf), ConfigError> {
    for path in config_paths() {
        if path.exists() {
            return load_config_from_path(&path);
        }
    }

    Err(ConfigError::NotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_length_is_relative_to_screen() {
        assert_eq!(PanelLength::Pixels(-100).resolve(1000), 900);
        assert_eq!(PanelLength::Pixels(0).resolve(1000), 1000);
        assert_eq!(PanelLength::Pixels(-2000).resolve(1000), 0);
    }

    #[test]
    fn test_positive_length_is_clamped() {
        assert_eq!(PanelLength::Pixels(600).resolve(1000), 600);
        assert_eq!(PanelLength::Pixels(1600).resolve(1000), 1000);
    }

    #[test]
    fn test_percentage_length() {
        assert_eq!(PanelLength::Percentage("50%".to_string()).resolve(1000), 500);
        assert_eq!(PanelLength::Percentage(" 75 % ".to_string()).resolve(1920), 1440);
        assert_eq!(PanelLength::Percentage("250%".to_string()).resolve(800), 800);
        assert_eq!(PanelLength::Percentage("garbage".to_string()).resolve(800), 800);
    }

    #[test]
    fn test_length_deserializes_number_or_string() {
        let px: PanelLength = serde_json::from_str("-40").unwrap();
        assert_eq!(px, PanelLength::Pixels(-40));
        let pct: PanelLength = serde_json::from_str("\"80%\"").unwrap();
        assert_eq!(pct, PanelLength::Percentage("80%".to_string()));
    }

    #[test]
    fn test_config_deserializes_partial_sections() {
        let json = r#"{
            "panel": { "edge": "top", "thickness": 30, "autoHide": { "enabled": true } },
            "taskbar": { "grouping": false, "closeOnMiddleClick": true }
        }"#;

        let config: ShelfConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.panel.edge, Edge::Top);
        assert_eq!(config.panel.thickness, 30);
        assert!(config.panel.auto_hide.enabled);
        assert_eq!(config.panel.auto_hide.hidden_margin, 4);
        assert!(!config.taskbar.grouping);
        assert!(config.taskbar.close_on_middle_click);
        assert_eq!(config.taskbar.button_width, 180);
    }

    #[test]
    fn test_load_config_from_path_strips_comments() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.jsonc");
        fs::write(
            &path,
            "{\n  // bottom is the default\n  \"panel\": { /* inline */ \"edge\": \"left\" }\n}",
        )
        .unwrap();

        let (config, loaded_from) = load_config_from_path(&path).unwrap();
        assert_eq!(config.panel.edge, Edge::Left);
        assert_eq!(loaded_from, path);
    }

    #[test]
    fn test_load_config_from_missing_path() {
        let result = load_config_from_path(Path::new("/nonexistent/shelf/config.jsonc"));
        assert!(matches!(result, Err(ConfigError::NotFound)));
    }

    #[test]
    fn test_persistence_path_override() {
        let config = PersistenceConfig {
            path: "/tmp/shelf/plugins.json".to_string(),
            ..Default::default()
        };
        assert_eq!(config.resolve_path(), Some(PathBuf::from("/tmp/shelf/plugins.json")));
    }

    #[test]
    fn test_config_paths_are_not_empty() {
        let paths = config_paths();
        assert!(!paths.is_empty() || std::env::var("HOME").is_err());
    }
}
