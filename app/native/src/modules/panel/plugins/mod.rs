//! Built-in plugin catalog.
//!
//! Plugins are looked up by their persisted type name. Each type declares its
//! cardinality; the registry refuses a second instance of a single-instance type.

mod clock;
mod nightmode;
mod quicklaunch;
mod showdesktop;
mod spacer;
mod startmenu;

use std::fmt;

use serde::Serialize;

pub use clock::ClockPlugin;
pub use nightmode::NightModePlugin;
pub use quicklaunch::{Launcher, QuickLaunchPlugin};
pub use showdesktop::ShowDesktopPlugin;
pub use spacer::SpacerPlugin;
pub use startmenu::StartMenuPlugin;

use super::plugin::{BoxedPlugin, PluginError};
use crate::config::TaskbarConfig;
use crate::modules::taskbar::{TASKBAR_KIND, TaskbarPlugin};

/// How many instances of a plugin type may exist on one panel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    Single,
    Multiple,
}

/// Known plugin types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginKind {
    Taskbar,
    StartMenu,
    Clock,
    QuickLaunch,
    Spacer,
    NightMode,
    ShowDesktop,
}

impl PluginKind {
    /// All plugin types in catalog order.
    pub const ALL: [Self; 7] = [
        Self::StartMenu,
        Self::QuickLaunch,
        Self::Taskbar,
        Self::Spacer,
        Self::NightMode,
        Self::ShowDesktop,
        Self::Clock,
    ];

    /// Persisted type name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Taskbar => TASKBAR_KIND,
            Self::StartMenu => "startmenu",
            Self::Clock => "clock",
            Self::QuickLaunch => "quicklaunch",
            Self::Spacer => "spacer",
            Self::NightMode => "nightmode",
            Self::ShowDesktop => "showdesktop",
        }
    }

    #[must_use]
    pub const fn cardinality(self) -> Cardinality {
        match self {
            Self::Taskbar | Self::StartMenu | Self::NightMode => Cardinality::Single,
            Self::Clock | Self::QuickLaunch | Self::Spacer | Self::ShowDesktop => {
                Cardinality::Multiple
            }
        }
    }

    /// One-line description for listings.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Taskbar => "Buttons for open windows",
            Self::StartMenu => "Application menu and session actions",
            Self::Clock => "Date and time",
            Self::QuickLaunch => "Application launchers",
            Self::Spacer => "Empty space, fixed or expanding",
            Self::NightMode => "Night mode toggle",
            Self::ShowDesktop => "Minimize all windows",
        }
    }

    /// Instantiate a fresh, unconfigured plugin.
    #[must_use]
    pub fn create(self, taskbar: &TaskbarConfig) -> BoxedPlugin {
        match self {
            Self::Taskbar => Box::new(TaskbarPlugin::new(taskbar)),
            Self::StartMenu => Box::new(StartMenuPlugin::default()),
            Self::Clock => Box::new(ClockPlugin::default()),
            Self::QuickLaunch => Box::new(QuickLaunchPlugin::default()),
            Self::Spacer => Box::new(SpacerPlugin::default()),
            Self::NightMode => Box::new(NightModePlugin::default()),
            Self::ShowDesktop => Box::new(ShowDesktopPlugin::default()),
        }
    }
}

impl fmt::Display for PluginKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl std::str::FromStr for PluginKind {
    type Err = PluginError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == name)
            .ok_or_else(|| PluginError::UnknownType(s.to_string()))
    }
}

/// Plugins placed on a panel that has no stored plugin list.
#[must_use]
pub fn default_plugin_set() -> Vec<(PluginKind, serde_json::Value)> {
    vec![
        (PluginKind::StartMenu, serde_json::Value::Null),
        (PluginKind::QuickLaunch, serde_json::Value::Null),
        (PluginKind::Taskbar, serde_json::Value::Null),
        (PluginKind::Spacer, serde_json::json!({ "expandable": false })),
        (PluginKind::NightMode, serde_json::Value::Null),
        (PluginKind::Clock, serde_json::Value::Null),
    ]
}
