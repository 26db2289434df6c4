//! Start menu plugin.
//!
//! The menu tree is drawn by the renderer. Session entries come back as
//! commands named after the [`SessionAction`] and go to the injected services.

use serde::Deserialize;

use crate::geometry::Rect;
use crate::modules::panel::plugin::{HostContext, Plugin, PluginError, SizeHint, parse_config};
use crate::modules::panel::services::{SessionAction, SharedServices};
use crate::modules::windows::WmRequest;

const KIND: &str = "startmenu";

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct StartMenuConfig {
    icon: String,
    /// Show lock, logout and power entries.
    session_actions: bool,
}

impl Default for StartMenuConfig {
    fn default() -> Self {
        Self {
            icon: "start-here".to_string(),
            session_actions: true,
        }
    }
}

#[derive(Default)]
pub struct StartMenuPlugin {
    config: StartMenuConfig,
    services: Option<SharedServices>,
    thickness: i32,
}

impl std::fmt::Debug for StartMenuPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StartMenuPlugin")
            .field("config", &self.config)
            .field("thickness", &self.thickness)
            .finish_non_exhaustive()
    }
}

impl StartMenuPlugin {
    /// Icon shown on the button.
    #[must_use]
    pub fn icon(&self) -> &str { &self.config.icon }

    /// Session entries offered by the menu.
    #[must_use]
    pub fn session_entries(&self) -> &'static [SessionAction] {
        if self.config.session_actions { &SessionAction::ALL } else { &[] }
    }
}

impl Plugin for StartMenuPlugin {
    fn kind(&self) -> &'static str { KIND }

    fn init(&mut self, host: &HostContext) -> Result<(), PluginError> {
        self.services = Some(host.services.clone());
        self.thickness = host.thickness;
        Ok(())
    }

    fn configure(&mut self, config: &serde_json::Value) -> Result<(), PluginError> {
        self.config = parse_config(KIND, config)?;
        Ok(())
    }

    fn resize(&mut self, _rect: Rect) {}

    fn destroy(&mut self) { self.services = None; }

    fn size_hint(&self) -> SizeHint { SizeHint::fixed(self.thickness) }

    fn command(&mut self, command: &str) -> Result<Vec<WmRequest>, PluginError> {
        let Ok(action) = command.parse::<SessionAction>() else {
            return Err(PluginError::unsupported(KIND, command));
        };
        if !self.session_entries().contains(&action) {
            return Err(PluginError::unsupported(KIND, command));
        }
        let Some(services) = &self.services else {
            return Err(PluginError::unsupported(KIND, command));
        };
        tracing::info!(action = %action, "session action requested");
        services.session_action(action)?;
        Ok(Vec::new())
    }
}
