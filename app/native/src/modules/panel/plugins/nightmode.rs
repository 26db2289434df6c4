//! Night mode toggle.

use serde::Deserialize;

use crate::geometry::Rect;
use crate::modules::panel::plugin::{HostContext, Plugin, PluginError, SizeHint, parse_config};
use crate::modules::panel::services::SharedServices;
use crate::modules::windows::WmRequest;

const KIND: &str = "nightmode";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct NightModeConfig {
    /// State applied at startup.
    enabled: bool,
}

#[derive(Default)]
pub struct NightModePlugin {
    enabled: bool,
    services: Option<SharedServices>,
    thickness: i32,
}

impl std::fmt::Debug for NightModePlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NightModePlugin")
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

impl NightModePlugin {
    #[must_use]
    pub const fn is_enabled(&self) -> bool { self.enabled }

    fn set(&mut self, enabled: bool) -> Result<(), PluginError> {
        if let Some(services) = &self.services {
            services.set_night_mode(enabled)?;
        }
        self.enabled = enabled;
        Ok(())
    }
}

impl Plugin for NightModePlugin {
    fn kind(&self) -> &'static str { KIND }

    fn init(&mut self, host: &HostContext) -> Result<(), PluginError> {
        self.services = Some(host.services.clone());
        self.thickness = host.thickness;
        Ok(())
    }

    fn configure(&mut self, config: &serde_json::Value) -> Result<(), PluginError> {
        let config: NightModeConfig = parse_config(KIND, config)?;
        self.enabled = config.enabled;
        Ok(())
    }

    fn resize(&mut self, _rect: Rect) {}

    fn destroy(&mut self) { self.services = None; }

    fn size_hint(&self) -> SizeHint { SizeHint::fixed(self.thickness) }

    fn command(&mut self, command: &str) -> Result<Vec<WmRequest>, PluginError> {
        match command {
            "toggle" => self.set(!self.enabled)?,
            "on" => self.set(true)?,
            "off" => self.set(false)?,
            _ => return Err(PluginError::unsupported(KIND, command)),
        }
        Ok(Vec::new())
    }
}
