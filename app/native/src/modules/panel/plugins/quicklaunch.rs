//! Quick-launch buttons.

use serde::{Deserialize, Serialize};

use crate::geometry::Rect;
use crate::modules::panel::plugin::{HostContext, Plugin, PluginError, SizeHint, parse_config};
use crate::modules::panel::services::SharedServices;
use crate::modules::windows::WmRequest;

const KIND: &str = "quicklaunch";

/// One launcher button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Launcher {
    pub name: String,
    pub command: String,
    #[serde(default)]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct QuickLaunchConfig {
    launchers: Vec<Launcher>,
}

#[derive(Default)]
pub struct QuickLaunchPlugin {
    config: QuickLaunchConfig,
    services: Option<SharedServices>,
    thickness: i32,
}

impl std::fmt::Debug for QuickLaunchPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuickLaunchPlugin")
            .field("config", &self.config)
            .field("thickness", &self.thickness)
            .finish_non_exhaustive()
    }
}

impl QuickLaunchPlugin {
    #[must_use]
    pub fn launchers(&self) -> &[Launcher] { &self.config.launchers }
}

impl Plugin for QuickLaunchPlugin {
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

    /// One square button per launcher; truncation keeps the first one.
    fn size_hint(&self) -> SizeHint {
        let count = i32::try_from(self.config.launchers.len()).unwrap_or(i32::MAX);
        SizeHint {
            minimum: if count > 0 { self.thickness } else { 0 },
            preferred: self.thickness.saturating_mul(count),
            expandable: false,
        }
    }

    /// `launch:<name>` starts the launcher with that name.
    fn command(&mut self, command: &str) -> Result<Vec<WmRequest>, PluginError> {
        let launcher = command
            .strip_prefix("launch:")
            .and_then(|name| self.config.launchers.iter().find(|l| l.name == name));
        let (Some(launcher), Some(services)) = (launcher, &self.services) else {
            return Err(PluginError::unsupported(KIND, command));
        };
        tracing::debug!(name = %launcher.name, "launching");
        services.launch(&launcher.command)?;
        Ok(Vec::new())
    }
}
