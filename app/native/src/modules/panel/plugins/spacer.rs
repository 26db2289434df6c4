//! Empty space between plugins.

use serde::Deserialize;

use crate::geometry::Rect;
use crate::modules::panel::plugin::{HostContext, Plugin, PluginError, SizeHint, parse_config};

const KIND: &str = "spacer";

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SpacerConfig {
    /// Fixed size in pixels; ignored when expandable.
    size: i32,
    /// Absorb leftover panel space.
    expandable: bool,
}

impl Default for SpacerConfig {
    fn default() -> Self {
        Self {
            size: 8,
            expandable: true,
        }
    }
}

/// Fixed or expanding gap.
#[derive(Debug, Default)]
pub struct SpacerPlugin {
    config: SpacerConfig,
}

impl Plugin for SpacerPlugin {
    fn kind(&self) -> &'static str { KIND }

    fn init(&mut self, _host: &HostContext) -> Result<(), PluginError> { Ok(()) }

    fn configure(&mut self, config: &serde_json::Value) -> Result<(), PluginError> {
        self.config = parse_config(KIND, config)?;
        Ok(())
    }

    fn resize(&mut self, _rect: Rect) {}

    fn size_hint(&self) -> SizeHint {
        if self.config.expandable {
            SizeHint::expandable(0)
        } else {
            SizeHint::fixed(self.config.size.max(0))
        }
    }
}
