//! Show-desktop button.

use crate::geometry::Rect;
use crate::modules::panel::plugin::{HostContext, Plugin, PluginError, SizeHint};
use crate::modules::windows::WmRequest;

const KIND: &str = "showdesktop";

#[derive(Debug, Default)]
pub struct ShowDesktopPlugin {
    /// Whether the last request asked to show the desktop.
    showing: bool,
    thickness: i32,
}

impl Plugin for ShowDesktopPlugin {
    fn kind(&self) -> &'static str { KIND }

    fn init(&mut self, host: &HostContext) -> Result<(), PluginError> {
        self.thickness = host.thickness;
        Ok(())
    }

    fn configure(&mut self, _config: &serde_json::Value) -> Result<(), PluginError> { Ok(()) }

    fn resize(&mut self, _rect: Rect) {}

    fn size_hint(&self) -> SizeHint { SizeHint::fixed(self.thickness / 2) }

    fn command(&mut self, command: &str) -> Result<Vec<WmRequest>, PluginError> {
        if command != "toggle" {
            return Err(PluginError::unsupported(KIND, command));
        }
        self.showing = !self.showing;
        Ok(vec![WmRequest::ShowDesktop { show: self.showing }])
    }
}
