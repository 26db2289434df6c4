//! Clock plugin.
//!
//! Time formatting and drawing belong to the renderer; the plugin only carries
//! the format and sizes itself from it.

use serde::Deserialize;

use crate::geometry::{Orientation, Rect};
use crate::modules::panel::plugin::{HostContext, Plugin, PluginError, SizeHint, parse_config};

const KIND: &str = "clock";

/// Horizontal padding on each side of the text.
const PADDING: i32 = 8;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ClockConfig {
    /// strftime-style format, e.g. `%H:%M`.
    format: String,
}

impl Default for ClockConfig {
    fn default() -> Self { Self { format: "%H:%M".to_string() } }
}

#[derive(Debug, Default)]
pub struct ClockPlugin {
    config: ClockConfig,
    orientation: Option<Orientation>,
    thickness: i32,
    icon_size: i32,
}

impl ClockPlugin {
    /// Configured format string.
    #[must_use]
    pub fn format(&self) -> &str { &self.config.format }

    /// Rough rendered width of the format: each conversion expands to about two glyphs.
    fn estimated_glyphs(&self) -> i32 {
        let mut glyphs = 0_i32;
        let mut chars = self.config.format.chars();
        while let Some(c) = chars.next() {
            if c == '%' {
                chars.next();
                glyphs += 2;
            } else {
                glyphs += 1;
            }
        }
        glyphs
    }
}

impl Plugin for ClockPlugin {
    fn kind(&self) -> &'static str { KIND }

    fn init(&mut self, host: &HostContext) -> Result<(), PluginError> {
        self.orientation = Some(host.orientation());
        self.thickness = host.thickness;
        self.icon_size = host.icon_size;
        Ok(())
    }

    fn configure(&mut self, config: &serde_json::Value) -> Result<(), PluginError> {
        self.config = parse_config(KIND, config)?;
        Ok(())
    }

    fn resize(&mut self, _rect: Rect) {}

    fn size_hint(&self) -> SizeHint {
        if self.orientation == Some(Orientation::Vertical) {
            return SizeHint::fixed(self.thickness);
        }
        let glyph = (self.icon_size / 2).max(6);
        SizeHint::fixed(self.estimated_glyphs() * glyph + 2 * PADDING)
    }
}
