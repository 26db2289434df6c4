//! Core window types tracked by the window directory.
//!
//! A `Window` is keyed by the platform's opaque handle and carries the last
//! applied revision so that reordered or duplicated notifications can be
//! discarded.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Monotonically increasing per-window revision supplied by the adapter.
pub type Revision = u64;

// ============================================================================
// Identity
// ============================================================================

/// Opaque platform window handle, stable for the window's lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowId(pub u64);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{:#x}", self.0) }
}

// ============================================================================
// Layer / Maximize / Desktop
// ============================================================================

/// Stacking layer. A window is in exactly one layer at any time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Layer {
    #[default]
    Normal,
    AlwaysOnTop,
    AlwaysOnBottom,
}

/// Maximization axes requested from or reported by the window manager.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MaximizeAxis {
    /// Not maximized (restore).
    #[default]
    None,
    Horizontal,
    Vertical,
    Both,
}

impl MaximizeAxis {
    /// Builds the axis value from independent horizontal/vertical flags.
    #[must_use]
    pub const fn from_flags(horizontal: bool, vertical: bool) -> Self {
        match (horizontal, vertical) {
            (false, false) => Self::None,
            (true, false) => Self::Horizontal,
            (false, true) => Self::Vertical,
            (true, true) => Self::Both,
        }
    }

    /// Splits the axis into (horizontal, vertical) flags.
    #[must_use]
    pub const fn flags(self) -> (bool, bool) {
        match self {
            Self::None => (false, false),
            Self::Horizontal => (true, false),
            Self::Vertical => (false, true),
            Self::Both => (true, true),
        }
    }
}

/// Virtual desktop a window lives on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Desktop {
    /// Sticky window, visible on every desktop.
    #[default]
    All,
    /// Zero-based desktop index.
    Index(u32),
}

impl Desktop {
    /// Whether a window on this desktop is visible on `desktop`.
    #[must_use]
    pub const fn is_on(self, desktop: u32) -> bool {
        match self {
            Self::All => true,
            Self::Index(idx) => idx == desktop,
        }
    }
}

impl fmt::Display for Desktop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Index(idx) => write!(f, "{}", idx + 1),
        }
    }
}

/// Virtual desktop summary reported by the window manager.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesktopInfo {
    /// Number of virtual desktops.
    pub count: u32,
    /// Zero-based index of the active desktop.
    pub active: u32,
}

impl Default for DesktopInfo {
    fn default() -> Self { Self { count: 1, active: 0 } }
}

// ============================================================================
// Attributes
// ============================================================================

/// Full attribute set of a window.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools)] // Window state naturally has many boolean flags
pub struct WindowAttributes {
    pub title: String,

    /// Application class identifier (`WM_CLASS`, app id, bundle id...).
    pub class: String,

    /// Icon reference (theme name or path), resolved by the renderer.
    pub icon: Option<String>,

    pub minimized: bool,
    pub maximized_horizontal: bool,
    pub maximized_vertical: bool,
    pub shaded: bool,
    pub layer: Layer,
    pub desktop: Desktop,

    /// Index of the screen the window is mostly on.
    pub screen: u32,

    pub skip_taskbar: bool,

    /// Whether the window currently has input focus.
    pub active: bool,
}

impl WindowAttributes {
    /// Create attributes for a plain window of the given class.
    #[must_use]
    pub fn new(title: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            class: class.into(),
            ..Default::default()
        }
    }

    /// Current maximization as a single axis value.
    #[must_use]
    pub const fn maximize_axis(&self) -> MaximizeAxis {
        MaximizeAxis::from_flags(self.maximized_horizontal, self.maximized_vertical)
    }
}

/// Partial update of window attributes. `None` fields are left untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AttributeDelta {
    pub title: Option<String>,
    pub class: Option<String>,
    pub icon: Option<Option<String>>,
    pub minimized: Option<bool>,
    pub maximized: Option<MaximizeAxis>,
    pub shaded: Option<bool>,
    pub layer: Option<Layer>,
    pub desktop: Option<Desktop>,
    pub screen: Option<u32>,
    pub skip_taskbar: Option<bool>,
    pub active: Option<bool>,
}

impl AttributeDelta {
    /// Whether the delta changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool { *self == Self::default() }

    /// Merges this delta into a full attribute set.
    pub fn apply_to(&self, attrs: &mut WindowAttributes) {
        if let Some(title) = &self.title {
            attrs.title.clone_from(title);
        }
        if let Some(class) = &self.class {
            attrs.class.clone_from(class);
        }
        if let Some(icon) = &self.icon {
            attrs.icon.clone_from(icon);
        }
        if let Some(minimized) = self.minimized {
            attrs.minimized = minimized;
        }
        if let Some(axis) = self.maximized {
            (attrs.maximized_horizontal, attrs.maximized_vertical) = axis.flags();
        }
        if let Some(shaded) = self.shaded {
            attrs.shaded = shaded;
        }
        if let Some(layer) = self.layer {
            attrs.layer = layer;
        }
        if let Some(desktop) = self.desktop {
            attrs.desktop = desktop;
        }
        if let Some(screen) = self.screen {
            attrs.screen = screen;
        }
        if let Some(skip) = self.skip_taskbar {
            attrs.skip_taskbar = skip;
        }
        if let Some(active) = self.active {
            attrs.active = active;
        }
    }
}

impl From<WindowAttributes> for AttributeDelta {
    fn from(attrs: WindowAttributes) -> Self {
        let maximized = attrs.maximize_axis();
        Self {
            title: Some(attrs.title),
            class: Some(attrs.class),
            icon: Some(attrs.icon),
            minimized: Some(attrs.minimized),
            maximized: Some(maximized),
            shaded: Some(attrs.shaded),
            layer: Some(attrs.layer),
            desktop: Some(attrs.desktop),
            screen: Some(attrs.screen),
            skip_taskbar: Some(attrs.skip_taskbar),
            active: Some(attrs.active),
        }
    }
}

// ============================================================================
// Display State
// ============================================================================

/// Confirmed display state of a taskbar entry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WindowState {
    #[default]
    Normal,
    Minimized,
    Maximized,
    MaximizedHorizontal,
    MaximizedVertical,
    Shaded,
}

// ============================================================================
// Window
// ============================================================================

/// A tracked top-level window.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub id: WindowId,

    /// Last applied revision.
    pub revision: Revision,

    /// Creation order within the directory. Lower is older.
    pub sequence: u64,

    pub attributes: WindowAttributes,
}

impl Window {
    /// Display state derived from the attribute flags.
    ///
    /// Minimized wins over every other flag, then shaded, then maximized.
    #[must_use]
    pub const fn display_state(&self) -> WindowState {
        let attrs = &self.attributes;
        if attrs.minimized {
            return WindowState::Minimized;
        }
        if attrs.shaded {
            return WindowState::Shaded;
        }
        match attrs.maximize_axis() {
            MaximizeAxis::Both => WindowState::Maximized,
            MaximizeAxis::Horizontal => WindowState::MaximizedHorizontal,
            MaximizeAxis::Vertical => WindowState::MaximizedVertical,
            MaximizeAxis::None => WindowState::Normal,
        }
    }

    /// Application class identifier.
    #[must_use]
    pub fn class(&self) -> &str { &self.attributes.class }

    /// Whether the window should never appear on the taskbar.
    #[must_use]
    pub const fn skips_taskbar(&self) -> bool { self.attributes.skip_taskbar }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(attrs: WindowAttributes) -> Window {
        Window {
            id: WindowId(1),
            revision: 1,
            sequence: 0,
            attributes: attrs,
        }
    }

    #[test]
    fn test_minimized_takes_precedence_over_maximized() {
        let mut attrs = WindowAttributes::new("Editor", "editor");
        attrs.minimized = true;
        attrs.maximized_horizontal = true;
        attrs.maximized_vertical = true;
        assert_eq!(window(attrs).display_state(), WindowState::Minimized);
    }

    #[test]
    fn test_shaded_takes_precedence_over_maximized() {
        let mut attrs = WindowAttributes::new("Editor", "editor");
        attrs.shaded = true;
        attrs.maximized_vertical = true;
        assert_eq!(window(attrs).display_state(), WindowState::Shaded);
    }

    #[test]
    fn test_maximize_axis_states() {
        let mut attrs = WindowAttributes::new("Editor", "editor");
        attrs.maximized_horizontal = true;
        assert_eq!(window(attrs.clone()).display_state(), WindowState::MaximizedHorizontal);
        attrs.maximized_vertical = true;
        assert_eq!(window(attrs.clone()).display_state(), WindowState::Maximized);
        attrs.maximized_horizontal = false;
        assert_eq!(window(attrs).display_state(), WindowState::MaximizedVertical);
    }

    #[test]
    fn test_delta_merges_only_set_fields() {
        let mut attrs = WindowAttributes::new("Old", "term");
        attrs.desktop = Desktop::Index(1);

        let delta = AttributeDelta {
            title: Some("New".to_string()),
            maximized: Some(MaximizeAxis::Both),
            ..Default::default()
        };
        delta.apply_to(&mut attrs);

        assert_eq!(attrs.title, "New");
        assert_eq!(attrs.class, "term");
        assert_eq!(attrs.desktop, Desktop::Index(1));
        assert!(attrs.maximized_horizontal && attrs.maximized_vertical);
    }

    #[test]
    fn test_full_delta_round_trips_attributes() {
        let mut attrs = WindowAttributes::new("Mail", "mail");
        attrs.layer = Layer::AlwaysOnTop;
        attrs.icon = Some("mail-client".to_string());

        let mut target = WindowAttributes::default();
        AttributeDelta::from(attrs.clone()).apply_to(&mut target);
        assert_eq!(target, attrs);
    }

    #[test]
    fn test_desktop_all_is_on_every_desktop() {
        assert!(Desktop::All.is_on(0));
        assert!(Desktop::All.is_on(7));
        assert!(Desktop::Index(2).is_on(2));
        assert!(!Desktop::Index(2).is_on(0));
    }

    #[test]
    fn test_empty_delta() {
        assert!(AttributeDelta::default().is_empty());
        let delta = AttributeDelta {
            active: Some(true),
            ..Default::default()
        };
        assert!(!delta.is_empty());
    }
}
