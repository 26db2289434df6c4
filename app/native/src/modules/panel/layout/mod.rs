//! Panel geometry and plugin slot layout.
//!
//! Layout is a pure function of the screen rectangle, the panel settings and
//! the plugins' size hints. Recomputing with the same inputs yields the same
//! result, which keeps screen-change handling idempotent.

mod packing;

pub use packing::{PackedSlot, Packing, SlotVisibility, pack};
use serde::Serialize;
use uuid::Uuid;

use super::plugin::SizeHint;
use crate::config::{PanelConfig, PanelLength};
use crate::geometry::{Alignment, Edge, Orientation, Rect};
use crate::modules::windows::WmRequest;

// ============================================================================
// Settings
// ============================================================================

/// Geometry-relevant subset of the panel configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelSettings {
    pub edge: Edge,
    pub length: PanelLength,
    pub thickness: i32,
    pub alignment: Alignment,
    pub offset: i32,
    pub reserve_space: bool,
    pub auto_hide: bool,
    pub hidden_margin: i32,
}

impl Default for PanelSettings {
    fn default() -> Self { Self::from(&PanelConfig::default()) }
}

impl From<&PanelConfig> for PanelSettings {
    fn from(config: &PanelConfig) -> Self {
        Self {
            edge: config.edge,
            length: config.length.clone(),
            thickness: i32::try_from(config.thickness).unwrap_or(i32::MAX),
            alignment: config.alignment,
            offset: config.offset,
            reserve_space: config.reserve_space,
            auto_hide: config.auto_hide.enabled,
            hidden_margin: i32::try_from(config.auto_hide.hidden_margin).unwrap_or(0),
        }
    }
}

impl PanelSettings {
    #[must_use]
    pub const fn orientation(&self) -> Orientation { self.edge.orientation() }

    /// Thickness of the strip left on screen while the panel is hidden.
    #[must_use]
    pub fn hidden_thickness(&self) -> i32 { self.hidden_margin.clamp(0, self.thickness.max(0)) }
}

/// Position of a span of `length` inside `[start, start + available)`.
fn align(start: i32, available: i32, length: i32, alignment: Alignment, offset: i32) -> i32 {
    let free = (available - length).max(0);
    let position = match alignment {
        Alignment::Start => offset,
        Alignment::Center => free / 2 + offset,
        Alignment::End => free - offset,
    };
    start + position.clamp(0, free)
}

/// Rectangle of the fully shown panel on `screen`.
#[must_use]
pub fn panel_rect(screen: Rect, settings: &PanelSettings) -> Rect {
    match settings.orientation() {
        Orientation::Horizontal => {
            let length = settings.length.resolve(screen.width);
            let thickness = settings.thickness.clamp(0, screen.height.max(0));
            let x = align(screen.x, screen.width, length, settings.alignment, settings.offset);
            let y = match settings.edge {
                Edge::Top => screen.y,
                _ => screen.bottom() - thickness,
            };
            Rect::new(x, y, length, thickness)
        }
        Orientation::Vertical => {
            let length = settings.length.resolve(screen.height);
            let thickness = settings.thickness.clamp(0, screen.width.max(0));
            let y = align(screen.y, screen.height, length, settings.alignment, settings.offset);
            let x = match settings.edge {
                Edge::Left => screen.x,
                _ => screen.right() - thickness,
            };
            Rect::new(x, y, thickness, length)
        }
    }
}

/// Shift a shown panel towards its edge so only `visible` pixels stay on screen.
#[must_use]
pub fn retract(panel: Rect, edge: Edge, visible: i32) -> Rect {
    let thickness = match edge.orientation() {
        Orientation::Horizontal => panel.height,
        Orientation::Vertical => panel.width,
    };
    let hidden = thickness - visible.clamp(0, thickness);
    match edge {
        Edge::Top => Rect { y: panel.y - hidden, ..panel },
        Edge::Bottom => Rect { y: panel.y + hidden, ..panel },
        Edge::Left => Rect { x: panel.x - hidden, ..panel },
        Edge::Right => Rect { x: panel.x + hidden, ..panel },
    }
}

// ============================================================================
// Strut
// ============================================================================

/// Screen space reserved along the panel's edge.
///
/// A thickness of zero releases any reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Strut {
    pub edge: Edge,
    pub thickness: u32,
    pub rect: Rect,
}

impl Strut {
    /// Compute the reservation for a panel.
    ///
    /// Auto-hidden panels reserve nothing so maximized windows can use the
    /// space the panel retracts from.
    #[must_use]
    pub fn for_panel(panel: Rect, settings: &PanelSettings) -> Self {
        let thickness = if settings.reserve_space && !settings.auto_hide {
            match settings.orientation() {
                Orientation::Horizontal => panel.height,
                Orientation::Vertical => panel.width,
            }
        } else {
            0
        };
        Self {
            edge: settings.edge,
            thickness: u32::try_from(thickness).unwrap_or(0),
            rect: panel,
        }
    }

    #[must_use]
    pub const fn is_reserved(&self) -> bool { self.thickness > 0 }

    /// Window manager request carrying this reservation.
    #[must_use]
    pub const fn request(&self) -> WmRequest {
        WmRequest::ReserveScreenStrut {
            edge: self.edge,
            thickness: self.thickness,
            rect: self.rect,
        }
    }
}

// ============================================================================
// Layout
// ============================================================================

/// A plugin as seen by the layout engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotInput {
    pub id: Uuid,
    pub kind: String,
    pub hint: SizeHint,
}

/// Slot assigned to one plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginSlot {
    pub id: Uuid,
    pub kind: String,
    pub ordinal: usize,
    /// Absolute rectangle inside the shown panel. Empty when hidden.
    pub rect: Rect,
    pub visibility: SlotVisibility,
}

/// Immutable snapshot of the panel layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PanelLayout {
    pub screen: Rect,
    pub edge: Edge,
    /// Rectangle of the fully shown panel.
    pub panel: Rect,
    /// Rectangle currently on screen, after auto-hide retraction.
    pub visible: Rect,
    pub slots: Vec<PluginSlot>,
    /// Some plugins were truncated or hidden for lack of space.
    pub overflow: bool,
    pub strut: Strut,
}

impl PanelLayout {
    /// Slot of a plugin instance.
    #[must_use]
    pub fn slot(&self, id: Uuid) -> Option<&PluginSlot> { self.slots.iter().find(|s| s.id == id) }

    /// Number of plugins not fully shown.
    #[must_use]
    pub fn overflowed(&self) -> usize {
        self.slots.iter().filter(|s| s.visibility != SlotVisibility::Visible).count()
    }
}

/// Lay the panel out on `screen`.
///
/// `plugins` must be in ordinal order. `visible_thickness` is the part of the
/// panel currently on screen, as reported by auto-hide.
#[must_use]
pub fn compute_layout(
    screen: Rect,
    settings: &PanelSettings,
    plugins: &[SlotInput],
    visible_thickness: i32,
) -> PanelLayout {
    let panel = panel_rect(screen, settings);
    let orientation = settings.orientation();
    let hints: Vec<SizeHint> = plugins.iter().map(|p| p.hint).collect();
    let packing = pack(panel.length_along(orientation), &hints);

    let mut cursor = 0;
    let slots = plugins
        .iter()
        .zip(&packing.slots)
        .enumerate()
        .map(|(ordinal, (plugin, packed))| {
            let rect = match orientation {
                Orientation::Horizontal => {
                    Rect::new(panel.x + cursor, panel.y, packed.size, panel.height)
                }
                Orientation::Vertical => {
                    Rect::new(panel.x, panel.y + cursor, panel.width, packed.size)
                }
            };
            cursor += packed.size;
            PluginSlot {
                id: plugin.id,
                kind: plugin.kind.clone(),
                ordinal,
                rect,
                visibility: packed.visibility,
            }
        })
        .collect();

    PanelLayout {
        screen,
        edge: settings.edge,
        panel,
        visible: retract(panel, settings.edge, visible_thickness),
        slots,
        overflow: packing.overflow,
        strut: Strut::for_panel(panel, settings),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCREEN: Rect = Rect::new(0, 0, 1000, 800);

    fn settings(length: PanelLength) -> PanelSettings {
        PanelSettings {
            length,
            thickness: 40,
            ..PanelSettings::default()
        }
    }

    fn input(kind: &str, hint: SizeHint) -> SlotInput {
        SlotInput {
            id: Uuid::now_v7(),
            kind: kind.to_string(),
            hint,
        }
    }

    #[test]
    fn test_negative_length_resolves_against_screen() {
        let rect = panel_rect(SCREEN, &settings(PanelLength::Pixels(-100)));
        assert_eq!(rect.width, 900);
        assert_eq!(rect.x, 50);
        assert_eq!(rect.y, 760);
        assert_eq!(rect.height, 40);
    }

    #[test]
    fn test_percentage_and_pixel_lengths() {
        let half = panel_rect(SCREEN, &settings(PanelLength::Percentage("50%".to_string())));
        assert_eq!(half.width, 500);

        let wide = panel_rect(SCREEN, &settings(PanelLength::Pixels(5000)));
        assert_eq!(wide.width, 1000);
    }

    #[test]
    fn test_alignment_and_offset() {
        let mut s = settings(PanelLength::Pixels(400));
        s.alignment = Alignment::Start;
        s.offset = 10;
        assert_eq!(panel_rect(SCREEN, &s).x, 10);

        s.alignment = Alignment::End;
        assert_eq!(panel_rect(SCREEN, &s).x, 590);

        // Offsets never push the panel off screen.
        s.offset = 900;
        assert_eq!(panel_rect(SCREEN, &s).x, 0);
    }

    #[test]
    fn test_vertical_edges() {
        let mut s = settings(PanelLength::Pixels(-200));
        s.edge = Edge::Right;
        let rect = panel_rect(SCREEN, &s);
        assert_eq!(rect, Rect::new(960, 100, 40, 600));

        s.edge = Edge::Left;
        assert_eq!(panel_rect(SCREEN, &s).x, 0);
    }

    #[test]
    fn test_slots_packed_along_long_axis() {
        let s = settings(PanelLength::Pixels(-100));
        let plugins = vec![
            input("startmenu", SizeHint::fixed(200)),
            input("quicklaunch", SizeHint::fixed(200)),
            input("clock", SizeHint::fixed(200)),
            input("taskbar", SizeHint::expandable(0)),
        ];
        let layout = compute_layout(SCREEN, &s, &plugins, 40);

        let widths: Vec<i32> = layout.slots.iter().map(|slot| slot.rect.width).collect();
        assert_eq!(widths, vec![200, 200, 200, 300]);
        assert_eq!(layout.slots[3].rect.x, 650);
        assert_eq!(layout.slots[3].ordinal, 3);
        assert!(!layout.overflow);
    }

    #[test]
    fn test_overflow_drops_highest_ordinal() {
        let s = settings(PanelLength::Pixels(500));
        let plugins = vec![
            input("startmenu", SizeHint::fixed(300)),
            input("clock", SizeHint::fixed(300)),
        ];
        let layout = compute_layout(SCREEN, &s, &plugins, 40);
        assert!(layout.overflow);
        assert_eq!(layout.overflowed(), 1);
        assert_eq!(layout.slots[1].visibility, SlotVisibility::Hidden);
        assert_eq!(layout.slots[0].visibility, SlotVisibility::Visible);
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let s = settings(PanelLength::Percentage("80%".to_string()));
        let plugins = vec![input("spacer", SizeHint::expandable(0))];
        assert_eq!(compute_layout(SCREEN, &s, &plugins, 40), compute_layout(SCREEN, &s, &plugins, 40));
    }

    #[test]
    fn test_retract_keeps_margin() {
        let panel = Rect::new(0, 760, 1000, 40);
        assert_eq!(retract(panel, Edge::Bottom, 4), Rect::new(0, 796, 1000, 40));
        assert_eq!(retract(panel, Edge::Bottom, 40), panel);
        let top = Rect::new(0, 0, 1000, 40);
        assert_eq!(retract(top, Edge::Top, 0).y, -40);
    }

    #[test]
    fn test_strut_released_when_auto_hidden() {
        let mut s = settings(PanelLength::default());
        let panel = panel_rect(SCREEN, &s);
        assert_eq!(Strut::for_panel(panel, &s).thickness, 40);

        s.auto_hide = true;
        assert!(!Strut::for_panel(panel, &s).is_reserved());

        s.auto_hide = false;
        s.reserve_space = false;
        assert_eq!(Strut::for_panel(panel, &s).thickness, 0);
    }
}
