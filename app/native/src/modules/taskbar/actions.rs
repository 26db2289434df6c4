//! User input on the taskbar, translated into window manager requests.
//!
//! Nothing here changes confirmed window state. Each input produces a plan of
//! fire-and-forget requests; the confirming notifications arrive later through
//! the adapter.

use serde::{Deserialize, Serialize};

use super::presenter::TaskbarView;
use crate::config::TaskbarConfig;
use crate::modules::windows::{Desktop, DesktopInfo, Layer, MaximizeAxis, WindowDirectory, WindowId, WmRequest};

/// Mouse button of a click.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

/// What a click landed on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryTarget {
    Window(WindowId),
    /// A group button, by application class.
    Group(String),
}

/// Actions offered by a window's context menu.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WindowAction {
    Activate,
    Restore,
    Minimize,
    Maximize(MaximizeAxis),
    Shade(bool),
    SetLayer(Layer),
    MoveToDesktop(Desktop),
    MoveToCurrentDesktop,
    Close,
}

/// Input delivered to the taskbar.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "input", rename_all = "kebab-case")]
pub enum TaskbarInput {
    Click { target: EntryTarget, button: MouseButton },

    /// Positive deltas move forward.
    Wheel { delta: i32 },

    Menu { window_id: WindowId, action: WindowAction },
}

/// Outcome of one input.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActionPlan {
    pub requests: Vec<WmRequest>,

    /// Group whose popup should be toggled.
    pub toggle_group: Option<String>,
}

impl ActionPlan {
    fn request(request: WmRequest) -> Self {
        Self {
            requests: vec![request],
            toggle_group: None,
        }
    }

    /// Whether the plan does nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.requests.is_empty() && self.toggle_group.is_none() }
}

/// Translate an input into an action plan.
#[must_use]
pub fn plan_input(
    input: &TaskbarInput,
    directory: &WindowDirectory,
    view: &TaskbarView,
    config: &TaskbarConfig,
) -> ActionPlan {
    let desktops = directory.desktops();
    match input {
        TaskbarInput::Click { target, button } => match (target, button) {
            (EntryTarget::Window(id), MouseButton::Left) => plan_left_click(*id, directory, config),
            (EntryTarget::Window(id), MouseButton::Middle) if config.close_on_middle_click => {
                ActionPlan::request(WmRequest::Close { window_id: *id })
            }
            (EntryTarget::Group(class), MouseButton::Left) => ActionPlan {
                requests: Vec::new(),
                toggle_group: Some(class.clone()),
            },
            // The context menu is drawn by the renderer; its choices arrive as `Menu`.
            _ => ActionPlan::default(),
        },
        TaskbarInput::Wheel { delta } if config.cycle_on_wheel => {
            plan_wheel(*delta, directory, view)
        }
        TaskbarInput::Wheel { .. } => ActionPlan::default(),
        TaskbarInput::Menu { window_id, action } => {
            plan_menu(*window_id, *action, directory, desktops)
        }
    }
}

/// Left click on a window button.
///
/// - active and visible: minimize
/// - minimized: bring to the current desktop if configured, then activate
/// - otherwise: activate
fn plan_left_click(id: WindowId, directory: &WindowDirectory, config: &TaskbarConfig) -> ActionPlan {
    let Some(window) = directory.get(id) else {
        return ActionPlan::default();
    };
    let attrs = &window.attributes;

    if attrs.active && !attrs.minimized {
        return ActionPlan::request(WmRequest::SetMinimized {
            window_id: id,
            minimized: true,
        });
    }

    let mut requests = Vec::with_capacity(2);
    let current = directory.desktops().active;
    if attrs.minimized && config.raise_on_current_desktop && !attrs.desktop.is_on(current) {
        requests.push(WmRequest::MoveToDesktop {
            window_id: id,
            desktop: Desktop::Index(current),
        });
    }
    requests.push(WmRequest::Activate { window_id: id });
    ActionPlan {
        requests,
        toggle_group: None,
    }
}

/// Wheel: activate the next (or previous) window after the active one.
fn plan_wheel(delta: i32, directory: &WindowDirectory, view: &TaskbarView) -> ActionPlan {
    if delta == 0 {
        return ActionPlan::default();
    }
    let order = view.cycle_order();
    if order.is_empty() {
        return ActionPlan::default();
    }

    let active = order
        .iter()
        .position(|id| directory.get(*id).is_some_and(|w| w.attributes.active));
    let len = order.len();
    let next = match (active, delta > 0) {
        (Some(idx), true) => (idx + 1) % len,
        (Some(idx), false) => (idx + len - 1) % len,
        (None, true) => 0,
        (None, false) => len - 1,
    };

    if active == Some(next) {
        return ActionPlan::default();
    }
    ActionPlan::request(WmRequest::Activate { window_id: order[next] })
}

fn plan_menu(id: WindowId, action: WindowAction, directory: &WindowDirectory, desktops: DesktopInfo) -> ActionPlan {
    let Some(window) = directory.get(id) else {
        return ActionPlan::default();
    };
    let attrs = &window.attributes;

    let request = match action {
        WindowAction::Activate => WmRequest::Activate { window_id: id },
        WindowAction::Restore if attrs.minimized => WmRequest::SetMinimized {
            window_id: id,
            minimized: false,
        },
        WindowAction::Restore if attrs.shaded => WmRequest::SetShaded {
            window_id: id,
            shaded: false,
        },
        WindowAction::Restore => WmRequest::SetMaximized {
            window_id: id,
            axis: MaximizeAxis::None,
        },
        WindowAction::Minimize => WmRequest::SetMinimized {
            window_id: id,
            minimized: true,
        },
        WindowAction::Maximize(axis) => WmRequest::SetMaximized { window_id: id, axis },
        WindowAction::Shade(shaded) => WmRequest::SetShaded { window_id: id, shaded },
        WindowAction::SetLayer(layer) => WmRequest::SetLayer { window_id: id, layer },
        WindowAction::MoveToDesktop(desktop) => {
            if let Desktop::Index(idx) = desktop
                && idx >= desktops.count
            {
                tracing::debug!(window_id = %id, desktop = idx, "desktop index out of range");
                return ActionPlan::default();
            }
            WmRequest::MoveToDesktop { window_id: id, desktop }
        }
        WindowAction::MoveToCurrentDesktop => WmRequest::MoveToDesktop {
            window_id: id,
            desktop: Desktop::Index(desktops.active),
        },
        WindowAction::Close => WmRequest::Close { window_id: id },
    };
    ActionPlan::request(request)
}
