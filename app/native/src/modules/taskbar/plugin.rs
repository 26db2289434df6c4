//! The taskbar as a panel plugin.
//!
//! The plugin owns the presenter. The controller feeds it the window directory
//! after every batch and forwards user input; the plugin answers with views and
//! window manager requests.

use std::sync::Arc;
use std::time::{Duration, Instant};

use super::actions::{TaskbarInput, plan_input};
use super::presenter::{PresenterContext, TaskbarPresenter, TaskbarView};
use crate::config::{ButtonStyle, TaskbarConfig};
use crate::geometry::{Orientation, Rect};
use crate::modules::panel::plugin::{HostContext, Plugin, PluginError, SizeHint};
use crate::modules::windows::{WindowDirectory, WmRequest};

/// Catalog name of the taskbar plugin.
pub const TASKBAR_KIND: &str = "taskbar";

/// Task list plugin.
#[derive(Debug)]
pub struct TaskbarPlugin {
    presenter: TaskbarPresenter,

    /// Settings from the global `taskbar` section.
    global: TaskbarConfig,

    /// Per-instance settings; win over `global` when present.
    instance: Option<TaskbarConfig>,

    orientation: Orientation,
    thickness: i32,
    rect: Rect,
}

impl TaskbarPlugin {
    #[must_use]
    pub fn new(config: &TaskbarConfig) -> Self {
        Self {
            presenter: TaskbarPresenter::new(config),
            global: config.clone(),
            instance: None,
            orientation: Orientation::Horizontal,
            thickness: 0,
            rect: Rect::zero(),
        }
    }

    /// Settings in effect.
    #[must_use]
    pub fn config(&self) -> &TaskbarConfig { self.instance.as_ref().unwrap_or(&self.global) }

    /// Replace the global settings (configuration reload).
    pub fn set_global_config(&mut self, config: &TaskbarConfig) {
        self.global = config.clone();
        let effective = self.config().clone();
        self.presenter.set_config(&effective);
    }

    /// Most recent view.
    #[must_use]
    pub fn view(&self) -> Arc<TaskbarView> { self.presenter.view() }

    /// Slot assigned by the layout engine.
    #[must_use]
    pub const fn rect(&self) -> Rect { self.rect }

    fn pending_timeout(&self) -> Duration { Duration::from_millis(self.config().pending_timeout_ms) }

    /// Recompute the view after a directory change.
    ///
    /// Confirmed or expired pending overlays are dropped first.
    pub fn refresh(
        &mut self,
        directory: &WindowDirectory,
        ctx: &PresenterContext,
        now: Instant,
    ) -> Arc<TaskbarView> {
        let timeout = self.pending_timeout();
        self.presenter.pending_mut().reconcile(directory, now, timeout);
        self.presenter.present(directory, ctx)
    }

    /// Drop expired pending overlays. Returns `true` if the view needs a refresh.
    pub fn expire_pending(&mut self, directory: &WindowDirectory, now: Instant) -> bool {
        let timeout = self.pending_timeout();
        self.presenter.pending_mut().reconcile(directory, now, timeout)
    }

    /// When the next pending overlay expires.
    #[must_use]
    pub fn next_pending_deadline(&self) -> Option<Instant> {
        self.presenter.pending().next_deadline(self.pending_timeout())
    }

    /// Handle user input.
    ///
    /// Returns the requests to send. While `degraded`, requests are dropped and
    /// no overlay is recorded; local effects such as opening a group still apply.
    pub fn handle_input(
        &mut self,
        input: &TaskbarInput,
        directory: &WindowDirectory,
        now: Instant,
        degraded: bool,
    ) -> Vec<WmRequest> {
        let view = self.presenter.view();
        let plan = plan_input(input, directory, &view, self.config());

        if let Some(class) = &plan.toggle_group {
            self.presenter.toggle_expanded(class);
        }

        if degraded {
            if !plan.requests.is_empty() {
                tracing::debug!(count = plan.requests.len(), "window manager unavailable, dropping requests");
            }
            return Vec::new();
        }

        for request in &plan.requests {
            if let Some(window_id) = request.window_id()
                && let Some(window) = directory.get(window_id)
            {
                self.presenter.pending_mut().insert(window_id, request.clone(), window.revision, now);
            }
        }
        plan.requests
    }

    /// Length of one button along the panel.
    fn button_length(&self) -> i32 {
        match (self.orientation, self.config().button_style) {
            (Orientation::Vertical, _) | (_, ButtonStyle::IconOnly) => self.thickness,
            _ => i32::try_from(self.config().button_width).unwrap_or(i32::MAX),
        }
    }
}

impl Plugin for TaskbarPlugin {
    fn kind(&self) -> &'static str { TASKBAR_KIND }

    fn init(&mut self, host: &HostContext) -> Result<(), PluginError> {
        self.orientation = host.orientation();
        self.thickness = host.thickness;
        Ok(())
    }

    fn configure(&mut self, config: &serde_json::Value) -> Result<(), PluginError> {
        self.instance = match config {
            serde_json::Value::Null => None,
            serde_json::Value::Object(map) if map.is_empty() => None,
            value => Some(
                serde_json::from_value(value.clone())
                    .map_err(|err| PluginError::invalid_config(TASKBAR_KIND, &err))?,
            ),
        };
        let effective = self.config().clone();
        self.presenter.set_config(&effective);
        Ok(())
    }

    fn resize(&mut self, rect: Rect) { self.rect = rect; }

    fn destroy(&mut self) { self.presenter.pending_mut().clear(); }

    fn size_hint(&self) -> SizeHint {
        let button = self.button_length().max(0);
        let count = i32::try_from(self.presenter.view().len()).unwrap_or(i32::MAX);
        SizeHint {
            minimum: if count > 0 { button } else { 0 },
            preferred: button.saturating_mul(count),
            expandable: true,
        }
    }

    fn as_taskbar(&self) -> Option<&TaskbarPlugin> { Some(self) }

    fn as_taskbar_mut(&mut self) -> Option<&mut TaskbarPlugin> { Some(self) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Edge;
    use crate::modules::panel::services::RecordingServices;
    use crate::modules::taskbar::actions::{EntryTarget, MouseButton};
    use crate::modules::windows::{AdapterEvent, WindowAttributes, WindowId};

    fn host(edge: Edge) -> HostContext {
        HostContext {
            instance_id: uuid::Uuid::now_v7(),
            edge,
            thickness: 40,
            icon_size: 32,
            services: Arc::new(RecordingServices::new()),
        }
    }

    fn directory(count: u64) -> WindowDirectory {
        let mut dir = WindowDirectory::new();
        for id in 1..=count {
            dir.apply(&AdapterEvent::CreateWindow {
                window_id: WindowId(id),
                revision: 1,
                attributes: WindowAttributes::new(format!("w{id}"), format!("app{id}")),
            });
        }
        dir
    }

    fn plugin() -> TaskbarPlugin {
        let mut plugin = TaskbarPlugin::new(&TaskbarConfig {
            current_desktop_only: false,
            ..Default::default()
        });
        plugin.init(&host(Edge::Bottom)).unwrap();
        plugin.configure(&serde_json::Value::Null).unwrap();
        plugin
    }

    #[test]
    fn test_size_hint_tracks_entries() {
        let mut plugin = plugin();
        assert_eq!(plugin.size_hint().preferred, 0);

        plugin.refresh(&directory(3), &PresenterContext::default(), Instant::now());
        let hint = plugin.size_hint();
        assert_eq!(hint.minimum, 180);
        assert_eq!(hint.preferred, 540);
        assert!(hint.expandable);
    }

    #[test]
    fn test_vertical_panel_uses_thickness() {
        let mut plugin = plugin();
        plugin.init(&host(Edge::Left)).unwrap();
        plugin.refresh(&directory(2), &PresenterContext::default(), Instant::now());
        assert_eq!(plugin.size_hint().preferred, 80);
    }

    #[test]
    fn test_instance_config_overrides_global() {
        let mut plugin = plugin();
        plugin
            .configure(&serde_json::json!({ "buttonStyle": "iconOnly", "currentDesktopOnly": false }))
            .unwrap();
        plugin.refresh(&directory(2), &PresenterContext::default(), Instant::now());
        assert_eq!(plugin.size_hint().preferred, 80);

        plugin.set_global_config(&TaskbarConfig::default());
        assert_eq!(plugin.config().button_style, ButtonStyle::IconOnly);
    }

    #[test]
    fn test_input_records_pending_overlay() {
        let mut plugin = plugin();
        let dir = directory(1);
        plugin.refresh(&dir, &PresenterContext::default(), Instant::now());

        let input = TaskbarInput::Click {
            target: EntryTarget::Window(WindowId(1)),
            button: MouseButton::Left,
        };
        let now = Instant::now();
        let requests = plugin.handle_input(&input, &dir, now, false);
        assert_eq!(requests, vec![WmRequest::Activate { window_id: WindowId(1) }]);

        let view = plugin.refresh(&dir, &PresenterContext::default(), now);
        assert!(view.find_window(WindowId(1)).unwrap().pressed);
        assert!(plugin.next_pending_deadline().is_some());

        assert!(plugin.expire_pending(&dir, now + Duration::from_secs(5)));
    }

    #[test]
    fn test_degraded_input_sends_nothing() {
        let mut plugin = plugin();
        let dir = directory(1);
        plugin.refresh(&dir, &PresenterContext::default(), Instant::now());

        let input = TaskbarInput::Click {
            target: EntryTarget::Window(WindowId(1)),
            button: MouseButton::Left,
        };
        assert!(plugin.handle_input(&input, &dir, Instant::now(), true).is_empty());
        assert!(plugin.next_pending_deadline().is_none());
    }
}
