//! State owned by the panel actor.
//!
//! Everything here is mutated from the actor task only. Renderers see the
//! results through the published `Arc` snapshots and notifications.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use eyeball::SharedObservable;
use tokio::sync::broadcast;
use uuid::Uuid;

use super::actor::{AdapterState, PanelNotification, Published};
use super::autohide::{AutoHide, FRAME_INTERVAL};
use super::layout::{PanelLayout, PanelSettings, SlotInput, Strut, compute_layout};
use super::plugin::{BoxedPlugin, HostContext, PluginError};
use super::plugins::PluginKind;
use super::registry::{PluginRecord, PluginRegistry, RegistryMutation};
use super::services::SharedServices;
use crate::config::ShelfConfig;
use crate::geometry::Rect;
use crate::modules::taskbar::{PresenterContext, TaskbarPlugin, TaskbarView};
use crate::modules::windows::{WindowDirectory, WindowId, WmRequest};

/// Capacity of the notification channel.
const NOTIFICATION_CAPACITY: usize = 64;

/// A registry mutation waiting to be written again.
///
/// The list is planned once, against `base`. The write is only retried while
/// the registry still holds `base`, so a relative change such as a move is
/// never replayed against a different list.
#[derive(Debug, Clone)]
pub struct PendingWrite {
    pub mutation: RegistryMutation,
    pub base: Vec<PluginRecord>,
    pub candidate: Vec<PluginRecord>,
    /// Failed attempts so far.
    pub attempts: u32,
    pub due: Instant,
}

/// All panel state.
pub struct PanelState {
    pub(crate) config: ShelfConfig,
    pub(crate) settings: PanelSettings,
    pub(crate) screen: Rect,
    pub(crate) directory: WindowDirectory,
    pub(crate) registry: PluginRegistry,
    pub(crate) plugins: HashMap<Uuid, BoxedPlugin>,
    pub(crate) services: SharedServices,
    pub(crate) autohide: AutoHide,
    pub(crate) layout: Arc<PanelLayout>,
    pub(crate) adapter_state: AdapterState,

    /// Last strut handed to the window manager.
    pub(crate) sent_strut: Option<Strut>,

    /// Requests to send once the current message is handled.
    pub(crate) outbox: Vec<WmRequest>,

    /// Windows to look up individually.
    pub(crate) lookups: Vec<WindowId>,

    pub(crate) pending_writes: VecDeque<PendingWrite>,

    published: Published,
}

impl std::fmt::Debug for PanelState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PanelState")
            .field("screen", &self.screen)
            .field("windows", &self.directory.len())
            .field("plugins", &self.registry.records())
            .field("adapter_state", &self.adapter_state)
            .finish_non_exhaustive()
    }
}

impl PanelState {
    /// Build the state and instantiate every known plugin in the registry.
    #[must_use]
    pub fn new(
        config: ShelfConfig,
        mut registry: PluginRegistry,
        services: SharedServices,
        screen: Rect,
        now: Instant,
    ) -> Self {
        let settings = PanelSettings::from(&config.panel);
        registry.set_locked(config.panel.locked);
        let autohide = AutoHide::new(&config.panel.auto_hide, now);
        let (notifications, _) = broadcast::channel(NOTIFICATION_CAPACITY);
        let layout = Arc::new(compute_layout(screen, &settings, &[], settings.thickness));

        let mut state = Self {
            config,
            settings,
            screen,
            directory: WindowDirectory::new(),
            registry,
            plugins: HashMap::new(),
            services,
            autohide,
            layout: Arc::clone(&layout),
            adapter_state: AdapterState::Connecting,
            sent_strut: None,
            outbox: Vec::new(),
            lookups: Vec::new(),
            pending_writes: VecDeque::new(),
            published: Published {
                layout: SharedObservable::new(layout),
                taskbar: SharedObservable::new(Arc::new(TaskbarView::default())),
                notifications,
            },
        };
        state.sync_plugins();
        state.refresh_taskbar(now);
        state.relayout(now);
        state
    }

    /// Published snapshots, shared with handles.
    #[must_use]
    pub fn published(&self) -> Published { self.published.clone() }

    #[must_use]
    pub const fn directory(&self) -> &WindowDirectory { &self.directory }

    #[must_use]
    pub const fn registry(&self) -> &PluginRegistry { &self.registry }

    #[must_use]
    pub fn layout(&self) -> Arc<PanelLayout> { Arc::clone(&self.layout) }

    #[must_use]
    pub const fn adapter_state(&self) -> AdapterState { self.adapter_state }

    #[must_use]
    pub const fn config(&self) -> &ShelfConfig { &self.config }

    /// Whether a plugin instance is running for `id`.
    #[must_use]
    pub fn is_instantiated(&self, id: Uuid) -> bool { self.plugins.contains_key(&id) }

    // ========================================================================
    // Plugins
    // ========================================================================

    pub(crate) fn host_context(&self, instance_id: Uuid) -> HostContext {
        HostContext {
            instance_id,
            edge: self.settings.edge,
            thickness: self.settings.thickness,
            icon_size: i32::try_from(self.config.panel.icon_size).unwrap_or(i32::MAX),
            services: Arc::clone(&self.services),
        }
    }

    /// Create, init and configure a plugin.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown type or a rejected configuration.
    pub(crate) fn instantiate(
        &self,
        id: Uuid,
        kind: &str,
        config: &serde_json::Value,
    ) -> Result<BoxedPlugin, PluginError> {
        let kind: PluginKind = kind.parse()?;
        let mut plugin = kind.create(&self.config.taskbar);
        plugin.init(&self.host_context(id))?;
        plugin.configure(config)?;
        Ok(plugin)
    }

    /// Bring live instances in line with the registry.
    pub(crate) fn sync_plugins(&mut self) {
        let records: Vec<PluginRecord> = self.registry.records().to_vec();

        self.plugins.retain(|id, plugin| {
            let keep = records.iter().any(|r| r.id == *id);
            if !keep {
                tracing::debug!(id = %id, kind = plugin.kind(), "destroying plugin");
                plugin.destroy();
            }
            keep
        });

        for record in &records {
            if self.plugins.contains_key(&record.id) {
                continue;
            }
            match self.instantiate(record.id, &record.kind, &record.config) {
                Ok(plugin) => {
                    tracing::debug!(id = %record.id, kind = %record.kind, "plugin instantiated");
                    self.plugins.insert(record.id, plugin);
                }
                Err(err) => {
                    tracing::warn!(id = %record.id, kind = %record.kind, error = %err, "plugin not loaded");
                }
            }
        }
    }

    /// Destroy every live instance.
    pub(crate) fn destroy_plugins(&mut self) {
        for plugin in self.plugins.values_mut() {
            plugin.destroy();
        }
        self.plugins.clear();
    }

    /// Destroy and recreate every instance, e.g. after the edge changed.
    pub(crate) fn recreate_plugins(&mut self) {
        self.destroy_plugins();
        self.sync_plugins();
    }

    pub(crate) fn taskbar(&self) -> Option<&TaskbarPlugin> {
        self.plugins.values().find_map(|p| p.as_taskbar())
    }

    pub(crate) fn taskbar_mut(&mut self) -> Option<&mut TaskbarPlugin> {
        self.plugins.values_mut().find_map(|p| p.as_taskbar_mut())
    }

    pub(crate) const fn presenter_context(&self) -> PresenterContext {
        PresenterContext {
            desktops: self.directory.desktops(),
            screen: self.config.panel.screen,
            stale: !self.adapter_state.is_connected(),
        }
    }

    // ========================================================================
    // Publication
    // ========================================================================

    /// Recompute the taskbar view and publish it if it changed.
    pub(crate) fn refresh_taskbar(&mut self, now: Instant) -> bool {
        let ctx = self.presenter_context();
        let directory = &self.directory;
        let Some(taskbar) = self.plugins.values_mut().find_map(|p| p.as_taskbar_mut()) else {
            return false;
        };
        let view = taskbar.refresh(directory, &ctx, now);
        self.publish_taskbar(view)
    }

    pub(crate) fn publish_taskbar(&mut self, view: Arc<TaskbarView>) -> bool {
        if *self.published.taskbar.get() == *view {
            return false;
        }
        tracing::trace!(entries = view.len(), stale = view.stale, "taskbar view changed");
        self.published.taskbar.set(Arc::clone(&view));
        self.notify(PanelNotification::TaskbarChanged(view));
        true
    }

    /// Recompute the layout and publish it if it changed.
    pub(crate) fn relayout(&mut self, now: Instant) -> bool {
        let inputs: Vec<SlotInput> = self
            .registry
            .records()
            .iter()
            .filter_map(|record| {
                self.plugins.get(&record.id).map(|plugin| SlotInput {
                    id: record.id,
                    kind: record.kind.clone(),
                    hint: plugin.size_hint(),
                })
            })
            .collect();
        let visible = self.autohide.visible_thickness(
            now,
            self.settings.thickness,
            self.settings.hidden_thickness(),
        );
        let layout = compute_layout(self.screen, &self.settings, &inputs, visible);
        if layout == *self.layout {
            return false;
        }

        for slot in &layout.slots {
            let moved = self.layout.slot(slot.id).is_none_or(|old| old.rect != slot.rect);
            if moved && let Some(plugin) = self.plugins.get_mut(&slot.id) {
                plugin.resize(slot.rect);
            }
        }
        if layout.overflow && !self.layout.overflow {
            tracing::info!(hidden = layout.overflowed(), "panel too short for all plugins");
        }

        let layout = Arc::new(layout);
        self.layout = Arc::clone(&layout);
        self.published.layout.set(Arc::clone(&layout));
        self.notify(PanelNotification::LayoutChanged(layout));
        self.sync_strut();
        true
    }

    /// Send the strut if it differs from the one the window manager has.
    pub(crate) fn sync_strut(&mut self) {
        let strut = self.layout.strut;
        if self.sent_strut == Some(strut) || !self.adapter_state.is_connected() {
            return;
        }
        tracing::debug!(edge = %strut.edge, thickness = strut.thickness, "updating strut");
        self.sent_strut = Some(strut);
        self.outbox.push(strut.request());
    }

    pub(crate) fn notify(&self, notification: PanelNotification) {
        // Nobody listening is fine.
        let _ = self.published.notifications.send(notification);
    }

    /// Queue requests for the window manager; dropped while disconnected.
    pub(crate) fn send_requests(&mut self, requests: Vec<WmRequest>) {
        if requests.is_empty() {
            return;
        }
        if !self.adapter_state.is_connected() {
            tracing::debug!(count = requests.len(), "window manager unavailable, dropping requests");
            return;
        }
        self.outbox.extend(requests);
    }

    pub(crate) fn take_outbox(&mut self) -> Vec<WmRequest> { std::mem::take(&mut self.outbox) }

    pub(crate) fn take_lookups(&mut self) -> Vec<WindowId> { std::mem::take(&mut self.lookups) }

    // ========================================================================
    // Timers
    // ========================================================================

    /// Next instant a timer needs the actor's attention.
    #[must_use]
    pub fn next_deadline(&self, now: Instant) -> Option<Instant> {
        let animation = self.autohide.is_animating().then(|| now + FRAME_INTERVAL);
        [
            self.taskbar().and_then(TaskbarPlugin::next_pending_deadline),
            self.autohide.next_deadline(),
            animation,
            self.pending_writes.front().map(|w| w.due),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    pub(crate) fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.config.persistence.retry_delay_ms)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::modules::panel::services::RecordingServices;
    use crate::modules::panel::store::MemoryStore;

    pub(crate) const SCREEN: Rect = Rect::new(0, 0, 1920, 1080);

    /// State with the default plugin set and no adapter connection.
    pub(crate) fn test_state(config: ShelfConfig, now: Instant) -> PanelState {
        let registry = PluginRegistry::open(Box::new(MemoryStore::new())).unwrap();
        PanelState::new(config, registry, Arc::new(RecordingServices::new()), SCREEN, now)
    }

    #[test]
    fn test_default_plugins_are_instantiated() {
        let state = test_state(ShelfConfig::default(), Instant::now());
        assert_eq!(state.plugins.len(), 6);
        assert!(state.taskbar().is_some());
        assert_eq!(state.layout.slots.len(), 6);
    }

    #[test]
    fn test_layout_published_on_start() {
        let state = test_state(ShelfConfig::default(), Instant::now());
        assert_eq!(*state.published().layout.get(), *state.layout);
        assert_eq!(state.layout.panel, Rect::new(0, 1034, 1920, 46));
    }

    #[test]
    fn test_unknown_stored_type_is_kept_but_not_instantiated() {
        let record = PluginRecord {
            id: Uuid::now_v7(),
            kind: "weather".to_string(),
            ordinal: 0,
            config: serde_json::Value::Null,
        };
        let store = MemoryStore::with_records(vec![record.clone()]);
        let registry = PluginRegistry::open(Box::new(store)).unwrap();
        let state = PanelState::new(
            ShelfConfig::default(),
            registry,
            Arc::new(RecordingServices::new()),
            SCREEN,
            Instant::now(),
        );
        assert_eq!(state.registry.len(), 1);
        assert!(!state.is_instantiated(record.id));
        assert!(state.layout.slots.is_empty());
    }

    #[test]
    fn test_requests_dropped_while_disconnected() {
        let mut state = test_state(ShelfConfig::default(), Instant::now());
        state.send_requests(vec![WmRequest::ShowDesktop { show: true }]);
        assert!(state.take_outbox().is_empty());

        state.adapter_state = AdapterState::Connected;
        state.send_requests(vec![WmRequest::ShowDesktop { show: true }]);
        assert_eq!(state.take_outbox().len(), 1);
    }

    #[test]
    fn test_strut_sent_once_connected() {
        let mut state = test_state(ShelfConfig::default(), Instant::now());
        assert!(state.sent_strut.is_none());

        state.adapter_state = AdapterState::Connected;
        state.sync_strut();
        let sent = state.take_outbox();
        assert_eq!(sent, vec![state.layout.strut.request()]);

        state.sync_strut();
        assert!(state.take_outbox().is_empty());
    }
}
