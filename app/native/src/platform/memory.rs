//! In-process window manager.
//!
//! Keeps windows in memory and publishes every change as an event batch to all
//! open subscriptions. Requests are logged and, when auto-confirm is enabled,
//! applied back as attribute changes the way a real window manager would
//! confirm them.

use std::collections::BTreeMap;

use futures::StreamExt;
use futures::channel::mpsc::{UnboundedSender, unbounded};
use parking_lot::Mutex;

use crate::modules::windows::{
    AdapterError, AdapterEvent, AttributeDelta, Desktop, DesktopInfo, EventBatch, EventStream,
    Revision, WindowAttributes, WindowId, WindowManagerAdapter, WindowRecord, WmRequest,
};

#[derive(Default)]
struct Inner {
    windows: BTreeMap<WindowId, WindowRecord>,
    desktops: DesktopInfo,
    next_id: u64,
    revision: Revision,
    disconnected: bool,
    subscribers: Vec<UnboundedSender<EventBatch>>,
    requests: Vec<WmRequest>,
    auto_confirm: bool,
    lossy: bool,
}

impl Inner {
    const fn bump(&mut self) -> Revision {
        self.revision += 1;
        self.revision
    }

    fn publish(&mut self, batch: EventBatch) {
        if batch.is_empty() || self.lossy {
            return;
        }
        self.subscribers.retain(|tx| tx.unbounded_send(batch.clone()).is_ok());
    }

    fn change(&mut self, window_id: WindowId, delta: AttributeDelta) -> Option<AdapterEvent> {
        let revision = self.bump();
        let record = self.windows.get_mut(&window_id)?;
        delta.apply_to(&mut record.attributes);
        record.revision = revision;
        Some(AdapterEvent::AttributeChanged {
            window_id,
            revision,
            delta,
        })
    }

    fn change_batch(&mut self, window_id: WindowId, delta: AttributeDelta) -> EventBatch {
        self.change(window_id, delta).into_iter().collect()
    }

    fn activate(&mut self, window_id: WindowId) -> EventBatch {
        let ids: Vec<WindowId> = self.windows.keys().copied().collect();
        ids.into_iter()
            .filter_map(|id| {
                let active = id == window_id;
                let delta = AttributeDelta {
                    active: Some(active),
                    minimized: active.then_some(false),
                    ..Default::default()
                };
                let changed = self.windows.get(&id).is_some_and(|r| {
                    r.attributes.active != active || (active && r.attributes.minimized)
                });
                changed.then(|| self.change(id, delta)).flatten()
            })
            .collect()
    }

    fn confirm(&mut self, request: &WmRequest) -> EventBatch {
        match *request {
            WmRequest::Activate { window_id } => self.activate(window_id),
            WmRequest::SetMinimized {
                window_id,
                minimized,
            } => {
                let mut batch = self.change_batch(window_id, AttributeDelta {
                    minimized: Some(minimized),
                    active: minimized.then_some(false),
                    ..Default::default()
                });
                if !minimized {
                    batch.extend(self.activate(window_id));
                }
                batch
            }
            WmRequest::SetMaximized { window_id, axis } => self.change_batch(window_id, AttributeDelta {
                maximized: Some(axis),
                ..Default::default()
            }),
            WmRequest::SetShaded { window_id, shaded } => self.change_batch(window_id, AttributeDelta {
                shaded: Some(shaded),
                ..Default::default()
            }),
            WmRequest::SetLayer { window_id, layer } => self.change_batch(window_id, AttributeDelta {
                layer: Some(layer),
                ..Default::default()
            }),
            WmRequest::MoveToDesktop { window_id, desktop } => {
                let revision = self.bump();
                match self.windows.get_mut(&window_id) {
                    Some(record) => {
                        record.attributes.desktop = desktop;
                        record.revision = revision;
                        vec![AdapterEvent::DesktopChanged {
                            window_id,
                            revision,
                            desktop,
                        }]
                    }
                    None => Vec::new(),
                }
            }
            WmRequest::Close { window_id } => {
                let revision = self.bump();
                self.windows
                    .remove(&window_id)
                    .map(|_| AdapterEvent::DestroyWindow {
                        window_id,
                        revision,
                    })
                    .into_iter()
                    .collect()
            }
            WmRequest::ShowDesktop { show } => {
                let ids: Vec<WindowId> = self.windows.keys().copied().collect();
                ids.into_iter()
                    .filter_map(|id| {
                        self.change(id, AttributeDelta {
                            minimized: Some(show),
                            active: show.then_some(false),
                            ..Default::default()
                        })
                    })
                    .collect()
            }
            WmRequest::ReserveScreenStrut { .. } => Vec::new(),
        }
    }
}

/// Window manager living entirely in memory.
#[derive(Default)]
pub struct InMemoryWindowManager {
    inner: Mutex<Inner>,
}

impl std::fmt::Debug for InMemoryWindowManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("InMemoryWindowManager")
            .field("windows", &inner.windows.len())
            .field("desktops", &inner.desktops)
            .field("disconnected", &inner.disconnected)
            .finish_non_exhaustive()
    }
}

impl InMemoryWindowManager {
    #[must_use]
    pub fn new(desktops: DesktopInfo) -> Self {
        let manager = Self::default();
        manager.inner.lock().desktops = desktops;
        manager
    }

    /// Apply every request back as a confirmation event.
    #[must_use]
    pub fn with_auto_confirm(self, enabled: bool) -> Self {
        self.inner.lock().auto_confirm = enabled;
        self
    }

    /// Open a window and announce it. Returns its id.
    pub fn open_window(&self, attributes: WindowAttributes) -> WindowId {
        let mut inner = self.inner.lock();
        inner.next_id += 1;
        let window_id = WindowId(inner.next_id);
        let revision = inner.bump();
        if attributes.active {
            // Id 0 is never assigned, so this only deactivates the others.
            let others = inner.activate(WindowId(0));
            inner.publish(others);
        }
        inner.windows.insert(window_id, WindowRecord {
            id: window_id,
            revision,
            attributes: attributes.clone(),
        });
        inner.publish(vec![AdapterEvent::CreateWindow {
            window_id,
            revision,
            attributes,
        }]);
        window_id
    }

    /// Close a window. Returns `false` if it did not exist.
    pub fn close_window(&self, window_id: WindowId) -> bool {
        let mut inner = self.inner.lock();
        let batch = inner.confirm(&WmRequest::Close { window_id });
        let closed = !batch.is_empty();
        inner.publish(batch);
        closed
    }

    /// Change attributes of a window. Returns `false` if it did not exist.
    pub fn change(&self, window_id: WindowId, delta: AttributeDelta) -> bool {
        let mut inner = self.inner.lock();
        let Some(event) = inner.change(window_id, delta) else {
            return false;
        };
        inner.publish(vec![event]);
        true
    }

    /// Move a window to another desktop.
    pub fn move_to_desktop(&self, window_id: WindowId, desktop: Desktop) -> bool {
        let mut inner = self.inner.lock();
        let batch = inner.confirm(&WmRequest::MoveToDesktop { window_id, desktop });
        let moved = !batch.is_empty();
        inner.publish(batch);
        moved
    }

    /// Change the desktop count or the active desktop.
    pub fn set_desktops(&self, desktops: DesktopInfo) {
        let mut inner = self.inner.lock();
        inner.desktops = desktops;
        inner.publish(vec![AdapterEvent::DesktopsChanged(desktops)]);
    }

    /// Publish a raw batch without touching the stored windows.
    pub fn emit(&self, batch: EventBatch) { self.inner.lock().publish(batch); }

    /// While enabled, changes are applied but never announced, as if the
    /// notifications were lost on the way.
    pub fn set_event_loss(&self, lossy: bool) { self.inner.lock().lossy = lossy; }

    /// Drop the connection: open streams end and every call fails until
    /// [`Self::reconnect`].
    pub fn disconnect(&self) {
        let mut inner = self.inner.lock();
        inner.disconnected = true;
        inner.subscribers.clear();
    }

    pub fn reconnect(&self) { self.inner.lock().disconnected = false; }

    #[must_use]
    pub fn is_connected(&self) -> bool { !self.inner.lock().disconnected }

    /// Number of open subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        let mut inner = self.inner.lock();
        inner.subscribers.retain(|tx| !tx.is_closed());
        inner.subscribers.len()
    }

    /// Every request received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<WmRequest> { self.inner.lock().requests.clone() }

    /// Current attributes of a window.
    #[must_use]
    pub fn attributes(&self, window_id: WindowId) -> Option<WindowAttributes> {
        self.inner.lock().windows.get(&window_id).map(|r| r.attributes.clone())
    }

    fn check_connected(inner: &Inner) -> Result<(), AdapterError> {
        if inner.disconnected {
            return Err(AdapterError::Unavailable("window manager disconnected".to_string()));
        }
        Ok(())
    }
}

impl WindowManagerAdapter for InMemoryWindowManager {
    fn subscribe(&self) -> Result<EventStream, AdapterError> {
        let mut inner = self.inner.lock();
        Self::check_connected(&inner)?;
        let (tx, rx) = unbounded();
        inner.subscribers.push(tx);
        Ok(rx.boxed())
    }

    fn window_attributes(&self, window_id: WindowId) -> Result<WindowRecord, AdapterError> {
        let inner = self.inner.lock();
        Self::check_connected(&inner)?;
        inner.windows.get(&window_id).cloned().ok_or(AdapterError::NotFound(window_id))
    }

    fn desktop_info(&self) -> Result<DesktopInfo, AdapterError> {
        let inner = self.inner.lock();
        Self::check_connected(&inner)?;
        Ok(inner.desktops)
    }

    fn list_windows(&self) -> Result<Vec<WindowId>, AdapterError> {
        let inner = self.inner.lock();
        Self::check_connected(&inner)?;
        Ok(inner.windows.keys().copied().collect())
    }

    fn request(&self, request: WmRequest) -> Result<(), AdapterError> {
        let mut inner = self.inner.lock();
        Self::check_connected(&inner)?;
        tracing::trace!(?request, "window manager request");
        if inner.auto_confirm {
            let batch = inner.confirm(&request);
            inner.publish(batch);
        }
        inner.requests.push(request);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;

    fn terminal(class: &str) -> WindowAttributes { WindowAttributes::new(class, class) }

    #[test]
    fn test_subscribers_receive_batches() {
        let wm = InMemoryWindowManager::new(DesktopInfo::default());
        let mut stream = wm.subscribe().unwrap();

        let id = wm.open_window(terminal("xterm"));
        let batch = block_on(stream.next()).unwrap();
        assert!(matches!(
            batch.as_slice(),
            [AdapterEvent::CreateWindow { window_id, .. }] if *window_id == id
        ));
    }

    #[test]
    fn test_revisions_increase_per_window() {
        let wm = InMemoryWindowManager::new(DesktopInfo::default());
        let id = wm.open_window(terminal("xterm"));
        let first = wm.window_attributes(id).unwrap().revision;
        wm.change(id, AttributeDelta {
            title: Some("vim".to_string()),
            ..Default::default()
        });
        let record = wm.window_attributes(id).unwrap();
        assert!(record.revision > first);
        assert_eq!(record.attributes.title, "vim");
    }

    #[test]
    fn test_disconnect_ends_streams_and_fails_calls() {
        let wm = InMemoryWindowManager::new(DesktopInfo::default());
        let mut stream = wm.subscribe().unwrap();
        wm.disconnect();

        assert!(block_on(stream.next()).is_none());
        assert!(matches!(wm.list_windows(), Err(AdapterError::Unavailable(_))));

        wm.reconnect();
        assert!(wm.list_windows().is_ok());
    }

    #[test]
    fn test_auto_confirm_minimize() {
        let wm = InMemoryWindowManager::new(DesktopInfo::default()).with_auto_confirm(true);
        let id = wm.open_window(terminal("xterm"));
        wm.request(WmRequest::SetMinimized {
            window_id: id,
            minimized: true,
        })
        .unwrap();

        assert!(wm.attributes(id).unwrap().minimized);
        assert_eq!(wm.requests().len(), 1);
    }

    #[test]
    fn test_activate_moves_focus() {
        let wm = InMemoryWindowManager::new(DesktopInfo::default()).with_auto_confirm(true);
        let a = wm.open_window(terminal("xterm"));
        let b = wm.open_window(terminal("firefox"));
        wm.request(WmRequest::Activate { window_id: a }).unwrap();
        wm.request(WmRequest::Activate { window_id: b }).unwrap();

        assert!(!wm.attributes(a).unwrap().active);
        assert!(wm.attributes(b).unwrap().active);
    }

    #[test]
    fn test_event_loss_still_changes_state() {
        let wm = InMemoryWindowManager::new(DesktopInfo::default());
        let mut stream = wm.subscribe().unwrap();
        wm.set_event_loss(true);
        let id = wm.open_window(terminal("xterm"));
        wm.set_event_loss(false);
        wm.close_window(id);

        let batch = block_on(stream.next()).unwrap();
        assert!(matches!(batch.as_slice(), [AdapterEvent::DestroyWindow { .. }]));
    }

    #[test]
    fn test_without_auto_confirm_requests_are_only_logged() {
        let wm = InMemoryWindowManager::new(DesktopInfo::default());
        let id = wm.open_window(terminal("xterm"));
        wm.request(WmRequest::Close { window_id: id }).unwrap();
        assert!(wm.attributes(id).is_some());
        assert_eq!(wm.requests(), vec![WmRequest::Close { window_id: id }]);
    }
}
