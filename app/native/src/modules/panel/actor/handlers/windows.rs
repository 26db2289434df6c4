//! Window manager event handlers.

use std::collections::HashSet;
use std::time::Instant;

use crate::modules::panel::actor::{AdapterState, PanelNotification};
use crate::modules::panel::state::PanelState;
use crate::modules::taskbar::TaskbarInput;
use crate::modules::windows::{AdapterEvent, DesktopInfo, WindowId, WindowRecord};

/// Apply a batch of adapter events atomically.
///
/// Events about windows the directory has never seen are answered by a
/// follow-up lookup instead of being applied blindly.
pub fn on_window_events(state: &mut PanelState, batch: &[AdapterEvent], now: Instant) {
    let unseen: Vec<WindowId> = batch
        .iter()
        .filter(|event| {
            matches!(
                event,
                AdapterEvent::AttributeChanged { .. } | AdapterEvent::DesktopChanged { .. }
            )
        })
        .filter_map(AdapterEvent::window_id)
        .filter(|id| state.directory.last_revision(*id).is_none())
        .collect();

    let report = state.directory.apply_batch(batch);
    tracing::debug!(
        created = report.created,
        updated = report.updated,
        removed = report.removed,
        stale = report.stale,
        unknown = report.unknown,
        "window batch applied"
    );

    let mut queued: HashSet<WindowId> = state.lookups.iter().copied().collect();
    for id in unseen {
        if !state.directory.contains(id) && queued.insert(id) {
            state.lookups.push(id);
        }
    }

    if report.changed() {
        state.refresh_taskbar(now);
        state.relayout(now);
    }
}

/// A single-window lookup finished.
pub fn on_window_resolved(
    state: &mut PanelState,
    window_id: WindowId,
    record: Option<WindowRecord>,
    now: Instant,
) {
    let outcome = state.directory.reconcile(window_id, record);
    tracing::debug!(window_id = %window_id, ?outcome, "window resolved");
    state.refresh_taskbar(now);
    state.relayout(now);
}

/// A (re)connection completed with a full snapshot.
///
/// Windows missing from the snapshot are dropped, the rest are merged by
/// revision, so replaying the snapshot never duplicates or loses a window.
pub fn on_adapter_connected(
    state: &mut PanelState,
    windows: Vec<WindowRecord>,
    desktops: DesktopInfo,
    now: Instant,
) {
    let live: HashSet<WindowId> = windows.iter().map(|record| record.id).collect();

    for id in state.directory.ids() {
        if !live.contains(&id) {
            state.directory.reconcile(id, None);
        }
    }
    for record in windows {
        state.directory.reconcile(record.id, Some(record));
    }
    state.directory.prune_tombstones(&live);
    state.directory.set_desktops(desktops);
    state.lookups.clear();

    tracing::info!(windows = state.directory.len(), "window manager connected");
    set_adapter_state(state, AdapterState::Connected);
    // The window manager may have restarted without our reservation.
    state.sent_strut = None;
    state.sync_strut();

    state.refresh_taskbar(now);
    state.relayout(now);
}

/// The connection was lost; keep the last-known directory and mark views stale.
pub fn on_adapter_disconnected(state: &mut PanelState, reason: &str, now: Instant) {
    if state.adapter_state == AdapterState::Degraded {
        tracing::debug!(reason, "window manager still unavailable");
        return;
    }
    tracing::warn!(reason, "window manager unavailable, entering degraded mode");
    set_adapter_state(state, AdapterState::Degraded);
    state.sent_strut = None;
    state.lookups.clear();
    state.outbox.clear();
    state.refresh_taskbar(now);
}

fn set_adapter_state(state: &mut PanelState, adapter_state: AdapterState) {
    if state.adapter_state != adapter_state {
        state.adapter_state = adapter_state;
        state.notify(PanelNotification::AdapterStateChanged(adapter_state));
    }
}

/// Click, wheel or menu input on the taskbar.
pub fn on_taskbar_input(state: &mut PanelState, input: &TaskbarInput, now: Instant) {
    let degraded = !state.adapter_state.is_connected();
    let directory = &state.directory;
    let Some(taskbar) = state.plugins.values_mut().find_map(|p| p.as_taskbar_mut()) else {
        tracing::debug!("taskbar input without a taskbar");
        return;
    };
    let requests = taskbar.handle_input(input, directory, now, degraded);
    state.send_requests(requests);

    // Overlay and expansion changes only show after a refresh.
    state.refresh_taskbar(now);
    state.relayout(now);
}
