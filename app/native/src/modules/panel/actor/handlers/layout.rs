//! Screen, configuration, pointer and timer handlers.

use std::time::Instant;

use super::plugins::on_retry_writes;
use crate::config::ShelfConfig;
use crate::geometry::Rect;
use crate::modules::panel::layout::PanelSettings;
use crate::modules::panel::state::PanelState;

/// The panel's screen changed geometry. Recomputing for the same screen is a no-op.
pub fn on_screen_changed(state: &mut PanelState, screen: Rect, now: Instant) {
    if !screen.is_valid() {
        tracing::warn!(%screen, "ignoring empty screen geometry");
        return;
    }
    if state.screen == screen {
        return;
    }
    tracing::debug!(from = %state.screen, to = %screen, "screen changed");
    state.screen = screen;
    state.relayout(now);
}

/// Apply a reloaded configuration.
pub fn on_config_changed(state: &mut PanelState, config: ShelfConfig, now: Instant) {
    if state.config == config {
        return;
    }
    let old = std::mem::replace(&mut state.config, config);
    let new = &state.config;

    if old.persistence != new.persistence {
        tracing::info!("persistence settings take effect on the next start");
    }

    state.settings = PanelSettings::from(&new.panel);
    state.registry.set_locked(new.panel.locked);

    let host_changed = old.panel.edge != new.panel.edge
        || old.panel.thickness != new.panel.thickness
        || old.panel.icon_size != new.panel.icon_size;
    let taskbar_changed = old.taskbar != new.taskbar;
    let auto_hide = new.panel.auto_hide.clone();
    let taskbar = new.taskbar.clone();

    if host_changed {
        tracing::debug!("panel geometry changed, recreating plugins");
        state.recreate_plugins();
    } else if taskbar_changed && let Some(plugin) = state.taskbar_mut() {
        plugin.set_global_config(&taskbar);
    }

    state.autohide.set_config(&auto_hide, now);
    tracing::info!("configuration applied");

    state.refresh_taskbar(now);
    state.relayout(now);
}

pub fn on_pointer_entered(state: &mut PanelState, now: Instant) {
    if state.autohide.pointer_entered(now) {
        state.relayout(now);
    }
}

pub fn on_pointer_left(state: &mut PanelState, now: Instant) {
    if state.autohide.pointer_left(now) {
        state.relayout(now);
    }
}

/// Advance every timer: pending overlays, auto-hide and write retries.
pub fn on_tick(state: &mut PanelState, now: Instant) {
    let directory = &state.directory;
    let expired = state
        .plugins
        .values_mut()
        .find_map(|p| p.as_taskbar_mut())
        .is_some_and(|taskbar| taskbar.expire_pending(directory, now));
    if expired {
        state.refresh_taskbar(now);
    }

    let animating = state.autohide.is_animating();
    if state.autohide.tick(now) || animating {
        state.relayout(now);
    }

    on_retry_writes(state, now);
}
